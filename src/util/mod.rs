//! Utility functions for common operations.
//!
//! - **Text**: Unicode-aware width and truncation for rendering, and
//!   sanitising of server-provided text
//! - **URL validation**: the backend base URL and links passed to the system
//!   opener
//! - **Tasks**: panic capture for spawned background work

mod task;
mod text;
mod url_validator;

pub use task::catch_task_panic;
pub use text::{clean_text, display_width, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_server_url, validate_url_for_open, UrlValidationError};
