//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling per focus region
//! - `render` - Layout and render dispatch
//! - `helpers` - Shared layout and style helpers
//! - `add_form` - Add-feed form and reload control
//! - `changelog` - Pending-changes panel
//! - `feeds` - Feed list with per-row controls and edit forms
//! - `status` - Message line and keybinding hints
//! - `help` - Help overlay

mod add_form;
mod changelog;
mod feeds;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;

// Re-export the public API
pub use loop_runner::{run, Action};
