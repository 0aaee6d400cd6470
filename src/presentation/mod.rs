//! Small presentation primitives shared by the screens.
//!
//! - **Visibility**: collapsible regions and their toggle labels
//! - **Message region**: one line of status text, last write wins
//! - **Transient labels**: overrides that revert after a fixed time
//! - **Clipboard**: system clipboard with a helper-program fallback

mod clipboard;
mod message;
mod transient;
mod visibility;

pub use clipboard::{
    Clipboard, ClipboardBackend, ClipboardError, CommandClipboard, CopyPath, HelperCommand,
    SystemClipboard, DEFAULT_HELPERS,
};
pub use message::MessageRegion;
pub use transient::{TransientLabels, DEFAULT_FEEDBACK};
pub use visibility::{toggle_visibility, Visibility};

#[cfg(test)]
pub(crate) use clipboard::testing;
