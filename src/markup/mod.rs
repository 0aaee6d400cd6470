//! Reading server-rendered partials into a row model.
//!
//! The server, not the client, renders the feed list and changelog. This
//! module only locates what the controller binds to: rows, their role-marked
//! controls, and the edit-form fields. It is a thin reader, not a templating
//! engine.

mod changelog;
mod feed_list;

pub use changelog::{parse_changelog, Changelog};
pub use feed_list::{parse_feed_list, ControlRole, FeedList, FeedRow, FieldInput, MarkupError};
