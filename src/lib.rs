//! Terminal admin console for a podconfig backend.
//!
//! The backend renders the feed list and changelog; this crate binds to what
//! it renders, drives the add/modify/remove/reload mutations, and resyncs
//! from the server after every one of them.

pub mod api;
pub mod app;
pub mod config;
pub mod confirm;
pub mod dirty;
pub mod markup;
pub mod presentation;
pub mod sync;
pub mod ui;
pub mod util;
