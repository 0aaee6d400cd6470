//! Transport adapter for the podconfig backend.
//!
//! Every request goes to one of a fixed set of endpoints and carries the
//! `X-Requested-With` marker. Mutations post URL-form-encoded bodies with
//! empty fields omitted; list and changelog fetches return raw markup.
//!
//! # Module Structure
//!
//! - [`client`] - `FeedApi`, the endpoint contract and `TransportError`
//! - [`form`] - `FormBody` and the typed add/modify request bodies

mod client;
mod form;

pub use client::{
    Endpoint, FeedApi, Payload, ResponseShape, TransportError, DEFAULT_MAX_RESPONSE_BYTES,
    DEFAULT_TIMEOUT, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE,
};
pub use form::{
    AddFeedRequest, EditField, FeedSettings, FormBody, ModifyFeedRequest,
    DEFAULT_FORMAT_OPTIONS, FIELD_FEED_KEY, FIELD_YOUTUBE_URL,
};
