//! Form-encoded request bodies for the mutating endpoints.
//!
//! The backend cannot tell "field absent" from "field present but empty" in a
//! useful way: an absent field means "leave unchanged", an empty one may be
//! parsed as a value. Bodies therefore drop empty values at insertion time and
//! an empty string never reaches the wire.

use std::collections::BTreeMap;
use url::form_urlencoded;

/// Form field carrying the channel URL when adding a feed.
pub const FIELD_YOUTUBE_URL: &str = "youtubeUrl";
/// Form field carrying the feed identity key for modify/remove.
pub const FIELD_FEED_KEY: &str = "feedKey";

// ============================================================================
// Editable Fields
// ============================================================================

/// Configuration fields shared by the add form and the per-row edit forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EditField {
    UpdatePeriod,
    Format,
    MaxAge,
    CleanKeepLast,
}

impl EditField {
    /// All editable fields in form order.
    pub const ALL: [EditField; 4] = [
        EditField::UpdatePeriod,
        EditField::Format,
        EditField::MaxAge,
        EditField::CleanKeepLast,
    ];

    /// Wire name of the field (also the suffix of the row input id).
    pub const fn name(self) -> &'static str {
        match self {
            EditField::UpdatePeriod => "update_period",
            EditField::Format => "format",
            EditField::MaxAge => "max_age",
            EditField::CleanKeepLast => "clean_keep_last",
        }
    }

    /// Human-readable label for form rendering.
    pub const fn label(self) -> &'static str {
        match self {
            EditField::UpdatePeriod => "Update period",
            EditField::Format => "Format",
            EditField::MaxAge => "Max age (days)",
            EditField::CleanKeepLast => "Keep last",
        }
    }

    /// Whether the field is a fixed choice (rendered as a select by the server).
    pub const fn is_choice(self) -> bool {
        matches!(self, EditField::Format)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Output formats podsync understands, used when the server renders no options.
pub const DEFAULT_FORMAT_OPTIONS: &[&str] = &["audio", "video"];

// ============================================================================
// Form Body
// ============================================================================

/// A flat `name -> value` body, URL-form-encoded on the wire.
///
/// Insertion order is kept so the encoded body is deterministic; the backend
/// does not depend on order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
    pairs: Vec<(String, String)>,
}

impl FormBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FormBody::insert`].
    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name` to `value`. Empty values are omitted; inserting an empty
    /// value for an existing name removes it.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.pairs.retain(|(n, _)| n != name);
        if !value.is_empty() {
            self.pairs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encodes as `application/x-www-form-urlencoded`.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.pairs {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }
}

// ============================================================================
// Typed Requests
// ============================================================================

/// Values for the optional configuration fields. Unset and empty are the same.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSettings {
    values: BTreeMap<EditField, String>,
}

impl FeedSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: EditField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: EditField, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: EditField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    fn write_into(&self, body: &mut FormBody) {
        for field in EditField::ALL {
            if let Some(value) = self.get(field) {
                body.insert(field.name(), value);
            }
        }
    }
}

/// Body of `POST /add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddFeedRequest {
    pub youtube_url: String,
    pub settings: FeedSettings,
}

impl AddFeedRequest {
    pub fn to_form(&self) -> FormBody {
        let mut body = FormBody::new().field(FIELD_YOUTUBE_URL, &self.youtube_url);
        self.settings.write_into(&mut body);
        body
    }
}

/// Body of `POST /modify`. Only non-empty settings are sent, so the server
/// leaves the rest untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyFeedRequest {
    pub feed_key: String,
    pub settings: FeedSettings,
}

impl ModifyFeedRequest {
    pub fn to_form(&self) -> FormBody {
        let mut body = FormBody::new().field(FIELD_FEED_KEY, &self.feed_key);
        self.settings.write_into(&mut body);
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_values_are_omitted() {
        let body = FormBody::new()
            .field("youtubeUrl", "https://x")
            .field("update_period", "")
            .field("format", "mp3")
            .field("max_age", "")
            .field("clean_keep_last", "");

        assert_eq!(body.names().collect::<Vec<_>>(), vec!["youtubeUrl", "format"]);
        assert_eq!(body.encode(), "youtubeUrl=https%3A%2F%2Fx&format=mp3");
    }

    #[test]
    fn test_add_request_with_only_url() {
        let req = AddFeedRequest {
            youtube_url: "https://youtube.com/c/test".to_string(),
            settings: FeedSettings::new()
                .with(EditField::UpdatePeriod, "")
                .with(EditField::Format, "")
                .with(EditField::MaxAge, "")
                .with(EditField::CleanKeepLast, ""),
        };

        assert_eq!(
            req.to_form().encode(),
            "youtubeUrl=https%3A%2F%2Fyoutube.com%2Fc%2Ftest"
        );
    }

    #[test]
    fn test_modify_request_keeps_key_first() {
        let req = ModifyFeedRequest {
            feed_key: "mychannel".to_string(),
            settings: FeedSettings::new()
                .with(EditField::CleanKeepLast, "5")
                .with(EditField::UpdatePeriod, "6h"),
        };

        let body = req.to_form();
        assert_eq!(
            body.names().collect::<Vec<_>>(),
            vec!["feedKey", "update_period", "clean_keep_last"]
        );
        assert_eq!(body.get("clean_keep_last"), Some("5"));
    }

    #[test]
    fn test_insert_empty_removes_existing() {
        let mut body = FormBody::new().field("format", "audio");
        body.insert("format", "");
        assert!(body.is_empty());
    }

    #[test]
    fn test_whitespace_is_not_empty() {
        // Values are sent as typed; only the empty string is dropped.
        let body = FormBody::new().field("max_age", " ");
        assert_eq!(body.get("max_age"), Some(" "));
    }

    #[test]
    fn test_edit_field_name_roundtrip() {
        for field in EditField::ALL {
            assert_eq!(EditField::from_name(field.name()), Some(field));
        }
        assert_eq!(EditField::from_name("quality"), None);
    }
}
