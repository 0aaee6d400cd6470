//! Per-row edit sessions and dirty-state comparison.
//!
//! A session starts when a row's edit form is shown. Its baseline is captured
//! once and never changes; dirtiness is recomputed from scratch against live
//! values on every edit, so the save control can never drift out of sync.

use crate::api::EditField;
use crate::markup::FeedRow;
use std::collections::{BTreeMap, HashMap};

/// Anything that exposes live edit-field values.
pub trait FieldSource {
    /// Current value of `field`, or `None` when the field is not rendered.
    fn live_value(&self, field: EditField) -> Option<&str>;
}

impl FieldSource for FeedRow {
    fn live_value(&self, field: EditField) -> Option<&str> {
        self.field_value(field)
    }
}

impl FieldSource for BTreeMap<EditField, String> {
    fn live_value(&self, field: EditField) -> Option<&str> {
        self.get(&field).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct EditSession {
    baseline: BTreeMap<EditField, String>,
}

/// Baselines keyed by feed key.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    sessions: HashMap<String, EditSession>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots every present field of `source` as the session baseline.
    /// Fields the source does not render are left out entirely.
    pub fn capture_baseline(&mut self, key: &str, source: &impl FieldSource) {
        let baseline: BTreeMap<EditField, String> = EditField::ALL
            .into_iter()
            .filter_map(|field| source.live_value(field).map(|v| (field, v.to_string())))
            .collect();
        tracing::trace!(feed = key, fields = baseline.len(), "Captured edit baseline");
        self.sessions
            .insert(key.to_string(), EditSession { baseline });
    }

    /// True iff some baseline field now holds a different string.
    ///
    /// Exact comparison: no trimming and no numeric coercion. A field that
    /// disappeared since capture counts as unchanged. No session means clean.
    pub fn is_dirty(&self, key: &str, source: &impl FieldSource) -> bool {
        let Some(session) = self.sessions.get(key) else {
            return false;
        };
        session.baseline.iter().any(|(field, original)| {
            source
                .live_value(*field)
                .is_some_and(|current| current != original)
        })
    }

    pub fn has_session(&self, key: &str) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn baseline(&self, key: &str, field: EditField) -> Option<&str> {
        self.sessions
            .get(key)
            .and_then(|s| s.baseline.get(&field))
            .map(String::as_str)
    }

    pub fn end_session(&mut self, key: &str) {
        self.sessions.remove(key);
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
