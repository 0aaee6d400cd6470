use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Default display time for transient feedback such as "copied!".
pub const DEFAULT_FEEDBACK: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
struct Transient {
    text: String,
    until: Instant,
}

/// Temporary label overrides that revert on their own.
///
/// Labels are computed from a base text, so "reverting" means the override
/// simply stops applying; the base is whatever the control showed before.
#[derive(Debug, Clone)]
pub struct TransientLabels<K> {
    active: HashMap<K, Transient>,
}

impl<K> Default for TransientLabels<K> {
    fn default() -> Self {
        Self {
            active: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> TransientLabels<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `text` on `key` for `duration`, replacing any override already
    /// showing.
    pub fn show(&mut self, key: K, text: impl Into<String>, duration: Duration) {
        self.active.insert(
            key,
            Transient {
                text: text.into(),
                until: Instant::now() + duration,
            },
        );
    }

    /// Current label for `key`: the override while it lasts, else `base`.
    pub fn label<'a>(&'a self, key: &K, base: &'a str) -> &'a str {
        match self.active.get(key) {
            Some(t) if Instant::now() < t.until => t.text.as_str(),
            _ => base,
        }
    }

    pub fn is_active(&self, key: &K) -> bool {
        self.active
            .get(key)
            .is_some_and(|t| Instant::now() < t.until)
    }

    /// Drops elapsed overrides. Returns true if anything reverted.
    pub fn expire(&mut self) -> bool {
        let now = Instant::now();
        let before = self.active.len();
        self.active.retain(|_, t| now < t.until);
        self.active.len() != before
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    #[tokio::test]
    async fn test_label_reverts_after_duration() {
        time::pause();
        let mut labels = TransientLabels::new();
        labels.show("alpha", "Copied!", DEFAULT_FEEDBACK);

        assert_eq!(labels.label(&"alpha", "Copy"), "Copied!");
        assert_eq!(labels.label(&"beta", "Copy"), "Copy");

        time::advance(Duration::from_millis(999)).await;
        assert_eq!(labels.label(&"alpha", "Copy"), "Copied!");

        time::advance(Duration::from_millis(1)).await;
        assert_eq!(labels.label(&"alpha", "Copy"), "Copy");
        assert!(labels.expire());
        assert!(!labels.expire());
    }

    #[tokio::test]
    async fn test_show_again_restarts_duration() {
        time::pause();
        let mut labels = TransientLabels::new();
        labels.show(1u8, "Copied!", DEFAULT_FEEDBACK);
        time::advance(Duration::from_millis(800)).await;
        labels.show(1u8, "Copied!", DEFAULT_FEEDBACK);
        time::advance(Duration::from_millis(800)).await;
        assert!(labels.is_active(&1));
    }
}
