use crate::util::strip_control_chars;

/// The single shared message region. Last write wins; there is no queue and
/// no history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRegion {
    text: Option<String>,
}

impl MessageRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the region's contents with `text`.
    pub fn show(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(message = %text, "Showing message");
        self.text = Some(strip_control_chars(&text).into_owned());
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut region = MessageRegion::new();
        assert_eq!(region.text(), None);

        region.show("first");
        region.show("Feed 'alpha' modified successfully!.");
        assert_eq!(region.text(), Some("Feed 'alpha' modified successfully!."));
    }

    #[test]
    fn test_server_text_is_sanitised() {
        let mut region = MessageRegion::new();
        region.show("\x1b[2Jdone");
        assert_eq!(region.text(), Some("done"));
    }
}
