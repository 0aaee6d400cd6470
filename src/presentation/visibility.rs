/// Whether a collapsible region (advanced options, an edit form) is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Shown,
}

impl Visibility {
    pub fn is_shown(self) -> bool {
        self == Visibility::Shown
    }

    pub fn flipped(self) -> Self {
        match self {
            Visibility::Hidden => Visibility::Shown,
            Visibility::Shown => Visibility::Hidden,
        }
    }

    /// Label for the toggling control given the region's current state.
    pub fn label<'a>(self, when_hidden: &'a str, when_shown: &'a str) -> &'a str {
        match self {
            Visibility::Hidden => when_hidden,
            Visibility::Shown => when_shown,
        }
    }
}

/// Flips `region` and returns the label its toggle should now show.
///
/// A pure function of the current state and the two labels; applying it twice
/// restores both the region and the label.
pub fn toggle_visibility<'a>(
    region: &mut Visibility,
    label_when_hidden: &'a str,
    label_when_shown: &'a str,
) -> &'a str {
    *region = region.flipped();
    region.label(label_when_hidden, label_when_shown)
}
