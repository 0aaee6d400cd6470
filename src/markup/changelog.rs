use super::feed_list::MarkupError;
use crate::util::clean_text;
use scraper::{Html, Selector};

/// Pending changes the server has recorded since the last container reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changelog {
    pub entries: Vec<String>,
}

impl Changelog {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads the `/changelog` partial. List items become entries; markup without
/// a list falls back to its non-empty text lines.
pub fn parse_changelog(markup: &str) -> Result<Changelog, MarkupError> {
    let item = Selector::parse("li").map_err(|_| MarkupError::Selector("li"))?;
    let document = Html::parse_fragment(markup);

    let mut entries: Vec<String> = document
        .select(&item)
        .map(|li| clean_text(&li.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect();

    if entries.is_empty() {
        let text: String = document.root_element().text().collect();
        entries = text
            .lines()
            .map(clean_text)
            .filter(|t| !t.is_empty())
            .collect();
    }

    Ok(Changelog { entries })
}
