use crate::api::{EditField, DEFAULT_FORMAT_OPTIONS};
use crate::util::clean_text;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("Invalid selector '{0}'")]
    Selector(&'static str),
}

// ============================================================================
// Control Roles
// ============================================================================

/// Interactive affordances the server marks on each row with `data-role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlRole {
    EditToggle,
    SaveEdit,
    RemoveFeed,
    CopyXml,
}

impl ControlRole {
    pub const fn marker(self) -> &'static str {
        match self {
            ControlRole::EditToggle => "edit-button",
            ControlRole::SaveEdit => "save-edit",
            ControlRole::RemoveFeed => "remove-feed",
            ControlRole::CopyXml => "xml-button",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "edit-button" => Some(ControlRole::EditToggle),
            "save-edit" => Some(ControlRole::SaveEdit),
            "remove-feed" => Some(ControlRole::RemoveFeed),
            "xml-button" => Some(ControlRole::CopyXml),
            _ => None,
        }
    }
}

// ============================================================================
// Row Model
// ============================================================================

/// Live value of one edit-form field. `options` is non-empty for choice fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldInput {
    pub value: String,
    pub options: Vec<String>,
}

impl FieldInput {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            options: Vec::new(),
        }
    }

    pub fn choice(value: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            value: value.into(),
            options,
        }
    }

    /// Steps to the next (or previous) option, wrapping. A value that is not
    /// among the options steps to the first one.
    pub fn cycle(&mut self, forward: bool) {
        if self.options.is_empty() {
            return;
        }
        let len = self.options.len();
        let next = match self.options.iter().position(|o| *o == self.value) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.value = self.options[next].clone();
    }
}

/// One feed as rendered by the server. Rebuilt from scratch on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub key: String,
    pub name: String,
    pub source_url: Option<String>,
    pub xml_url: Option<String>,
    /// Edit-form fields present in the markup. A missing field was not
    /// rendered for this feed and takes no part in dirty tracking.
    pub fields: BTreeMap<EditField, FieldInput>,
    pub controls: BTreeSet<ControlRole>,
}

impl FeedRow {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            source_url: None,
            xml_url: None,
            fields: BTreeMap::new(),
            controls: BTreeSet::new(),
        }
    }

    pub fn has_control(&self, role: ControlRole) -> bool {
        self.controls.contains(&role)
    }

    pub fn field_value(&self, field: EditField) -> Option<&str> {
        self.fields.get(&field).map(|f| f.value.as_str())
    }

    pub fn field_mut(&mut self, field: EditField) -> Option<&mut FieldInput> {
        self.fields.get_mut(&field)
    }

    /// Present fields in form order.
    pub fn present_fields(&self) -> Vec<EditField> {
        EditField::ALL
            .into_iter()
            .filter(|f| self.fields.contains_key(f))
            .collect()
    }
}

/// Result of reading a feed-list partial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedList {
    pub rows: Vec<FeedRow>,
    /// Server-provided text shown when there are no rows ("No feeds found.").
    pub notice: Option<String>,
}

impl FeedList {
    pub fn row(&self, key: &str) -> Option<&FeedRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn row_mut(&mut self, key: &str) -> Option<&mut FeedRow> {
        self.rows.iter_mut().find(|r| r.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Parsing
// ============================================================================

struct Selectors {
    row: Selector,
    keyed: Selector,
    role: Selector,
    name: Selector,
    with_id: Selector,
    option: Selector,
    message: Selector,
}

impl Selectors {
    fn new() -> Result<Self, MarkupError> {
        Ok(Self {
            row: parse_selector(".feed-item")?,
            keyed: parse_selector("[data-feedkey]")?,
            role: parse_selector("[data-role]")?,
            name: parse_selector(".feed-name")?,
            with_id: parse_selector("input[id], select[id], textarea[id]")?,
            option: parse_selector("option")?,
            message: parse_selector(".message")?,
        })
    }
}

fn parse_selector(css: &'static str) -> Result<Selector, MarkupError> {
    Selector::parse(css).map_err(|_| MarkupError::Selector(css))
}

/// Reads the `/feeds` partial into rows.
///
/// Rows are `.feed-item` elements. When the server renders no such wrappers
/// the controls are grouped by their `data-feedkey` instead. Rows without a
/// key cannot be addressed by any action and are skipped.
pub fn parse_feed_list(markup: &str) -> Result<FeedList, MarkupError> {
    let selectors = Selectors::new()?;
    let document = Html::parse_fragment(markup);

    let inputs: HashMap<&str, ElementRef<'_>> = document
        .select(&selectors.with_id)
        .filter_map(|el| el.value().id().map(|id| (id, el)))
        .collect();

    let mut rows: Vec<FeedRow> = Vec::new();
    let containers: Vec<ElementRef<'_>> = document.select(&selectors.row).collect();

    if containers.is_empty() {
        for control in document.select(&selectors.keyed) {
            let Some(key) = control.value().attr("data-feedkey") else {
                continue;
            };
            if !rows.iter().any(|r| r.key == key) {
                rows.push(FeedRow::new(key));
            }
            if let Some(row) = rows.iter_mut().find(|r| r.key == key) {
                read_control(row, control);
            }
        }
    } else {
        for container in containers {
            let Some(key) = row_key(container, &selectors) else {
                tracing::warn!("Skipping feed row without a feed key");
                continue;
            };
            let mut row = FeedRow::new(key);
            if let Some(name_el) = container.select(&selectors.name).next() {
                let name = clean_text(&name_el.text().collect::<String>());
                if !name.is_empty() {
                    row.name = name;
                }
                row.source_url = non_empty_attr(name_el, "href");
            }
            for control in container.select(&selectors.role) {
                read_control(&mut row, control);
            }
            rows.push(row);
        }
    }

    for row in &mut rows {
        for field in EditField::ALL {
            let id = format!("{}-{}", row.key, field.name());
            if let Some(el) = inputs.get(id.as_str()) {
                row.fields
                    .insert(field, read_field(*el, field, &selectors.option));
            }
        }
    }

    let notice = if rows.is_empty() {
        let messages: Vec<String> = document
            .select(&selectors.message)
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect();
        let text = if messages.is_empty() {
            clean_text(&document.root_element().text().collect::<String>())
        } else {
            messages.join(" ")
        };
        (!text.is_empty()).then_some(text)
    } else {
        None
    };

    tracing::debug!(rows = rows.len(), "Parsed feed list markup");
    Ok(FeedList { rows, notice })
}

fn row_key(container: ElementRef<'_>, selectors: &Selectors) -> Option<String> {
    non_empty_attr(container, "data-feedkey").or_else(|| {
        container
            .select(&selectors.keyed)
            .find_map(|el| non_empty_attr(el, "data-feedkey"))
    })
}

fn read_control(row: &mut FeedRow, control: ElementRef<'_>) {
    let Some(role) = control
        .value()
        .attr("data-role")
        .and_then(ControlRole::from_marker)
    else {
        return;
    };
    if role == ControlRole::CopyXml {
        if let Some(url) = non_empty_attr(control, "data-xmlurl") {
            row.xml_url = Some(url);
        }
    }
    row.controls.insert(role);
}

fn read_field(el: ElementRef<'_>, field: EditField, option: &Selector) -> FieldInput {
    if el.value().name() == "select" {
        let options: Vec<(String, bool)> = el
            .select(option)
            .map(|o| {
                let value = o
                    .value()
                    .attr("value")
                    .map(str::to_string)
                    .unwrap_or_else(|| clean_text(&o.text().collect::<String>()));
                (value, o.value().attr("selected").is_some())
            })
            .collect();
        let value = options
            .iter()
            .find(|(_, selected)| *selected)
            .or_else(|| options.first())
            .map(|(v, _)| v.clone())
            .unwrap_or_default();
        return FieldInput::choice(value, options.into_iter().map(|(v, _)| v).collect());
    }

    let value = if el.value().name() == "textarea" {
        el.text().collect::<String>()
    } else {
        el.value().attr("value").unwrap_or_default().to_string()
    };

    if field.is_choice() {
        let options = DEFAULT_FORMAT_OPTIONS.iter().map(|o| o.to_string()).collect();
        FieldInput::choice(value, options)
    } else {
        FieldInput::text(value)
    }
}

fn non_empty_attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
