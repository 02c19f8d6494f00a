use std::fmt;

use crate::entities::{Kind, PlaceRecord};

const ENTRY_CLASS: &str = "place";

/// A node of the rendered page, reduced to what click resolution needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub classes: Vec<String>,
    pub data_id: Option<String>,
}

impl Element {
    pub fn with_class(class: &str) -> Self {
        Self {
            classes: vec![class.into()],
            data_id: None,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Where a click landed: the clicked element first, then its ancestors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClickTarget {
    pub path: Vec<Element>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Detail {
    pub icon: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListEntry {
    pub id: String,
    pub kind: Kind,
    pub title: String,
    pub details: Vec<Detail>,
}

impl ListEntry {
    fn from_record(record: &PlaceRecord) -> Self {
        let mut details = vec![
            Detail {
                icon: "🏙️",
                value: record.city().into(),
            },
            Detail {
                icon: "🏛️",
                value: record.name().into(),
            },
        ];

        if let Some(height) = record.height() {
            details.push(Detail {
                icon: "⬆️",
                value: height.into(),
            });
        }

        Self {
            id: record.id().into(),
            kind: record.kind(),
            title: record.description().into(),
            details,
        }
    }

    /// The `li` element carrying this entry's id.
    pub fn element(&self) -> Element {
        Element {
            classes: vec![ENTRY_CLASS.into(), format!("{}--{}", ENTRY_CLASS, self.kind)],
            data_id: Some(self.id.clone()),
        }
    }
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.title.replace("<br>", " | "))?;

        for detail in &self.details {
            write!(f, "\n    {} {}", detail.icon, detail.value)?;
        }

        Ok(())
    }
}

/// The visible place list. Entry 0 sits directly below the form.
#[derive(Debug, Default)]
pub struct ListRenderer {
    entries: Vec<ListEntry>,
}

impl ListRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    /// Inserts right after the form, above every earlier entry.
    #[tracing::instrument(skip(self, record), fields(id = record.id()))]
    pub fn render_one(&mut self, record: &PlaceRecord) {
        self.entries.insert(0, ListEntry::from_record(record));
    }

    /// Resolves a click to the id of the enclosing entry, if any.
    pub fn select_by_element(&self, target: &ClickTarget) -> Option<String> {
        target
            .path
            .iter()
            .find(|element| element.has_class(ENTRY_CLASS))
            .and_then(|element| element.data_id.clone())
    }

    /// Click target for the title of the entry at `row`.
    pub fn target_at(&self, row: usize) -> Option<ClickTarget> {
        let entry = self.entries.get(row)?;

        Some(ClickTarget {
            path: vec![
                Element::with_class("place__title"),
                entry.element(),
                Element::with_class("places"),
            ],
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Display for ListRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "(no places yet)");
        }

        for (row, entry) in self.entries.iter().enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            write!(f, "{:>2}. {}", row, entry)?;
        }

        Ok(())
    }
}
