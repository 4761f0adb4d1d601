//! Search options

use serde::{Deserialize, Serialize};

/// Which content a search or replacement may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Editable fields only
    Input,
    /// Visible page text
    #[default]
    Page,
    /// All page text, hidden or not
    Html,
}

impl Scope {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "input" => Some(Self::Input),
            "page" => Some(Self::Page),
            "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// Options for one search
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub scope: Scope,
    pub include_editable_fields: bool,
    pub search_hidden: bool,
}

impl SearchOptions {
    /// Hidden content is searched when asked for or when the scope is `Html`
    pub fn includes_hidden(&self) -> bool {
        self.search_hidden || self.scope == Scope::Html
    }

    /// Whether the page-text pass runs for text and regex queries
    pub fn searches_page_text(&self) -> bool {
        self.scope != Scope::Input
    }

    /// Whether the editable-field pass runs for text and regex queries
    pub fn searches_fields(&self) -> bool {
        self.include_editable_fields || self.scope == Scope::Input
    }
}
