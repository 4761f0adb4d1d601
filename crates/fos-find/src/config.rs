//! Find configuration
//!
//! Defaults supplied by the settings collaborator. Every field is optional in
//! TOML; missing fields take the built-in defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::options::{Scope, SearchOptions};

/// Id of the find overlay root, excluded from every search
pub const DEFAULT_UI_ROOT_ID: &str = "fos-find-overlay";

/// Find engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindConfig {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub search_hidden: bool,
    pub include_editable_fields: bool,
    /// Matches kept per search before traversal stops
    pub max_matches: usize,
    /// Text ranges painted before the rest are dropped
    pub max_highlight_ranges: usize,
    /// Match count above which scroll markers are sampled
    pub marker_sample_threshold: usize,
    /// Scroll markers kept when sampling
    pub max_scroll_markers: usize,
    /// Replacements remembered for undo
    pub undo_limit: usize,
    pub ui_root_id: String,
}

impl Default for FindConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_word: false,
            search_hidden: false,
            include_editable_fields: false,
            max_matches: 10_000,
            max_highlight_ranges: 5_000,
            marker_sample_threshold: 500,
            max_scroll_markers: 200,
            undo_limit: 50,
            ui_root_id: DEFAULT_UI_ROOT_ID.to_string(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl FindConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parse a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_matches == 0 {
            return Err(ConfigError::Validation("max_matches must be > 0".to_string()));
        }
        if self.max_scroll_markers == 0 {
            return Err(ConfigError::Validation("max_scroll_markers must be > 0".to_string()));
        }
        if self.ui_root_id.trim().is_empty() {
            return Err(ConfigError::Validation("ui_root_id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Options bag for a page search with these defaults
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            case_sensitive: self.case_sensitive,
            whole_word: self.whole_word,
            scope: Scope::Page,
            include_editable_fields: self.include_editable_fields,
            search_hidden: self.search_hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FindConfig::default();
        assert_eq!(config.max_matches, 10_000);
        assert_eq!(config.undo_limit, 50);
        assert_eq!(config.ui_root_id, "fos-find-overlay");
        assert_eq!(config.search_options(), SearchOptions::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = FindConfig::from_toml_str("whole_word = true\nundo_limit = 5\n").unwrap();
        assert!(config.whole_word);
        assert_eq!(config.undo_limit, 5);
        assert_eq!(config.max_highlight_ranges, 5_000);
        assert!(config.search_options().whole_word);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            FindConfig::from_toml_str("max_matches = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FindConfig::from_toml_str("max_matches = 0"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_file_defaults() {
        let config = FindConfig::load(Path::new("/nonexistent/fos-find.toml")).unwrap();
        assert_eq!(config, FindConfig::default());
    }
}
