//! fOS Find
//!
//! In-page find for fOS documents: text, whole-word, regex, CSS selector
//! and XPath queries over the rendered page and its editable fields, with
//! highlighting and undoable replacement.
//!
//! ```no_run
//! use fos_find::{FindEngine, SearchOptions};
//!
//! let document = fos_html::parse("<p>Hello world</p>").unwrap();
//! let mut engine = FindEngine::default();
//! engine.search(&document, "/w(or)ld/", SearchOptions::default());
//! println!("{}", engine.status_text());
//! ```

mod config;
mod engine;
mod error;
mod highlight;
mod matches;
mod mode;
mod options;
mod pattern;
mod replace;
mod visibility;
mod walker;

pub use config::{ConfigError, DEFAULT_UI_ROOT_ID, FindConfig};
pub use engine::{FindEngine, describe_element, describe_node};
pub use error::{FindError, ReplaceError};
pub use highlight::{
    CURRENT_COLOR, Color, ElementHighlight, ElementHighlightKind, Highlighter, MATCH_COLOR,
    RangeHighlight, ScrollMarker,
};
pub use matches::{
    EditableMatch, ElementMatch, FieldMatch, Match, MatchCollection, MatchKind, TextMatch,
};
pub use mode::{Detection, SearchMode, compile_regex, detect, looks_like_css_selector};
pub use options::{Scope, SearchOptions};
pub use pattern::{Captures, Hit, TextPattern};
pub use replace::{
    DefaultEditStrategy, DirectRangeEdit, EditStrategy, NativeInsertText, ReplaceAllReport,
    Replacer, UndoEntry, WithFallback, expand_template,
};
pub use visibility::{LayoutProbe, Size, StyleLayoutProbe, VisibilityOracle, clip_hides};
pub use walker::{
    EditableField, ExclusionPolicy, UI_MARKER_ATTRIBUTE, editable_fields, is_text_input,
    text_nodes, text_offsets,
};
