//! Find and replace errors
//!
//! Query errors never escape a search: the engine stores their text as the
//! last error. Replace errors display as the reason shown to the user.

/// Query compilation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FindError {
    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid XPath expression: {0}")]
    InvalidXPath(String),
}

/// Why a match could not be replaced or an edit undone
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplaceError {
    #[error("Not in editable field (try page or html scope)")]
    NotEditable,

    #[error("Text is hidden (try html scope)")]
    Hidden,

    #[error("CSS selector matches cannot be replaced (they select elements, not text)")]
    CssMatch,

    #[error("XPath matches cannot be replaced (they select nodes, not text)")]
    XPathMatch,

    #[error("Field is read-only")]
    ReadOnly,

    #[error("Match text has changed since the search")]
    Stale,

    #[error("Element no longer exists")]
    ElementGone,

    #[error("Text node no longer exists")]
    NodeGone,

    #[error("Could not edit the selected text")]
    EditRefused,

    #[error("Nothing to undo")]
    NothingToUndo,
}
