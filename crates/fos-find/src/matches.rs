//! Match records and the ordered match collection

use std::cmp::Ordering;

use fos_dom::{DomTree, NodeId, Range, XPathNode};

use crate::pattern::Captures;

/// Kind of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Text,
    Regex,
    Css,
    XPath,
    Input,
    Textarea,
    ContentEditable,
}

/// Occurrence inside a page text node
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    pub node: NodeId,
    pub range: Range,
    pub text: String,
    /// Capture groups of regex matches
    pub groups: Option<Captures>,
}

/// Element selected by a CSS selector or XPath expression
#[derive(Debug, Clone, PartialEq)]
pub struct ElementMatch {
    /// Owning element of the selected node
    pub element: NodeId,
    /// The node the query selected (element, text, comment or attribute)
    pub node: XPathNode,
    /// Description such as `div#main.note` or `@href="/"`
    pub text: String,
}

/// Occurrence inside an `input` or `textarea` value
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    pub element: NodeId,
    /// Byte offsets into the field value
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub groups: Option<Captures>,
}

/// Occurrence inside a `contenteditable` host
#[derive(Debug, Clone, PartialEq)]
pub struct EditableMatch {
    pub host: NodeId,
    pub node: NodeId,
    pub range: Range,
    /// Start of the match in the host's text content
    pub host_offset: usize,
    pub text: String,
    pub groups: Option<Captures>,
}

/// One located occurrence of a query
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    Text(TextMatch),
    Regex(TextMatch),
    Css(ElementMatch),
    XPath(ElementMatch),
    Input(FieldMatch),
    Textarea(FieldMatch),
    ContentEditable(EditableMatch),
}

impl Match {
    pub fn kind(&self) -> MatchKind {
        match self {
            Self::Text(_) => MatchKind::Text,
            Self::Regex(_) => MatchKind::Regex,
            Self::Css(_) => MatchKind::Css,
            Self::XPath(_) => MatchKind::XPath,
            Self::Input(_) => MatchKind::Input,
            Self::Textarea(_) => MatchKind::Textarea,
            Self::ContentEditable(_) => MatchKind::ContentEditable,
        }
    }

    /// Matched text, or the description of a selected node
    pub fn text(&self) -> &str {
        match self {
            Self::Text(m) | Self::Regex(m) => &m.text,
            Self::Css(m) | Self::XPath(m) => &m.text,
            Self::Input(m) | Self::Textarea(m) => &m.text,
            Self::ContentEditable(m) => &m.text,
        }
    }

    /// Live range, for range-addressed matches
    pub fn range(&self) -> Option<&Range> {
        match self {
            Self::Text(m) | Self::Regex(m) => Some(&m.range),
            Self::ContentEditable(m) => Some(&m.range),
            _ => None,
        }
    }

    /// Addressed element, for element- and field-addressed matches
    pub fn element(&self) -> Option<NodeId> {
        match self {
            Self::Css(m) | Self::XPath(m) => Some(m.element),
            Self::Input(m) | Self::Textarea(m) => Some(m.element),
            _ => None,
        }
    }

    /// `(start, end)` byte offsets within the addressed text node or value
    pub fn offsets(&self) -> Option<(usize, usize)> {
        match self {
            Self::Text(m) | Self::Regex(m) => Some((m.range.start_offset(), m.range.end_offset())),
            Self::ContentEditable(m) => Some((m.range.start_offset(), m.range.end_offset())),
            Self::Input(m) | Self::Textarea(m) => Some((m.start, m.end)),
            Self::Css(_) | Self::XPath(_) => None,
        }
    }

    /// Capture groups, present only for regex-sourced matches
    pub fn groups(&self) -> Option<&[Option<String>]> {
        match self {
            Self::Text(m) | Self::Regex(m) => m.groups.as_deref(),
            Self::Input(m) | Self::Textarea(m) => m.groups.as_deref(),
            Self::ContentEditable(m) => m.groups.as_deref(),
            Self::Css(_) | Self::XPath(_) => None,
        }
    }

    pub fn is_editable_field(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Textarea(_) | Self::ContentEditable(_))
    }

    /// Whether the match denotes an element rather than a text span
    pub fn is_element_match(&self) -> bool {
        matches!(self, Self::Css(_) | Self::XPath(_))
    }

    /// Node whose position orders this match in the document
    pub fn anchor(&self) -> NodeId {
        match self {
            Self::Text(m) | Self::Regex(m) => m.node,
            Self::ContentEditable(m) => m.node,
            Self::Css(m) | Self::XPath(m) => m.element,
            Self::Input(m) | Self::Textarea(m) => m.element,
        }
    }

    /// Document order, then start offset within the same node
    pub fn compare_position(&self, other: &Match, tree: &DomTree) -> Ordering {
        let (a, b) = (self.anchor(), other.anchor());
        if a == b {
            let start = |m: &Match| m.offsets().map_or(0, |(s, _)| s);
            return start(self).cmp(&start(other));
        }
        tree.compare_document_position(a, b)
    }
}

/// Ordered matches of one search with the current-match cursor
#[derive(Debug, Clone, Default)]
pub struct MatchCollection {
    matches: Vec<Match>,
    current: Option<usize>,
    limit_reached: bool,
}

impl MatchCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection with the cursor on the first match, if any
    pub(crate) fn from_matches(matches: Vec<Match>, limit_reached: bool) -> Self {
        let current = (!matches.is_empty()).then_some(0);
        Self {
            matches,
            current,
            limit_reached,
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Match> {
        self.matches.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    pub fn as_slice(&self) -> &[Match] {
        &self.matches
    }

    /// Cursor position, `None` when empty
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Match> {
        self.current.and_then(|i| self.matches.get(i))
    }

    /// Advance the cursor, wrapping to the first match
    pub fn next(&mut self) -> Option<&Match> {
        let len = self.matches.len();
        let index = self.current.map_or(0, |i| (i + 1) % len.max(1));
        self.move_to(index)
    }

    /// Move the cursor back, wrapping to the last match
    pub fn previous(&mut self) -> Option<&Match> {
        let len = self.matches.len();
        let index = match self.current {
            Some(0) | None => len.saturating_sub(1),
            Some(i) => i - 1,
        };
        self.move_to(index)
    }

    /// Put the cursor on `index`
    pub fn move_to(&mut self, index: usize) -> Option<&Match> {
        if index >= self.matches.len() {
            return None;
        }
        self.current = Some(index);
        self.matches.get(index)
    }

    /// Whether the match cap truncated the collection
    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }
}

impl<'a> IntoIterator for &'a MatchCollection {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_match(start: usize) -> Match {
        let node = NodeId::ROOT;
        Match::Text(TextMatch {
            node,
            range: Range::in_text(node, start, start + 1),
            text: "x".into(),
            groups: None,
        })
    }

    #[test]
    fn test_cursor_wraps() {
        let mut matches = MatchCollection::from_matches((0..3).map(text_match).collect(), false);
        assert_eq!(matches.current_index(), Some(0));
        for _ in 0..3 {
            matches.next();
        }
        assert_eq!(matches.current_index(), Some(0));
        matches.previous();
        assert_eq!(matches.current_index(), Some(2));
    }

    #[test]
    fn test_empty_cursor() {
        let mut matches = MatchCollection::new();
        assert_eq!(matches.current_index(), None);
        assert!(matches.next().is_none());
        assert!(matches.previous().is_none());
        assert_eq!(matches.current_index(), None);
    }

    #[test]
    fn test_accessors() {
        let m = text_match(2);
        assert_eq!(m.kind(), MatchKind::Text);
        assert_eq!(m.offsets(), Some((2, 3)));
        assert!(m.range().is_some());
        assert!(m.element().is_none());
        assert!(!m.is_editable_field());
        assert!(m.groups().is_none());
    }
}
