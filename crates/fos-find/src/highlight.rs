//! Highlighter
//!
//! Turns a match collection into a paint model: text ranges, element
//! decorations and scrollbar markers. Nothing here affects matching.

use std::collections::HashMap;

use fos_dom::{Document, NodeId, Range};

use crate::config::FindConfig;
use crate::matches::Match;
use crate::mode::SearchMode;

/// Tags that start a new line for the position estimate
const BLOCK_TAGS: &[&str] = &["div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr"];

/// Estimated height of one block, in pixels
const BLOCK_HEIGHT: f32 = 20.0;

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Translucent yellow
pub const MATCH_COLOR: Color = Color::rgba(255, 255, 0, 180);
/// Orange
pub const CURRENT_COLOR: Color = Color::rgba(255, 165, 0, 220);

#[derive(Debug, Clone, PartialEq)]
pub struct RangeHighlight {
    /// Index in the match collection
    pub index: usize,
    pub range: Range,
    pub current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementHighlightKind {
    /// Selector match
    Outline,
    /// Form field with the matched span of its value
    FieldTint { start: usize, end: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementHighlight {
    pub index: usize,
    pub element: NodeId,
    pub kind: ElementHighlightKind,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollMarker {
    pub index: usize,
    /// 0.0 at the top of the page, 1.0 at the bottom
    pub position: f32,
    pub current: bool,
}

/// Paint model for one match collection
#[derive(Debug, Clone)]
pub struct Highlighter {
    max_ranges: usize,
    marker_sample_threshold: usize,
    max_markers: usize,
    mode: Option<SearchMode>,
    current: Option<usize>,
    ranges: Vec<RangeHighlight>,
    elements: Vec<ElementHighlight>,
    markers: Vec<ScrollMarker>,
}

impl Highlighter {
    pub fn new(config: &FindConfig) -> Self {
        Self {
            max_ranges: config.max_highlight_ranges,
            marker_sample_threshold: config.marker_sample_threshold,
            max_markers: config.max_scroll_markers,
            mode: None,
            current: None,
            ranges: Vec::new(),
            elements: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Rebuild the paint model after a search
    pub fn highlight_matches(
        &mut self,
        document: &Document,
        matches: &[Match],
        current: Option<usize>,
        mode: SearchMode,
    ) {
        self.clear();
        self.mode = Some(mode);
        self.current = current;

        for (index, m) in matches.iter().enumerate() {
            let is_current = current == Some(index);
            match m {
                Match::Text(_) | Match::Regex(_) | Match::ContentEditable(_) => {
                    if self.ranges.len() < self.max_ranges || is_current {
                        self.push_range(index, m, is_current);
                    }
                }
                Match::Css(e) | Match::XPath(e) => self.elements.push(ElementHighlight {
                    index,
                    element: e.element,
                    kind: ElementHighlightKind::Outline,
                    current: is_current,
                }),
                Match::Input(f) | Match::Textarea(f) => self.elements.push(ElementHighlight {
                    index,
                    element: f.element,
                    kind: ElementHighlightKind::FieldTint {
                        start: f.start,
                        end: f.end,
                    },
                    current: is_current,
                }),
            }
        }
        if matches.len() > self.max_ranges {
            tracing::debug!(
                "highlighting {} of {} text range(s)",
                self.ranges.len(),
                matches.len()
            );
        }

        self.markers = self.scroll_markers(document, matches, current);
        tracing::debug!(
            "{} highlight: {} range(s), {} element(s), {} marker(s)",
            mode.label(),
            self.ranges.len(),
            self.elements.len(),
            self.markers.len()
        );
    }

    /// Move the current flag without rebuilding the model
    pub fn update_current_match(
        &mut self,
        document: &Document,
        matches: &[Match],
        new_index: Option<usize>,
        mode: SearchMode,
    ) {
        let old = std::mem::replace(&mut self.current, new_index);
        self.mode = Some(mode);
        if old == new_index {
            return;
        }

        for index in [old, new_index].into_iter().flatten() {
            let current = Some(index) == new_index;
            if let Some(r) = self.ranges.iter_mut().find(|r| r.index == index) {
                r.current = current;
            }
            if let Some(e) = self.elements.iter_mut().find(|e| e.index == index) {
                e.current = current;
            }
            if let Some(m) = self.markers.iter_mut().find(|m| m.index == index) {
                m.current = current;
            }
        }

        // A capped-out or sampled-out match still gets painted once it is current
        if let Some(index) = new_index {
            if let Some(m) = matches.get(index) {
                if m.range().is_some() && !self.ranges.iter().any(|r| r.index == index) {
                    self.push_range(index, m, true);
                }
                if !self.markers.iter().any(|marker| marker.index == index) {
                    let (offsets, total) = block_offsets(document);
                    let at = self.markers.partition_point(|marker| marker.index < index);
                    self.markers.insert(
                        at,
                        ScrollMarker {
                            index,
                            position: marker_position(&offsets, total, m),
                            current: true,
                        },
                    );
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.mode = None;
        self.current = None;
        self.ranges.clear();
        self.elements.clear();
        self.markers.clear();
    }

    pub fn ranges(&self) -> &[RangeHighlight] {
        &self.ranges
    }

    pub fn elements(&self) -> &[ElementHighlight] {
        &self.elements
    }

    pub fn markers(&self) -> &[ScrollMarker] {
        &self.markers
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn mode(&self) -> Option<SearchMode> {
        self.mode
    }

    pub fn color_for(&self, current: bool) -> Color {
        if current { CURRENT_COLOR } else { MATCH_COLOR }
    }

    fn push_range(&mut self, index: usize, m: &Match, current: bool) {
        if let Some(range) = m.range() {
            self.ranges.push(RangeHighlight {
                index,
                range: range.clone(),
                current,
            });
        }
    }

    fn scroll_markers(&self, document: &Document, matches: &[Match], current: Option<usize>) -> Vec<ScrollMarker> {
        if matches.is_empty() {
            return Vec::new();
        }
        let (offsets, total) = block_offsets(document);

        let mut indices: Vec<usize> = if matches.len() > self.marker_sample_threshold && self.max_markers > 0 {
            (0..self.max_markers)
                .map(|k| k * matches.len() / self.max_markers)
                .collect()
        } else {
            (0..matches.len()).collect()
        };
        if let Some(c) = current.filter(|c| *c < matches.len()) {
            if let Err(at) = indices.binary_search(&c) {
                indices.insert(at, c);
            }
        }
        indices.dedup();

        indices
            .into_iter()
            .map(|index| ScrollMarker {
                index,
                position: marker_position(&offsets, total, &matches[index]),
                current: current == Some(index),
            })
            .collect()
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(&FindConfig::default())
    }
}

/// Fraction of the page height above the match
fn marker_position(offsets: &HashMap<NodeId, f32>, total: f32, m: &Match) -> f32 {
    let y = offsets.get(&m.anchor()).copied().unwrap_or_default();
    if total > 0.0 { (y / total).clamp(0.0, 1.0) } else { 0.0 }
}

/// Estimated vertical offset of every node under `<body>`, plus the total
fn block_offsets(document: &Document) -> (HashMap<NodeId, f32>, f32) {
    let tree = document.tree();
    let body = document.body();
    let root = if body.is_valid() { body } else { tree.root() };

    let mut offsets = HashMap::new();
    let mut y = 0.0;
    for node in tree.descendants(root) {
        if BLOCK_TAGS.iter().any(|tag| tree.has_tag(node, tag)) {
            y += BLOCK_HEIGHT;
        }
        offsets.insert(node, y);
    }
    (offsets, y)
}
