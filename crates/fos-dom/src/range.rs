//! Range and Selection API
//!
//! A `Range` is a pair of boundary points. For text containers the offset is
//! a byte offset into the node's UTF-8 content; for other containers it is a
//! child index.

use std::cmp::Ordering;

use crate::{DomError, DomResult, DomTree, NodeId};

/// Range boundary point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    /// The container node
    pub node: NodeId,
    /// Offset within the container
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Order two points in document order
    pub fn compare(&self, other: &BoundaryPoint, tree: &DomTree) -> Ordering {
        if self.node == other.node {
            self.offset.cmp(&other.offset)
        } else {
            tree.compare_document_position(self.node, other.node)
        }
    }
}

/// Range - a contiguous part of the document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

impl Range {
    /// Collapsed range at a position
    pub fn new(container: NodeId, offset: usize) -> Self {
        let point = BoundaryPoint::new(container, offset);
        Self { start: point, end: point }
    }

    /// Range between two points
    pub fn between(
        start_container: NodeId,
        start_offset: usize,
        end_container: NodeId,
        end_offset: usize,
    ) -> Self {
        Self {
            start: BoundaryPoint::new(start_container, start_offset),
            end: BoundaryPoint::new(end_container, end_offset),
        }
    }

    /// Range over `[start, end)` of a single text node
    pub fn in_text(node: NodeId, start: usize, end: usize) -> Self {
        Self::between(node, start, node, end)
    }

    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    pub fn start_container(&self) -> NodeId {
        self.start.node
    }

    pub fn start_offset(&self) -> usize {
        self.start.offset
    }

    pub fn end_container(&self) -> NodeId {
        self.end.node
    }

    pub fn end_offset(&self) -> usize {
        self.end.offset
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Whether both ends sit in the same container
    pub fn is_single_container(&self) -> bool {
        self.start.node == self.end.node
    }

    pub fn set_start(&mut self, node: NodeId, offset: usize) {
        self.start = BoundaryPoint::new(node, offset);
    }

    pub fn set_end(&mut self, node: NodeId, offset: usize) {
        self.end = BoundaryPoint::new(node, offset);
    }

    /// Collapse the range to its start
    pub fn collapse_to_start(&mut self) {
        self.end = self.start;
    }

    /// Check that the range still addresses valid text in `tree`
    ///
    /// Only single-text-node ranges are checked for character boundaries.
    pub fn validate(&self, tree: &DomTree) -> DomResult<()> {
        if !tree.is_connected(self.start.node) || !tree.is_connected(self.end.node) {
            return Err(DomError::NotFound);
        }
        if self.is_single_container() {
            if let Some(text) = tree.text(self.start.node) {
                for offset in [self.start.offset, self.end.offset] {
                    if offset > text.len() || !text.is_char_boundary(offset) {
                        return Err(DomError::IndexSize { offset });
                    }
                }
                if self.start.offset > self.end.offset {
                    return Err(DomError::IndexSize { offset: self.start.offset });
                }
            }
        }
        Ok(())
    }

    /// Text covered by a single-text-node range
    pub fn text<'a>(&self, tree: &'a DomTree) -> Option<&'a str> {
        if !self.is_single_container() {
            return None;
        }
        tree.text(self.start.node)?
            .get(self.start.offset..self.end.offset)
    }

    /// Order ranges by their start points
    pub fn compare_start(&self, other: &Range, tree: &DomTree) -> Ordering {
        self.start.compare(&other.start, tree)
    }
}

/// Selection direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionDirection {
    #[default]
    None,
    Forward,
    Backward,
}

/// The document's selection - at most one range
#[derive(Debug, Clone, Default)]
pub struct Selection {
    range: Option<Range>,
    pub direction: SelectionDirection,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> Option<&Range> {
        self.range.as_ref()
    }

    pub fn range_count(&self) -> usize {
        usize::from(self.range.is_some())
    }

    /// Replace all ranges with `range`
    pub fn select(&mut self, range: Range) {
        self.range = Some(range);
        self.direction = SelectionDirection::Forward;
    }

    pub fn remove_all_ranges(&mut self) {
        self.range = None;
        self.direction = SelectionDirection::None;
    }

    pub fn is_collapsed(&self) -> bool {
        self.range.as_ref().is_none_or(Range::collapsed)
    }
}
