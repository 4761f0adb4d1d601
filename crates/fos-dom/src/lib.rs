//! fOS DOM - Document Object Model
//!
//! Arena-backed DOM tree with the host surface an in-page tool needs:
//! tree traversal, document-order comparison, ranges and selection,
//! editing commands with their own history, synthetic events and XPath.

mod document;
mod dom_events;
mod editing;
mod error;
mod interner;
mod node;
mod range;
mod tree;
pub mod xpath;

pub use document::Document;
pub use dom_events::{DomEvent, DomEventType, EventDispatcher};
pub use editing::{EditCommand, EditHistory, TextEdit, splice_text};
pub use error::{DomError, DomResult};
pub use interner::{InternedString, StringInterner};
pub use node::{Attribute, ElementData, Node, NodeData, NodeType, TextData};
pub use range::{BoundaryPoint, Range, Selection, SelectionDirection};
pub use tree::{Ancestors, Children, Descendants, DomTree};
pub use xpath::{XPathError, XPathExpression, XPathNode};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Invalid/null node
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 != u32::MAX
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}
