//! DOM operation errors

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found")]
    NotFound,
    #[error("Hierarchy request error")]
    HierarchyRequest,
    #[error("Invalid node type")]
    InvalidNodeType,
    #[error("Node is not a child")]
    NotAChild,
    #[error("Offset {offset} is out of bounds or not on a character boundary")]
    IndexSize { offset: usize },
}
