//! XPath 1.0 evaluation over the DOM tree
//!
//! Supports location paths on the common axes, predicates, the core
//! string/number/boolean functions and union. Results come back as an
//! ordered node-set snapshot.

mod eval;
mod parser;

use thiserror::Error;

use crate::{DomTree, NodeId};

pub use eval::XPathNode;
pub use parser::{Axis, BinaryOp, Expr, NodeTest, Step};

/// XPath failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XPathError {
    #[error("syntax error at token {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' expects {expected} argument(s)")]
    Arity { name: String, expected: &'static str },
    #[error("expression does not evaluate to a node-set")]
    NotANodeSet,
}

/// A compiled XPath expression
#[derive(Debug, Clone, PartialEq)]
pub struct XPathExpression {
    source: String,
    expr: Expr,
}

impl XPathExpression {
    /// Parse `source` into an expression tree
    pub fn compile(source: &str) -> Result<Self, XPathError> {
        Ok(Self {
            source: source.to_string(),
            expr: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate as an ordered node-set snapshot
    pub fn evaluate(&self, tree: &DomTree, context: NodeId) -> Result<Vec<XPathNode>, XPathError> {
        eval::evaluate_node_set(tree, &self.expr, context)
    }
}

/// Compile and evaluate `expr` against `context`, returning matched nodes in
/// document order
pub fn evaluate(tree: &DomTree, expr: &str, context: NodeId) -> Result<Vec<XPathNode>, XPathError> {
    XPathExpression::compile(expr)?.evaluate(tree, context)
}
