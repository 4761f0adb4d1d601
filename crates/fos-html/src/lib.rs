//! fOS HTML Parser
//!
//! HTML5 parser built on html5ever, plus innerHTML serialization.

mod parser;
mod serializer;

pub use fos_dom::Document;
pub use parser::HtmlParser;
pub use serializer::{HtmlSerializer, inner_html, set_inner_html};

use fos_dom::{DomError, NodeId};

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse(html)
}

/// HTML parsing and serialization errors
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),

    #[error("DOM error while building tree: {0}")]
    Dom(#[from] DomError),

    #[error("node {0:?} cannot hold markup")]
    NotAnElement(NodeId),
}
