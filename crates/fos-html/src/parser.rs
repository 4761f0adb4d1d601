//! HTML5 Parser implementation
//!
//! Uses html5ever's build-in RcDom and converts to our DOM format.
//! This is simpler and more reliable than implementing TreeSink directly.

use fos_dom::{Document, DomTree, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::HtmlError;

/// HTML5 parser
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, HtmlError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, HtmlError> {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = Self::parse_rcdom(html)?;

        let mut document = Document::empty(url);
        let root = document.tree().root();
        self.convert_node(&dom.document, document.tree_mut(), root)?;

        // Find html, head, body elements
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(document)
    }

    /// Parse `html` as body content and append the resulting nodes to
    /// `parent`
    ///
    /// Markup that only makes sense in a table or select context is
    /// dropped the same way it would be inside `<body>`.
    pub fn parse_fragment_into(
        &self,
        html: &str,
        tree: &mut DomTree,
        parent: NodeId,
    ) -> Result<Vec<NodeId>, HtmlError> {
        let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
        let dom = Self::parse_rcdom(&wrapped)?;
        let Some(body) = find_body(&dom.document) else {
            return Ok(Vec::new());
        };

        let first_new = tree.len();
        for child in body.children.borrow().iter() {
            self.convert_node(child, tree, parent)?;
        }
        Ok(tree
            .child_ids(parent)
            .filter(|id| id.index() >= first_new)
            .collect())
    }

    fn parse_rcdom(html: &str) -> Result<RcDom, HtmlError> {
        Ok(parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?)
    }

    /// Convert an RcDom node to our DOM format
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> Result<(), HtmlError> {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent)?;
                }
            }
            RcNodeData::Doctype { name, .. } => {
                let id = tree.create_doctype(name);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                // Inter-element whitespace outside <body> carries nothing
                if !text.trim().is_empty() || keeps_whitespace(tree, parent) {
                    let id = tree.create_text(&text);
                    tree.append_child(parent, id)?;
                }
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    tree.set_attribute(id, &attr.name.local, &attr.value)?;
                }
                tree.append_child(parent, id)?;

                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, id)?;
                }
            }
            RcNodeData::ProcessingInstruction { .. } => {
                // Ignore processing instructions
            }
        }
        Ok(())
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn keeps_whitespace(tree: &DomTree, parent: NodeId) -> bool {
    tree.is_element(parent) && !tree.has_tag(parent, "html") && !tree.has_tag(parent, "head")
}

fn find_body(document: &Handle) -> Option<Handle> {
    let html = document
        .children
        .borrow()
        .iter()
        .find(|c| matches!(&c.data, RcNodeData::Element { name, .. } if name.local.as_ref() == "html"))
        .cloned()?;
    let body = html
        .children
        .borrow()
        .iter()
        .find(|c| matches!(&c.data, RcNodeData::Element { name, .. } if name.local.as_ref() == "body"))
        .cloned();
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html).unwrap();

        assert!(doc.tree().len() > 1, "Expected more than 1 node, got {}", doc.tree().len());
        assert_eq!(doc.title(), "Test");
        assert!(doc.body().is_valid());
    }

    #[test]
    fn test_parse_fragment() {
        let html = "<div><span>Text</span></div>";
        let doc = HtmlParser::new().parse(html).unwrap();

        // Even fragments get wrapped in html/head/body by html5ever
        let body = doc.body();
        let div = doc.tree().element_children(body).next().unwrap();
        assert_eq!(doc.tree().tag_name(div), Some("div"));
        assert_eq!(doc.tree().text_content(div), "Text");
    }

    #[test]
    fn test_whitespace_kept_inside_body() {
        let doc = HtmlParser::new().parse("<p><b>a</b> <i>b</i></p>").unwrap();
        let p = doc.tree().element_children(doc.body()).next().unwrap();
        assert_eq!(doc.tree().text_content(p), "a b");
    }

    #[test]
    fn test_parse_fragment_into() {
        let mut doc = HtmlParser::new().parse("<div id=host></div>").unwrap();
        let host = doc.get_element_by_id("host").unwrap();
        let added = HtmlParser::new()
            .parse_fragment_into("one <em>two</em>", doc.tree_mut(), host)
            .unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(doc.tree().text_content(host), "one two");
    }
}
