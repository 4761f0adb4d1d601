//! HTML Serialization (innerHTML/outerHTML)
//!
//! Serializes DOM nodes to HTML strings and replaces an element's children
//! from markup.

use fos_dom::{DomTree, NodeData, NodeId};

use crate::{HtmlError, HtmlParser};

/// Void elements (no end tag)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Raw text elements (no escaping for content)
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// HTML serializer
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSerializer;

impl HtmlSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Serialize innerHTML of a node (children only)
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_children(tree, node_id, &mut output);
        output
    }

    /// Serialize outerHTML of a node (including the node itself)
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(tree, node_id, &mut output);
        output
    }

    fn serialize_node(&self, tree: &DomTree, node_id: NodeId, output: &mut String) {
        let Some(node) = tree.get(node_id) else {
            return;
        };

        match &node.data {
            NodeData::Document => {
                self.serialize_children(tree, node_id, output);
            }
            NodeData::Element(elem) => {
                let tag = tree.resolve(elem.name);

                output.push('<');
                output.push_str(tag);
                for (name, value) in tree.attributes(node_id) {
                    output.push(' ');
                    output.push_str(name);
                    output.push_str("=\"");
                    escape_attribute(value, output);
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&tag) {
                    return;
                }
                if RAW_TEXT_ELEMENTS.contains(&tag) {
                    self.serialize_children_raw(tree, node_id, output);
                } else {
                    self.serialize_children(tree, node_id, output);
                }
                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeData::Text(text) => {
                escape_text(&text.content, output);
            }
            NodeData::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
            NodeData::Doctype { name } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(tree.resolve(*name));
                output.push('>');
            }
        }
    }

    fn serialize_children(&self, tree: &DomTree, parent_id: NodeId, output: &mut String) {
        for (child_id, _) in tree.children(parent_id) {
            self.serialize_node(tree, child_id, output);
        }
    }

    fn serialize_children_raw(&self, tree: &DomTree, parent_id: NodeId, output: &mut String) {
        for (_child_id, child) in tree.children(parent_id) {
            if let NodeData::Text(text) = &child.data {
                output.push_str(&text.content);
            }
        }
    }
}

/// innerHTML getter
pub fn inner_html(tree: &DomTree, node: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(tree, node)
}

/// innerHTML setter: drop the children of `node` and parse `html` in
/// their place
pub fn set_inner_html(tree: &mut DomTree, node: NodeId, html: &str) -> Result<(), HtmlError> {
    if !tree.is_element(node) {
        return Err(HtmlError::NotAnElement(node));
    }
    tree.remove_children(node)?;
    HtmlParser::new().parse_fragment_into(html, tree, node)?;
    Ok(())
}

/// Escape text content for HTML
fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

/// Escape attribute value
fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_inner() {
        let doc = HtmlParser::new()
            .parse(r#"<div id="d">a &amp; <b class="x">b</b><br></div>"#)
            .unwrap();
        let div = doc.get_element_by_id("d").unwrap();
        assert_eq!(inner_html(doc.tree(), div), r#"a &amp; <b class="x">b</b><br>"#);
        assert_eq!(
            HtmlSerializer::new().serialize_outer(doc.tree(), div),
            r#"<div id="d">a &amp; <b class="x">b</b><br></div>"#
        );
    }

    #[test]
    fn test_set_inner_html_round_trips() {
        let mut doc = HtmlParser::new()
            .parse(r#"<div id="d" contenteditable>old <i>text</i></div>"#)
            .unwrap();
        let div = doc.get_element_by_id("d").unwrap();
        let snapshot = inner_html(doc.tree(), div);

        set_inner_html(doc.tree_mut(), div, "new").unwrap();
        assert_eq!(doc.tree().text_content(div), "new");

        set_inner_html(doc.tree_mut(), div, &snapshot).unwrap();
        assert_eq!(inner_html(doc.tree(), div), snapshot);
    }

    #[test]
    fn test_set_inner_html_rejects_text_nodes() {
        let mut doc = HtmlParser::new().parse("<p>x</p>").unwrap();
        let p = doc.tree().element_children(doc.body()).next().unwrap();
        let text = doc.tree().child_ids(p).next().unwrap();
        assert!(matches!(
            set_inner_html(doc.tree_mut(), text, "y"),
            Err(HtmlError::NotAnElement(_))
        ));
    }
}
