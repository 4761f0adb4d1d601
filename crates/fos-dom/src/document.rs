//! Document - High-level document API

use crate::editing::{splice_text, EditCommand, EditHistory};
use crate::{DomEvent, DomTree, EventDispatcher, NodeId, Range, Selection};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    selection: Selection,
    events: Vec<DomEvent>,
    history: EditHistory,
}

impl Document {
    /// Create a document with an empty html/head/body skeleton
    pub fn new(url: &str) -> Self {
        let mut doc = Self::empty(url);
        let tree = &mut doc.tree;
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        // Freshly created nodes cannot violate the hierarchy
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);
        doc.html_element = html;
        doc.head_element = head;
        doc.body_element = body;
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            selection: Selection::new(),
            events: Vec::new(),
            history: EditHistory::default(),
        }
    }

    /// Locate html/head/body after the tree was built externally
    pub fn finalize(&mut self) {
        let tree = &self.tree;
        self.html_element = tree
            .element_children(tree.root())
            .find(|&n| tree.has_tag(n, "html"))
            .unwrap_or(NodeId::NONE);
        if self.html_element.is_valid() {
            self.head_element = tree
                .element_children(self.html_element)
                .find(|&n| tree.has_tag(n, "head"))
                .unwrap_or(NodeId::NONE);
            self.body_element = tree
                .element_children(self.html_element)
                .find(|&n| tree.has_tag(n, "body"))
                .unwrap_or(NodeId::NONE);
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Text of the first `<title>` in `<head>`
    pub fn title(&self) -> String {
        if !self.head_element.is_valid() {
            return String::new();
        }
        self.tree
            .element_children(self.head_element)
            .find(|&n| self.tree.has_tag(n, "title"))
            .map(|n| self.tree.text_content(n))
            .unwrap_or_default()
    }

    /// `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// `<head>` element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// `<body>` element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// First connected element with the given id
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .find(|&n| self.tree.attribute(n, "id") == Some(id))
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    // --- Selection ---

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Make `range` the only selected range
    pub fn select_range(&mut self, range: Range) {
        self.selection.select(range);
    }

    // --- Events ---

    /// Events dispatched so far
    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    /// Drain queued events
    pub fn take_events(&mut self) -> Vec<DomEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Editing ---

    /// The page's own edit history
    pub fn edit_history(&self) -> &EditHistory {
        &self.history
    }

    /// Run an editing command against the current selection
    ///
    /// Returns `false` when the command is refused: no selection, a
    /// selection outside an editing host, or one spanning several nodes.
    pub fn exec_command(&mut self, command: EditCommand, value: Option<&str>) -> bool {
        match command {
            EditCommand::InsertText => self.insert_text(value.unwrap_or("")),
            EditCommand::Delete => self.insert_text(""),
            EditCommand::Undo => self.step_history(true),
            EditCommand::Redo => self.step_history(false),
        }
    }

    fn insert_text(&mut self, text: &str) -> bool {
        let Some(range) = self.selection.range().cloned() else {
            return false;
        };
        if !range.is_single_container() || range.validate(&self.tree).is_err() {
            return false;
        }
        let node = range.start_container();
        let Some(host) = self.tree.editing_host(node) else {
            return false;
        };
        if !self.tree.is_text(node) {
            return false;
        }

        self.dispatch_event(DomEvent::before_input(host, "insertText"));
        let edit = match splice_text(
            &mut self.tree,
            node,
            range.start_offset(),
            range.end_offset(),
            text,
        ) {
            Ok(edit) => edit,
            Err(err) => {
                tracing::debug!("insertText refused: {err}");
                return false;
            }
        };
        self.history.push(edit);

        let caret = range.start_offset() + text.len();
        self.selection.select(Range::new(node, caret));
        self.dispatch_event(DomEvent::input(host, "insertText"));
        true
    }

    fn step_history(&mut self, undo: bool) -> bool {
        let entry = if undo {
            self.history.pop_undo()
        } else {
            self.history.pop_redo()
        };
        let Some(entry) = entry else {
            return false;
        };
        let (expected, restored) = if undo {
            (&entry.after, &entry.before)
        } else {
            (&entry.before, &entry.after)
        };
        if !self.tree.is_connected(entry.node) || self.tree.text(entry.node) != Some(expected) {
            return false;
        }
        if self.tree.set_text(entry.node, restored.clone()).is_err() {
            return false;
        }
        if undo {
            self.history.push_redo(entry);
        } else {
            self.history.push_undo_keep_redo(entry);
        }
        true
    }
}

impl EventDispatcher for Document {
    fn dispatch_event(&mut self, event: DomEvent) {
        tracing::trace!("dispatch {} on {:?}", event.event_type.name(), event.target);
        self.events.push(event);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomEventType;

    fn editable_doc() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let tree = doc.tree_mut();
        let div = tree.create_element("div");
        let text = tree.create_text("Hello world");
        tree.append_child(body, div).unwrap();
        tree.append_child(div, text).unwrap();
        tree.set_attribute(div, "contenteditable", "true").unwrap();
        (doc, div, text)
    }

    #[test]
    fn test_skeleton() {
        let doc = Document::new("https://example.com");
        assert!(doc.body().is_valid());
        assert_eq!(doc.tree().tag_name(doc.body()), Some("body"));
        assert_eq!(doc.url(), "https://example.com");
    }

    #[test]
    fn test_insert_text_command() {
        let (mut doc, div, text) = editable_doc();
        doc.select_range(Range::in_text(text, 0, 5));
        assert!(doc.exec_command(EditCommand::InsertText, Some("Howdy")));
        assert_eq!(doc.tree().text(text), Some("Howdy world"));
        assert!(doc.edit_history().can_undo());
        assert!(doc
            .events()
            .iter()
            .any(|e| e.event_type == DomEventType::Input && e.target == div));

        assert!(doc.exec_command(EditCommand::Undo, None));
        assert_eq!(doc.tree().text(text), Some("Hello world"));
    }

    #[test]
    fn test_insert_text_refused_outside_host() {
        let (mut doc, div, text) = editable_doc();
        doc.tree_mut().remove_attribute(div, "contenteditable").unwrap();
        doc.select_range(Range::in_text(text, 0, 5));
        assert!(!doc.exec_command(EditCommand::InsertText, Some("x")));
        doc.selection_mut().remove_all_ranges();
        assert!(!doc.exec_command(EditCommand::InsertText, Some("x")));
    }
}
