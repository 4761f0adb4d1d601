//! DOM Tree (arena-based allocation)
//!
//! All nodes live in one `Vec`; structure is expressed through `NodeId`
//! links. Removing a node only unlinks it, so stale ids stay valid to look
//! up but are no longer connected to the root.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::{DomError, DomResult, InternedString, Node, NodeData, NodeId, StringInterner};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    pub(crate) nodes: Vec<Node>,
    interner: StringInterner,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(Node::document());
        Self {
            nodes,
            interner: StringInterner::new(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes ever allocated (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut StringInterner {
        &mut self.interner
    }

    /// Resolve an interned name
    #[inline]
    pub fn resolve(&self, id: InternedString) -> &str {
        self.interner.get(id)
    }

    // --- Creation ---

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = self.interner.intern(&tag.to_ascii_lowercase());
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content.to_string()))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content.to_string()))
    }

    /// Create a detached doctype
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        let name = self.interner.intern(name);
        self.push(Node::doctype(name))
    }

    // --- Structure mutation ---

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound)
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound)
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.node(parent)?;
        self.node(child)?;
        if child == parent || self.is_ancestor_of(child, parent) || child == NodeId::ROOT {
            return Err(DomError::HierarchyRequest);
        }
        if self.node(parent)?.is_text() {
            return Err(DomError::InvalidNodeType);
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(child);
            }
            if self.node(reference)?.parent != parent {
                return Err(DomError::NotAChild);
            }
        }

        self.detach(child)?;

        match reference {
            None => {
                let last = self.node(parent)?.last_child;
                {
                    let c = self.node_mut(child)?;
                    c.parent = parent;
                    c.prev_sibling = last;
                    c.next_sibling = NodeId::NONE;
                }
                if last.is_valid() {
                    self.node_mut(last)?.next_sibling = child;
                } else {
                    self.node_mut(parent)?.first_child = child;
                }
                self.node_mut(parent)?.last_child = child;
            }
            Some(reference) => {
                let prev = self.node(reference)?.prev_sibling;
                {
                    let c = self.node_mut(child)?;
                    c.parent = parent;
                    c.prev_sibling = prev;
                    c.next_sibling = reference;
                }
                self.node_mut(reference)?.prev_sibling = child;
                if prev.is_valid() {
                    self.node_mut(prev)?.next_sibling = child;
                } else {
                    self.node_mut(parent)?.first_child = child;
                }
            }
        }
        Ok(child)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild);
        }
        self.detach(child)?;
        Ok(child)
    }

    /// Unlink a node from its parent; no-op when already detached
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let (parent, prev, next) = {
            let n = self.node(id)?;
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        if !parent.is_valid() {
            return Ok(());
        }
        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = next;
        } else {
            self.node_mut(parent)?.first_child = next;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = prev;
        } else {
            self.node_mut(parent)?.last_child = prev;
        }
        let n = self.node_mut(id)?;
        n.parent = NodeId::NONE;
        n.prev_sibling = NodeId::NONE;
        n.next_sibling = NodeId::NONE;
        Ok(())
    }

    /// Detach every child of `id`
    pub fn remove_children(&mut self, id: NodeId) -> DomResult<()> {
        let children: Vec<NodeId> = self.child_ids(id).collect();
        for child in children {
            self.detach(child)?;
        }
        Ok(())
    }

    // --- Navigation ---

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let first = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, next: first }
    }

    /// Iterate over child ids of a node
    pub fn child_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).map(|(child, _)| child)
    }

    /// Element children only
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .filter(|(_, node)| node.is_element())
            .map(|(child, _)| child)
    }

    /// Pre-order iterator over the descendants of `id` (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let first = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Descendants {
            tree: self,
            root: id,
            next: first,
        }
    }

    /// Iterator over ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Parent, when it is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// `id` itself when it is an element, else its parent element
    pub fn owning_element(&self, id: NodeId) -> Option<NodeId> {
        if self.is_element(id) {
            Some(id)
        } else {
            self.parent_element(id)
        }
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.prev_sibling).filter(|s| s.is_valid())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.next_sibling).filter(|s| s.is_valid())
    }

    /// Previous sibling that is an element
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.previous_sibling(id);
        while let Some(sib) = cur {
            if self.is_element(sib) {
                return Some(sib);
            }
            cur = self.previous_sibling(sib);
        }
        None
    }

    /// Next sibling that is an element
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.next_sibling(id);
        while let Some(sib) = cur {
            if self.is_element(sib) {
                return Some(sib);
            }
            cur = self.next_sibling(sib);
        }
        None
    }

    /// True when `ancestor` is a proper ancestor of `node`
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Inclusive containment check
    pub fn contains(&self, container: NodeId, node: NodeId) -> bool {
        container == node || self.is_ancestor_of(container, node)
    }

    /// Whether the node is reachable from the document root
    pub fn is_connected(&self, id: NodeId) -> bool {
        if id == NodeId::ROOT {
            return true;
        }
        if self.get(id).is_none() {
            return false;
        }
        self.ancestors(id).last() == Some(NodeId::ROOT)
    }

    /// Compare two nodes in document (pre-order) order
    ///
    /// Ancestors sort before their descendants. Nodes in different trees
    /// fall back to allocation order so the result stays total.
    pub fn compare_document_position(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let path_a = self.path_from_top(a);
        let path_b = self.path_from_top(b);
        if path_a.first() != path_b.first() {
            return a.cmp(&b);
        }

        let common = path_a
            .iter()
            .zip(path_b.iter())
            .take_while(|(x, y)| x == y)
            .count();

        if common == path_a.len() {
            return Ordering::Less;
        }
        if common == path_b.len() {
            return Ordering::Greater;
        }

        let (branch_a, branch_b) = (path_a[common], path_b[common]);
        let mut cur = self.next_sibling(branch_a);
        while let Some(sib) = cur {
            if sib == branch_b {
                return Ordering::Less;
            }
            cur = self.next_sibling(sib);
        }
        Ordering::Greater
    }

    fn path_from_top(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path.push(id);
        path
    }

    // --- Element data ---

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.is_element())
    }

    #[inline]
    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.is_text())
    }

    /// Lower-case local name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        let elem = self.get(id)?.as_element()?;
        Some(self.resolve(elem.name))
    }

    /// Check an element's tag name
    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Get an attribute value
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let elem = self.get(id)?.as_element()?;
        let key = self.interner.lookup(&name.to_ascii_lowercase())?;
        elem.get_attr(key)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let key = self.interner.intern(&name.to_ascii_lowercase());
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        elem.set_attr(key, value.to_string());
        Ok(())
    }

    /// Remove an attribute, returning the old value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        let Some(key) = self.interner.lookup(&name.to_ascii_lowercase()) else {
            return Ok(None);
        };
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        Ok(elem.remove_attr(key))
    }

    /// Attribute (name, value) pairs in source order
    pub fn attributes(&self, id: NodeId) -> Vec<(&str, &str)> {
        self.get(id)
            .and_then(|n| n.as_element())
            .map(|elem| {
                elem.attrs
                    .iter()
                    .map(|a| (self.resolve(a.name), a.value.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Class list of an element
    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> + '_ {
        self.attribute(id, "class")
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    // --- Text ---

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_text()
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, id: NodeId, content: String) -> DomResult<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(text) => {
                text.content = content;
                Ok(())
            }
            _ => Err(DomError::InvalidNodeType),
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    // --- Form controls ---

    /// Current value of an `input` or `textarea`
    ///
    /// The dirty value wins; otherwise `input` falls back to its `value`
    /// attribute and `textarea` to its text content.
    pub fn form_value(&self, id: NodeId) -> Option<Cow<'_, str>> {
        let elem = self.get(id)?.as_element()?;
        if let Some(value) = &elem.value {
            return Some(Cow::Borrowed(value.as_str()));
        }
        match self.resolve(elem.name) {
            "input" => Some(Cow::Borrowed(self.attribute(id, "value").unwrap_or(""))),
            "textarea" => Some(Cow::Owned(self.text_content(id))),
            _ => None,
        }
    }

    /// Set the current value of a form control
    pub fn set_form_value(&mut self, id: NodeId, value: String) -> DomResult<()> {
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        elem.value = Some(value);
        Ok(())
    }

    /// `contenteditable` state of the element's own attribute
    pub fn is_editing_host(&self, id: NodeId) -> bool {
        match self.attribute(id, "contenteditable") {
            Some(v) => matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "" | "true" | "plaintext-only"
            ),
            None => false,
        }
    }

    /// Nearest inclusive ancestor that is an editing host, if editing is
    /// not switched off on the way up
    pub fn editing_host(&self, id: NodeId) -> Option<NodeId> {
        let start = self.owning_element(id)?;
        std::iter::once(start)
            .chain(self.ancestors(start))
            .take_while(|&n| {
                !self
                    .attribute(n, "contenteditable")
                    .is_some_and(|v| v.eq_ignore_ascii_case("false"))
            })
            .find(|&n| self.is_editing_host(n))
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Child iterator
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Pre-order descendant iterator
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next;
        let node = self.tree.get(current)?;

        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            let mut cur = current;
            loop {
                if cur == self.root {
                    break NodeId::NONE;
                }
                let Some(n) = self.tree.get(cur) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                if !n.parent.is_valid() || n.parent == self.root {
                    break NodeId::NONE;
                }
                cur = n.parent;
            }
        };
        Some(current)
    }
}

/// Ancestor iterator
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
