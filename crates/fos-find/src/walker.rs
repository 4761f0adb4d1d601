//! Document traversal with exclusion rules
//!
//! Pure functions over a tree plus an explicit [`ExclusionPolicy`]; the
//! engine decides what to do with the nodes they yield.

use fos_dom::{DomTree, NodeId};

use crate::config::DEFAULT_UI_ROOT_ID;
use crate::visibility::{LayoutProbe, VisibilityOracle};

/// Attribute marking the find tool's own UI
pub const UI_MARKER_ATTRIBUTE: &str = "data-fos-find-ui";

/// Subtrees whose text is never page text
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "textarea"];

/// Input types whose value is free text
const TEXT_INPUT_TYPES: &[&str] = &["text", "search", "email", "url", "tel"];

/// What a traversal leaves out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    /// Keep invisible, `aria-hidden` and closed-`<details>` content
    pub search_hidden: bool,
    /// Leave `contenteditable` hosts to the editable-field pass
    pub skip_editing_hosts: bool,
    /// Id of the tool's own UI root
    pub ui_root_id: String,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self {
            search_hidden: false,
            skip_editing_hosts: false,
            ui_root_id: DEFAULT_UI_ROOT_ID.to_string(),
        }
    }
}

impl ExclusionPolicy {
    /// Whether `element` is the root of the tool's own UI
    pub fn is_tool_ui(&self, tree: &DomTree, element: NodeId) -> bool {
        tree.has_attribute(element, UI_MARKER_ATTRIBUTE)
            || tree.attribute(element, "id") == Some(self.ui_root_id.as_str())
    }

    /// Whether `node` sits inside the tool's own UI
    pub fn in_tool_ui(&self, tree: &DomTree, node: NodeId) -> bool {
        std::iter::once(node)
            .chain(tree.ancestors(node))
            .any(|n| tree.is_element(n) && self.is_tool_ui(tree, n))
    }

    /// Exclusion shared by element-addressed passes (CSS, XPath, fields)
    pub fn excludes_element<P: LayoutProbe>(
        &self,
        tree: &DomTree,
        oracle: &mut VisibilityOracle<'_, P>,
        element: NodeId,
    ) -> bool {
        if self.in_tool_ui(tree, element) {
            return true;
        }
        if self.search_hidden {
            return false;
        }
        is_aria_hidden(tree, element) || in_closed_details(tree, element) || !oracle.is_visible(element)
    }
}

/// `aria-hidden="true"` on the element or an ancestor
pub fn is_aria_hidden(tree: &DomTree, element: NodeId) -> bool {
    std::iter::once(element)
        .chain(tree.ancestors(element))
        .any(|n| tree.attribute(n, "aria-hidden").is_some_and(|v| v.trim().eq_ignore_ascii_case("true")))
}

/// Inside a `<details>` without `open`, other than in its `<summary>`
pub fn in_closed_details(tree: &DomTree, node: NodeId) -> bool {
    let mut child = node;
    for ancestor in tree.ancestors(node) {
        if tree.has_tag(ancestor, "details")
            && !tree.has_attribute(ancestor, "open")
            && !tree.has_tag(child, "summary")
        {
            return true;
        }
        child = ancestor;
    }
    false
}

/// Text nodes under `root` in document order, skipping excluded subtrees
pub fn text_nodes<P: LayoutProbe>(
    tree: &DomTree,
    root: NodeId,
    policy: &ExclusionPolicy,
    oracle: &mut VisibilityOracle<'_, P>,
) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut stack: Vec<NodeId> = tree.child_ids(root).collect();
    stack.reverse();

    while let Some(node) = stack.pop() {
        if let Some(text) = tree.text(node) {
            if text.is_empty() {
                continue;
            }
            let hidden = !policy.search_hidden
                && tree.parent_element(node).is_some_and(|parent| !oracle.is_visible(parent));
            if hidden {
                tracing::trace!("skipping hidden text {node:?}");
            } else {
                nodes.push(node);
            }
            continue;
        }
        if !tree.is_element(node) || rejects_subtree(tree, node, policy, oracle) {
            continue;
        }

        let closed_details =
            !policy.search_hidden && tree.has_tag(node, "details") && !tree.has_attribute(node, "open");
        let first = stack.len();
        stack.extend(
            tree.child_ids(node)
                .filter(|&child| !closed_details || tree.has_tag(child, "summary")),
        );
        stack[first..].reverse();
    }
    nodes
}

fn rejects_subtree<P: LayoutProbe>(
    tree: &DomTree,
    element: NodeId,
    policy: &ExclusionPolicy,
    oracle: &mut VisibilityOracle<'_, P>,
) -> bool {
    if tree.tag_name(element).is_some_and(|tag| SKIPPED_TAGS.contains(&tag)) {
        return true;
    }
    if policy.is_tool_ui(tree, element) {
        return true;
    }
    if policy.skip_editing_hosts && tree.is_editing_host(element) {
        return true;
    }
    if policy.search_hidden {
        return false;
    }
    let aria_hidden = tree
        .attribute(element, "aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
    aria_hidden || !oracle.is_rendered(element)
}

/// An editable target found by [`editable_fields`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    Input(NodeId),
    Textarea(NodeId),
    /// Outermost `contenteditable` host
    Host(NodeId),
}

/// Whether `element` is an `input` whose value is free text
pub fn is_text_input(tree: &DomTree, element: NodeId) -> bool {
    if !tree.has_tag(element, "input") {
        return false;
    }
    match tree.attribute(element, "type").map(str::trim) {
        None | Some("") => true,
        Some(kind) => TEXT_INPUT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(kind)),
    }
}

/// Editable targets under `root` in document order
///
/// Nested `contenteditable` hosts are covered by their outermost host.
pub fn editable_fields<P: LayoutProbe>(
    tree: &DomTree,
    root: NodeId,
    policy: &ExclusionPolicy,
    oracle: &mut VisibilityOracle<'_, P>,
) -> Vec<EditableField> {
    let mut fields = Vec::new();
    for node in tree.descendants(root) {
        let field = if is_text_input(tree, node) {
            EditableField::Input(node)
        } else if tree.has_tag(node, "textarea") {
            EditableField::Textarea(node)
        } else if tree.is_editing_host(node)
            && tree.parent(node).and_then(|p| tree.editing_host(p)).is_none()
        {
            EditableField::Host(node)
        } else {
            continue;
        };
        if policy.excludes_element(tree, oracle, node) {
            tracing::trace!("skipping excluded field {node:?}");
            continue;
        }
        fields.push(field);
    }
    fields
}

/// Byte offset of each text node's start within the text content of `host`
pub fn text_offsets(tree: &DomTree, host: NodeId) -> Vec<(NodeId, usize)> {
    let mut offset = 0;
    tree.descendants(host)
        .filter_map(|node| {
            let text = tree.text(node)?;
            let start = offset;
            offset += text.len();
            Some((node, start))
        })
        .collect()
}
