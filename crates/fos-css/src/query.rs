//! Selector queries over the DOM tree

use fos_dom::{DomTree, NodeId};

use crate::{CssError, SelectorList};

/// All descendant elements of `root` matching `selectors`, in document order
pub fn query_selector_all(tree: &DomTree, root: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
    tree.descendants(root)
        .filter(|&n| selectors.matches(tree, n))
        .collect()
}

/// First descendant element of `root` matching `selectors`
pub fn query_selector(tree: &DomTree, root: NodeId, selectors: &SelectorList) -> Option<NodeId> {
    tree.descendants(root).find(|&n| selectors.matches(tree, n))
}

/// Parse `selector` and run [`query_selector_all`]
pub fn select(tree: &DomTree, root: NodeId, selector: &str) -> Result<Vec<NodeId>, CssError> {
    let selectors = SelectorList::parse(selector)?;
    Ok(query_selector_all(tree, root, &selectors))
}

/// `Element.matches()`
pub fn matches(tree: &DomTree, element: NodeId, selector: &str) -> Result<bool, CssError> {
    Ok(SelectorList::parse(selector)?.matches(tree, element))
}

/// `Element.closest()`: nearest inclusive ancestor matching `selectors`
pub fn closest(tree: &DomTree, element: NodeId, selectors: &SelectorList) -> Option<NodeId> {
    std::iter::once(element)
        .chain(tree.ancestors(element))
        .find(|&n| selectors.matches(tree, n))
}
