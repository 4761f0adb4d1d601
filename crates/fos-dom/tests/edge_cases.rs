//! Edge case tests for fos-dom

use fos_dom::{Document, DomError, EditCommand, Range, XPathError, splice_text, xpath};

fn editable(content: &str) -> (Document, fos_dom::NodeId, fos_dom::NodeId) {
    let mut doc = Document::new("about:blank");
    let body = doc.body();
    let tree = doc.tree_mut();
    let host = tree.create_element("div");
    tree.set_attribute(host, "contenteditable", "true").unwrap();
    let text = tree.create_text(content);
    tree.append_child(body, host).unwrap();
    tree.append_child(host, text).unwrap();
    (doc, host, text)
}

#[test]
fn test_xpath_syntax_errors() {
    let doc = Document::new("about:blank");
    let tree = doc.tree();
    for bad in ["//", "//div[", "div[@id='x'", "1 +", "//*[", "@"] {
        let err = xpath::evaluate(tree, bad, tree.root());
        assert!(matches!(err, Err(XPathError::Syntax { .. })), "{bad:?} gave {err:?}");
    }
}

#[test]
fn test_xpath_non_node_set_rejected() {
    let doc = Document::new("about:blank");
    let tree = doc.tree();
    assert_eq!(
        xpath::evaluate(tree, "count(//div)", tree.root()),
        Err(XPathError::NotANodeSet)
    );
    assert!(matches!(
        xpath::evaluate(tree, "frobnicate(1)", tree.root()),
        Err(XPathError::UnknownFunction(_))
    ));
}

#[test]
fn test_xpath_names_case_insensitive() {
    let mut doc = Document::new("about:blank");
    let body = doc.body();
    let tree = doc.tree_mut();
    let div = tree.create_element("DIV");
    tree.append_child(body, div).unwrap();
    let tree = doc.tree();
    assert_eq!(xpath::evaluate(tree, "//div", tree.root()).unwrap().len(), 1);
    assert_eq!(xpath::evaluate(tree, "//DIV", tree.root()).unwrap().len(), 1);
}

#[test]
fn test_splice_rejects_mid_character_offsets() {
    let (mut doc, _, text) = editable("héllo");
    // 'é' occupies bytes 1..3
    let err = splice_text(doc.tree_mut(), text, 2, 3, "x").unwrap_err();
    assert_eq!(err, DomError::IndexSize { offset: 2 });
    assert_eq!(doc.tree().text(text), Some("héllo"));
}

#[test]
fn test_exec_command_refuses_stale_or_spanning_ranges() {
    let (mut doc, host, text) = editable("abc");
    let tree = doc.tree_mut();
    let other = tree.create_text("def");
    tree.append_child(host, other).unwrap();

    doc.select_range(Range::between(text, 1, other, 1));
    assert!(!doc.exec_command(EditCommand::InsertText, Some("x")));

    doc.select_range(Range::in_text(text, 0, 10));
    assert!(!doc.exec_command(EditCommand::InsertText, Some("x")));

    doc.tree_mut().detach(text).unwrap();
    doc.select_range(Range::in_text(text, 0, 1));
    assert!(!doc.exec_command(EditCommand::InsertText, Some("x")));
}

#[test]
fn test_contenteditable_false_blocks_editing() {
    let (mut doc, host, _) = editable("abc");
    let tree = doc.tree_mut();
    let island = tree.create_element("span");
    tree.set_attribute(island, "contenteditable", "false").unwrap();
    let inner = tree.create_text("locked");
    tree.append_child(island, inner).unwrap();
    tree.append_child(host, island).unwrap();

    assert_eq!(doc.tree().editing_host(inner), None);
    doc.select_range(Range::in_text(inner, 0, 6));
    assert!(!doc.exec_command(EditCommand::InsertText, Some("x")));
}

#[test]
fn test_undo_after_external_change_is_refused() {
    let (mut doc, _, text) = editable("abc");
    doc.select_range(Range::in_text(text, 0, 1));
    assert!(doc.exec_command(EditCommand::InsertText, Some("X")));
    doc.tree_mut().set_text(text, "changed".into()).unwrap();
    assert!(!doc.exec_command(EditCommand::Undo, None));
    assert_eq!(doc.tree().text(text), Some("changed"));
}

#[test]
fn test_detached_nodes_not_connected() {
    let (mut doc, host, text) = editable("abc");
    assert!(doc.tree().is_connected(text));
    doc.tree_mut().detach(host).unwrap();
    assert!(!doc.tree().is_connected(text));
    assert!(Range::in_text(text, 0, 1).validate(doc.tree()).is_err());
}
