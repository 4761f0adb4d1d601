//! Edge case tests for fos-find
//!
//! Malformed queries, hidden and excluded content, stale matches and
//! undo after the page changed.

use fos_find::{
    DEFAULT_UI_ROOT_ID, FindConfig, FindEngine, FindError, Match, MatchKind, ReplaceError,
    Replacer, Scope, SearchMode, SearchOptions, UI_MARKER_ATTRIBUTE,
};
use fos_html::parse;

fn page(body: &str) -> fos_dom::Document {
    parse(&format!("<html><head></head><body>{body}</body></html>")).unwrap()
}

fn count(doc: &fos_dom::Document, query: &str, options: SearchOptions) -> usize {
    FindEngine::default().search(doc, query, options).len()
}

fn hidden() -> SearchOptions {
    SearchOptions {
        search_hidden: true,
        ..SearchOptions::default()
    }
}

#[test]
fn test_invalid_regex() {
    let doc = page("<p>[</p>");
    let mut engine = FindEngine::default();
    assert!(engine.search(&doc, "/[/", SearchOptions::default()).is_empty());
    assert!(matches!(engine.last_error(), Some(FindError::InvalidRegex(_))));
    assert!(engine.status_text().starts_with("Invalid regular expression"));

    // A later valid query clears the error
    engine.search(&doc, "[", SearchOptions::default());
    assert!(engine.last_error().is_none());
    assert_eq!(engine.match_count(), 1);
}

#[test]
fn test_bad_regex_flags() {
    let doc = page("<p>a</p>");
    let mut engine = FindEngine::default();
    engine.search(&doc, "/a/gg", SearchOptions::default());
    assert!(matches!(engine.last_error(), Some(FindError::InvalidRegex(_))));
}

#[test]
fn test_invalid_selector() {
    let doc = page("<p>a</p>");
    let mut engine = FindEngine::default();
    assert!(engine.search(&doc, "css:div >", SearchOptions::default()).is_empty());
    assert!(matches!(engine.last_error(), Some(FindError::InvalidSelector(_))));
    assert_eq!(engine.search_mode(), Some(SearchMode::Css));
}

#[test]
fn test_invalid_xpath() {
    let doc = page("<p>a</p>");
    let mut engine = FindEngine::default();
    for query in ["xpath://p[", "//p[@", "xpath:count(//p)", "xpath:bogus(//p)"] {
        assert!(engine.search(&doc, query, SearchOptions::default()).is_empty(), "{query}");
        assert!(matches!(engine.last_error(), Some(FindError::InvalidXPath(_))), "{query}");
    }
}

#[test]
fn test_deeply_nested_queries_rejected() {
    let doc = page("<p>a</p>");
    let mut engine = FindEngine::default();

    let xpath = format!("xpath:{}//p{}", "(".repeat(800), ")".repeat(800));
    assert!(engine.search(&doc, &xpath, SearchOptions::default()).is_empty());
    assert!(matches!(engine.last_error(), Some(FindError::InvalidXPath(_))));

    let css = format!("css:{}p{}", ":not(".repeat(2000), ")".repeat(2000));
    assert!(engine.search(&doc, &css, SearchOptions::default()).is_empty());
    assert!(matches!(engine.last_error(), Some(FindError::InvalidSelector(_))));

    // Shallow nesting still works
    let xpath = format!("xpath:{}//p{}", "(".repeat(20), ")".repeat(20));
    assert_eq!(engine.search(&doc, &xpath, SearchOptions::default()).len(), 1);
    let css = format!("css:{}p{}", ":is(".repeat(20), ")".repeat(20));
    assert_eq!(engine.search(&doc, &css, SearchOptions::default()).len(), 1);
}

#[test]
fn test_deep_selector_lookalike_falls_back_to_text() {
    let query = format!("p{}a{}", ":not(".repeat(2000), ")".repeat(2000));
    let doc = page(&format!("<p>{query}</p>"));
    let mut engine = FindEngine::default();
    assert_eq!(engine.search(&doc, &query, SearchOptions::default()).len(), 1);
    assert!(engine.last_error().is_none());
    assert_eq!(engine.search_mode(), Some(SearchMode::Text));
}

#[test]
fn test_empty_selector_queries() {
    let doc = page("<p>a</p>");
    let mut engine = FindEngine::default();
    for query in ["css:", "css:   ", "xpath:", "$"] {
        assert!(engine.search(&doc, query, SearchOptions::default()).is_empty(), "{query:?}");
        assert!(engine.last_error().is_none(), "{query:?}");
        assert_eq!(engine.status_text(), "No matches");
    }
}

#[test]
fn test_no_matches_and_empty_navigation() {
    let doc = page("<p>abc</p>");
    let mut engine = FindEngine::default();
    engine.search(&doc, "zzz", SearchOptions::default());
    assert_eq!(engine.status_text(), "No matches");
    assert!(engine.next_match().is_none());
    assert!(engine.previous_match().is_none());
    assert_eq!(engine.current_index(), None);

    engine.clear();
    assert_eq!(engine.status_text(), "");
    assert_eq!(engine.search_mode(), None);
}

#[test]
fn test_script_and_style_never_searched() {
    let doc = parse(
        "<html><head><title>needle</title><style>.needle{}</style></head>\
         <body><script>var needle;</script><noscript>needle</noscript><p>hay</p></body></html>",
    )
    .unwrap();
    assert_eq!(count(&doc, "needle", SearchOptions::default()), 0);
    assert_eq!(count(&doc, "needle", hidden()), 0);
}

#[test]
fn test_hidden_content() {
    let doc = page(
        r#"<style>.gone { visibility: hidden }</style>
        <p>needle</p>
        <p hidden>needle</p>
        <p class="gone">needle</p>
        <div style="opacity: 0"><span>needle</span></div>
        <div aria-hidden="true">needle</div>
        <div style="width: 0; height: 0; display: block">needle</div>
        <div style="clip-path: inset(50%)">needle</div>"#,
    );
    assert_eq!(count(&doc, "needle", SearchOptions::default()), 1);
    assert_eq!(count(&doc, "needle", hidden()), 7);

    let html = SearchOptions {
        scope: Scope::Html,
        ..SearchOptions::default()
    };
    assert_eq!(count(&doc, "needle", html), 7);
}

#[test]
fn test_element_with_only_undisplayed_content_is_empty() {
    let doc = page(
        r#"<div id="empty"><span style="display:none">x</span></div>
        <div id="full"><span style="display:none">x</span>y</div>"#,
    );
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "css:div", SearchOptions::default());
    assert_eq!(matches.len(), 1);
    assert_eq!(matches.as_slice()[0].anchor(), doc.get_element_by_id("full").unwrap());
    assert_eq!(count(&doc, "css:div", hidden()), 2);
}

#[test]
fn test_closed_details() {
    let doc = page("<details><summary>needle one</summary><p>needle two</p></details>");
    assert_eq!(count(&doc, "needle", SearchOptions::default()), 1);
    assert_eq!(count(&doc, "needle", hidden()), 2);

    let open = page("<details open><summary>needle one</summary><p>needle two</p></details>");
    assert_eq!(count(&open, "needle", SearchOptions::default()), 2);
}

#[test]
fn test_own_ui_excluded() {
    let doc = page(&format!(
        r#"<div id="{DEFAULT_UI_ROOT_ID}"><p>needle</p><input value="needle"></div>
        <span {UI_MARKER_ATTRIBUTE}>needle</span><p>needle</p>"#
    ));
    let options = SearchOptions {
        include_editable_fields: true,
        search_hidden: true,
        ..SearchOptions::default()
    };
    assert_eq!(count(&doc, "needle", options.clone()), 1);
    assert_eq!(count(&doc, "css:p", options.clone()), 1);
    assert_eq!(count(&doc, "//p", options), 1);

    let config = FindConfig {
        ui_root_id: "other".to_string(),
        ..FindConfig::default()
    };
    let mut engine = FindEngine::new(config);
    assert_eq!(engine.search(&doc, "needle", SearchOptions::default()).len(), 2);
}

#[test]
fn test_non_text_inputs_ignored() {
    let doc = page(
        r#"<input type="checkbox" value="needle"><input type="password" value="needle">
        <input type="search" value="needle"><input type="hidden" value="needle">"#,
    );
    let options = SearchOptions {
        scope: Scope::Input,
        ..SearchOptions::default()
    };
    assert_eq!(count(&doc, "needle", options), 1);
}

#[test]
fn test_nested_editing_hosts_scanned_once() {
    let doc = page(r#"<div contenteditable>outer <span contenteditable>needle</span></div>"#);
    let options = SearchOptions {
        scope: Scope::Input,
        ..SearchOptions::default()
    };
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "needle", options);
    assert_eq!(matches.len(), 1);
    let Some(Match::ContentEditable(m)) = matches.get(0) else {
        panic!("expected a contenteditable match");
    };
    assert_eq!(m.host_offset, 6);
}

#[test]
fn test_unicode_offsets() {
    let doc = page("<p>Ünïcödé straße STRASSE</p>");
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "ünïcödé", SearchOptions::default());
    assert_eq!(matches.len(), 1);
    let m = matches.get(0).unwrap();
    assert_eq!(m.text(), "Ünïcödé");
    assert_eq!(m.offsets(), Some((0, "Ünïcödé".len())));
}

#[test]
fn test_regex_empty_matches_skipped() {
    let doc = page("<p>abc</p>");
    assert_eq!(count(&doc, "/x*/", SearchOptions::default()), 0);
    assert_eq!(count(&doc, "/b|/", SearchOptions::default()), 1);
}

#[test]
fn test_regex_flags() {
    let doc = page("<p>Line one\nline two</p>");
    assert_eq!(count(&doc, "/^line/", SearchOptions::default()), 0);
    assert_eq!(count(&doc, "/^line/im", SearchOptions::default()), 2);
    // Regex queries ignore the case-sensitivity option
    let insensitive = SearchOptions {
        case_sensitive: false,
        ..SearchOptions::default()
    };
    assert_eq!(count(&doc, "/LINE/", insensitive), 0);
}

#[test]
fn test_text_match_not_replaceable_in_input_scope() {
    let mut doc = page("<p>needle</p>");
    let mut engine = FindEngine::default();
    let m = engine.search(&doc, "needle", SearchOptions::default()).get(0).cloned().unwrap();
    let mut replacer = Replacer::default();
    let err = replacer.replace_match(&mut doc, &m, "x", Scope::Input).unwrap_err();
    assert_eq!(err, ReplaceError::NotEditable);
    assert_eq!(err.to_string(), "Not in editable field (try page or html scope)");
    assert!(replacer.can_replace(&doc, &m, Scope::Page).is_ok());
}

#[test]
fn test_hidden_text_needs_html_scope() {
    let mut doc = page(r#"<p style="display:none">secret</p>"#);
    let mut engine = FindEngine::default();
    let options = SearchOptions {
        scope: Scope::Html,
        ..SearchOptions::default()
    };
    let m = engine.search(&doc, "secret", options).get(0).cloned().unwrap();

    let mut replacer = Replacer::default();
    assert_eq!(replacer.can_replace(&doc, &m, Scope::Page), Err(ReplaceError::Hidden));
    replacer.replace_match(&mut doc, &m, "public", Scope::Html).unwrap();
    assert_eq!(doc.tree().text_content(doc.body()), "public");
}

#[test]
fn test_stale_match_rejected() {
    let mut doc = page("<p>one two</p>");
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "two", SearchOptions::default()).as_slice().to_vec();
    let mut replacer = Replacer::default();
    replacer.replace_match(&mut doc, &matches[0], "three", Scope::Page).unwrap();
    assert_eq!(
        replacer.replace_match(&mut doc, &matches[0], "four", Scope::Page),
        Err(ReplaceError::Stale)
    );
    assert_eq!(replacer.undo_count(), 1);
}

#[test]
fn test_replace_all_collects_distinct_errors() {
    let mut doc = page(r#"<p>cat</p><input readonly value="cat"><input disabled value="cat"><p>cat</p>"#);
    let mut engine = FindEngine::default();
    let options = SearchOptions {
        include_editable_fields: true,
        ..SearchOptions::default()
    };
    let matches = engine.search(&doc, "cat", options).as_slice().to_vec();
    assert_eq!(matches.len(), 4);

    let mut replacer = Replacer::default();
    let report = replacer.replace_all(&mut doc, &matches, "dog", Scope::Page, SearchMode::Text, "cat");
    assert_eq!(report.success_count, 2);
    assert_eq!(report.fail_count, 2);
    assert_eq!(report.errors, vec![ReplaceError::ReadOnly]);
}

#[test]
fn test_xpath_replace_all_fails() {
    let mut doc = page("<p>one</p>");
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "//p", SearchOptions::default()).as_slice().to_vec();
    assert_eq!(matches[0].kind(), MatchKind::XPath);

    let mut replacer = Replacer::default();
    let report = replacer.replace_all(&mut doc, &matches, "x", Scope::Html, SearchMode::XPath, "//p");
    assert_eq!(report.errors, vec![ReplaceError::XPathMatch]);
    assert!(!replacer.can_undo());
}

#[test]
fn test_undo_after_node_removed() {
    let mut doc = page(r#"<p id="p">one</p><input id="i" value="one">"#);
    let mut engine = FindEngine::default();
    let options = SearchOptions {
        include_editable_fields: true,
        ..SearchOptions::default()
    };
    let matches = engine.search(&doc, "one", options).as_slice().to_vec();
    assert_eq!(matches.len(), 2);

    let mut replacer = Replacer::default();
    replacer.replace_match(&mut doc, &matches[0], "two", Scope::Page).unwrap();
    replacer.replace_match(&mut doc, &matches[1], "two", Scope::Page).unwrap();

    let input = doc.get_element_by_id("i").unwrap();
    doc.tree_mut().detach(input).unwrap();
    assert_eq!(replacer.undo(&mut doc), Err(ReplaceError::ElementGone));

    let p = doc.get_element_by_id("p").unwrap();
    doc.tree_mut().detach(p).unwrap();
    assert_eq!(replacer.undo(&mut doc), Err(ReplaceError::NodeGone));
    assert_eq!(replacer.undo(&mut doc), Err(ReplaceError::NothingToUndo));
}

#[test]
fn test_config_from_toml() {
    let config = FindConfig::from_toml_str("max_matches = 5\nsearch_hidden = true\n").unwrap();
    assert_eq!(config.max_matches, 5);
    assert!(config.search_options().search_hidden);
    assert_eq!(config.undo_limit, 50);
    assert!(FindConfig::from_toml_str("max_matches = 0").is_err());
    assert!(FindConfig::from_toml_str("max_matches = \"lots\"").is_err());
}
