//! Comprehensive tests for fos-find
//!
//! Searches, navigation, highlighting and replacement over parsed
//! documents.

use fos_find::{
    FindConfig, FindEngine, Highlighter, Match, MatchKind, Replacer, Scope, SearchMode,
    SearchOptions, detect,
};
use fos_html::parse;

fn page(body: &str) -> fos_dom::Document {
    parse(&format!("<html><head></head><body>{body}</body></html>")).unwrap()
}

fn with_fields() -> SearchOptions {
    SearchOptions {
        include_editable_fields: true,
        ..SearchOptions::default()
    }
}

fn body_text(doc: &fos_dom::Document) -> String {
    doc.tree().text_content(doc.body())
}

#[test]
fn test_plain_queries_are_text() {
    for query in ["hello", "two words", "a.b", "50%", "C++"] {
        assert_eq!(detect(query).mode, SearchMode::Text, "{query:?}");
    }
}

#[test]
fn test_regex_literals() {
    for query in ["/a+/", "/a+/gimsuy", "/(x|y)z/i"] {
        let detection = detect(query);
        assert_eq!(detection.mode, SearchMode::Regex, "{query:?}");
        assert!(detection.error.is_none(), "{query:?}");
    }
    let broken = detect("/[/");
    assert_eq!(broken.mode, SearchMode::Regex);
    assert!(broken.error.is_some());
}

#[test]
fn test_text_search_case_folding() {
    let doc = page("<p>Apple apple APPLE</p>");
    let mut engine = FindEngine::default();
    assert_eq!(engine.search(&doc, "apple", SearchOptions::default()).len(), 3);

    let options = SearchOptions {
        case_sensitive: true,
        ..SearchOptions::default()
    };
    let matches = engine.search(&doc, "apple", options);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches.get(0).and_then(Match::offsets), Some((6, 11)));
}

#[test]
fn test_whole_word() {
    let doc = page("<p>concatenate cats cat</p>");
    let mut engine = FindEngine::default();
    let options = SearchOptions {
        whole_word: true,
        ..SearchOptions::default()
    };
    let matches = engine.search(&doc, "cat", options);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches.get(0).and_then(Match::offsets), Some((17, 20)));

    assert_eq!(engine.search(&doc, "cat", SearchOptions::default()).len(), 3);
}

#[test]
fn test_matches_in_document_order() {
    let doc = page("<div><p>x one</p><ul><li>x two</li></ul></div><p>x three</p>");
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "x", SearchOptions::default());
    assert_eq!(matches.len(), 3);
    for pair in matches.as_slice().windows(2) {
        assert!(pair[0].compare_position(&pair[1], doc.tree()).is_lt());
    }
}

#[test]
fn test_cursor_cycling() {
    let doc = page("<p>a a a a</p>");
    let mut engine = FindEngine::default();
    engine.search(&doc, "a", SearchOptions::default());
    let n = engine.match_count();
    assert_eq!(n, 4);
    assert_eq!(engine.current_index(), Some(0));
    for _ in 0..n {
        engine.next_match();
    }
    assert_eq!(engine.current_index(), Some(0));
    engine.previous_match();
    assert_eq!(engine.current_index(), Some(n - 1));
    assert_eq!(engine.status_text(), "4 of 4");
}

#[test]
fn test_match_cap() {
    let doc = page(&format!("<p>{}</p>", "a".repeat(10_005)));
    let mut engine = FindEngine::default();
    engine.search(&doc, "a", SearchOptions::default());
    assert_eq!(engine.match_count(), 10_000);
    assert!(engine.was_match_limit_reached());
    assert_eq!(engine.status_text(), "1 of 10000+");
}

#[test]
fn test_configured_cap() {
    let doc = page("<p>b b b b b</p>");
    let config = FindConfig {
        max_matches: 2,
        ..FindConfig::default()
    };
    let mut engine = FindEngine::new(config);
    engine.search(&doc, "b", SearchOptions::default());
    assert_eq!(engine.match_count(), 2);
    assert!(engine.was_match_limit_reached());
}

#[test]
fn test_text_and_input_scenario() {
    let doc = page(r#"<p>Hello world</p><input value="Hello">"#);
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "Hello", with_fields());
    assert_eq!(matches.len(), 2);
    assert_eq!(matches.get(0).map(Match::kind), Some(MatchKind::Text));
    let input = matches.get(1).unwrap();
    assert_eq!(input.kind(), MatchKind::Input);
    assert_eq!(input.offsets(), Some((0, 5)));
}

#[test]
fn test_fields_skipped_by_default() {
    let doc = page(r#"<p>Hello</p><input value="Hello"><textarea>Hello</textarea>"#);
    let mut engine = FindEngine::default();
    assert_eq!(engine.search(&doc, "Hello", SearchOptions::default()).len(), 1);
    assert_eq!(engine.search(&doc, "Hello", with_fields()).len(), 3);
}

#[test]
fn test_css_hidden_scenario() {
    let doc = page(r#"<p>one</p><p>two</p><p style="display:none">three</p>"#);
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "css:p", SearchOptions::default());
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.kind() == MatchKind::Css));

    let hidden = SearchOptions {
        search_hidden: true,
        ..SearchOptions::default()
    };
    assert_eq!(engine.search(&doc, "css:p", hidden).len(), 3);
}

#[test]
fn test_css_labels() {
    let doc = page(r#"<section id="s" class="a b"><span>x</span></section>"#);
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "$section", SearchOptions::default());
    assert_eq!(matches.get(0).map(Match::text), Some("section#s.a.b"));
    assert_eq!(engine.search_mode(), Some(SearchMode::Css));
}

#[test]
fn test_mixed_mode() {
    let doc = page(r#"<p class="note">see .note here</p>"#);
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, ".note", SearchOptions::default());
    assert_eq!(matches.len(), 2);
    assert_eq!(matches.get(0).map(Match::kind), Some(MatchKind::Css));
    assert_eq!(matches.get(1).map(Match::kind), Some(MatchKind::Text));
    assert_eq!(engine.search_mode(), Some(SearchMode::Mixed));
    assert_eq!(SearchMode::Mixed.label(), "CSS + Text");
}

#[test]
fn test_xpath_queries() {
    let doc = page(r#"<p class="x">first paragraph</p><p>second</p><a href="/home">link</a>"#);
    let mut engine = FindEngine::default();

    let matches = engine.search(&doc, "//p", SearchOptions::default());
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.kind() == MatchKind::XPath));

    let matches = engine.search(&doc, "xpath://p[@class='x']/text()", SearchOptions::default());
    assert_eq!(matches.get(0).map(Match::text), Some("\"first paragraph\""));

    let matches = engine.search(&doc, "//a/@href", SearchOptions::default());
    assert_eq!(matches.get(0).map(Match::text), Some("@href=\"/home\""));
    let link = doc.tree().descendants(doc.body()).find(|&n| doc.tree().has_tag(n, "a"));
    assert_eq!(matches.get(0).and_then(Match::element), link);
}

#[test]
fn test_regex_search_groups() {
    let doc = page("<p>alice@example bob@test</p>");
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, r"/(\w+)@(\w+)/", SearchOptions::default());
    assert_eq!(matches.len(), 2);
    let first = matches.get(0).unwrap();
    assert_eq!(first.kind(), MatchKind::Regex);
    assert_eq!(first.groups(), Some(&[Some("alice".to_string()), Some("example".to_string())][..]));
}

#[test]
fn test_contenteditable_matches() {
    let doc = page(r#"<div contenteditable="true">edit <b>me</b> now</div><p>me too</p>"#);
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "me", with_fields());
    assert_eq!(matches.len(), 2);
    let editable = matches.iter().find(|m| m.kind() == MatchKind::ContentEditable).unwrap();
    let Match::ContentEditable(m) = editable else { unreachable!() };
    assert_eq!(m.host_offset, 5);

    // Without the field pass, host text is ordinary page text
    assert!(engine
        .search(&doc, "me", SearchOptions::default())
        .iter()
        .all(|m| m.kind() == MatchKind::Text));
}

#[test]
fn test_replace_round_trip() {
    let mut doc = page("<p>Hello world</p>");
    let original = body_text(&doc);
    let mut engine = FindEngine::default();
    let m = engine.search(&doc, "world", SearchOptions::default()).get(0).cloned().unwrap();

    let mut replacer = Replacer::default();
    replacer.replace_match(&mut doc, &m, "there", Scope::Page).unwrap();
    assert_eq!(body_text(&doc), "Hello there");

    let again = engine.search(&doc, "there", SearchOptions::default());
    assert_eq!(again.len(), 1);
    assert_eq!(again.get(0).and_then(Match::offsets), Some((6, 11)));

    replacer.undo(&mut doc).unwrap();
    assert_eq!(body_text(&doc), original);
    assert!(!replacer.can_undo());
}

#[test]
fn test_replace_all_same_node() {
    let mut doc = page("<p>aaa-bbb aaa-ccc aaa</p>");
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "aaa", SearchOptions::default()).as_slice().to_vec();
    assert_eq!(matches.len(), 3);

    let mut replacer = Replacer::default();
    let report = replacer.replace_all(&mut doc, &matches, "z", Scope::Page, SearchMode::Text, "aaa");
    assert_eq!(report.success_count, 3);
    assert_eq!(report.fail_count, 0);
    assert_eq!(body_text(&doc), "z-bbb z-ccc z");
}

#[test]
fn test_replace_all_regex_template() {
    let mut doc = page("<p>alice@example bob@test</p>");
    let mut engine = FindEngine::default();
    let query = r"/(\w+)@(\w+)/";
    let matches = engine.search(&doc, query, SearchOptions::default()).as_slice().to_vec();

    let mut replacer = Replacer::default();
    let report = replacer.replace_all(&mut doc, &matches, "$2 at $1 ($&)", Scope::Page, SearchMode::Regex, query);
    assert_eq!(report.success_count, 2);
    assert_eq!(body_text(&doc), "example at alice (alice@example) test at bob (bob@test)");
}

#[test]
fn test_regex_groups_recaptured() {
    let mut doc = page("<p>2024-01</p>");
    let mut engine = FindEngine::default();
    let query = r"/(\d+)-(\d+)/";
    let mut matches = engine.search(&doc, query, SearchOptions::default()).as_slice().to_vec();
    if let Match::Regex(m) = &mut matches[0] {
        m.groups = None;
    }

    let mut replacer = Replacer::default();
    replacer.replace_all(&mut doc, &matches, "$2/$1", Scope::Page, SearchMode::Regex, query);
    assert_eq!(body_text(&doc), "01/2024");
}

#[test]
fn test_replace_fields() {
    let mut doc = page(r#"<input id="i" value="cat and cat"><textarea id="t">a cat</textarea>"#);
    let mut engine = FindEngine::default();
    let options = SearchOptions {
        scope: Scope::Input,
        ..SearchOptions::default()
    };
    let matches = engine.search(&doc, "cat", options).as_slice().to_vec();
    assert_eq!(matches.len(), 3);

    let mut replacer = Replacer::default();
    let report = replacer.replace_all(&mut doc, &matches, "dog", Scope::Input, SearchMode::Text, "cat");
    assert_eq!(report.success_count, 3);

    let input = doc.get_element_by_id("i").unwrap();
    let textarea = doc.get_element_by_id("t").unwrap();
    assert_eq!(doc.tree().form_value(input).as_deref(), Some("dog and dog"));
    assert_eq!(doc.tree().form_value(textarea).as_deref(), Some("a dog"));
    assert!(doc.events().iter().any(|e| e.target == input));

    while replacer.can_undo() {
        replacer.undo(&mut doc).unwrap();
    }
    assert_eq!(doc.tree().form_value(input).as_deref(), Some("cat and cat"));
    assert_eq!(doc.tree().form_value(textarea).as_deref(), Some("a cat"));
}

#[test]
fn test_replace_contenteditable() {
    let mut doc = page(r#"<div id="host" contenteditable="true">edit <b>me</b> now</div>"#);
    let mut engine = FindEngine::default();
    let m = engine.search(&doc, "me", with_fields()).get(0).cloned().unwrap();
    assert_eq!(m.kind(), MatchKind::ContentEditable);

    let mut replacer = Replacer::default();
    replacer.replace_match(&mut doc, &m, "you", Scope::Page).unwrap();
    let host = doc.get_element_by_id("host").unwrap();
    assert_eq!(doc.tree().text_content(host), "edit you now");

    replacer.undo(&mut doc).unwrap();
    assert_eq!(doc.tree().text_content(host), "edit me now");
    assert_eq!(fos_html::inner_html(doc.tree(), host), "edit <b>me</b> now");
}

#[test]
fn test_selector_matches_not_replaceable() {
    let mut doc = page("<p>one</p><p>two</p>");
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "css:p", SearchOptions::default()).as_slice().to_vec();

    let mut replacer = Replacer::default();
    for scope in [Scope::Input, Scope::Page, Scope::Html] {
        let err = replacer.can_replace(&doc, &matches[0], scope).unwrap_err();
        assert!(err.to_string().starts_with("CSS selector matches cannot be replaced"));
    }

    let report = replacer.replace_all(&mut doc, &matches, "x", Scope::Page, SearchMode::Css, "css:p");
    assert_eq!(report.success_count, 0);
    assert_eq!(report.fail_count, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(body_text(&doc), "onetwo");
}

#[test]
fn test_highlighter_follows_cursor() {
    let doc = page(r#"<p>find me</p><input value="find">"#);
    let mut engine = FindEngine::default();
    let matches = engine.search(&doc, "find", with_fields()).as_slice().to_vec();

    let mut highlighter = Highlighter::default();
    highlighter.highlight_matches(&doc, &matches, engine.current_index(), SearchMode::Text);
    assert_eq!(highlighter.ranges().len(), 1);
    assert_eq!(highlighter.elements().len(), 1);
    assert!(highlighter.ranges()[0].current);

    engine.next_match();
    highlighter.update_current_match(&doc, &matches, engine.current_index(), SearchMode::Text);
    assert!(!highlighter.ranges()[0].current);
    assert!(highlighter.elements()[0].current);

    highlighter.clear();
    assert!(highlighter.markers().is_empty());
}
