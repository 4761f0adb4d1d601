//! Comprehensive tests for fos-css
//!
//! Tests stylesheet parsing, selector matching over parsed documents
//! and style computation.

use fos_css::{CssParser, Display, SelectorList, Specificity, StyleResolver, Visibility, select};
use fos_html::parse;

#[test]
fn test_parse_empty() {
    let stylesheet = CssParser::new().parse("").unwrap();
    assert_eq!(stylesheet.len(), 0);
    assert!(stylesheet.is_empty());
}

#[test]
fn test_parse_multiple_rules() {
    let css = r#"
        .foo { color: red; }
        .bar { background: blue; }
        #baz { display: flex; }
    "#;
    let stylesheet = CssParser::new().parse(css).unwrap();
    assert_eq!(stylesheet.len(), 3);
}

#[test]
fn test_parse_complex_selectors() {
    let css = r#"
        div.container > p.text { color: black; }
        ul li a:hover { color: blue; }
        input[type="text"] { border: 1px solid; }
        h1, h2, h3 { margin: 0; }
    "#;
    let stylesheet = CssParser::new().parse(css).unwrap();
    assert_eq!(stylesheet.len(), 4);
    assert_eq!(stylesheet.rules[3].selectors.0.len(), 3);
}

#[test]
fn test_specificity() {
    let spec = |s: &str| SelectorList::parse(s).unwrap().max_specificity();
    assert_eq!(spec("div"), Specificity(0, 0, 1));
    assert_eq!(spec("#a .b c"), Specificity(1, 1, 1));
    assert_eq!(spec("a[href]:hover"), Specificity(0, 2, 1));
    assert_eq!(spec(":where(#a) p"), Specificity(0, 0, 1));
    assert_eq!(spec(":is(#a, p) span"), Specificity(1, 0, 1));
    assert!(spec("#a") > spec(".a.b.c.d"));
}

#[test]
fn test_select_on_parsed_document() {
    let doc = parse(
        r#"<html><body>
            <nav><a href="/">Home</a><a href="/docs" class="active">Docs</a></nav>
            <main><p class="intro">Hi</p><p>There</p></main>
        </body></html>"#,
    )
    .unwrap();
    let tree = doc.tree();

    let links = select(tree, tree.root(), "nav > a").unwrap();
    assert_eq!(links.len(), 2);
    let active = select(tree, tree.root(), "a.active[href^='/d']").unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(tree.text_content(active[0]), "Docs");

    let paras = select(tree, tree.root(), "main p:not(.intro)").unwrap();
    assert_eq!(paras.len(), 1);
    assert_eq!(tree.text_content(paras[0]), "There");
}

#[test]
fn test_style_elements_cascade() {
    let doc = parse(
        r#"<html><head><style>
            .gone { display: none }
            .ghost { visibility: hidden }
            .faint { opacity: 0 }
        </style></head>
        <body><div class="gone">a</div><div class="ghost">b</div><span class="faint">c</span></body></html>"#,
    )
    .unwrap();
    let tree = doc.tree();
    let resolver = StyleResolver::for_tree(tree);

    let gone = select(tree, tree.root(), ".gone").unwrap()[0];
    let ghost = select(tree, tree.root(), ".ghost").unwrap()[0];
    let faint = select(tree, tree.root(), ".faint").unwrap()[0];

    assert_eq!(resolver.compute_style(tree, gone, None).display, Display::None);
    assert_eq!(resolver.compute_style(tree, ghost, None).visibility, Visibility::Hidden);
    let faint_style = resolver.compute_style(tree, faint, None);
    assert_eq!(faint_style.opacity, 0.0);
    assert_eq!(faint_style.display, Display::Inline);
}

#[test]
fn test_visibility_inherited_through_compute_chain() {
    let doc = parse(
        r#"<html><body><div style="visibility:hidden"><p><b id="t">x</b></p></div></body></html>"#,
    )
    .unwrap();
    let tree = doc.tree();
    let resolver = StyleResolver::for_tree(tree);

    let target = doc.get_element_by_id("t").unwrap();
    let mut chain: Vec<_> = tree.ancestors(target).filter(|&n| tree.is_element(n)).collect();
    chain.reverse();
    chain.push(target);

    let mut style = None;
    for node in chain {
        style = Some(resolver.compute_style(tree, node, style.as_ref()));
    }
    assert!(style.unwrap().is_visibility_hidden());
}
