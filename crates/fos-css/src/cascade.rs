//! Style Cascade & Resolver
//!
//! Computes the final styles for DOM elements by:
//! 1. Matching selectors against elements
//! 2. Sorting by importance, origin, specificity and source order
//! 3. Applying the winning declarations over the inherited style

use fos_dom::{DomTree, NodeId};

use crate::computed::ComputedStyle;
use crate::{CssParser, Declaration, Specificity, Stylesheet};

/// Browser defaults for the properties we compute
const UA_STYLESHEET: &str = r#"
head, script, style, link, meta, title, base, template, noscript, datalist,
param, source, track, area, [hidden], input[type="hidden" i], dialog:not([open]) {
    display: none;
}
html, body, div, p, h1, h2, h3, h4, h5, h6, ul, ol, dl, dt, dd, form, header,
footer, section, article, nav, aside, main, blockquote, pre, figure, figcaption,
details, summary, fieldset, address, hr, legend, dialog {
    display: block;
}
li { display: list-item; }
table { display: table; }
tr { display: table-row; }
td, th { display: table-cell; }
img, input, textarea, select, button, video, canvas, iframe, svg, embed, object {
    display: inline-block;
}
"#;

/// Cascade origin, lowest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    UserAgent,
    Author,
    Inline,
}

/// Style resolver - computes styles for DOM elements
pub struct StyleResolver {
    /// User agent stylesheet (browser defaults)
    ua_styles: Stylesheet,
    /// Author stylesheets (page CSS) in document order
    author_styles: Vec<Stylesheet>,
    parser: CssParser,
}

impl StyleResolver {
    pub fn new() -> Self {
        let parser = CssParser::new();
        let ua_styles = parser.parse(UA_STYLESHEET).unwrap_or_else(|err| {
            tracing::warn!("user-agent stylesheet failed to parse: {err}");
            Stylesheet::new()
        });
        Self {
            ua_styles,
            author_styles: Vec::new(),
            parser,
        }
    }

    /// Resolver with every `<style>` element of the document loaded
    pub fn for_tree(tree: &DomTree) -> Self {
        let mut resolver = Self::new();
        for node in tree.descendants(tree.root()) {
            if !tree.has_tag(node, "style") {
                continue;
            }
            match resolver.parser.parse(&tree.text_content(node)) {
                Ok(sheet) => resolver.add_stylesheet(sheet),
                Err(err) => tracing::debug!("ignoring <style> element: {err}"),
            }
        }
        tracing::debug!("style resolver loaded {} author sheet(s)", resolver.author_styles.len());
        resolver
    }

    /// Add an author stylesheet
    pub fn add_stylesheet(&mut self, stylesheet: Stylesheet) {
        self.author_styles.push(stylesheet);
    }

    /// Compute styles for a node given its parent's computed style
    ///
    /// Non-element nodes only inherit.
    pub fn compute_style(
        &self,
        tree: &DomTree,
        node_id: NodeId,
        parent: Option<&ComputedStyle>,
    ) -> ComputedStyle {
        let mut style = parent.map(ComputedStyle::inherit_from).unwrap_or_default();
        if !tree.is_element(node_id) {
            return style;
        }

        let inline = tree
            .attribute(node_id, "style")
            .map(|s| self.parser.parse_inline(s))
            .unwrap_or_default();

        // (declaration, importance, origin, specificity, source order)
        let mut matches: Vec<(&Declaration, bool, Origin, Specificity, usize)> = Vec::new();
        let mut order = 0;

        let sheets = std::iter::once((Origin::UserAgent, &self.ua_styles))
            .chain(self.author_styles.iter().map(|s| (Origin::Author, s)));
        for (origin, sheet) in sheets {
            for rule in &sheet.rules {
                order += 1;
                let Some(specificity) = rule.selectors.matching_specificity(tree, node_id) else {
                    continue;
                };
                for decl in &rule.declarations {
                    matches.push((decl, decl.important, origin, specificity, order));
                }
            }
        }

        order += 1;
        for decl in &inline {
            matches.push((decl, decl.important, Origin::Inline, Specificity::default(), order));
        }

        // Later entries win
        matches.sort_by_key(|&(_, important, origin, specificity, order)| {
            (important, origin, specificity, order)
        });
        for (decl, ..) in matches {
            style.apply_declaration(decl);
        }

        style
    }
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{Display, Visibility};

    fn tree_with(tag: &str, attrs: &[(&str, &str)]) -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        tree.append_child(tree.root(), html).unwrap();
        let el = tree.create_element(tag);
        for (k, v) in attrs {
            tree.set_attribute(el, k, v).unwrap();
        }
        tree.append_child(html, el).unwrap();
        (tree, el)
    }

    #[test]
    fn test_ua_defaults() {
        let resolver = StyleResolver::new();
        let (tree, script) = tree_with("script", &[]);
        assert_eq!(resolver.compute_style(&tree, script, None).display, Display::None);
        let (tree, div) = tree_with("div", &[]);
        assert_eq!(resolver.compute_style(&tree, div, None).display, Display::Block);
        let (tree, span) = tree_with("span", &[("hidden", "")]);
        assert_eq!(resolver.compute_style(&tree, span, None).display, Display::None);
    }

    #[test]
    fn test_specificity_and_inline_order() {
        let mut resolver = StyleResolver::new();
        resolver.add_stylesheet(
            CssParser::new()
                .parse("#x { display: none } div { display: flex } .c { opacity: 0.5 }")
                .unwrap(),
        );
        let (tree, div) = tree_with("div", &[("id", "x"), ("class", "c"), ("style", "opacity: 1")]);
        let style = resolver.compute_style(&tree, div, None);
        assert_eq!(style.display, Display::None);
        assert_eq!(style.opacity, 1.0);
    }

    #[test]
    fn test_important_beats_inline() {
        let mut resolver = StyleResolver::new();
        resolver.add_stylesheet(CssParser::new().parse("p { visibility: hidden !important }").unwrap());
        let (tree, p) = tree_with("p", &[("style", "visibility: visible")]);
        assert_eq!(resolver.compute_style(&tree, p, None).visibility, Visibility::Hidden);
    }
}
