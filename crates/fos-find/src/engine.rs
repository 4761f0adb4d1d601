//! Match engine
//!
//! Runs one search pass per query and owns the resulting collection and
//! cursor. Every search is a fresh traversal; nothing is cached between
//! calls.

use std::collections::HashMap;

use fos_css::{SelectorList, query_selector_all};
use fos_dom::{Document, DomTree, NodeId, Range, XPathNode, xpath};

use crate::config::FindConfig;
use crate::matches::{EditableMatch, ElementMatch, FieldMatch, Match, MatchCollection, TextMatch};
use crate::mode::{self, SearchMode, compile_regex, looks_like_css_selector};
use crate::options::SearchOptions;
use crate::pattern::{Hit, TextPattern};
use crate::visibility::VisibilityOracle;
use crate::walker::{self, EditableField, ExclusionPolicy};
use crate::error::FindError;

/// Characters of node text kept in XPath match descriptions
const DESCRIPTION_CHARS: usize = 50;

/// Find engine: query in, ordered matches and a cursor out
#[derive(Debug, Default)]
pub struct FindEngine {
    config: FindConfig,
    query: String,
    options: SearchOptions,
    mode: Option<SearchMode>,
    matches: MatchCollection,
    last_error: Option<FindError>,
}

impl FindEngine {
    pub fn new(config: FindConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &FindConfig {
        &self.config
    }

    /// Search `document` for `query`, replacing the previous results
    ///
    /// Query errors do not fail the call: they leave the collection empty
    /// and are reported by [`last_error`](Self::last_error).
    pub fn search(&mut self, document: &Document, query: &str, options: SearchOptions) -> &MatchCollection {
        self.clear();
        self.query = query.to_string();
        self.options = options;
        if query.is_empty() {
            return &self.matches;
        }

        let detection = mode::detect(query);
        let mut pass = SearchPass::new(document, &self.config, &self.options);
        let outcome = match detection.mode {
            SearchMode::Text | SearchMode::Mixed => pass.text_query(&detection.pattern, query),
            SearchMode::Regex => match detection.error {
                Some(err) => Err(err),
                None => pass.regex_query(&detection.pattern, &detection.flags),
            },
            SearchMode::Css => pass.css_query(&detection.pattern).map(|()| SearchMode::Css),
            SearchMode::XPath => pass.xpath_query(&detection.pattern).map(|()| SearchMode::XPath),
        };

        match outcome {
            Ok(mode) => self.mode = Some(mode),
            Err(err) => {
                tracing::debug!("query {query:?} failed: {err}");
                self.mode = Some(detection.mode);
                self.last_error = Some(err);
            }
        }

        let (matches, limit_reached) = pass.finish();
        if limit_reached {
            tracing::debug!("match limit of {} reached", self.config.max_matches);
        }
        self.matches = MatchCollection::from_matches(matches, limit_reached);
        tracing::debug!(
            "{} search for {query:?}: {} match(es)",
            self.mode.map_or("?", |m| m.label()),
            self.matches.len()
        );
        &self.matches
    }

    /// Advance to the next match, wrapping around
    pub fn next_match(&mut self) -> Option<&Match> {
        self.matches.next()
    }

    /// Go back to the previous match, wrapping around
    pub fn previous_match(&mut self) -> Option<&Match> {
        self.matches.previous()
    }

    pub fn current_match(&self) -> Option<&Match> {
        self.matches.current()
    }

    /// Cursor position, `None` when there are no matches
    pub fn current_index(&self) -> Option<usize> {
        self.matches.current_index()
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn matches(&self) -> &MatchCollection {
        &self.matches
    }

    /// Reset to the state before any search
    pub fn clear(&mut self) {
        self.query.clear();
        self.options = SearchOptions::default();
        self.mode = None;
        self.matches = MatchCollection::new();
        self.last_error = None;
    }

    pub fn last_error(&self) -> Option<&FindError> {
        self.last_error.as_ref()
    }

    pub fn was_match_limit_reached(&self) -> bool {
        self.matches.limit_reached()
    }

    /// Mode of the last non-empty query
    pub fn search_mode(&self) -> Option<SearchMode> {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Status line, e.g. "3 of 10"
    pub fn status_text(&self) -> String {
        if self.query.is_empty() {
            String::new()
        } else if let Some(err) = &self.last_error {
            err.to_string()
        } else if self.matches.is_empty() {
            "No matches".to_string()
        } else {
            let current = self.matches.current_index().map_or(0, |i| i + 1);
            let more = if self.matches.limit_reached() { "+" } else { "" };
            format!("{} of {}{}", current, self.matches.len(), more)
        }
    }
}

/// State of one traversal: the capped match sink and the memoized oracle
struct SearchPass<'a> {
    document: &'a Document,
    tree: &'a DomTree,
    options: &'a SearchOptions,
    policy: ExclusionPolicy,
    oracle: VisibilityOracle<'a>,
    max_matches: usize,
    matches: Vec<Match>,
    limit_reached: bool,
}

impl<'a> SearchPass<'a> {
    fn new(document: &'a Document, config: &FindConfig, options: &'a SearchOptions) -> Self {
        Self {
            document,
            tree: document.tree(),
            options,
            policy: ExclusionPolicy {
                search_hidden: options.includes_hidden(),
                skip_editing_hosts: options.searches_fields(),
                ui_root_id: config.ui_root_id.clone(),
            },
            oracle: VisibilityOracle::new(document),
            max_matches: config.max_matches,
            matches: Vec::new(),
            limit_reached: false,
        }
    }

    fn finish(self) -> (Vec<Match>, bool) {
        (self.matches, self.limit_reached)
    }

    /// Add a match unless the cap is reached; returns whether to go on
    fn push(&mut self, m: Match) -> bool {
        if self.matches.len() >= self.max_matches {
            self.limit_reached = true;
            return false;
        }
        self.matches.push(m);
        true
    }

    /// Where text traversal starts
    fn body(&self) -> NodeId {
        let body = self.document.body();
        if body.is_valid() { body } else { self.tree.root() }
    }

    fn text_query(&mut self, pattern: &str, query: &str) -> Result<SearchMode, FindError> {
        let mut mode = SearchMode::Text;
        if self.options.searches_page_text() && looks_like_css_selector(query) {
            if let Ok(selectors) = SelectorList::parse(query.trim()) {
                tracing::debug!("{query:?} is also a selector, adding element matches");
                self.select_elements(&selectors);
                mode = SearchMode::Mixed;
            }
        }
        let pattern = TextPattern::literal(pattern, self.options.case_sensitive, self.options.whole_word)?;
        self.run_text_passes(&pattern);
        Ok(mode)
    }

    fn regex_query(&mut self, pattern: &str, flags: &str) -> Result<SearchMode, FindError> {
        let regex = compile_regex(pattern, flags)?;
        self.run_text_passes(&TextPattern::Regex(regex));
        Ok(SearchMode::Regex)
    }

    fn run_text_passes(&mut self, pattern: &TextPattern) {
        if self.options.searches_page_text() {
            self.page_text_pass(pattern);
        }
        if self.options.searches_fields() && !self.limit_reached {
            self.field_pass(pattern);
        }
    }

    fn page_text_pass(&mut self, pattern: &TextPattern) {
        let tree = self.tree;
        let nodes = walker::text_nodes(tree, self.body(), &self.policy, &mut self.oracle);
        tracing::debug!("scanning {} text node(s)", nodes.len());
        for node in nodes {
            let Some(text) = tree.text(node) else { continue };
            let finished = pattern.scan(text, |hit| {
                let m = TextMatch {
                    node,
                    range: Range::in_text(node, hit.start, hit.end),
                    text: text[hit.start..hit.end].to_string(),
                    groups: hit.groups,
                };
                self.push(if pattern.is_regex() { Match::Regex(m) } else { Match::Text(m) })
            });
            if !finished {
                return;
            }
        }
    }

    fn field_pass(&mut self, pattern: &TextPattern) {
        let tree = self.tree;
        let fields = walker::editable_fields(tree, self.body(), &self.policy, &mut self.oracle);
        tracing::debug!("scanning {} editable field(s)", fields.len());
        for field in fields {
            let finished = match field {
                EditableField::Input(element) | EditableField::Textarea(element) => {
                    let value = tree.form_value(element).unwrap_or_default();
                    let textarea = matches!(field, EditableField::Textarea(_));
                    pattern.scan(&value, |hit| {
                        let m = field_match(element, &value, hit);
                        self.push(if textarea { Match::Textarea(m) } else { Match::Input(m) })
                    })
                }
                EditableField::Host(host) => self.host_pass(pattern, host),
            };
            if !finished {
                return;
            }
        }
    }

    /// Scan a `contenteditable` host node by node
    fn host_pass(&mut self, pattern: &TextPattern, host: NodeId) -> bool {
        let tree = self.tree;
        let policy = ExclusionPolicy {
            skip_editing_hosts: false,
            ..self.policy.clone()
        };
        let offsets: HashMap<NodeId, usize> = walker::text_offsets(tree, host).into_iter().collect();
        for node in walker::text_nodes(tree, host, &policy, &mut self.oracle) {
            let Some(text) = tree.text(node) else { continue };
            let base = offsets.get(&node).copied().unwrap_or_default();
            let finished = pattern.scan(text, |hit| {
                self.push(Match::ContentEditable(EditableMatch {
                    host,
                    node,
                    range: Range::in_text(node, hit.start, hit.end),
                    host_offset: base + hit.start,
                    text: text[hit.start..hit.end].to_string(),
                    groups: hit.groups,
                }))
            });
            if !finished {
                return false;
            }
        }
        true
    }

    fn css_query(&mut self, pattern: &str) -> Result<(), FindError> {
        if pattern.is_empty() {
            return Ok(());
        }
        let selectors = SelectorList::parse(pattern).map_err(|e| FindError::InvalidSelector(e.to_string()))?;
        self.select_elements(&selectors);
        Ok(())
    }

    fn select_elements(&mut self, selectors: &SelectorList) {
        let tree = self.tree;
        for element in query_selector_all(tree, tree.root(), selectors) {
            if self.policy.excludes_element(tree, &mut self.oracle, element) {
                continue;
            }
            let m = ElementMatch {
                element,
                node: XPathNode::Node(element),
                text: describe_element(tree, element),
            };
            if !self.push(Match::Css(m)) {
                return;
            }
        }
    }

    fn xpath_query(&mut self, pattern: &str) -> Result<(), FindError> {
        if pattern.is_empty() {
            return Ok(());
        }
        let tree = self.tree;
        let nodes =
            xpath::evaluate(tree, pattern, self.body()).map_err(|e| FindError::InvalidXPath(e.to_string()))?;
        for node in nodes {
            let owner = match &node {
                XPathNode::Node(id) => tree.owning_element(*id),
                XPathNode::Attribute { owner, .. } => Some(*owner),
            };
            let Some(element) = owner else { continue };
            if self.policy.excludes_element(tree, &mut self.oracle, element) {
                continue;
            }
            let text = describe_node(tree, &node);
            if !self.push(Match::XPath(ElementMatch { element, node, text })) {
                break;
            }
        }
        Ok(())
    }
}

fn field_match(element: NodeId, value: &str, hit: Hit) -> FieldMatch {
    FieldMatch {
        element,
        start: hit.start,
        end: hit.end,
        text: value[hit.start..hit.end].to_string(),
        groups: hit.groups,
    }
}

/// `tag#id.class1.class2`
pub fn describe_element(tree: &DomTree, element: NodeId) -> String {
    let mut label = tree.tag_name(element).unwrap_or_default().to_string();
    if let Some(id) = tree.attribute(element, "id").filter(|id| !id.is_empty()) {
        label.push('#');
        label.push_str(id);
    }
    for class in tree.classes(element) {
        label.push('.');
        label.push_str(class);
    }
    label
}

/// Element signature, quoted text, or `@name="value"`
pub fn describe_node(tree: &DomTree, node: &XPathNode) -> String {
    match node {
        XPathNode::Attribute { name, value, .. } => format!("@{name}=\"{value}\""),
        XPathNode::Node(id) if tree.is_element(*id) => describe_element(tree, *id),
        XPathNode::Node(_) => format!("\"{}\"", truncate(node.string_value(tree).trim(), DESCRIPTION_CHARS)),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
