//! Replacement and undo
//!
//! Each replacement records what it overwrote so it can be undone,
//! independently of the page's own edit history.

use std::collections::VecDeque;

use fos_css::{ComputedStyle, StyleResolver};
use fos_dom::{
    Document, DomEvent, DomTree, EditCommand, EventDispatcher, NodeId, Range, splice_text,
};
use regex::Regex;

use crate::config::FindConfig;
use crate::error::ReplaceError;
use crate::matches::{EditableMatch, FieldMatch, Match, TextMatch};
use crate::mode::{self, SearchMode, compile_regex};
use crate::options::Scope;
use crate::pattern::Captures;
use crate::walker;

/// How text inside an editing host gets replaced
pub trait EditStrategy {
    fn name(&self) -> &'static str;

    /// Replace the text covered by `range`, a single text node inside `host`
    fn replace_range(
        &self,
        document: &mut Document,
        host: NodeId,
        range: &Range,
        text: &str,
    ) -> Result<(), ReplaceError>;
}

/// Select the range and run the document's `insertText` command, which
/// keeps the page's own undo history and input events intact
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeInsertText;

impl EditStrategy for NativeInsertText {
    fn name(&self) -> &'static str {
        "insertText"
    }

    fn replace_range(
        &self,
        document: &mut Document,
        _host: NodeId,
        range: &Range,
        text: &str,
    ) -> Result<(), ReplaceError> {
        document.select_range(range.clone());
        if document.exec_command(EditCommand::InsertText, Some(text)) {
            Ok(())
        } else {
            Err(ReplaceError::EditRefused)
        }
    }
}

/// Splice the text node directly and announce it with an `input` event
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectRangeEdit;

impl EditStrategy for DirectRangeEdit {
    fn name(&self) -> &'static str {
        "range"
    }

    fn replace_range(
        &self,
        document: &mut Document,
        host: NodeId,
        range: &Range,
        text: &str,
    ) -> Result<(), ReplaceError> {
        splice_text(
            document.tree_mut(),
            range.start_container(),
            range.start_offset(),
            range.end_offset(),
            text,
        )
        .map_err(|err| {
            tracing::debug!("range edit refused: {err}");
            ReplaceError::EditRefused
        })?;
        document.dispatch_event(DomEvent::input(host, "insertReplacementText"));
        Ok(())
    }
}

/// Try `preferred`, then `fallback`
#[derive(Debug, Default, Clone, Copy)]
pub struct WithFallback<P, F> {
    pub preferred: P,
    pub fallback: F,
}

impl<P: EditStrategy, F: EditStrategy> EditStrategy for WithFallback<P, F> {
    fn name(&self) -> &'static str {
        self.preferred.name()
    }

    fn replace_range(
        &self,
        document: &mut Document,
        host: NodeId,
        range: &Range,
        text: &str,
    ) -> Result<(), ReplaceError> {
        match self.preferred.replace_range(document, host, range, text) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(
                    "{} failed ({err}), retrying with {}",
                    self.preferred.name(),
                    self.fallback.name()
                );
                self.fallback.replace_range(document, host, range, text)
            }
        }
    }
}

pub type DefaultEditStrategy = WithFallback<NativeInsertText, DirectRangeEdit>;

/// State overwritten by one replacement
#[derive(Debug, Clone, PartialEq)]
pub enum UndoEntry {
    /// Previous value of an `input` or `textarea`
    Field { element: NodeId, value: String },
    /// Previous markup of an editing host
    Editable { host: NodeId, inner_html: String },
    /// Previous content of a page text node
    Text { node: NodeId, content: String },
}

/// Outcome of [`Replacer::replace_all`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceAllReport {
    pub success_count: usize,
    pub fail_count: usize,
    /// Distinct failure reasons in the order first seen
    pub errors: Vec<ReplaceError>,
}

impl ReplaceAllReport {
    fn record_failure(&mut self, error: ReplaceError) {
        self.fail_count += 1;
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }
}

/// Applies replacements and keeps a bounded undo stack
#[derive(Debug)]
pub struct Replacer<S: EditStrategy = DefaultEditStrategy> {
    strategy: S,
    undo_stack: VecDeque<UndoEntry>,
    undo_limit: usize,
}

impl Replacer {
    pub fn new(undo_limit: usize) -> Self {
        Self::with_strategy(DefaultEditStrategy::default(), undo_limit)
    }

    pub fn from_config(config: &FindConfig) -> Self {
        Self::new(config.undo_limit)
    }
}

impl Default for Replacer {
    fn default() -> Self {
        Self::from_config(&FindConfig::default())
    }
}

impl<S: EditStrategy> Replacer<S> {
    pub fn with_strategy(strategy: S, undo_limit: usize) -> Self {
        Self {
            strategy,
            undo_stack: VecDeque::new(),
            undo_limit,
        }
    }

    /// Check whether `m` can be replaced under `scope`
    pub fn can_replace(&self, document: &Document, m: &Match, scope: Scope) -> Result<(), ReplaceError> {
        check(document.tree(), m, scope, &mut None)
    }

    /// Replace one match
    ///
    /// `$&`, `$1`..`$9` and `$$` in `replacement` expand when the match
    /// carries capture groups.
    pub fn replace_match(
        &mut self,
        document: &mut Document,
        m: &Match,
        replacement: &str,
        scope: Scope,
    ) -> Result<(), ReplaceError> {
        let text = match m.groups() {
            Some(groups) => expand_template(replacement, m.text(), groups),
            None => replacement.to_string(),
        };
        self.apply(document, m, &text, scope, &mut None)
            .inspect_err(|err| tracing::warn!("replace failed: {err}"))
    }

    /// Replace every match, last first so earlier offsets stay valid
    ///
    /// Selector modes select elements and fail every item.
    pub fn replace_all(
        &mut self,
        document: &mut Document,
        matches: &[Match],
        replacement: &str,
        scope: Scope,
        mode: SearchMode,
        original_query: &str,
    ) -> ReplaceAllReport {
        let mut report = ReplaceAllReport::default();
        if mode.is_selector() {
            let reason = match mode {
                SearchMode::XPath => ReplaceError::XPathMatch,
                _ => ReplaceError::CssMatch,
            };
            for _ in matches {
                report.record_failure(reason.clone());
            }
            return report;
        }

        let recapture = (mode == SearchMode::Regex)
            .then(|| {
                let detection = mode::detect(original_query);
                compile_regex(&detection.pattern, &detection.flags).ok()
            })
            .flatten();

        let mut ordered: Vec<&Match> = matches.iter().collect();
        {
            let tree = document.tree();
            ordered.sort_by(|a, b| b.compare_position(a, tree));
        }

        let mut resolver = None;
        for m in ordered {
            let text = match (m.groups(), &recapture) {
                (Some(groups), _) => expand_template(replacement, m.text(), groups),
                (None, Some(regex)) => match recapture_groups(regex, m.text()) {
                    Some(groups) => expand_template(replacement, m.text(), &groups),
                    None => replacement.to_string(),
                },
                (None, None) => replacement.to_string(),
            };
            match self.apply(document, m, &text, scope, &mut resolver) {
                Ok(()) => report.success_count += 1,
                Err(err) => {
                    tracing::warn!("replace failed for {:?} match: {err}", m.kind());
                    report.record_failure(err);
                }
            }
        }

        tracing::info!(
            "replaced {} of {} match(es)",
            report.success_count,
            report.success_count + report.fail_count
        );
        report
    }

    /// Revert the most recent replacement
    pub fn undo(&mut self, document: &mut Document) -> Result<(), ReplaceError> {
        let entry = self.undo_stack.pop_back().ok_or(ReplaceError::NothingToUndo)?;
        let result = restore(document, entry);
        if let Err(err) = &result {
            tracing::warn!("undo failed: {err}");
        }
        result
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear_undo(&mut self) {
        self.undo_stack.clear();
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.undo_limit {
            self.undo_stack.pop_front();
        }
    }

    fn apply(
        &mut self,
        document: &mut Document,
        m: &Match,
        text: &str,
        scope: Scope,
        resolver: &mut Option<StyleResolver>,
    ) -> Result<(), ReplaceError> {
        check(document.tree(), m, scope, resolver)?;
        let entry = match m {
            Match::Input(field) | Match::Textarea(field) => replace_in_field(document, field, text)?,
            Match::ContentEditable(editable) => {
                let range = locate(document.tree(), editable).ok_or(ReplaceError::Stale)?;
                let inner_html = fos_html::inner_html(document.tree(), editable.host);
                self.strategy
                    .replace_range(document, editable.host, &range, text)?;
                UndoEntry::Editable {
                    host: editable.host,
                    inner_html,
                }
            }
            Match::Text(t) | Match::Regex(t) => replace_in_text(document, t, text)?,
            Match::Css(_) => return Err(ReplaceError::CssMatch),
            Match::XPath(_) => return Err(ReplaceError::XPathMatch),
        };
        self.push_undo(entry);
        Ok(())
    }
}

fn check(
    tree: &DomTree,
    m: &Match,
    scope: Scope,
    resolver: &mut Option<StyleResolver>,
) -> Result<(), ReplaceError> {
    match m {
        Match::Css(_) => Err(ReplaceError::CssMatch),
        Match::XPath(_) => Err(ReplaceError::XPathMatch),
        Match::Input(field) | Match::Textarea(field) => {
            if !tree.is_connected(field.element) {
                return Err(ReplaceError::ElementGone);
            }
            if tree.has_attribute(field.element, "readonly") || tree.has_attribute(field.element, "disabled") {
                return Err(ReplaceError::ReadOnly);
            }
            let value = tree.form_value(field.element).ok_or(ReplaceError::ElementGone)?;
            if value.get(field.start..field.end) != Some(field.text.as_str()) {
                return Err(ReplaceError::Stale);
            }
            Ok(())
        }
        Match::ContentEditable(editable) => {
            if !tree.is_connected(editable.host) {
                return Err(ReplaceError::ElementGone);
            }
            if !tree.is_editing_host(editable.host) {
                return Err(ReplaceError::NotEditable);
            }
            locate(tree, editable).map(|_| ()).ok_or(ReplaceError::Stale)
        }
        Match::Text(t) | Match::Regex(t) => {
            if scope == Scope::Input {
                return Err(ReplaceError::NotEditable);
            }
            if !tree.is_connected(t.node) {
                return Err(ReplaceError::NodeGone);
            }
            if t.range.text(tree) != Some(t.text.as_str()) {
                return Err(ReplaceError::Stale);
            }
            if scope == Scope::Page {
                let resolver = resolver.get_or_insert_with(|| StyleResolver::for_tree(tree));
                if !is_displayed(resolver, tree, t.node) {
                    return Err(ReplaceError::Hidden);
                }
            }
            Ok(())
        }
    }
}

/// Style-only visibility: no `display: none` on the way up and not
/// `visibility: hidden`
fn is_displayed(resolver: &StyleResolver, tree: &DomTree, node: NodeId) -> bool {
    let Some(element) = tree.owning_element(node) else {
        return false;
    };
    let mut chain: Vec<NodeId> = std::iter::once(element)
        .chain(tree.ancestors(element).filter(|&a| tree.is_element(a)))
        .collect();
    chain.reverse();

    let mut style: Option<ComputedStyle> = None;
    for element in chain {
        let computed = resolver.compute_style(tree, element, style.as_ref());
        if computed.is_display_none() {
            return false;
        }
        style = Some(computed);
    }
    style.is_some_and(|s| !s.is_visibility_hidden())
}

fn replace_in_field(document: &mut Document, field: &FieldMatch, text: &str) -> Result<UndoEntry, ReplaceError> {
    let old = document
        .tree()
        .form_value(field.element)
        .ok_or(ReplaceError::ElementGone)?
        .into_owned();
    let mut value = String::with_capacity(old.len() + text.len());
    value.push_str(&old[..field.start]);
    value.push_str(text);
    value.push_str(&old[field.end..]);

    document
        .tree_mut()
        .set_form_value(field.element, value)
        .map_err(|_| ReplaceError::ElementGone)?;
    document.dispatch_event(DomEvent::input(field.element, "insertReplacementText"));
    document.dispatch_event(DomEvent::change(field.element));
    Ok(UndoEntry::Field {
        element: field.element,
        value: old,
    })
}

fn replace_in_text(document: &mut Document, t: &TextMatch, text: &str) -> Result<UndoEntry, ReplaceError> {
    let edit = splice_text(
        document.tree_mut(),
        t.node,
        t.range.start_offset(),
        t.range.end_offset(),
        text,
    )
    .map_err(|err| {
        tracing::debug!("text splice refused: {err}");
        ReplaceError::Stale
    })?;
    document.dispatch_event(DomEvent::char_data_modified(t.node, &edit.before, &edit.after));
    Ok(UndoEntry::Text {
        node: t.node,
        content: edit.before,
    })
}

/// Range of an editable match, relocated by host offset when its node
/// was replaced
fn locate(tree: &DomTree, m: &EditableMatch) -> Option<Range> {
    if tree.contains(m.host, m.node) && tree.is_connected(m.node) && m.range.text(tree) == Some(m.text.as_str()) {
        return Some(m.range.clone());
    }
    let end = m.host_offset + m.text.len();
    for (node, start) in walker::text_offsets(tree, m.host) {
        let len = tree.text(node).map_or(0, str::len);
        if start <= m.host_offset && end <= start + len {
            let range = Range::in_text(node, m.host_offset - start, end - start);
            return (range.text(tree) == Some(m.text.as_str())).then_some(range);
        }
    }
    None
}

fn restore(document: &mut Document, entry: UndoEntry) -> Result<(), ReplaceError> {
    match entry {
        UndoEntry::Field { element, value } => {
            if !document.tree().is_connected(element) {
                return Err(ReplaceError::ElementGone);
            }
            document
                .tree_mut()
                .set_form_value(element, value)
                .map_err(|_| ReplaceError::ElementGone)?;
            document.dispatch_event(DomEvent::input(element, "historyUndo"));
            document.dispatch_event(DomEvent::change(element));
        }
        UndoEntry::Editable { host, inner_html } => {
            if !document.tree().is_connected(host) {
                return Err(ReplaceError::ElementGone);
            }
            fos_html::set_inner_html(document.tree_mut(), host, &inner_html).map_err(|err| {
                tracing::debug!("restoring markup failed: {err}");
                ReplaceError::ElementGone
            })?;
            document.dispatch_event(DomEvent::input(host, "historyUndo"));
        }
        UndoEntry::Text { node, content } => {
            if !document.tree().is_connected(node) {
                return Err(ReplaceError::NodeGone);
            }
            let old = document.tree().text(node).unwrap_or_default().to_string();
            document
                .tree_mut()
                .set_text(node, content.clone())
                .map_err(|_| ReplaceError::NodeGone)?;
            document.dispatch_event(DomEvent::char_data_modified(node, &old, &content));
        }
    }
    Ok(())
}

fn recapture_groups(regex: &Regex, text: &str) -> Option<Captures> {
    let caps = regex.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|g| g.map(|g| g.as_str().to_string()))
            .collect(),
    )
}

/// Expand `$&`, `$1`..`$9` and `$$` in `template`
///
/// A group that did not participate expands to nothing; a reference past
/// the last group stays literal.
pub fn expand_template(template: &str, whole: &str, groups: &[Option<String>]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('&') => {
                chars.next();
                out.push_str(whole);
            }
            Some(d @ '1'..='9') => {
                let index = d as usize - '1' as usize;
                if index < groups.len() {
                    chars.next();
                    if let Some(Some(group)) = groups.get(index) {
                        out.push_str(group);
                    }
                } else {
                    out.push('$');
                }
            }
            _ => out.push('$'),
        }
    }
    out
}
