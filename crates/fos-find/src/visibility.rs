//! Visibility oracle
//!
//! Decides whether an element is meaningfully visible from its computed
//! style and an injected layout probe. Verdicts are memoized, so an oracle
//! must not outlive the search pass it was built for.

use std::collections::HashMap;

use fos_css::{ComputedStyle, Display, Length, LengthUnit, StyleResolver};
use fos_dom::{Document, DomTree, NodeId};

/// Border-box size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero width and zero height
    pub fn is_zero(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}

/// Source of element box sizes
pub trait LayoutProbe {
    fn size(&self, tree: &DomTree, resolver: &StyleResolver, element: NodeId, style: &ComputedStyle) -> Size;
}

/// Elements that have a box without any text content
const REPLACED_ELEMENTS: &[&str] = &[
    "img", "input", "textarea", "select", "button", "video", "canvas", "iframe", "svg", "hr",
    "embed", "object",
];

/// Approximate character advance and line height
const CHAR_WIDTH: f32 = 8.0;
const LINE_HEIGHT: f32 = 16.0;

/// Layout probe for documents without a layout engine
///
/// Explicit `width`/`height` win; otherwise the box is sized by content:
/// replaced elements and elements with non-whitespace text are non-empty.
/// Subtrees with `display: none` add nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleLayoutProbe;

impl LayoutProbe for StyleLayoutProbe {
    fn size(&self, tree: &DomTree, resolver: &StyleResolver, element: NodeId, style: &ComputedStyle) -> Size {
        let explicit = |length: Option<Length>| length.map(length_to_px);
        match (explicit(style.width), explicit(style.height)) {
            (Some(width), Some(height)) => Size::new(width, height),
            (width, height) => {
                let content = content_size(tree, resolver, element);
                Size::new(width.unwrap_or(content.width), height.unwrap_or(content.height))
            }
        }
    }
}

fn length_to_px(length: Length) -> f32 {
    let factor = match length.unit {
        LengthUnit::Px => 1.0,
        LengthUnit::Em | LengthUnit::Rem => 16.0,
        LengthUnit::Pt => 4.0 / 3.0,
        LengthUnit::Ch => CHAR_WIDTH,
        // Relative to a container we do not lay out; only zero matters
        LengthUnit::Percent | LengthUnit::Vw | LengthUnit::Vh => 1.0,
    };
    (length.value * factor).max(0.0)
}

fn content_size(tree: &DomTree, resolver: &StyleResolver, element: NodeId) -> Size {
    if tree
        .tag_name(element)
        .is_some_and(|tag| REPLACED_ELEMENTS.contains(&tag))
    {
        return Size::new(100.0, 20.0);
    }

    let mut chars = 0usize;
    let mut replaced = false;
    let mut stack: Vec<NodeId> = tree.child_ids(element).collect();
    stack.reverse();
    while let Some(node) = stack.pop() {
        if let Some(text) = tree.text(node) {
            chars += text.chars().filter(|c| !c.is_whitespace()).count();
            continue;
        }
        if !tree.is_element(node) {
            continue;
        }
        // display does not inherit
        if resolver.compute_style(tree, node, None).is_display_none() {
            continue;
        }
        if tree.tag_name(node).is_some_and(|tag| REPLACED_ELEMENTS.contains(&tag)) {
            replaced = true;
        }
        let start = stack.len();
        stack.extend(tree.child_ids(node));
        stack[start..].reverse();
    }
    if chars == 0 && !replaced {
        return Size::default();
    }
    Size::new((chars as f32 * CHAR_WIDTH).max(if replaced { 100.0 } else { 0.0 }), LINE_HEIGHT)
}

/// Memoizing visibility predicate over one document snapshot
pub struct VisibilityOracle<'a, P: LayoutProbe = StyleLayoutProbe> {
    tree: &'a DomTree,
    /// Ancestor walks stop below this node (the body)
    stop_at: NodeId,
    resolver: StyleResolver,
    probe: P,
    styles: HashMap<NodeId, ComputedStyle>,
    sizes: HashMap<NodeId, Size>,
    /// Whether the element and its ancestors below `stop_at` pass
    rendered: HashMap<NodeId, bool>,
}

impl<'a> VisibilityOracle<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self::with_probe(document, StyleLayoutProbe)
    }
}

impl<'a, P: LayoutProbe> VisibilityOracle<'a, P> {
    pub fn with_probe(document: &'a Document, probe: P) -> Self {
        let tree = document.tree();
        Self {
            tree,
            stop_at: document.body(),
            resolver: StyleResolver::for_tree(tree),
            probe,
            styles: HashMap::new(),
            sizes: HashMap::new(),
            rendered: HashMap::new(),
        }
    }

    /// Whether `node` (or, for text, its parent element) is visible
    ///
    /// Every element from the target up to the body must be displayed,
    /// visible, opaque, unclipped and not collapsed to zero size unless
    /// inline. The target itself must have a size or be inline.
    pub fn is_visible(&mut self, node: NodeId) -> bool {
        let Some(element) = self.tree.owning_element(node) else {
            return false;
        };
        if !self.is_rendered(element) {
            return false;
        }
        let Some(display) = self.computed_style(element).map(|s| s.display) else {
            return false;
        };
        display == Display::Inline || !self.size(element).is_zero()
    }

    /// Ancestor half of [`is_visible`](Self::is_visible): the element and
    /// every ancestor below the body pass the style and size checks
    pub fn is_rendered(&mut self, element: NodeId) -> bool {
        let mut pending = Vec::new();
        let mut verdict = true;
        let mut cursor = Some(element);
        while let Some(node) = cursor {
            if node == self.stop_at {
                break;
            }
            if let Some(&cached) = self.rendered.get(&node) {
                verdict = cached;
                break;
            }
            pending.push(node);
            cursor = self.tree.parent_element(node);
        }

        for node in pending.into_iter().rev() {
            verdict = verdict && self.passes_own_checks(node);
            self.rendered.insert(node, verdict);
        }
        verdict
    }

    /// Computed style of an element, `None` for other nodes
    pub fn computed_style(&mut self, element: NodeId) -> Option<&ComputedStyle> {
        if !self.tree.is_element(element) {
            return None;
        }
        self.ensure_style(element);
        self.styles.get(&element)
    }

    fn ensure_style(&mut self, element: NodeId) {
        if self.styles.contains_key(&element) {
            return;
        }
        let mut chain = vec![element];
        let mut cursor = element;
        while let Some(parent) = self.tree.parent_element(cursor) {
            if self.styles.contains_key(&parent) {
                break;
            }
            chain.push(parent);
            cursor = parent;
        }
        for node in chain.into_iter().rev() {
            let parent_style = self.tree.parent_element(node).and_then(|p| self.styles.get(&p));
            let style = self.resolver.compute_style(self.tree, node, parent_style);
            self.styles.insert(node, style);
        }
    }

    fn size(&mut self, element: NodeId) -> Size {
        if let Some(&size) = self.sizes.get(&element) {
            return size;
        }
        self.ensure_style(element);
        let size = match self.styles.get(&element) {
            Some(style) => self.probe.size(self.tree, &self.resolver, element, style),
            None => Size::default(),
        };
        self.sizes.insert(element, size);
        size
    }

    fn passes_own_checks(&mut self, element: NodeId) -> bool {
        self.ensure_style(element);
        let Some(style) = self.styles.get(&element) else {
            return false;
        };
        if style.is_display_none() || style.is_visibility_hidden() || style.opacity <= 0.0 {
            tracing::trace!("{element:?} hidden by style");
            return false;
        }
        if clip_hides(style) {
            tracing::trace!("{element:?} clipped away");
            return false;
        }
        let sized_by_content = style.display.is_inline_level() || style.display == Display::Contents;
        if !sized_by_content && self.size(element).is_zero() {
            tracing::trace!("{element:?} has an empty box");
            return false;
        }
        true
    }
}

/// Whether `clip-path` or `clip` removes the whole box
pub fn clip_hides(style: &ComputedStyle) -> bool {
    style.clip_path.as_deref().is_some_and(clip_path_hides)
        || style.clip.as_deref().is_some_and(clip_rect_hides)
}

/// Split `name(args)` into its lower-cased parts
fn function_args(value: &str) -> Option<(String, String)> {
    let value = value.trim().to_ascii_lowercase();
    let open = value.find('(')?;
    let close = value.rfind(')')?;
    (close > open).then(|| (value[..open].trim().to_string(), value[open + 1..close].to_string()))
}

fn clip_path_hides(value: &str) -> bool {
    let Some((function, args)) = function_args(value) else {
        return false;
    };
    match function.as_str() {
        "inset" => {
            let insets: Option<Vec<f32>> = args
                .split_whitespace()
                .take_while(|token| *token != "round")
                .map(percentage)
                .collect();
            let Some(insets) = insets else {
                return false;
            };
            let [top, right, bottom, left] = match insets[..] {
                [all] => [all; 4],
                [vertical, horizontal] => [vertical, horizontal, vertical, horizontal],
                [top, horizontal, bottom] => [top, horizontal, bottom, horizontal],
                [top, right, bottom, left] => [top, right, bottom, left],
                _ => return false,
            };
            top + bottom >= 100.0 || left + right >= 100.0
        }
        "circle" | "ellipse" => {
            let radii = args.split(" at ").next().unwrap_or("");
            radii.split_whitespace().any(|r| Length::parse(r).is_some_and(|l| l.is_zero()))
        }
        "polygon" => {
            let points: Vec<String> = args
                .split(',')
                .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|p| !matches!(p.as_str(), "nonzero" | "evenodd"))
                .collect();
            points.first().is_some_and(|first| points.iter().all(|p| p == first))
        }
        _ => false,
    }
}

/// `N%`, or a unitless zero
fn percentage(token: &str) -> Option<f32> {
    match token.strip_suffix('%') {
        Some(number) => number.parse().ok(),
        None => Length::parse(token).filter(Length::is_zero).map(|_| 0.0),
    }
}

/// Legacy `clip: rect(top, right, bottom, left)` with no area
fn clip_rect_hides(value: &str) -> bool {
    let Some((function, args)) = function_args(value) else {
        return false;
    };
    if function != "rect" {
        return false;
    }
    let edges: Option<Vec<f32>> = args
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| Length::parse(t).map(length_to_px))
        .collect();
    match edges.as_deref() {
        Some(&[top, right, bottom, left]) => right <= left || bottom <= top,
        _ => false,
    }
}
