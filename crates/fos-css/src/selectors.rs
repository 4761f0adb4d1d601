//! CSS Selectors Module
//!
//! Selector model, specificity and matching against the DOM tree.

use fos_dom::{DomTree, NodeId};

use crate::selector_parser;
use crate::{CssError, Specificity};

/// Pseudo-element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoElement {
    /// ::before - content before element
    Before,
    /// ::after - content after element
    After,
    /// ::first-line - first line of text
    FirstLine,
    /// ::first-letter - first letter of text
    FirstLetter,
    /// ::marker - list marker
    Marker,
    /// ::selection - selected text
    Selection,
    /// ::placeholder - input placeholder
    Placeholder,
    /// ::backdrop - fullscreen backdrop
    Backdrop,
}

impl PseudoElement {
    /// Parse from a name without colons
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            "first-line" => Some(Self::FirstLine),
            "first-letter" => Some(Self::FirstLetter),
            "marker" => Some(Self::Marker),
            "selection" => Some(Self::Selection),
            "placeholder" => Some(Self::Placeholder),
            "backdrop" => Some(Self::Backdrop),
            _ => None,
        }
    }

    /// Pseudo-elements that CSS2 also allowed with a single colon
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            Self::Before | Self::After | Self::FirstLine | Self::FirstLetter
        )
    }
}

/// Pseudo-class type
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    // Link pseudo-classes
    Link,
    AnyLink,
    Visited,

    // User action pseudo-classes
    Hover,
    Active,
    Focus,
    FocusVisible,
    FocusWithin,
    Target,

    // Input pseudo-classes
    Enabled,
    Disabled,
    Checked,
    Required,
    Optional,
    ReadOnly,
    ReadWrite,
    PlaceholderShown,

    // Tree-structural pseudo-classes
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    NthChild(NthExpression),
    NthLastChild(NthExpression),
    NthOfType(NthExpression),
    NthLastOfType(NthExpression),

    // Logical pseudo-classes
    Not(SelectorList),
    Is(SelectorList),
    Where(SelectorList),
    Has(SelectorList),
}

impl PseudoClass {
    /// Parse a non-functional pseudo-class name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "link" => Self::Link,
            "any-link" => Self::AnyLink,
            "visited" => Self::Visited,
            "hover" => Self::Hover,
            "active" => Self::Active,
            "focus" => Self::Focus,
            "focus-visible" => Self::FocusVisible,
            "focus-within" => Self::FocusWithin,
            "target" => Self::Target,
            "enabled" => Self::Enabled,
            "disabled" => Self::Disabled,
            "checked" => Self::Checked,
            "required" => Self::Required,
            "optional" => Self::Optional,
            "read-only" => Self::ReadOnly,
            "read-write" => Self::ReadWrite,
            "placeholder-shown" => Self::PlaceholderShown,
            "root" => Self::Root,
            "empty" => Self::Empty,
            "first-child" => Self::FirstChild,
            "last-child" => Self::LastChild,
            "only-child" => Self::OnlyChild,
            "first-of-type" => Self::FirstOfType,
            "last-of-type" => Self::LastOfType,
            "only-of-type" => Self::OnlyOfType,
            _ => return None,
        })
    }
}

/// An+B expression for :nth-* selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthExpression {
    /// Coefficient (A in An+B)
    pub a: i32,
    /// Offset (B in An+B)
    pub b: i32,
}

impl NthExpression {
    /// Create "odd" expression (2n+1)
    pub fn odd() -> Self {
        Self { a: 2, b: 1 }
    }

    /// Create "even" expression (2n)
    pub fn even() -> Self {
        Self { a: 2, b: 0 }
    }

    /// Create An+B expression
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Parse from string like "2n+1", "odd", "even", "3", "-n+3"
    pub fn parse(s: &str) -> Option<Self> {
        let s: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        match s.as_str() {
            "odd" => return Some(Self::odd()),
            "even" => return Some(Self::even()),
            "" => return None,
            _ => {}
        }

        if let Ok(n) = s.parse::<i32>() {
            return Some(Self::new(0, n));
        }

        let n_pos = s.find('n')?;
        let a_str = &s[..n_pos];
        let a = match a_str {
            "" | "+" => 1,
            "-" => -1,
            _ => a_str.parse().ok()?,
        };

        let rest = &s[n_pos + 1..];
        let b = if rest.is_empty() {
            0
        } else {
            // The sign is mandatory between An and B
            if !rest.starts_with(['+', '-']) {
                return None;
            }
            rest.parse().ok()?
        };

        Some(Self::new(a, b))
    }

    /// Check if index n (1-based) matches this expression
    pub fn matches(&self, n: i32) -> bool {
        if self.a == 0 {
            return n == self.b;
        }

        let diff = n - self.b;
        if self.a > 0 {
            diff >= 0 && diff % self.a == 0
        } else {
            diff <= 0 && diff % self.a == 0
        }
    }
}

/// A component of a compound selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Universal selector *
    Universal,
    /// Type selector (tag name, lower-cased)
    Type(String),
    /// ID selector #id
    Id(String),
    /// Class selector .class
    Class(String),
    /// Attribute selector [attr], [attr=value], etc.
    Attribute(AttributeSelector),
    /// Pseudo-class :first-child, :nth-child(), etc.
    PseudoClass(PseudoClass),
    /// Pseudo-element ::before, ::after
    PseudoElement(PseudoElement),
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Contains(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(val) = value else {
            return false;
        };
        let Some(matcher) = &self.matcher else {
            return true;
        };

        let folded;
        let val = if self.case_insensitive {
            folded = val.to_ascii_lowercase();
            folded.as_str()
        } else {
            val
        };
        let norm = |expected: &str| {
            if self.case_insensitive {
                expected.to_ascii_lowercase()
            } else {
                expected.to_string()
            }
        };

        match matcher {
            AttributeMatcher::Exact(expected) => val == norm(expected),
            AttributeMatcher::Contains(expected) => {
                let expected = norm(expected);
                !expected.is_empty() && val.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeMatcher::DashMatch(expected) => {
                let expected = norm(expected);
                val == expected || val.starts_with(&format!("{expected}-"))
            }
            // Empty prefix/suffix/substring never match
            AttributeMatcher::Prefix(expected) => !expected.is_empty() && val.starts_with(&norm(expected)),
            AttributeMatcher::Suffix(expected) => !expected.is_empty() && val.ends_with(&norm(expected)),
            AttributeMatcher::Substring(expected) => !expected.is_empty() && val.contains(&norm(expected)),
        }
    }
}

/// Combinator between two compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    SubsequentSibling,
}

/// A sequence of simple selectors applying to one element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

/// A compound selector chain joined by combinators
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    /// The rightmost compound, which the matched element must satisfy
    pub subject: CompoundSelector,
    /// Compounds to the left of the subject, nearest first, each with the
    /// combinator linking it to the compound on its right
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

impl SelectorList {
    /// Parse a selector list, rejecting anything the matcher cannot evaluate
    pub fn parse(input: &str) -> Result<Self, CssError> {
        selector_parser::parse_selector_list(input)
    }

    /// Whether any selector in the list matches `element`
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        tree.is_element(element) && self.0.iter().any(|s| s.matches(tree, element))
    }

    /// Highest specificity among the selectors that match `element`
    pub fn matching_specificity(&self, tree: &DomTree, element: NodeId) -> Option<Specificity> {
        self.0
            .iter()
            .filter(|s| s.matches(tree, element))
            .map(ComplexSelector::specificity)
            .max()
    }

    /// Highest specificity in the list
    pub fn max_specificity(&self) -> Specificity {
        self.0
            .iter()
            .map(ComplexSelector::specificity)
            .max()
            .unwrap_or_default()
    }
}

impl ComplexSelector {
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        self.subject.matches(tree, element) && self.match_ancestors(tree, element, 0)
    }

    fn match_ancestors(&self, tree: &DomTree, element: NodeId, index: usize) -> bool {
        let Some((combinator, compound)) = self.ancestors.get(index) else {
            return true;
        };
        let check = |candidate: NodeId| {
            compound.matches(tree, candidate) && self.match_ancestors(tree, candidate, index + 1)
        };
        match combinator {
            Combinator::Child => tree.parent_element(element).is_some_and(check),
            Combinator::Descendant => tree
                .ancestors(element)
                .filter(|&a| tree.is_element(a))
                .any(check),
            Combinator::NextSibling => tree.previous_element_sibling(element).is_some_and(check),
            Combinator::SubsequentSibling => {
                std::iter::successors(tree.previous_element_sibling(element), |&s| {
                    tree.previous_element_sibling(s)
                })
                .any(check)
            }
        }
    }

    /// Specificity (ids, classes/attributes/pseudo-classes, types)
    pub fn specificity(&self) -> Specificity {
        std::iter::once(&self.subject)
            .chain(self.ancestors.iter().map(|(_, c)| c))
            .fold(Specificity::default(), |acc, c| acc + c.specificity())
    }
}

impl CompoundSelector {
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        self.components.iter().all(|c| match_component(c, tree, element))
    }

    pub fn specificity(&self) -> Specificity {
        self.components.iter().fold(Specificity::default(), |acc, c| {
            acc + match c {
                SelectorComponent::Universal => Specificity::default(),
                SelectorComponent::Id(_) => Specificity(1, 0, 0),
                SelectorComponent::Class(_) | SelectorComponent::Attribute(_) => Specificity(0, 1, 0),
                SelectorComponent::Type(_) | SelectorComponent::PseudoElement(_) => Specificity(0, 0, 1),
                SelectorComponent::PseudoClass(pseudo) => match pseudo {
                    PseudoClass::Where(_) => Specificity::default(),
                    PseudoClass::Not(list) | PseudoClass::Is(list) | PseudoClass::Has(list) => {
                        list.max_specificity()
                    }
                    _ => Specificity(0, 1, 0),
                },
            }
        })
    }
}

/// Match a selector component against an element
pub fn match_component(component: &SelectorComponent, tree: &DomTree, element: NodeId) -> bool {
    match component {
        SelectorComponent::Universal => tree.is_element(element),
        SelectorComponent::Type(tag) => tree
            .tag_name(element)
            .is_some_and(|t| t.eq_ignore_ascii_case(tag)),
        SelectorComponent::Id(id) => tree.attribute(element, "id") == Some(id.as_str()),
        SelectorComponent::Class(class) => tree.classes(element).any(|c| c == class),
        SelectorComponent::Attribute(attr) => attr.matches(tree.attribute(element, &attr.name)),
        SelectorComponent::PseudoClass(pseudo) => match_pseudo_class(pseudo, tree, element),
        // A selector with a pseudo-element addresses no DOM element
        SelectorComponent::PseudoElement(_) => false,
    }
}

const FORM_CONTROLS: &[&str] = &["button", "input", "select", "textarea", "option", "optgroup", "fieldset"];

/// Match a pseudo-class against an element
pub fn match_pseudo_class(pseudo: &PseudoClass, tree: &DomTree, element: NodeId) -> bool {
    let tag = tree.tag_name(element).unwrap_or("");
    let has = |name: &str| tree.has_attribute(element, name);

    match pseudo {
        // Link pseudo-classes
        PseudoClass::Link | PseudoClass::AnyLink => matches!(tag, "a" | "area") && has("href"),

        // A snapshot has no interaction state
        PseudoClass::Visited
        | PseudoClass::Hover
        | PseudoClass::Active
        | PseudoClass::Focus
        | PseudoClass::FocusVisible
        | PseudoClass::FocusWithin
        | PseudoClass::Target => false,

        // Input pseudo-classes
        PseudoClass::Enabled => FORM_CONTROLS.contains(&tag) && !has("disabled"),
        PseudoClass::Disabled => FORM_CONTROLS.contains(&tag) && has("disabled"),
        PseudoClass::Checked => match tag {
            "input" => {
                let kind = tree.attribute(element, "type").unwrap_or("");
                (kind.eq_ignore_ascii_case("checkbox") || kind.eq_ignore_ascii_case("radio"))
                    && has("checked")
            }
            "option" => has("selected"),
            _ => false,
        },
        PseudoClass::Required => matches!(tag, "input" | "select" | "textarea") && has("required"),
        PseudoClass::Optional => matches!(tag, "input" | "select" | "textarea") && !has("required"),
        PseudoClass::ReadWrite => is_read_write(tree, element),
        PseudoClass::ReadOnly => !is_read_write(tree, element),
        PseudoClass::PlaceholderShown => {
            matches!(tag, "input" | "textarea")
                && has("placeholder")
                && tree.form_value(element).is_none_or(|v| v.is_empty())
        }

        // Tree-structural pseudo-classes
        PseudoClass::Root => tree.parent(element) == Some(tree.root()) && tree.is_element(element),
        PseudoClass::Empty => tree.child_ids(element).all(|c| {
            !tree.is_element(c) && tree.text(c).is_none_or(str::is_empty)
        }),
        PseudoClass::FirstChild => tree.previous_element_sibling(element).is_none(),
        PseudoClass::LastChild => tree.next_element_sibling(element).is_none(),
        PseudoClass::OnlyChild => {
            tree.previous_element_sibling(element).is_none() && tree.next_element_sibling(element).is_none()
        }
        PseudoClass::FirstOfType => sibling_position(tree, element, true, false) == 1,
        PseudoClass::LastOfType => sibling_position(tree, element, true, true) == 1,
        PseudoClass::OnlyOfType => {
            sibling_position(tree, element, true, false) == 1 && sibling_position(tree, element, true, true) == 1
        }
        PseudoClass::NthChild(expr) => expr.matches(sibling_position(tree, element, false, false)),
        PseudoClass::NthLastChild(expr) => expr.matches(sibling_position(tree, element, false, true)),
        PseudoClass::NthOfType(expr) => expr.matches(sibling_position(tree, element, true, false)),
        PseudoClass::NthLastOfType(expr) => expr.matches(sibling_position(tree, element, true, true)),

        // Logical pseudo-classes
        PseudoClass::Not(list) => !list.matches(tree, element),
        PseudoClass::Is(list) | PseudoClass::Where(list) => list.matches(tree, element),
        PseudoClass::Has(list) => tree
            .descendants(element)
            .any(|d| tree.is_element(d) && list.matches(tree, d)),
    }
}

/// 1-based position among element siblings, optionally counting only
/// siblings of the same type and/or counting from the end
fn sibling_position(tree: &DomTree, element: NodeId, same_type: bool, from_end: bool) -> i32 {
    let tag = tree.tag_name(element);
    let step = |n: NodeId| {
        if from_end {
            tree.next_element_sibling(n)
        } else {
            tree.previous_element_sibling(n)
        }
    };
    let preceding = std::iter::successors(step(element), |&n| step(n))
        .filter(|&n| !same_type || tree.tag_name(n) == tag)
        .count();
    preceding as i32 + 1
}

fn is_read_write(tree: &DomTree, element: NodeId) -> bool {
    let has = |name: &str| tree.has_attribute(element, name);
    match tree.tag_name(element) {
        Some("textarea") => !has("readonly") && !has("disabled"),
        Some("input") => {
            let kind = tree.attribute(element, "type").unwrap_or("text").to_ascii_lowercase();
            let textual = matches!(
                kind.as_str(),
                "text" | "search" | "url" | "tel" | "email" | "password" | "number" | "date" | ""
            );
            textual && !has("readonly") && !has("disabled")
        }
        _ => tree.editing_host(element).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_expression() {
        let odd = NthExpression::parse("odd").unwrap();
        assert!(odd.matches(1) && odd.matches(3) && !odd.matches(2));
        let first3 = NthExpression::parse("-n+3").unwrap();
        assert!(first3.matches(1) && first3.matches(3) && !first3.matches(4));
        assert_eq!(NthExpression::parse("2n + 1"), Some(NthExpression::new(2, 1)));
        assert_eq!(NthExpression::parse("2n1"), None);
        assert_eq!(NthExpression::parse("bogus"), None);
    }

    #[test]
    fn test_attribute_matchers() {
        let sel = |matcher, ci| AttributeSelector {
            name: "x".into(),
            matcher: Some(matcher),
            case_insensitive: ci,
        };
        assert!(sel(AttributeMatcher::Exact("a".into()), false).matches(Some("a")));
        assert!(!sel(AttributeMatcher::Exact("a".into()), false).matches(Some("A")));
        assert!(sel(AttributeMatcher::Exact("a".into()), true).matches(Some("A")));
        assert!(sel(AttributeMatcher::Contains("b".into()), false).matches(Some("a b c")));
        assert!(sel(AttributeMatcher::DashMatch("en".into()), false).matches(Some("en-US")));
        assert!(!sel(AttributeMatcher::Prefix("".into()), false).matches(Some("abc")));
        assert!(!sel(AttributeMatcher::Exact("a".into()), false).matches(None));
    }

    #[test]
    fn test_specificity() {
        let list = SelectorList::parse("div#main .item > a:hover").unwrap();
        assert_eq!(list.max_specificity(), Specificity(1, 2, 2));
        let list = SelectorList::parse(":where(#a) p").unwrap();
        assert_eq!(list.max_specificity(), Specificity(0, 0, 1));
    }
}
