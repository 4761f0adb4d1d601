//! fOS CSS Parser & Style System
//!
//! Selector matching, stylesheet parsing and the cascade.

mod cascade;
mod computed;
mod parser;
mod properties;
mod query;
mod selector_parser;
mod selectors;

use std::ops::Add;

pub use cascade::StyleResolver;
pub use computed::ComputedStyle;
pub use parser::CssParser;
pub use properties::{Display, Length, LengthUnit, Visibility, parse_opacity};
pub use query::{closest, matches, query_selector, query_selector_all, select};
pub use selectors::{
    AttributeMatcher, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    NthExpression, PseudoClass, PseudoElement, SelectorComponent, SelectorList,
};

/// Parse a CSS stylesheet
pub fn parse_stylesheet(css: &str) -> Result<Stylesheet, CssError> {
    CssParser::new().parse(css)
}

/// Parsed stylesheet
#[derive(Debug, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// CSS style rule
#[derive(Debug)]
pub struct Rule {
    pub selectors: SelectorList,
    pub declarations: Vec<Declaration>,
}

/// Selector specificity (a, b, c)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Add for Specificity {
    type Output = Specificity;

    fn add(self, rhs: Specificity) -> Specificity {
        Specificity(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Lower-cased property name
    pub property: String,
    /// Serialized value
    pub value: String,
    pub important: bool,
}

/// CSS errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CssError {
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: u32, message: String },

    #[error("'{selector}' is not a valid selector ({reason} at offset {position})")]
    InvalidSelector {
        selector: String,
        position: usize,
        reason: String,
    },
}
