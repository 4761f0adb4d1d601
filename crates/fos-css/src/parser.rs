//! CSS Parser using lightningcss
//!
//! Parses stylesheets and inline `style` attributes into our internal
//! representation.

use lightningcss::declaration::DeclarationBlock;
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use lightningcss::traits::ToCss;

use crate::{CssError, Declaration, Rule, SelectorList, Stylesheet};

/// CSS Parser
pub struct CssParser;

impl CssParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a CSS stylesheet
    ///
    /// Rules whose selectors the matcher cannot evaluate are dropped.
    /// Conditional group rules (`@media`, `@supports`) are not applied.
    pub fn parse(&self, css: &str) -> Result<Stylesheet, CssError> {
        let options = ParserOptions {
            error_recovery: true,
            ..ParserOptions::default()
        };

        let stylesheet = StyleSheet::parse(css, options).map_err(|e| CssError::ParseError {
            line: 0,
            message: format!("{:?}", e),
        })?;

        let mut result = Stylesheet::new();
        for rule in stylesheet.rules.0.iter() {
            if let CssRule::Style(style_rule) = rule {
                let Ok(selector_text) = style_rule.selectors.to_css_string(PrinterOptions::default()) else {
                    continue;
                };
                let selectors = match SelectorList::parse(&selector_text) {
                    Ok(list) => list,
                    Err(err) => {
                        tracing::debug!("skipping rule: {err}");
                        continue;
                    }
                };
                result.rules.push(Rule {
                    selectors,
                    declarations: self.convert_declarations(&style_rule.declarations),
                });
            }
        }

        Ok(result)
    }

    /// Parse the contents of a `style` attribute
    pub fn parse_inline(&self, style: &str) -> Vec<Declaration> {
        match DeclarationBlock::parse_string(style, ParserOptions::default()) {
            Ok(block) => self.convert_declarations(&block),
            Err(err) => {
                tracing::trace!("ignoring inline style {style:?}: {err:?}");
                Vec::new()
            }
        }
    }

    fn convert_declarations(&self, declarations: &DeclarationBlock) -> Vec<Declaration> {
        let normal = declarations
            .declarations
            .iter()
            .filter_map(|p| self.convert_declaration(p, false));
        let important = declarations
            .important_declarations
            .iter()
            .filter_map(|p| self.convert_declaration(p, true));
        normal.chain(important).collect()
    }

    fn convert_declaration(&self, property: &Property, important: bool) -> Option<Declaration> {
        let value = property.value_to_css_string(PrinterOptions::default()).ok()?;
        Some(Declaration {
            property: property.property_id().name().to_ascii_lowercase(),
            value,
            important,
        })
    }
}

impl Default for CssParser {
    fn default() -> Self {
        Self::new()
    }
}
