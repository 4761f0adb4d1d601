//! Selector parser
//!
//! Hand-written parser for the selector grammar the matcher supports.
//! Anything outside it is an error rather than a silently ignored part.

use crate::CssError;
use crate::selectors::{
    AttributeMatcher, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    NthExpression, PseudoClass, PseudoElement, SelectorComponent, SelectorList,
};

/// Deepest `:not()`/`:is()`/`:where()`/`:has()` nesting accepted
const MAX_NESTING: usize = 64;

/// Parse a comma-separated selector list
pub(crate) fn parse_selector_list(input: &str) -> Result<SelectorList, CssError> {
    let mut parser = SelectorParser {
        source: input,
        chars: input.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let list = parser.parse_list()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error("unexpected character"));
    }
    Ok(list)
}

struct SelectorParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl SelectorParser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), CssError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    /// Returns whether any whitespace was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, reason: &str) -> CssError {
        CssError::InvalidSelector {
            selector: self.source.to_string(),
            position: self.pos,
            reason: reason.to_string(),
        }
    }

    /// Parse until the end of input or an unbalanced ')'
    fn parse_list(&mut self) -> Result<SelectorList, CssError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            if !self.eat(',') {
                break;
            }
        }
        Ok(SelectorList(selectors))
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, CssError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                None | Some(',') | Some(')') => break,
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.error("unexpected character")),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        let subject = compounds.pop().unwrap_or_default();
        let ancestors = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();
        Ok(ComplexSelector { subject, ancestors })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, CssError> {
        let mut components = Vec::new();

        if self.eat('*') {
            components.push(SelectorComponent::Universal);
        } else if self.starts_ident() {
            components.push(SelectorComponent::Type(self.parse_ident()?.to_ascii_lowercase()));
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    if !self.starts_ident() {
                        return Err(self.error("expected identifier after '#'"));
                    }
                    components.push(SelectorComponent::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.pos += 1;
                    if !self.starts_ident() {
                        return Err(self.error("expected class name after '.'"));
                    }
                    components.push(SelectorComponent::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Attribute(self.parse_attribute()?));
                }
                Some(':') => {
                    self.pos += 1;
                    components.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        if components.is_empty() {
            return Err(self.error("expected selector"));
        }
        Ok(CompoundSelector { components })
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, CssError> {
        self.skip_whitespace();
        if !self.starts_ident() {
            return Err(self.error("expected attribute name"));
        }
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        if self.eat(']') {
            return Ok(AttributeSelector {
                name,
                matcher: None,
                case_insensitive: false,
            });
        }

        let op = match (self.peek(), self.peek_at(1)) {
            (Some('='), _) => {
                self.pos += 1;
                '='
            }
            (Some(c @ ('~' | '|' | '^' | '$' | '*')), Some('=')) => {
                self.pos += 2;
                c
            }
            _ => return Err(self.error("expected attribute operator")),
        };
        self.skip_whitespace();

        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                self.parse_string(q)?
            }
            _ if self.starts_ident() => self.parse_ident()?,
            _ => return Err(self.error("expected attribute value")),
        };
        self.skip_whitespace();

        let mut case_insensitive = false;
        match self.peek() {
            Some('i' | 'I') => {
                case_insensitive = true;
                self.pos += 1;
            }
            Some('s' | 'S') => self.pos += 1,
            _ => {}
        }
        self.skip_whitespace();
        self.expect(']')?;

        let matcher = match op {
            '=' => AttributeMatcher::Exact(value),
            '~' => AttributeMatcher::Contains(value),
            '|' => AttributeMatcher::DashMatch(value),
            '^' => AttributeMatcher::Prefix(value),
            '$' => AttributeMatcher::Suffix(value),
            _ => AttributeMatcher::Substring(value),
        };
        Ok(AttributeSelector {
            name,
            matcher: Some(matcher),
            case_insensitive,
        })
    }

    fn parse_pseudo(&mut self) -> Result<SelectorComponent, CssError> {
        let double = self.eat(':');
        if !self.starts_ident() {
            return Err(self.error("expected pseudo-class name"));
        }
        let name = self.parse_ident()?.to_ascii_lowercase();

        if double {
            return PseudoElement::parse(&name)
                .map(SelectorComponent::PseudoElement)
                .ok_or_else(|| self.error(&format!("unknown pseudo-element '::{name}'")));
        }

        if self.eat('(') {
            let pseudo = match name.as_str() {
                "nth-child" | "nth-last-child" | "nth-of-type" | "nth-last-of-type" => {
                    let arg = self.take_until_close();
                    let expr = NthExpression::parse(&arg)
                        .ok_or_else(|| self.error(&format!("invalid An+B expression '{arg}'")))?;
                    match name.as_str() {
                        "nth-child" => PseudoClass::NthChild(expr),
                        "nth-last-child" => PseudoClass::NthLastChild(expr),
                        "nth-of-type" => PseudoClass::NthOfType(expr),
                        _ => PseudoClass::NthLastOfType(expr),
                    }
                }
                "not" | "is" | "where" | "matches" | "has" => {
                    if self.depth >= MAX_NESTING {
                        return Err(self.error("selector nested too deeply"));
                    }
                    self.depth += 1;
                    let list = self.parse_list()?;
                    self.depth -= 1;
                    match name.as_str() {
                        "not" => PseudoClass::Not(list),
                        "where" => PseudoClass::Where(list),
                        "has" => PseudoClass::Has(list),
                        _ => PseudoClass::Is(list),
                    }
                }
                _ => return Err(self.error(&format!("unsupported pseudo-class ':{name}()'"))),
            };
            self.skip_whitespace();
            self.expect(')')?;
            return Ok(SelectorComponent::PseudoClass(pseudo));
        }

        if let Some(pseudo) = PseudoClass::from_name(&name) {
            return Ok(SelectorComponent::PseudoClass(pseudo));
        }
        match PseudoElement::parse(&name) {
            Some(element) if element.is_legacy() => Ok(SelectorComponent::PseudoElement(element)),
            _ => Err(self.error(&format!("unknown pseudo-class ':{name}'"))),
        }
    }

    /// Raw text up to (not including) the next ')'
    fn take_until_close(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != ')') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn starts_ident(&self) -> bool {
        let is_start = |c: Option<char>| c.is_some_and(|c| c.is_alphabetic() || c == '_' || !c.is_ascii());
        match self.peek() {
            Some('-') => match self.peek_at(1) {
                Some('-') => true,
                Some('\\') => true,
                c => is_start(c),
            },
            Some('\\') => self.peek_at(1).is_some_and(|c| c != '\n'),
            c => is_start(c),
        }
    }

    fn parse_ident(&mut self) -> Result<String, CssError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                out.push(self.parse_escape()?);
            } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(out)
    }

    fn parse_escape(&mut self) -> Result<char, CssError> {
        let mut hex = String::new();
        while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.extend(self.peek());
            self.pos += 1;
        }
        if hex.is_empty() {
            return match self.peek() {
                Some(c) if c != '\n' => {
                    self.pos += 1;
                    Ok(c)
                }
                _ => Err(self.error("invalid escape")),
            };
        }
        // One whitespace character terminates a hex escape
        if self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("invalid escape"))?;
        Ok(char::from_u32(code)
            .filter(|&c| c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn parse_string(&mut self, quote: char) -> Result<String, CssError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.error("unterminated string")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some('\\') => {
                    self.pos += 1;
                    out.push(self.parse_escape()?);
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound_and_combinators() {
        let list = parse_selector_list("div.card > p + span ~ a[href^='http' i]").unwrap();
        assert_eq!(list.0.len(), 1);
        let sel = &list.0[0];
        assert_eq!(sel.ancestors.len(), 3);
        assert_eq!(sel.ancestors[0].0, Combinator::SubsequentSibling);
        assert_eq!(sel.ancestors[2].0, Combinator::Child);
        let SelectorComponent::Attribute(attr) = &sel.subject.components[1] else {
            panic!("expected attribute selector");
        };
        assert!(attr.case_insensitive);
    }

    #[test]
    fn test_parse_lists_and_functional_pseudos() {
        let list = parse_selector_list("li:nth-child(2n+1), p:not(.a, .b) , :is(h1,h2)").unwrap();
        assert_eq!(list.0.len(), 3);
    }

    #[test]
    fn test_parse_escapes() {
        let list = parse_selector_list(r"#foo\:bar").unwrap();
        assert_eq!(
            list.0[0].subject.components[0],
            SelectorComponent::Id("foo:bar".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "div >", "..x", "#1abc", "p[", "a:unknown", "p::nope", "div,", ":nth-child(x)", "p)"] {
            assert!(parse_selector_list(bad).is_err(), "expected error for {bad:?}");
        }
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}p{}", ":not(".repeat(n), ")".repeat(n));
        assert!(parse_selector_list(&nested(MAX_NESTING)).is_ok());
        let Err(CssError::InvalidSelector { reason, .. }) = parse_selector_list(&nested(5000)) else {
            panic!("expected nesting error");
        };
        assert!(reason.contains("nested too deeply"));
        assert!(parse_selector_list(&format!("{}p", ":is(".repeat(5000))).is_err());
    }
}
