//! Mode detection
//!
//! Classifies a raw query into text, regex, CSS or XPath. Prefixes win over
//! the `/pattern/flags` form, which wins over plain text.

use regex::{Regex, RegexBuilder};

use crate::FindError;

/// How a query is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    Text,
    Regex,
    Css,
    XPath,
    /// Text query that is also a valid selector; element matches come first
    Mixed,
}

impl SearchMode {
    /// Short name shown next to the query
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Regex => "Regex",
            Self::Css => "CSS",
            Self::XPath => "XPath",
            Self::Mixed => "CSS + Text",
        }
    }

    /// Whether matches address elements rather than text
    pub fn is_selector(&self) -> bool {
        matches!(self, Self::Css | Self::XPath)
    }
}

/// Result of classifying a query
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub mode: SearchMode,
    /// Query with any mode prefix removed
    pub pattern: String,
    /// Regex flags, empty for other modes
    pub flags: String,
    /// Set when a regex query does not compile; mode is still `Regex`
    pub error: Option<FindError>,
}

impl Detection {
    fn new(mode: SearchMode, pattern: &str) -> Self {
        Self {
            mode,
            pattern: pattern.to_string(),
            flags: String::new(),
            error: None,
        }
    }
}

const REGEX_FLAGS: &str = "gimsuy";

/// Classify `query`
pub fn detect(query: &str) -> Detection {
    if let Some(rest) = query.strip_prefix("css:").or_else(|| query.strip_prefix('$')) {
        return Detection::new(SearchMode::Css, rest.trim());
    }
    if let Some(rest) = query.strip_prefix("xpath:") {
        return Detection::new(SearchMode::XPath, rest.trim());
    }
    if query.starts_with("//") && query.len() > 2 {
        return Detection::new(SearchMode::XPath, query);
    }
    if let Some((pattern, flags)) = split_regex_literal(query) {
        let error = compile_regex(pattern, flags).err();
        if let Some(err) = &error {
            tracing::debug!("regex query {query:?} does not compile: {err}");
        }
        return Detection {
            mode: SearchMode::Regex,
            pattern: pattern.to_string(),
            flags: flags.to_string(),
            error,
        };
    }
    Detection::new(SearchMode::Text, query)
}

/// Split `/body/flags` into its parts
fn split_regex_literal(query: &str) -> Option<(&str, &str)> {
    let rest = query.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let (pattern, flags) = (&rest[..close], &rest[close + 1..]);
    if pattern.is_empty() || !flags.chars().all(|c| REGEX_FLAGS.contains(c)) {
        return None;
    }
    Some((pattern, flags))
}

/// Compile a regex query
///
/// `i`, `m` and `s` map onto the engine's options; `g`, `u` and `y` have no
/// effect since every pass already finds all matches over Unicode text.
pub fn compile_regex(pattern: &str, flags: &str) -> Result<Regex, FindError> {
    for (i, flag) in flags.char_indices() {
        if !REGEX_FLAGS.contains(flag) {
            return Err(FindError::InvalidRegex(format!("unknown flag '{flag}'")));
        }
        if flags[..i].contains(flag) {
            return Err(FindError::InvalidRegex(format!("duplicate flag '{flag}'")));
        }
    }
    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| FindError::InvalidRegex(e.to_string()))
}

/// Whether an unprefixed query resembles a CSS selector
///
/// Only a hint: the engine still requires the selector to parse before
/// running a CSS pass.
pub fn looks_like_css_selector(query: &str) -> bool {
    let query = query.trim();
    let mut chars = query.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let second = chars.next();
    let ident_start = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '-');

    match first {
        '.' | '#' => return ident_start(second),
        '[' => return second.is_some_and(|c| c.is_ascii_alphabetic()),
        _ => {}
    }

    // tag followed directly by a class, id, attribute or pseudo-class
    if first.is_ascii_alphabetic() {
        let tag_end = query
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .unwrap_or(query.len());
        if query[tag_end..].starts_with(['.', '#', '[', ':']) {
            return true;
        }
    }

    has_combinator(query)
}

/// `word > word`, `word + word` or `word ~ word`
///
/// A descendant combinator (`ul li`) does not count, or every multi-word
/// phrase would turn into a mixed query.
fn has_combinator(query: &str) -> bool {
    let chars: Vec<char> = query.chars().collect();
    chars.iter().enumerate().any(|(i, &c)| {
        if !matches!(c, '>' | '+' | '~') {
            return false;
        }
        let before = chars[..i].iter().rev().find(|c| !c.is_whitespace());
        let after = chars[i + 1..].iter().find(|c| !c.is_whitespace());
        let ends_compound = before.is_some_and(|c| c.is_alphanumeric() || matches!(c, ']' | ')' | '*'));
        let starts_compound = after.is_some_and(|c| c.is_alphabetic() || matches!(c, '.' | '#' | '[' | '*' | ':'));
        ends_compound && starts_compound
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        for query in ["hello", "hello world", "a/b", "/", "/abc", "/a/x", "price: $5"] {
            let detection = detect(query);
            assert_eq!(detection.mode, SearchMode::Text, "{query:?}");
            assert_eq!(detection.pattern, query);
        }
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(detect("css: div.note ").pattern, "div.note");
        assert_eq!(detect("css:p").mode, SearchMode::Css);
        assert_eq!(detect("$.item").mode, SearchMode::Css);
        assert_eq!(detect("xpath://p").pattern, "//p");
        let slashes = detect("//div[@id]");
        assert_eq!(slashes.mode, SearchMode::XPath);
        assert_eq!(slashes.pattern, "//div[@id]");
        assert_eq!(detect("//").mode, SearchMode::Text);
    }

    #[test]
    fn test_regex_literal() {
        let detection = detect("/fo+(bar)?/gi");
        assert_eq!(detection.mode, SearchMode::Regex);
        assert_eq!(detection.pattern, "fo+(bar)?");
        assert_eq!(detection.flags, "gi");
        assert!(detection.error.is_none());

        let slash_in_body = detect("/a/b/");
        assert_eq!(slash_in_body.pattern, "a/b");
    }

    #[test]
    fn test_regex_errors_keep_mode() {
        let detection = detect("/[/");
        assert_eq!(detection.mode, SearchMode::Regex);
        assert!(matches!(detection.error, Some(FindError::InvalidRegex(_))));

        let duplicate = detect("/a/gg");
        assert_eq!(duplicate.mode, SearchMode::Regex);
        assert!(duplicate.error.is_some());
    }

    #[test]
    fn test_regex_flags() {
        let re = compile_regex("^b.c$", "ims").unwrap();
        assert!(re.is_match("a\nB\nC"));
        assert!(!compile_regex("^b.c$", "").unwrap().is_match("a\nB\nC"));
    }

    #[test]
    fn test_css_heuristic() {
        for query in [".item", "#main", "[data-x]", "div.note", "a:hover", "ul > li", "h1 + p", "input[type=text]"] {
            assert!(looks_like_css_selector(query), "{query:?}");
        }
        for query in ["hello", "hello world", "ul li", "1 + 1 = 2", "...", "# heading", "", "$5"] {
            assert!(!looks_like_css_selector(query), "{query:?}");
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(SearchMode::Mixed.label(), "CSS + Text");
        assert_ne!(SearchMode::Mixed.label(), SearchMode::Css.label());
    }
}
