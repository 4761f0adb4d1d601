//! Text scanning for literal and regex queries

use regex::{Regex, RegexBuilder};

use crate::FindError;

/// Capture group values, `None` for groups that did not participate
pub type Captures = Vec<Option<String>>;

/// One occurrence inside a string, as byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub start: usize,
    pub end: usize,
    /// Present for regex queries
    pub groups: Option<Captures>,
}

/// A compiled text or regex query
#[derive(Debug, Clone)]
pub enum TextPattern {
    Literal { regex: Regex, whole_word: bool },
    Regex(Regex),
}

impl TextPattern {
    /// Literal query, matched with Unicode case folding unless `case_sensitive`
    pub fn literal(query: &str, case_sensitive: bool, whole_word: bool) -> Result<Self, FindError> {
        let regex = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| FindError::InvalidRegex(e.to_string()))?;
        Ok(Self::Literal { regex, whole_word })
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex(_))
    }

    /// Report non-overlapping, non-empty occurrences in order until `emit`
    /// returns `false`; returns `false` if stopped early
    pub fn scan(&self, haystack: &str, mut emit: impl FnMut(Hit) -> bool) -> bool {
        match self {
            Self::Literal { regex, whole_word } => {
                let mut pos = 0;
                while let Some(m) = regex.find_at(haystack, pos) {
                    if *whole_word && !is_whole_word(haystack, m.start(), m.end()) {
                        pos = next_boundary(haystack, m.start());
                        continue;
                    }
                    let hit = Hit {
                        start: m.start(),
                        end: m.end(),
                        groups: None,
                    };
                    if !emit(hit) {
                        return false;
                    }
                    pos = m.end();
                }
                true
            }
            Self::Regex(regex) => {
                for caps in regex.captures_iter(haystack) {
                    let Some(whole) = caps.get(0) else { continue };
                    if whole.is_empty() {
                        continue;
                    }
                    let groups = caps
                        .iter()
                        .skip(1)
                        .map(|g| g.map(|m| m.as_str().to_string()))
                        .collect();
                    let hit = Hit {
                        start: whole.start(),
                        end: whole.end(),
                        groups: Some(groups),
                    };
                    if !emit(hit) {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// All occurrences in `haystack`
    pub fn find_all(&self, haystack: &str) -> Vec<Hit> {
        let mut hits = Vec::new();
        self.scan(haystack, |hit| {
            hits.push(hit);
            true
        });
        hits
    }
}

/// ASCII word character, as in `\w`
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_whole_word(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Byte offset of the character after the one starting at `at`
fn next_boundary(haystack: &str, at: usize) -> usize {
    at + haystack[at..].chars().next().map_or(1, char::len_utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(pattern: &TextPattern, haystack: &str) -> Vec<(usize, usize)> {
        pattern.find_all(haystack).iter().map(|h| (h.start, h.end)).collect()
    }

    #[test]
    fn test_literal_case_folding() {
        let insensitive = TextPattern::literal("cat", false, false).unwrap();
        assert_eq!(spans(&insensitive, "Cat cAT dog"), vec![(0, 3), (4, 7)]);
        let sensitive = TextPattern::literal("cat", true, false).unwrap();
        assert_eq!(spans(&sensitive, "Cat cat"), vec![(4, 7)]);
    }

    #[test]
    fn test_literal_non_overlapping() {
        let pattern = TextPattern::literal("aa", true, false).unwrap();
        assert_eq!(spans(&pattern, "aaaa"), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_literal_metacharacters() {
        let pattern = TextPattern::literal("a.b(", false, false).unwrap();
        assert_eq!(spans(&pattern, "axb( a.b("), vec![(5, 9)]);
    }

    #[test]
    fn test_whole_word() {
        let pattern = TextPattern::literal("cat", false, true).unwrap();
        assert_eq!(spans(&pattern, "concatenate cats cat"), vec![(17, 20)]);
        assert_eq!(spans(&pattern, "cat-cat_cat"), vec![(0, 3)]);
        // Non-ASCII letters are not word characters
        assert_eq!(spans(&pattern, "écat"), vec![(2, 5)]);
    }

    #[test]
    fn test_regex_groups_and_empty_matches() {
        let pattern = TextPattern::Regex(Regex::new(r"(\d+)(x)?|").unwrap());
        let hits = pattern.find_all("a12x b3");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].start, 1);
        assert_eq!(hits[0].groups, Some(vec![Some("12".into()), Some("x".into())]));
        assert_eq!(hits[1].groups, Some(vec![Some("3".into()), None]));
    }

    #[test]
    fn test_scan_stops_early() {
        let pattern = TextPattern::literal("a", false, false).unwrap();
        let mut seen = 0;
        let finished = pattern.scan("aaaa", |_| {
            seen += 1;
            seen < 2
        });
        assert!(!finished);
        assert_eq!(seen, 2);
    }
}
