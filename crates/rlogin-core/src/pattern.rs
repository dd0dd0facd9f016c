//! `PatternValue`: a single named pattern an [`crate::expect::ExpectContract`]
//! scans a receive buffer against. A pattern is either a regex, a literal
//! string (escaped into a regex), or the sentinel "match the current
//! prompt".

use crate::error::{TerminalError, TerminalErrorKind};
use regex::Regex;

/// Where in the buffer a pattern last matched.
#[derive(Debug, Clone)]
pub struct MatchData {
    pub matched_text: String,
    pub text_before_match: String,
    pub start: usize,
    pub end: usize,
}

/// A single pattern registered with an [`crate::expect::ExpectContract`].
#[derive(Debug, Clone)]
pub struct PatternValue {
    pub name: String,
    /// `None` means "match the contract's prompt regex instead".
    regex: Option<Regex>,
    /// If true, the portion of the buffer matched by the prompt is stripped
    /// before this pattern is searched against what remains.
    pub remove_prompt_to_compare: bool,
    last_match: Option<MatchData>,
}

impl PatternValue {
    /// Build a pattern from a raw (case-insensitive, multiline) regex source.
    pub fn new_regex(name: impl Into<String>, source: &str) -> Result<Self, TerminalError> {
        let pattern = format!("(?im){source}");
        let regex = Regex::new(&pattern)?;
        Ok(PatternValue {
            name: name.into(),
            regex: Some(regex),
            remove_prompt_to_compare: false,
            last_match: None,
        })
    }

    /// Build a pattern that matches a literal string verbatim.
    pub fn new_string(name: impl Into<String>, literal: &str) -> Result<Self, TerminalError> {
        Self::new_regex(name, &regex::escape(literal))
    }

    /// Build the sentinel "match the contract's prompt" pattern.
    pub fn new_prompt(name: impl Into<String>) -> Self {
        PatternValue {
            name: name.into(),
            regex: None,
            remove_prompt_to_compare: false,
            last_match: None,
        }
    }

    pub fn is_prompt_sentinel(&self) -> bool {
        self.regex.is_none()
    }

    pub fn with_remove_prompt_to_compare(mut self, value: bool) -> Self {
        self.remove_prompt_to_compare = value;
        self
    }

    /// Search `haystack`, recording (and returning) the match if found.
    /// A prompt-sentinel pattern must be resolved by the caller against the
    /// contract's prompt regex and reported via [`Self::record_match`].
    pub fn search(&mut self, haystack: &str) -> Option<&MatchData> {
        let regex = self.regex.as_ref()?;
        let m = regex.find(haystack)?;
        self.last_match = Some(MatchData {
            matched_text: m.as_str().to_string(),
            text_before_match: haystack[..m.start()].to_string(),
            start: m.start(),
            end: m.end(),
        });
        self.last_match.as_ref()
    }

    pub fn record_match(&mut self, data: MatchData) {
        self.last_match = Some(data);
    }

    pub fn reset(&mut self) {
        self.last_match = None;
    }

    pub fn is_matched(&self) -> bool {
        self.last_match.is_some()
    }

    pub fn value(&self) -> Option<&str> {
        self.last_match.as_ref().map(|m| m.matched_text.as_str())
    }

    pub fn text_before_match(&self) -> Option<&str> {
        self.last_match.as_ref().map(|m| m.text_before_match.as_str())
    }

    pub fn start(&self) -> Option<usize> {
        self.last_match.as_ref().map(|m| m.start)
    }
}

pub(crate) fn name_conflict(name: &str) -> TerminalError {
    TerminalError::new(
        TerminalErrorKind::ExpectListNameConflict,
        format!("pattern named '{name}' is already registered"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_pattern_matches_and_records_offsets() {
        let mut p = PatternValue::new_regex("password", r"password\s?:").unwrap();
        let m = p.search("login as admin\npassword: ").unwrap();
        assert_eq!(m.matched_text.to_lowercase(), "password:");
        assert!(p.text_before_match().unwrap().starts_with("login as admin"));
    }

    #[test]
    fn string_pattern_is_escaped() {
        let mut p = PatternValue::new_string("literal", "a.b(c)").unwrap();
        assert!(p.search("xx a.b(c) yy").is_some());
        let mut p2 = PatternValue::new_string("literal2", "a.b(c)").unwrap();
        assert!(p2.search("xxXaYb(c) yy").is_none());
    }

    #[test]
    fn prompt_sentinel_has_no_regex() {
        let p = PatternValue::new_prompt("prompt");
        assert!(p.is_prompt_sentinel());
    }
}
