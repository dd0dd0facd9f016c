//! `ExpectContract`: a set of named [`PatternValue`]s scanned together
//! against one receive buffer, with any/all/in-sequence satisfaction
//! policies.

use crate::pattern::{name_conflict, PatternValue};
use crate::TerminalError;
use regex::Regex;

/// How an [`ExpectContract`] decides it has seen "enough" matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Any single registered pattern matching is sufficient.
    Any,
    /// Every registered pattern must match (order doesn't matter).
    All,
    /// Every registered pattern must match, in the order they were added.
    AllInSequence,
}

/// Result of one [`ExpectContract::scan`] call.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub any_matched: bool,
    pub all_matched: bool,
    pub all_matched_in_sequence: bool,
    pub prompt_matched: bool,
    /// Name of patterns that matched on this call specifically (not
    /// necessarily all that have ever matched since the last reset).
    pub newly_matched: Vec<String>,
    pub ok: bool,
}

pub struct ExpectContract {
    patterns: Vec<PatternValue>,
    policy: MatchPolicy,
}

impl ExpectContract {
    pub fn new(policy: MatchPolicy) -> Self {
        ExpectContract {
            patterns: Vec::new(),
            policy,
        }
    }

    pub fn add(&mut self, pattern: PatternValue) -> Result<(), TerminalError> {
        if self.patterns.iter().any(|p| p.name == pattern.name) {
            return Err(name_conflict(&pattern.name));
        }
        self.patterns.push(pattern);
        Ok(())
    }

    pub fn reset(&mut self) {
        for p in &mut self.patterns {
            p.reset();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PatternValue> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Scan `buffer` for every registered pattern, plus `prompt` (if given)
    /// anchored at the end of the buffer (trailing newlines stripped first).
    pub fn scan(&mut self, buffer: &str, prompt: Option<&Regex>) -> ScanResult {
        let prompt_match = prompt.and_then(|re| re.find(buffer.trim_end_matches(['\r', '\n'])));
        let prompt_matched = prompt_match.is_some();
        let prompt_text = prompt_match.map(|m| m.as_str().to_string());

        let mut newly_matched = Vec::new();
        for pattern in &mut self.patterns {
            if pattern.is_prompt_sentinel() {
                if let (true, Some(text)) = (prompt_matched, prompt_text.as_ref()) {
                    let start = buffer.rfind(text.as_str()).unwrap_or(0);
                    pattern.record_match(crate::pattern::MatchData {
                        matched_text: text.clone(),
                        text_before_match: buffer[..start].to_string(),
                        start,
                        end: start + text.len(),
                    });
                    newly_matched.push(pattern.name.clone());
                }
                continue;
            }

            let haystack: std::borrow::Cow<str> = if pattern.remove_prompt_to_compare && prompt_matched
            {
                let trimmed = prompt_text
                    .as_ref()
                    .and_then(|t| buffer.rfind(t.as_str()))
                    .map(|idx| &buffer[..idx])
                    .unwrap_or(buffer);
                std::borrow::Cow::Borrowed(trimmed)
            } else {
                std::borrow::Cow::Borrowed(buffer)
            };

            if pattern.search(&haystack).is_some() {
                newly_matched.push(pattern.name.clone());
            }
        }

        let any_matched = self.patterns.iter().any(|p| p.is_matched()) || prompt_matched;
        let all_matched = !self.patterns.is_empty() && self.patterns.iter().all(|p| p.is_matched());
        let all_matched_in_sequence = all_matched && {
            let mut last_start = None;
            self.patterns.iter().all(|p| match p.start() {
                Some(start) => {
                    let ok = last_start.map(|last| start >= last).unwrap_or(true);
                    last_start = Some(start);
                    ok
                }
                None => false,
            })
        };

        let ok = match self.policy {
            MatchPolicy::Any => any_matched,
            MatchPolicy::All => all_matched,
            MatchPolicy::AllInSequence => all_matched_in_sequence,
        };

        ScanResult {
            any_matched,
            all_matched,
            all_matched_in_sequence,
            prompt_matched,
            newly_matched,
            ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_policy_satisfied_by_single_match() {
        let mut c = ExpectContract::new(MatchPolicy::Any);
        c.add(PatternValue::new_regex("err", "error").unwrap()).unwrap();
        c.add(PatternValue::new_regex("ok", "success").unwrap()).unwrap();
        let result = c.scan("command failed: error 42", None);
        assert!(result.ok);
        assert!(!result.all_matched);
    }

    #[test]
    fn all_policy_requires_every_pattern() {
        let mut c = ExpectContract::new(MatchPolicy::All);
        c.add(PatternValue::new_regex("a", "foo").unwrap()).unwrap();
        c.add(PatternValue::new_regex("b", "bar").unwrap()).unwrap();
        assert!(!c.scan("foo only", None).ok);
        c.reset();
        assert!(c.scan("foo and bar both here", None).ok);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut c = ExpectContract::new(MatchPolicy::Any);
        c.add(PatternValue::new_regex("dup", "x").unwrap()).unwrap();
        let err = c.add(PatternValue::new_regex("dup", "y").unwrap()).unwrap_err();
        assert_eq!(err.kind, crate::TerminalErrorKind::ExpectListNameConflict);
    }

    #[test]
    fn all_in_sequence_requires_buffer_order() {
        let mut c = ExpectContract::new(MatchPolicy::AllInSequence);
        c.add(PatternValue::new_regex("first", "alpha").unwrap()).unwrap();
        c.add(PatternValue::new_regex("second", "beta").unwrap()).unwrap();
        assert!(c.scan("alpha then beta", None).ok);
        c.reset();
        assert!(!c.scan("beta then alpha", None).ok);
    }
}
