//! `AskResponse`: one step of a multi-step login negotiation — wait for a
//! pattern, optionally send a reply, retire once seen enough times.

use crate::error::{TerminalError, TerminalErrorKind};

/// How many times a step is expected to fire before it's retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRange {
    pub start: i64,
    pub end: Option<i64>,
}

/// Parses a flexible count syntax: `"0"` (zero or more, always retired),
/// `"N"` (exactly N), `"N+"` (N or more), `"lo,hi"` (between lo and hi).
pub fn parse_count(count: &str) -> Result<CountRange, TerminalError> {
    let parts: Vec<&str> = count.split(',').collect();
    if parts.len() > 1 {
        let start = parts[0]
            .trim()
            .parse()
            .map_err(|_| invalid_count(count))?;
        let end = parts[1]
            .trim()
            .parse()
            .map_err(|_| invalid_count(count))?;
        return Ok(CountRange { start, end: Some(end) });
    }

    let token = parts[0].trim();
    if let Some(prefix) = token.strip_suffix('+') {
        let start = prefix.parse().map_err(|_| invalid_count(count))?;
        return Ok(CountRange { start, end: None });
    }

    let end: i64 = token.parse().map_err(|_| invalid_count(count))?;
    Ok(CountRange { start: 1, end: Some(end) })
}

fn invalid_count(count: &str) -> TerminalError {
    TerminalError::new(
        TerminalErrorKind::CommandNotProvided,
        format!("invalid count expression '{count}'"),
    )
}

/// One login-negotiation step: wait for `expect` (or, if `None`, for the
/// prompt itself), optionally send `response`.
#[derive(Debug, Clone)]
pub struct AskResponse {
    pub name: String,
    pub expect: Option<String>,
    pub response: Option<String>,
    pub required: bool,
    pub hidden: bool,
    count_range: CountRange,
    matches: i64,
}

impl AskResponse {
    pub fn new(
        name: impl Into<String>,
        expect: Option<String>,
        response: Option<String>,
        required: bool,
        hidden: bool,
        count: &str,
    ) -> Result<Self, TerminalError> {
        Ok(AskResponse {
            name: name.into(),
            expect,
            response,
            required,
            hidden,
            count_range: parse_count(count)?,
            matches: 0,
        })
    }

    /// A required, hidden password step matching a trailing `password:`
    /// prompt.
    pub fn password(response: impl Into<String>) -> Self {
        AskResponse {
            name: "password".to_string(),
            expect: Some(r"(password)\s?:".to_string()),
            response: Some(response.into()),
            required: true,
            hidden: true,
            count_range: CountRange { start: 1, end: Some(1) },
            matches: 0,
        }
    }

    /// An optional, visible username step.
    pub fn username(response: impl Into<String>) -> Self {
        AskResponse {
            name: "username".to_string(),
            expect: Some(r"(username|login)\s?:\s*$".to_string()),
            response: Some(response.into()),
            required: false,
            hidden: false,
            count_range: CountRange { start: 1, end: Some(1) },
            matches: 0,
        }
    }

    /// A terminating, required, response-less step: seeing it ends the
    /// login negotiation.
    pub fn prompt(expect: Option<String>) -> Self {
        AskResponse {
            name: "prompt".to_string(),
            expect,
            response: None,
            required: true,
            hidden: false,
            count_range: CountRange { start: 1, end: Some(1) },
            matches: 0,
        }
    }

    pub fn is_prompt_step(&self) -> bool {
        self.expect.is_none() || self.response.is_none()
    }

    pub fn reinit_matches(&mut self) {
        self.matches = 0;
    }

    /// Record a match, returning `(are_matches_enough, continue_checking)`.
    pub fn match_found(&mut self) -> (bool, bool) {
        self.matches += 1;
        (self.are_matches_enough(), self.continue_checking())
    }

    pub fn are_matches_enough(&self) -> bool {
        let CountRange { start, end } = self.count_range;
        (start == 0 && end == Some(0))
            || (start <= self.matches && end.map(|e| self.matches >= e).unwrap_or(true))
    }

    pub fn continue_checking(&self) -> bool {
        let CountRange { start, end } = self.count_range;
        !(start <= self.matches && end.map(|e| self.matches >= e).unwrap_or(false))
    }

    /// `get_ask_resp_list_for_new_connection`: build the standard
    /// prompt→username→password sequence for a fresh login.
    pub fn for_new_connection(
        username: Option<&str>,
        password: Option<&str>,
        prompt: Option<&str>,
    ) -> Vec<AskResponse> {
        let mut list = vec![{
            let mut p = AskResponse::prompt(prompt.map(|s| s.to_string()));
            p.required = prompt.is_some();
            p
        }];
        if let Some(u) = username.filter(|u| !u.is_empty()) {
            list.push(AskResponse::username(u));
        }
        if let Some(pw) = password.filter(|p| !p.is_empty()) {
            list.push(AskResponse::password(pw));
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_handles_all_forms() {
        assert_eq!(parse_count("0").unwrap(), CountRange { start: 0, end: Some(0) });
        assert_eq!(parse_count("3").unwrap(), CountRange { start: 1, end: Some(3) });
        assert_eq!(parse_count("2+").unwrap(), CountRange { start: 2, end: None });
        assert_eq!(parse_count("1,4").unwrap(), CountRange { start: 1, end: Some(4) });
    }

    #[test]
    fn invalid_count_is_rejected() {
        assert!(parse_count("abc").is_err());
    }

    #[test]
    fn exact_count_retires_after_n_matches() {
        let mut step = AskResponse::new("x", Some("x".into()), Some("y".into()), true, false, "2").unwrap();
        let (enough, cont) = step.match_found();
        assert!(!enough && cont);
        let (enough, cont) = step.match_found();
        assert!(enough && !cont);
    }

    #[test]
    fn zero_or_more_is_always_satisfied() {
        let step = AskResponse::new("x", Some("x".into()), Some("y".into()), false, false, "0").unwrap();
        assert!(step.are_matches_enough());
    }

    #[test]
    fn for_new_connection_skips_empty_credentials() {
        let list = AskResponse::for_new_connection(None, Some("secret"), Some("\\$ $"));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "prompt");
        assert_eq!(list[1].name, "password");
        assert!(list[1].hidden);
    }
}
