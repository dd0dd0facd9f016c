//! `ShellLogin`: the per-hop state `TerminalCore` pushes onto its stack once
//! a hop's login completes and its prompt has been found — the prompt
//! actually observed (escaped literally), the pre-prompt banner text, and
//! the handful of capability flags copied from the hop's `OsAdapter` so
//! later code doesn't need to keep re-asking the adapter once a hop is
//! live.

use regex::Regex;
use rlogin_core::AskResponse;
use rlogin_os::OsAdapter;
use secrecy::SecretString;
use std::sync::Arc;

/// Live state for one successfully logged-in hop.
pub struct ShellLogin {
    /// The regex currently used to recognize this hop's prompt at the end
    /// of a receive buffer. Starts as the hop's configured/expected prompt
    /// and is replaced with the escaped literal text once actually
    /// observed.
    pub expected_prompt: Regex,
    /// The literal prompt text last observed, unescaped.
    pub prompt_found: String,
    /// Banner/MOTD text captured before the prompt was first found.
    pub banner: String,
    pub can_change_prompt: bool,
    pub can_resize_pty: bool,
    pub can_disable_history: bool,
    pub reset_prompt_on_exit: bool,
    pub default_prompt: Option<String>,
    /// The login script this hop ran (kept for diagnostics; retired
    /// AskResponses still show their final match counts).
    pub ask_response_list: Vec<AskResponse>,
    /// Disables the same-prompt-across-hop sanity check for this hop.
    pub skip_prompt_check: bool,
    /// The OS profile this hop logged into, kept so `close`/`set_prompt`/the
    /// file-transfer fallback can issue the right shell commands without
    /// threading an adapter reference through every call site.
    pub os: Arc<dyn OsAdapter>,
    /// The credential this hop logged in with, kept so `check_output`'s
    /// sudo path can answer a `[sudo] password` prompt without the caller
    /// re-supplying it.
    pub password: Option<SecretString>,
}

impl ShellLogin {
    pub fn new(expected_prompt: Regex, os: Arc<dyn OsAdapter>) -> Self {
        ShellLogin {
            expected_prompt,
            prompt_found: String::new(),
            banner: String::new(),
            can_change_prompt: false,
            can_resize_pty: true,
            can_disable_history: false,
            reset_prompt_on_exit: false,
            default_prompt: None,
            ask_response_list: Vec::new(),
            skip_prompt_check: false,
            os,
            password: None,
        }
    }
}
