//! Small option/outcome bundles kept out of `core.rs` so its constructor and
//! file-transfer signatures don't grow an unreadable wall of positional
//! arguments.

use rlogin_core::AskResponse;
use std::collections::HashMap;
use std::time::Duration;

/// Tunable behavior flags for one [`crate::TerminalCore`], independent of
/// the per-hop [`rlogin_channel::ConnectionSpec`] list.
#[derive(Debug, Clone)]
pub struct TerminalOptions {
    /// Whether `open` replaces each hop's prompt with a randomly generated
    /// one unlikely to appear in command output.
    pub use_unique_prompt: bool,
    /// After reaching the final hop, backfill `connections[startIdx]`'s
    /// `expected_prompt` with whatever prompt was actually found, so a
    /// caller who didn't know it up front can read it back.
    pub allow_non_expected_prompt: bool,
    /// Whether `findLoginInfo` raises when a freshly found prompt equals
    /// the previous hop's.
    pub check_same_prompt_when_opening_terminal: bool,
    /// Whether consecutive SSH hops at the head of `connections[]` may be
    /// collapsed into one native `direct-tcpip` proxy-jump chain.
    pub enable_proxy_jump: bool,
    /// Whether `close` tears down the base transport, or leaves it open
    /// (e.g. because a caller wants to reuse the socket for another
    /// terminal via `CommandInParentTerminalChannel`).
    pub close_base_on_exit: bool,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        TerminalOptions {
            use_unique_prompt: true,
            allow_non_expected_prompt: false,
            check_same_prompt_when_opening_terminal: true,
            enable_proxy_jump: true,
            close_base_on_exit: true,
        }
    }
}

/// Result of [`crate::TerminalCore::run_ask_response_loop`]: every step that
/// fired enough times to retire, keyed by name.
pub type AskResponseOutcome = HashMap<String, AskResponse>;

/// Options for [`crate::TerminalCore::put_file`].
#[derive(Debug, Clone, Default)]
pub struct PutFileOptions {
    /// Overwrite the remote file if it already exists. When combined with
    /// `check_md5`, the upload lands at a temp path first and is only
    /// renamed onto `remote_path` once its checksum is confirmed.
    pub replace: bool,
    pub check_md5: bool,
    /// Delete the (possibly partial/corrupt) remote temp file if the MD5
    /// check fails.
    pub remove_if_bad_md5: bool,
}

/// Options for [`crate::TerminalCore::get_file`].
#[derive(Debug, Clone, Default)]
pub struct GetFileOptions {
    /// Explicit local destination; empty means derive one from the remote
    /// file's base name (see `rlogin_transfer::local_path_for_remote`).
    pub local_path: String,
    pub local_folder: Option<String>,
    pub replace: bool,
    pub check_md5: bool,
    pub remove_if_bad_md5: bool,
    /// Run the remote encode/checksum commands with the hop's sudo prefix.
    pub use_sudo: bool,
}

/// Timeout policy for one call to [`crate::TerminalCore::run_ask_response_loop`].
#[derive(Debug, Clone, Copy)]
pub struct AskResponseTiming {
    pub initial_timeout: Option<Duration>,
    /// Narrower timeout applied to every step after the first pattern has
    /// matched: a slow banner shouldn't force every later step to wait the
    /// full login timeout too.
    pub timeout_after_first_match: Option<Duration>,
}

impl Default for AskResponseTiming {
    fn default() -> Self {
        AskResponseTiming {
            initial_timeout: None,
            timeout_after_first_match: None,
        }
    }
}
