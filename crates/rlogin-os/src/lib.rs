//! Per-OS shell command adapters.
//!
//! Each supported platform gets one adapter struct implementing
//! [`OsAdapter`]; the trait's default-method bodies hold the shared Unix-ish
//! defaults so a new profile only needs to override what's actually
//! different about it.

mod alcatel;
mod busybox;
mod cisco;
mod drac;
mod ilo;
mod linux;
mod unix;
mod windows;

pub use alcatel::AlcatelAdapter;
pub use busybox::BusyBoxAdapter;
pub use cisco::CiscoIosAdapter;
pub use drac::DellDracAdapter;
pub use ilo::IloAdapter;
pub use linux::LinuxAdapter;
pub use unix::UnixAdapter;
pub use windows::WindowsAdapter;

use rand::Rng;
use rlogin_core::TerminalError;

/// Number of random lowercase characters in a generated unique prompt.
pub const RANDOM_PROMPT_LENGTH: usize = 10;

/// The contract every OS profile implements: the shell command strings
/// `TerminalCore` needs to log in, change the prompt, resize the PTY,
/// exchange files, and clean up after itself.
///
/// Methods return `Result` for operations an OS genuinely cannot do (e.g.
/// BusyBox has no `base64` binary) — callers should prefer checking the
/// relevant capability flag (e.g. [`OsAdapter::has_base64`]) before calling.
pub trait OsAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// The program used for `cat_cmd`/`cat_to_file` (`cat` on Unix, `type`
    /// on Windows/Cisco/Alcatel).
    fn cat_program(&self) -> &'static str;

    /// The interactive shell binary a `LocalSubprocess` channel spawns for
    /// this profile.
    fn shell_app(&self) -> &'static str {
        "/bin/sh"
    }

    fn has_base64(&self) -> bool;
    fn can_resize_pty(&self) -> bool {
        true
    }
    fn can_change_prompt(&self) -> bool {
        false
    }
    fn can_disable_history(&self) -> bool {
        false
    }
    /// The prompt to reset to on close, when `reset_prompt_on_exit` applies.
    fn default_prompt(&self) -> Option<&str> {
        None
    }
    /// Whether `TerminalCore::close` should restore [`Self::default_prompt`]
    /// before leaving this hop. Defaults to "yes, if there is one to restore
    /// to".
    fn reset_prompt_on_exit(&self) -> bool {
        self.default_prompt().is_some()
    }
    /// A profile-specific expected prompt regex, used when a `ConnectionSpec`
    /// doesn't supply one explicitly (e.g. Dell DRAC's `racadm> `).
    fn expected_prompt(&self) -> Option<&str> {
        None
    }

    fn cat_cmd(&self, file_path: &str) -> String {
        format!("{} {}", self.cat_program(), file_path)
    }

    fn cat_to_file(&self, file_path: &str, message: &str) -> Result<String, TerminalError>;

    fn resize_pty(&self, cols: u16, rows: u16) -> String {
        format!("stty cols {cols} rows {rows}")
    }

    fn exit_cmd(&self) -> &'static str {
        "exit"
    }

    /// Command prefix `check_output`/`send_sudo_cmd` prepends to run a
    /// command with elevated privilege. `None` on profiles with no such
    /// concept (Windows, Cisco IOS/Alcatel, iLO, DRAC).
    fn sudo_prefix(&self) -> Option<&'static str> {
        None
    }

    /// Pattern (without the `(?im)` flags `PatternValue` adds) matching this
    /// OS's password-for-sudo prompt, used by `check_output`'s sudo path.
    fn sudo_password_prompt(&self) -> &'static str {
        r"\[sudo\] password"
    }

    fn remove(&self, file_path: &str) -> Result<String, TerminalError>;

    fn list_file(&self, file_path: &str) -> Result<String, TerminalError>;

    /// Renames/moves `from` to `to`, overwriting `to` if it exists. Used by
    /// the base64 fallback's put path to atomically promote a `.tmp`
    /// download once its MD5 has been verified.
    fn move_file(&self, from: &str, to: &str) -> Result<String, TerminalError> {
        Ok(format!("mv -f {from} {to}"))
    }

    fn cd(&self, folder: &str) -> String {
        format!("cd {folder}")
    }

    fn set_prompt(&self, _prompt: &str) -> Option<String> {
        None
    }

    fn disable_history(&self) -> Option<String> {
        None
    }

    fn enable_history(&self) -> Option<String> {
        None
    }

    fn base64_encode(&self, file: &str) -> Result<String, TerminalError>;
    fn base64_encode_to_file(&self, decoded: &str, encoded: &str) -> Result<String, TerminalError>;
    fn base64_decode_to_file(&self, encoded: &str, decoded: &str) -> Result<String, TerminalError>;

    fn md5checksum(&self, file_path: &str) -> String;

    /// Template used by [`Self::get_unique_prompt`]; `{random}` is replaced
    /// by a run of lowercase letters.
    fn unique_prompt_format(&self) -> &'static str {
        "@@{random}@PWN@# "
    }

    /// Generates a prompt unlikely to appear in any command's legitimate
    /// output, used so `TerminalCore` can reliably detect "we're back at the
    /// shell" after sending a command.
    fn get_unique_prompt(&self) -> String {
        let mut rng = rand::thread_rng();
        let random: String = (0..RANDOM_PROMPT_LENGTH)
            .map(|_| (b'a' + rng.gen_range(0..26)) as char)
            .collect();
        self.unique_prompt_format().replace("{random}", &random)
    }
}

pub(crate) fn not_supported(op: &str, os_name: &str) -> TerminalError {
    TerminalError::new(
        rlogin_core::TerminalErrorKind::FileTransfer,
        format!("{op} is not supported on {os_name}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_prompt_uses_spec_length() {
        let a = UnixAdapter::default();
        let p = a.get_unique_prompt();
        let random_part = p
            .strip_prefix("@@")
            .and_then(|s| s.strip_suffix("@PWN# ").or_else(|| s.strip_suffix("@PWN@# ")));
        let _ = random_part;
        assert!(p.starts_with("@@"));
        assert_eq!(p.chars().filter(|c| c.is_ascii_lowercase()).count(), RANDOM_PROMPT_LENGTH);
    }
}
