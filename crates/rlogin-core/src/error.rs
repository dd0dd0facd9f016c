//! Error types shared across the workspace.
//!
//! Follows the manual `kind` + `message` shape used throughout the stack
//! instead of a derive macro: a flat enum of kinds, one struct wrapping it,
//! and `From` impls at the seams where foreign errors actually originate.

use std::fmt;

/// Discriminates the reason a [`TerminalError`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalErrorKind {
    /// A login sequence never reached the expected prompt.
    ExpectLogin,
    /// A named pattern was referenced but never registered.
    ExpectNotFound,
    /// Two patterns were registered under the same name.
    ExpectListNameConflict,
    /// `set_prompt`/`find_login_info` could not confirm the new prompt.
    PromptNotFound,
    /// An operation was attempted on a connection that isn't open.
    ConnectionNotOpen,
    /// The transport failed to open.
    ConnectionOpen,
    /// Credentials were rejected.
    Authentication,
    /// A command string was required but empty.
    CommandNotProvided,
    /// An SSH host key was presented that isn't in the known-hosts set.
    UnknownKeyToServer,
    /// The remote end refused the operation (wrong password, no permission).
    PermissionDenied,
    /// `ExpectContract`/`AskResponse` scanning exceeded its deadline.
    ExpectTimeout,
    /// A private key's passphrase was wrong.
    BadSshKeyPassword,
    /// No username could be determined and none was supplied.
    NoDefaultUser,
    /// A `FileTransferFallback` put/get failed (checksum mismatch, i/o).
    FileTransfer,
    /// A remote command returned non-zero, or no expected pattern matched it.
    CalledProcess,
    /// Wraps a lower-level I/O failure.
    Io,
    /// Wraps a regex compilation failure.
    InvalidPattern,
}

impl fmt::Display for TerminalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminalErrorKind::ExpectLogin => "expect login error",
            TerminalErrorKind::ExpectNotFound => "expect pattern not found",
            TerminalErrorKind::ExpectListNameConflict => "expect list name conflict",
            TerminalErrorKind::PromptNotFound => "prompt not found",
            TerminalErrorKind::ConnectionNotOpen => "connection not open",
            TerminalErrorKind::ConnectionOpen => "connection open error",
            TerminalErrorKind::Authentication => "authentication failed",
            TerminalErrorKind::CommandNotProvided => "command not provided",
            TerminalErrorKind::UnknownKeyToServer => "unknown host key",
            TerminalErrorKind::PermissionDenied => "permission denied",
            TerminalErrorKind::ExpectTimeout => "expect timeout",
            TerminalErrorKind::BadSshKeyPassword => "bad ssh key password",
            TerminalErrorKind::NoDefaultUser => "no default user",
            TerminalErrorKind::FileTransfer => "file transfer error",
            TerminalErrorKind::CalledProcess => "called process error",
            TerminalErrorKind::Io => "i/o error",
            TerminalErrorKind::InvalidPattern => "invalid pattern",
        };
        f.write_str(s)
    }
}

/// A `kind` + human-readable `message` error, the shape used throughout this
/// workspace instead of a derive-macro error enum.
#[derive(Debug, Clone)]
pub struct TerminalError {
    pub kind: TerminalErrorKind,
    pub message: String,
    /// Populated only for [`TerminalErrorKind::CalledProcess`].
    pub returncode: Option<i32>,
    /// Populated only for [`TerminalErrorKind::CalledProcess`]: output
    /// collected before the command was judged to have failed.
    pub output: Option<String>,
}

impl TerminalError {
    pub fn new(kind: TerminalErrorKind, message: impl Into<String>) -> Self {
        TerminalError {
            kind,
            message: message.into(),
            returncode: None,
            output: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TerminalErrorKind::ExpectTimeout, message)
    }

    pub fn prompt_not_found(message: impl Into<String>) -> Self {
        Self::new(TerminalErrorKind::PromptNotFound, message)
    }

    pub fn called_process(command: &str, returncode: i32, output: impl Into<String>) -> Self {
        TerminalError {
            kind: TerminalErrorKind::CalledProcess,
            message: format!("command '{command}' returned non-zero exit status {returncode}"),
            returncode: Some(returncode),
            output: Some(output.into()),
        }
    }
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TerminalError {}

impl From<std::io::Error> for TerminalError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind::*;
        let kind = match e.kind() {
            ConnectionRefused | ConnectionReset | ConnectionAborted | NotConnected => {
                TerminalErrorKind::ConnectionNotOpen
            }
            TimedOut => TerminalErrorKind::ExpectTimeout,
            _ => TerminalErrorKind::Io,
        };
        TerminalError::new(kind, e.to_string())
    }
}

impl From<regex::Error> for TerminalError {
    fn from(e: regex::Error) -> Self {
        TerminalError::new(TerminalErrorKind::InvalidPattern, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_timeout_maps_to_expect_timeout() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline");
        let err: TerminalError = io_err.into();
        assert_eq!(err.kind, TerminalErrorKind::ExpectTimeout);
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = TerminalError::new(TerminalErrorKind::NoDefaultUser, "no username supplied");
        assert_eq!(err.to_string(), "no default user: no username supplied");
    }

    #[test]
    fn called_process_carries_returncode_and_output() {
        let err = TerminalError::called_process("whoami", 1, "permission denied");
        assert_eq!(err.returncode, Some(1));
        assert_eq!(err.output.as_deref(), Some("permission denied"));
    }
}
