//! `ConnectionSpec`: an unopened connection descriptor — protocol, host/port,
//! auth material, OS adapter, and terminal flags — that produces a
//! [`Channel`](crate::Channel) on open.

use rlogin_core::AskResponse;
use rlogin_os::OsAdapter;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

/// Which protocol a hop's [`ConnectionSpec`] describes.
#[derive(Clone)]
pub enum Protocol {
    Ssh {
        host: String,
        port: u16,
        key_filename: Option<String>,
        key_password: Option<SecretString>,
        allow_unknown_host_key: bool,
    },
    Telnet {
        host: String,
        port: u16,
    },
    LocalSubprocess,
    /// "Arbitrary spawn-command channel": the next hop is reached by typing
    /// a raw command into the current shell rather than opening a new
    /// socket. `None` means TerminalCore should synthesize the command from
    /// the OS adapter's `ssh_app`/`telnet_app` template and this spec's
    /// `host`/`port`/`username`; `Some(cmd)` is a caller-supplied literal
    /// command.
    Command(Option<String>),
}

/// An unopened connection descriptor: one entry in `TerminalCore`'s
/// `connections[]`. `connections[0]` is opened locally; every later entry
/// is reached *through* the previous hop.
#[derive(Clone)]
pub struct ConnectionSpec {
    pub protocol: Protocol,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// May contain the literal placeholder `{username}`, expanded at open
    /// time.
    pub expected_prompt: Option<String>,
    pub os: Arc<dyn OsAdapter>,
    pub cols: u16,
    pub rows: u16,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Login script for this hop. Empty means "use
    /// `AskResponse::for_new_connection` built from `username`/`password`".
    pub ask_response_list: Vec<AskResponse>,
    /// Disables the same-prompt-across-hop sanity check for this hop — an
    /// explicit opt-out, not an inferred one.
    pub skip_prompt_check: bool,
    /// Whether this hop participates in SSH-to-SSH native proxy-jump
    /// short-circuiting (only meaningful for consecutive `Protocol::Ssh`
    /// entries at the head of `connections[]`).
    pub enable_proxy_jump: bool,
}

impl ConnectionSpec {
    pub fn new(protocol: Protocol, os: Arc<dyn OsAdapter>) -> Self {
        ConnectionSpec {
            protocol,
            username: None,
            password: None,
            expected_prompt: None,
            os,
            cols: 80,
            rows: 24,
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            ask_response_list: Vec::new(),
            skip_prompt_check: false,
            enable_proxy_jump: true,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    pub fn with_expected_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.expected_prompt = Some(prompt.into());
        self
    }

    /// Expands the `{username}` placeholder in `expected_prompt`, if any.
    pub fn expanded_expected_prompt(&self) -> Option<String> {
        self.expected_prompt.as_ref().map(|p| {
            p.replace("{username}", self.username.as_deref().unwrap_or(""))
        })
    }

    /// Whether this is (one of) the SSH prefix hops eligible for native
    /// proxy-jump short-circuiting.
    pub fn is_ssh(&self) -> bool {
        matches!(self.protocol, Protocol::Ssh { .. })
    }

    /// Builds the command a caller types into the *current* hop's shell to
    /// reach this hop, for any `Protocol::Command`-style transition
    /// (including the generic "ssh/telnet spawned from inside the prior
    /// shell" case TerminalCore uses for non-proxy-jumped hops).
    pub fn spawn_command_line(&self) -> String {
        match &self.protocol {
            Protocol::Command(Some(cmd)) => cmd.clone(),
            Protocol::Ssh { host, port, .. } => {
                let user = self
                    .username
                    .as_deref()
                    .map(|u| format!("-l {u} "))
                    .unwrap_or_default();
                format!("ssh -p {port} {user}{host}")
            }
            Protocol::Telnet { host, port } => format!("telnet {host} {port}"),
            Protocol::LocalSubprocess | Protocol::Command(None) => {
                self.os.name().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlogin_os::UnixAdapter;

    #[test]
    fn expected_prompt_placeholder_is_expanded() {
        let spec = ConnectionSpec::new(
            Protocol::Ssh {
                host: "10.0.0.5".into(),
                port: 22,
                key_filename: None,
                key_password: None,
                allow_unknown_host_key: false,
            },
            Arc::new(UnixAdapter::default()),
        )
        .with_username("alice")
        .with_expected_prompt(r"{username}@.+?:~\$ ");
        assert_eq!(spec.expanded_expected_prompt().unwrap(), r"alice@.+?:~\$ ");
    }

    #[test]
    fn spawn_command_line_for_ssh_hop() {
        let spec = ConnectionSpec::new(
            Protocol::Ssh {
                host: "10.0.0.5".into(),
                port: 2222,
                key_filename: None,
                key_password: None,
                allow_unknown_host_key: false,
            },
            Arc::new(UnixAdapter::default()),
        )
        .with_username("alice");
        assert_eq!(spec.spawn_command_line(), "ssh -p 2222 -l alice 10.0.0.5");
    }
}
