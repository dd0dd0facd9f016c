//! Builds a [`Channel`] from a [`ConnectionSpec`], for both a locally-opened
//! base hop and an SSH hop reached through a native proxy-jump tunnel.

use rlogin_channel::{Channel, ConnectionSpec, LocalSubprocessChannel, Protocol, SshAuth, SshChannel, TelnetChannel};
use rlogin_core::{TerminalError, TerminalErrorKind};
use secrecy::ExposeSecret;
use std::net::TcpStream;
use std::time::Duration;
use tokio::net::TcpStream as AsyncTcpStream;

const SSH_TERM: &str = "xterm-256color";

fn ssh_auth(spec: &ConnectionSpec, allow_unknown_host_key: bool, key_filename: Option<&str>, key_password: Option<&str>) -> SshAuth {
    SshAuth {
        username: spec.username.clone().unwrap_or_default(),
        password: spec.password.clone(),
        key_filename: key_filename.map(str::to_string),
        key_password: key_password.map(|p| secrecy::SecretString::new(p.to_string())),
        use_agent: key_filename.is_none(),
        allow_unknown_host_key,
    }
}

/// Opens `spec` as a fresh, independent transport: a direct TCP connection
/// for SSH/Telnet, or a spawned child process for a local subprocess hop.
/// This is the path used for `connections[0]` (or, when no SSH prefix is
/// eligible for proxy-jump, every hop opened as a typed-in-shell spawn
/// instead).
pub async fn open_direct(spec: &ConnectionSpec) -> Result<Box<dyn Channel>, TerminalError> {
    match &spec.protocol {
        Protocol::Ssh { host, port, key_filename, key_password, allow_unknown_host_key } => {
            let addr = format!("{host}:{port}");
            let std_stream = tokio::time::timeout(spec.connect_timeout, AsyncTcpStream::connect(&addr))
                .await
                .map_err(|_| TerminalError::new(TerminalErrorKind::ConnectionOpen, format!("ssh connect to {addr} timed out")))?
                .map_err(TerminalError::from)?
                .into_std()
                .map_err(TerminalError::from)?;
            std_stream.set_nonblocking(false).map_err(TerminalError::from)?;
            let auth = ssh_auth(
                spec,
                *allow_unknown_host_key,
                key_filename.as_deref(),
                key_password.as_ref().map(|s| s.expose_secret().as_str()),
            );
            let channel = SshChannel::connect(std_stream, host, *port, &auth, spec.cols, spec.rows, SSH_TERM)?;
            Ok(Box::new(channel))
        }
        Protocol::Telnet { host, port } => {
            let password = spec.password.as_ref().map(|s| s.expose_secret().to_string());
            let channel = TelnetChannel::connect(host, *port, spec.cols, spec.rows, spec.username.as_deref(), password.as_deref()).await?;
            Ok(Box::new(channel))
        }
        Protocol::LocalSubprocess | Protocol::Command(None) => {
            let channel = LocalSubprocessChannel::spawn(spec.os.shell_app(), spec.cols, spec.rows)?;
            Ok(Box::new(channel))
        }
        Protocol::Command(Some(_)) => Err(TerminalError::new(
            TerminalErrorKind::ConnectionOpen,
            "a Protocol::Command hop can only be reached through a prior hop's shell, not opened directly",
        )),
    }
}

/// Opens `spec` (always an SSH hop) through a native `direct-tcpip` tunnel
/// bridged by `via`, the previous SSH hop in a proxy-jump prefix.
pub fn open_via_proxy_jump(via: &dyn Channel, spec: &ConnectionSpec) -> Result<Box<dyn Channel>, TerminalError> {
    let (host, port, key_filename, key_password, allow_unknown_host_key) = match &spec.protocol {
        Protocol::Ssh { host, port, key_filename, key_password, allow_unknown_host_key } => {
            (host.as_str(), *port, key_filename.as_deref(), key_password.clone(), *allow_unknown_host_key)
        }
        _ => {
            return Err(TerminalError::new(
                TerminalErrorKind::ConnectionOpen,
                "only SSH hops participate in native proxy-jump chaining",
            ))
        }
    };
    let tcp: TcpStream = via.open_proxy_tunnel(host, port)?;
    tcp.set_nonblocking(false).map_err(TerminalError::from)?;
    let auth = ssh_auth(spec, allow_unknown_host_key, key_filename, key_password.as_ref().map(|s| s.expose_secret().as_str()));
    let channel = SshChannel::connect(tcp, host, port, &auth, spec.cols, spec.rows, SSH_TERM)?;
    Ok(Box::new(channel))
}

/// How long `open`'s post-spawn settle (send a newline, briefly flush)
/// waits before the prompt-detection proper begins.
pub const SETTLE_DELAY: Duration = Duration::from_millis(150);
