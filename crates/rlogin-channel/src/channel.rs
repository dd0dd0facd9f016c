//! The `Channel` trait: the byte-level transport contract every hop type
//! implements (SSH, Telnet, local subprocess, command-in-parent-terminal).

use async_trait::async_trait;
use rlogin_core::TerminalError;
use std::time::Duration;

/// Outcome of a single non-blocking [`Channel::recv`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvStatus {
    /// Bytes were available and are returned decoded as UTF-8 (invalid
    /// sequences dropped).
    Data(String),
    /// Nothing was available within the transport's short read window.
    NotReady,
    /// The peer closed the connection or EOF was reached.
    Closed,
}

/// Byte-level transport used by a single hop. All operations are
/// non-blocking beyond the transport's own short internal read timeout;
/// `TerminalCore` is the only caller and drives the polling loop itself.
#[async_trait]
pub trait Channel: Send {
    /// Best-effort single write. Does not wait for a reply.
    async fn send(&mut self, text: &str) -> Result<(), TerminalError>;

    /// Non-blocking read of up to `buf_size` bytes.
    async fn recv(&mut self, buf_size: usize) -> Result<RecvStatus, TerminalError>;

    /// Resize the remote PTY, when the transport supports it natively.
    /// A no-op for transports (or remote OSes) without native resize.
    async fn resize_pty(&mut self, cols: u16, rows: u16) -> Result<(), TerminalError>;

    /// Configure (or disable, with `None`) a periodic keepalive probe.
    fn set_keepalive(&mut self, interval: Option<Duration>);

    /// Quick liveness check; does not perform I/O.
    fn is_active(&self) -> bool;

    /// Idempotent teardown. Safe to call more than once.
    async fn close(&mut self) -> Result<(), TerminalError>;

    /// Whether this transport can perform file transfer natively (SFTP/SCP
    /// for SSH). `FileTransferFallback` uses this to decide whether to
    /// route through the base64-over-terminal path instead.
    fn supports_native_file_transfer(&self) -> bool {
        false
    }

    /// Opens a native `direct-tcpip` tunnel to `(host, port)` through this
    /// channel's underlying session, for `SSHProxyJump` chaining. Only
    /// [`crate::ssh::SshChannel`] overrides this; every other transport is
    /// not eligible to sit in the proxy-jump prefix and reports
    /// [`TerminalErrorKind::ConnectionOpen`].
    fn open_proxy_tunnel(&self, _host: &str, _port: u16) -> Result<std::net::TcpStream, TerminalError> {
        Err(TerminalError::new(
            rlogin_core::TerminalErrorKind::ConnectionOpen,
            "this channel does not support native SSH proxy-jump tunneling",
        ))
    }

    /// Uploads `data` to `remote_path` over this channel's native transfer
    /// protocol (SFTP for [`crate::ssh::SshChannel`]). Only called when
    /// [`Self::supports_native_file_transfer`] is true; every other
    /// transport reports `NotImplementedProtocol` so
    /// `rlogin_terminal::FileTransferFallback` falls back to the
    /// base64-over-terminal path.
    async fn native_put_file(&mut self, _remote_path: &str, _data: &[u8]) -> Result<(), TerminalError> {
        Err(TerminalError::new(
            rlogin_core::TerminalErrorKind::FileTransfer,
            "this channel has no native file-transfer protocol",
        ))
    }

    /// Downloads `remote_path` over this channel's native transfer
    /// protocol. See [`Self::native_put_file`].
    async fn native_get_file(&mut self, _remote_path: &str) -> Result<Vec<u8>, TerminalError> {
        Err(TerminalError::new(
            rlogin_core::TerminalErrorKind::FileTransfer,
            "this channel has no native file-transfer protocol",
        ))
    }

    /// Remote file size/mtime via this channel's native transfer protocol,
    /// when available.
    async fn native_stat_file(&mut self, _remote_path: &str) -> Result<(u64, Option<i64>), TerminalError> {
        Err(TerminalError::new(
            rlogin_core::TerminalErrorKind::FileTransfer,
            "this channel has no native file-transfer protocol",
        ))
    }
}
