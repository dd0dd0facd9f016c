//! SSH channel: interactive shell session over `ssh2`. One background
//! thread owns the `ssh2::Channel` (libssh2 channels are not safely shared
//! across threads), set non-blocking, polled in a loop with a command queue
//! for writes/resizes/close and an output queue for reads. Auth is tried in
//! order: key file, then agent, then password. See [`crate::proxy_jump`]
//! for the proxy-jump variant.

use crate::channel::{Channel, RecvStatus};
use async_trait::async_trait;
use rlogin_core::{TerminalError, TerminalErrorKind};
use secrecy::{ExposeSecret, SecretString};
use ssh2::{KnownHostFileKind, Session};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;
use tokio::sync::mpsc as tokio_mpsc;

const READ_CHUNK: usize = 16 * 1024;
const IDLE_SLEEP: Duration = Duration::from_millis(5);

enum ShellCommand {
    Write(Vec<u8>),
    Resize(u16, u16),
    SetKeepalive(Option<Duration>),
    Close,
    /// Requests a `direct-tcpip` tunnel to `(host, port)`, bridged to a
    /// loopback `TcpStream` handed back through `reply`. Handled inline by
    /// the pump thread because the `ssh2::Session` the tunnel is opened
    /// from never leaves that thread (see module docs).
    OpenTunnel {
        host: String,
        port: u16,
        reply: std_mpsc::Sender<Result<TcpStream, String>>,
    },
    /// Native SFTP upload, handled inline for the same reason `OpenTunnel`
    /// is: the `ssh2::Session` never leaves the pump thread.
    SftpPut {
        remote_path: String,
        data: Vec<u8>,
        reply: std_mpsc::Sender<Result<(), String>>,
    },
    SftpGet {
        remote_path: String,
        reply: std_mpsc::Sender<Result<Vec<u8>, String>>,
    },
    SftpStat {
        remote_path: String,
        reply: std_mpsc::Sender<Result<(u64, Option<i64>), String>>,
    },
}

enum ShellEvent {
    Data(Vec<u8>),
    Closed,
}

/// Auth material for [`SshChannel::connect`], tried in order: key file,
/// then agent, then password.
#[derive(Default, Clone)]
pub struct SshAuth {
    pub username: String,
    pub password: Option<SecretString>,
    pub key_filename: Option<String>,
    pub key_password: Option<SecretString>,
    pub use_agent: bool,
    pub allow_unknown_host_key: bool,
}

pub struct SshChannel {
    cmd_tx: std_mpsc::Sender<ShellCommand>,
    event_rx: tokio_mpsc::UnboundedReceiver<ShellEvent>,
    reader: Option<std::thread::JoinHandle<()>>,
    closed: bool,
}

impl SshChannel {
    /// Opens a direct TCP connection and an interactive shell session.
    /// `tcp` is already connected — callers that need a proxy-jumped
    /// transport construct it via [`crate::proxy_jump`] and pass it here.
    pub fn connect(
        tcp: TcpStream,
        host: &str,
        port: u16,
        auth: &SshAuth,
        cols: u16,
        rows: u16,
        term: &str,
    ) -> Result<Self, TerminalError> {
        tcp.set_nodelay(true).ok();
        let mut session = Session::new().map_err(ssh_err)?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(ssh_err)?;

        if !auth.allow_unknown_host_key {
            verify_host_key(&session, host, port)?;
        }

        authenticate(&mut session, auth)?;

        let mut channel = session.channel_session().map_err(ssh_err)?;
        channel
            .request_pty(term, None, Some((cols as u32, rows as u32, 0, 0)))
            .map_err(ssh_err)?;
        channel.shell().map_err(ssh_err)?;
        session.set_blocking(false);

        let (cmd_tx, cmd_rx) = std_mpsc::channel::<ShellCommand>();
        let (event_tx, event_rx) = tokio_mpsc::unbounded_channel::<ShellEvent>();

        let reader = std::thread::spawn(move || {
            shell_pump(session, channel, cmd_rx, event_tx);
        });

        Ok(SshChannel {
            cmd_tx,
            event_rx,
            reader: Some(reader),
            closed: false,
        })
    }
}

fn shell_pump(
    session: Session,
    mut channel: ssh2::Channel,
    cmd_rx: std_mpsc::Receiver<ShellCommand>,
    event_tx: tokio_mpsc::UnboundedSender<ShellEvent>,
) {
    let mut buffer = [0u8; READ_CHUNK];
    let mut keepalive: Option<Duration> = None;
    let mut last_keepalive = std::time::Instant::now();
    let mut running = true;

    while running {
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                ShellCommand::Write(bytes) => {
                    if channel.write_all(&bytes).is_ok() {
                        let _ = channel.flush();
                    }
                }
                ShellCommand::Resize(cols, rows) => {
                    let _ = channel.request_pty_size(cols as u32, rows as u32, None, None);
                }
                ShellCommand::SetKeepalive(interval) => {
                    keepalive = interval;
                    last_keepalive = std::time::Instant::now();
                }
                ShellCommand::Close => {
                    let _ = channel.close();
                    running = false;
                }
                ShellCommand::OpenTunnel { host, port, reply } => {
                    // `channel_direct_tcpip` needs a blocking session; the
                    // shell itself is polled in this same loop so a brief
                    // blocking window here only delays shell reads, it
                    // doesn't deadlock anything.
                    session.set_blocking(true);
                    let result = crate::proxy_jump::bridge_direct_tcpip(&session, &host, port)
                        .map_err(|e| e.to_string());
                    session.set_blocking(false);
                    let _ = reply.send(result);
                }
                ShellCommand::SftpPut { remote_path, data, reply } => {
                    session.set_blocking(true);
                    let result = sftp_put(&session, &remote_path, &data);
                    session.set_blocking(false);
                    let _ = reply.send(result);
                }
                ShellCommand::SftpGet { remote_path, reply } => {
                    session.set_blocking(true);
                    let result = sftp_get(&session, &remote_path);
                    session.set_blocking(false);
                    let _ = reply.send(result);
                }
                ShellCommand::SftpStat { remote_path, reply } => {
                    session.set_blocking(true);
                    let result = sftp_stat(&session, &remote_path);
                    session.set_blocking(false);
                    let _ = reply.send(result);
                }
            }
        }
        if !running {
            break;
        }

        match channel.read(&mut buffer) {
            Ok(0) => {}
            Ok(n) => {
                let _ = event_tx.send(ShellEvent::Data(buffer[..n].to_vec()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(_) => {
                let _ = event_tx.send(ShellEvent::Closed);
                break;
            }
        }

        if channel.eof() {
            let _ = event_tx.send(ShellEvent::Closed);
            break;
        }

        if let Some(interval) = keepalive {
            if last_keepalive.elapsed() >= interval {
                let _ = session.keepalive_send();
                last_keepalive = std::time::Instant::now();
            }
        }

        std::thread::sleep(IDLE_SLEEP);
    }
}

fn authenticate(session: &mut Session, auth: &SshAuth) -> Result<(), TerminalError> {
    if let Some(key) = &auth.key_filename {
        let pass = auth.key_password.as_ref().map(|s| s.expose_secret().as_str());
        return session
            .userauth_pubkey_file(&auth.username, None, Path::new(key), pass)
            .map_err(|e| {
                if e.message().to_lowercase().contains("passphrase") {
                    TerminalError::new(TerminalErrorKind::BadSshKeyPassword, e.to_string())
                } else {
                    ssh_err(e)
                }
            });
    }
    if auth.use_agent {
        if let Ok(mut agent) = session.agent() {
            if agent.connect().is_ok() && agent.list_identities().is_ok() {
                if let Ok(identities) = agent.identities() {
                    for identity in identities {
                        if agent.userauth(&auth.username, &identity).is_ok() {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
    if let Some(password) = &auth.password {
        return session
            .userauth_password(&auth.username, password.expose_secret())
            .map_err(|e| TerminalError::new(TerminalErrorKind::Authentication, e.to_string()));
    }
    Err(TerminalError::new(
        TerminalErrorKind::Authentication,
        "no key file, agent identity, or password available for SSH authentication",
    ))
}

/// Rejects an unrecognized or mismatched host key when
/// `allow_unknown_host_key` is false — the real, load-bearing policy
/// `original_source/remotelogin/connections/ssh/__init__.py` grounds this
/// on (`allow_unknown_keys` selects `paramiko.AutoAddPolicy()` vs
/// `paramiko.RejectPolicy()`).
fn verify_host_key(session: &Session, host: &str, port: u16) -> Result<(), TerminalError> {
    let (key, key_type) = session.host_key().ok_or_else(|| {
        TerminalError::new(TerminalErrorKind::UnknownKeyToServer, "server presented no host key")
    })?;
    let mut known_hosts = session.known_hosts().map_err(ssh_err)?;
    if let Some(home) = dirs::home_dir() {
        let path = home.join(".ssh").join("known_hosts");
        let _ = known_hosts.read_file(&path, KnownHostFileKind::OpenSSH);
    }
    match known_hosts.check_port(host, port as u16, key) {
        ssh2::CheckResult::Match => Ok(()),
        ssh2::CheckResult::Mismatch => Err(TerminalError::new(
            TerminalErrorKind::UnknownKeyToServer,
            format!("host key for {host}:{port} ({key_type:?}) does not match the known_hosts entry"),
        )),
        ssh2::CheckResult::NotFound => Err(TerminalError::new(
            TerminalErrorKind::UnknownKeyToServer,
            format!("host key for {host}:{port} ({key_type:?}) is not in known_hosts and allow_unknown_host_key is not set"),
        )),
        ssh2::CheckResult::Failure => Err(TerminalError::new(
            TerminalErrorKind::UnknownKeyToServer,
            format!("could not verify the host key for {host}:{port} against known_hosts"),
        )),
    }
}

fn ssh_err(e: ssh2::Error) -> TerminalError {
    TerminalError::new(TerminalErrorKind::ConnectionOpen, e.to_string())
}

/// Native SFTP upload via `ssh2::Sftp::create` + `Write::write_all`.
/// Called only while `session` has been switched to blocking mode by the
/// pump loop.
fn sftp_put(session: &Session, remote_path: &str, data: &[u8]) -> Result<(), String> {
    let sftp = session.sftp().map_err(|e| e.to_string())?;
    let mut remote_file = sftp.create(Path::new(remote_path)).map_err(|e| e.to_string())?;
    remote_file.write_all(data).map_err(|e| e.to_string())?;
    Ok(())
}

/// Native SFTP download via `ssh2::Sftp::open` + `Read::read_to_end`.
fn sftp_get(session: &Session, remote_path: &str) -> Result<Vec<u8>, String> {
    let sftp = session.sftp().map_err(|e| e.to_string())?;
    let mut remote_file = sftp.open(Path::new(remote_path)).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    remote_file.read_to_end(&mut out).map_err(|e| e.to_string())?;
    Ok(out)
}

/// Native SFTP `stat`.
fn sftp_stat(session: &Session, remote_path: &str) -> Result<(u64, Option<i64>), String> {
    let sftp = session.sftp().map_err(|e| e.to_string())?;
    let stat = sftp.stat(Path::new(remote_path)).map_err(|e| e.to_string())?;
    Ok((stat.size.unwrap_or(0), stat.mtime.map(|v| v as i64)))
}

#[async_trait]
impl Channel for SshChannel {
    async fn send(&mut self, text: &str) -> Result<(), TerminalError> {
        self.cmd_tx
            .send(ShellCommand::Write(text.as_bytes().to_vec()))
            .map_err(|_| TerminalError::new(TerminalErrorKind::ConnectionNotOpen, "ssh channel reader thread is gone"))
    }

    async fn recv(&mut self, _buf_size: usize) -> Result<RecvStatus, TerminalError> {
        match self.event_rx.try_recv() {
            Ok(ShellEvent::Data(bytes)) => {
                Ok(RecvStatus::Data(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Ok(ShellEvent::Closed) => Ok(RecvStatus::Closed),
            Err(tokio_mpsc::error::TryRecvError::Empty) => Ok(RecvStatus::NotReady),
            Err(tokio_mpsc::error::TryRecvError::Disconnected) => Ok(RecvStatus::Closed),
        }
    }

    async fn resize_pty(&mut self, cols: u16, rows: u16) -> Result<(), TerminalError> {
        let _ = self.cmd_tx.send(ShellCommand::Resize(cols, rows));
        Ok(())
    }

    fn set_keepalive(&mut self, interval: Option<Duration>) {
        let _ = self.cmd_tx.send(ShellCommand::SetKeepalive(interval));
    }

    fn is_active(&self) -> bool {
        !self.closed
    }

    async fn close(&mut self) -> Result<(), TerminalError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let _ = self.cmd_tx.send(ShellCommand::Close);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn supports_native_file_transfer(&self) -> bool {
        true
    }

    fn open_proxy_tunnel(&self, host: &str, port: u16) -> Result<TcpStream, TerminalError> {
        let (reply_tx, reply_rx) = std_mpsc::channel();
        self.cmd_tx
            .send(ShellCommand::OpenTunnel {
                host: host.to_string(),
                port,
                reply: reply_tx,
            })
            .map_err(|_| {
                TerminalError::new(TerminalErrorKind::ConnectionNotOpen, "ssh channel reader thread is gone")
            })?;
        reply_rx
            .recv_timeout(Duration::from_secs(15))
            .map_err(|_| TerminalError::new(TerminalErrorKind::ConnectionOpen, "proxy-jump tunnel request timed out"))?
            .map_err(|msg| TerminalError::new(TerminalErrorKind::ConnectionOpen, msg))
    }

    async fn native_put_file(&mut self, remote_path: &str, data: &[u8]) -> Result<(), TerminalError> {
        let (reply_tx, reply_rx) = std_mpsc::channel();
        self.cmd_tx
            .send(ShellCommand::SftpPut { remote_path: remote_path.to_string(), data: data.to_vec(), reply: reply_tx })
            .map_err(|_| TerminalError::new(TerminalErrorKind::ConnectionNotOpen, "ssh channel reader thread is gone"))?;
        reply_rx
            .recv_timeout(Duration::from_secs(120))
            .map_err(|_| TerminalError::new(TerminalErrorKind::FileTransfer, "sftp put timed out"))?
            .map_err(|msg| TerminalError::new(TerminalErrorKind::FileTransfer, msg))
    }

    async fn native_get_file(&mut self, remote_path: &str) -> Result<Vec<u8>, TerminalError> {
        let (reply_tx, reply_rx) = std_mpsc::channel();
        self.cmd_tx
            .send(ShellCommand::SftpGet { remote_path: remote_path.to_string(), reply: reply_tx })
            .map_err(|_| TerminalError::new(TerminalErrorKind::ConnectionNotOpen, "ssh channel reader thread is gone"))?;
        reply_rx
            .recv_timeout(Duration::from_secs(120))
            .map_err(|_| TerminalError::new(TerminalErrorKind::FileTransfer, "sftp get timed out"))?
            .map_err(|msg| TerminalError::new(TerminalErrorKind::FileTransfer, msg))
    }

    async fn native_stat_file(&mut self, remote_path: &str) -> Result<(u64, Option<i64>), TerminalError> {
        let (reply_tx, reply_rx) = std_mpsc::channel();
        self.cmd_tx
            .send(ShellCommand::SftpStat { remote_path: remote_path.to_string(), reply: reply_tx })
            .map_err(|_| TerminalError::new(TerminalErrorKind::ConnectionNotOpen, "ssh channel reader thread is gone"))?;
        reply_rx
            .recv_timeout(Duration::from_secs(30))
            .map_err(|_| TerminalError::new(TerminalErrorKind::FileTransfer, "sftp stat timed out"))?
            .map_err(|msg| TerminalError::new(TerminalErrorKind::FileTransfer, msg))
    }
}
