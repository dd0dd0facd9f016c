//! Local subprocess channel: spawns the host OS's shell with piped stdio.
//!
//! Grounded on `original_source/remotelogin/connections/local.py` plus the
//! reader-task shape [`crate::ssh::SshChannel`] uses for its own shell
//! session: a dedicated background task owns the blocking read loop on
//! `ChildStdout` and pushes chunks onto a bounded `tokio::sync::mpsc`
//! channel, exactly the "producer task + bounded queue" architecture
//! SPEC_FULL.md §5 calls for. `recv()` only ever does a non-blocking
//! `try_recv()` against that queue — the actual wait for pipe data happens
//! in the producer, off the caller's `expect` loop.

use crate::channel::{Channel, RecvStatus};
use async_trait::async_trait;
use rlogin_core::{TerminalError, TerminalErrorKind};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc;

/// How many unread chunks the producer task may buffer before it blocks on
/// `send` — a generous cap since the consumer drains it every `recv` poll.
const QUEUE_DEPTH: usize = 256;
const READ_CHUNK: usize = 8 * 1024;

enum ShellEvent {
    Data(Vec<u8>),
    Closed,
}

pub struct LocalSubprocessChannel {
    child: Child,
    stdin: ChildStdin,
    event_rx: mpsc::Receiver<ShellEvent>,
    reader: Option<tokio::task::JoinHandle<()>>,
    closed: bool,
}

impl LocalSubprocessChannel {
    /// Spawns `shell_app` (e.g. `/bin/bash`, `cmd.exe`) with piped stdio.
    /// `cols`/`rows` are forwarded as `COLUMNS`/`LINES` environment
    /// variables, a portable fallback for when no PTY allocation is
    /// available for the host platform.
    pub fn spawn(shell_app: &str, cols: u16, rows: u16) -> Result<Self, TerminalError> {
        let mut command = tokio::process::Command::new(shell_app);
        command
            .env("COLUMNS", cols.to_string())
            .env("LINES", rows.to_string())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            TerminalError::new(TerminalErrorKind::ConnectionOpen, format!("failed to spawn '{shell_app}': {e}"))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            TerminalError::new(TerminalErrorKind::ConnectionOpen, "child process has no stdin handle")
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| {
            TerminalError::new(TerminalErrorKind::ConnectionOpen, "child process has no stdout handle")
        })?;

        let (event_tx, event_rx) = mpsc::channel(QUEUE_DEPTH);
        let reader = tokio::spawn(async move {
            let mut buf = [0u8; READ_CHUNK];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) => {
                        let _ = event_tx.send(ShellEvent::Closed).await;
                        break;
                    }
                    Ok(n) => {
                        if event_tx.send(ShellEvent::Data(buf[..n].to_vec())).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        let _ = event_tx.send(ShellEvent::Closed).await;
                        break;
                    }
                }
            }
        });

        Ok(LocalSubprocessChannel {
            child,
            stdin,
            event_rx,
            reader: Some(reader),
            closed: false,
        })
    }
}

#[async_trait]
impl Channel for LocalSubprocessChannel {
    async fn send(&mut self, text: &str) -> Result<(), TerminalError> {
        self.stdin.write_all(text.as_bytes()).await.map_err(TerminalError::from)?;
        self.stdin.flush().await.map_err(TerminalError::from)
    }

    async fn recv(&mut self, _buf_size: usize) -> Result<RecvStatus, TerminalError> {
        match self.event_rx.try_recv() {
            Ok(ShellEvent::Data(bytes)) => Ok(RecvStatus::Data(String::from_utf8_lossy(&bytes).into_owned())),
            Ok(ShellEvent::Closed) => Ok(RecvStatus::Closed),
            Err(mpsc::error::TryRecvError::Empty) => Ok(RecvStatus::NotReady),
            Err(mpsc::error::TryRecvError::Disconnected) => Ok(RecvStatus::Closed),
        }
    }

    /// No PTY is allocated for a local subprocess; resize is expressed via
    /// `COLUMNS`/`LINES`, which only take effect for a freshly spawned
    /// shell, so this is a no-op for an already-running one.
    async fn resize_pty(&mut self, _cols: u16, _rows: u16) -> Result<(), TerminalError> {
        Ok(())
    }

    fn set_keepalive(&mut self, _interval: Option<Duration>) {}

    fn is_active(&self) -> bool {
        !self.closed
            && self
                .child
                .id()
                .is_some()
    }

    async fn close(&mut self) -> Result<(), TerminalError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
        Ok(())
    }
}
