//! `CommandInParentTerminal`: not a real transport. When the next hop is
//! reached by typing a command (`telnet 10.0.0.5`, `ssh host2`) into the
//! *current* shell rather than opening a fresh socket, this variant is that
//! shell: `send`/`recv` proxy straight through to the parent `Channel`, so
//! `TerminalCore`'s hop loop can treat "type a command into the shell I
//! already have" the same way it treats "open a brand new transport".

use crate::channel::{Channel, RecvStatus};
use async_trait::async_trait;
use rlogin_core::TerminalError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub struct CommandInParentTerminalChannel {
    parent: Arc<Mutex<Box<dyn Channel>>>,
}

impl CommandInParentTerminalChannel {
    pub fn new(parent: Arc<Mutex<Box<dyn Channel>>>) -> Self {
        CommandInParentTerminalChannel { parent }
    }
}

#[async_trait]
impl Channel for CommandInParentTerminalChannel {
    async fn send(&mut self, text: &str) -> Result<(), TerminalError> {
        self.parent.lock().await.send(text).await
    }

    async fn recv(&mut self, buf_size: usize) -> Result<RecvStatus, TerminalError> {
        self.parent.lock().await.recv(buf_size).await
    }

    async fn resize_pty(&mut self, cols: u16, rows: u16) -> Result<(), TerminalError> {
        self.parent.lock().await.resize_pty(cols, rows).await
    }

    fn set_keepalive(&mut self, interval: Option<Duration>) {
        if let Ok(mut guard) = self.parent.try_lock() {
            guard.set_keepalive(interval);
        }
    }

    fn is_active(&self) -> bool {
        self.parent.try_lock().map(|g| g.is_active()).unwrap_or(true)
    }

    async fn close(&mut self) -> Result<(), TerminalError> {
        // Closing a logical hop reached "within" the parent terminal does
        // not tear down the parent transport itself — only `exit`ing the
        // hop's shell (handled by `TerminalCore::close`'s ask/response
        // step) does that.
        Ok(())
    }
}
