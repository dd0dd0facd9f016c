//! In-process fake [`Channel`] for scenario tests, standing in for a real
//! SSH/Telnet/subprocess endpoint so the login/expect/transfer engine can be
//! exercised end to end without a live network fixture.
//!
//! A [`FakeChannel`] is scripted with canned responses keyed by what the
//! caller sent, plus optional unconditional "banner" chunks queued ahead of
//! any scripted reply (login banners, prompts appearing unprompted).

use crate::channel::{Channel, RecvStatus};
use async_trait::async_trait;
use rlogin_core::TerminalError;
use std::collections::VecDeque;
use std::time::Duration;

pub struct FakeChannel {
    /// Chunks to hand back on successive `recv` calls, in order, regardless
    /// of what was sent — good enough to script a whole login + command
    /// transcript ahead of time.
    queue: VecDeque<String>,
    sent: Vec<String>,
    closed: bool,
    active: bool,
}

impl FakeChannel {
    pub fn new() -> Self {
        FakeChannel {
            queue: VecDeque::new(),
            sent: Vec::new(),
            closed: false,
            active: true,
        }
    }

    /// Appends a chunk `recv` will eventually return.
    pub fn push_recv(mut self, chunk: impl Into<String>) -> Self {
        self.queue.push_back(chunk.into());
        self
    }

    /// After the queue drains, further `recv`s return `Closed` instead of
    /// indefinite `NotReady`.
    pub fn close_after_queue(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn sent_log(&self) -> &[String] {
        &self.sent
    }
}

impl Default for FakeChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for FakeChannel {
    async fn send(&mut self, text: &str) -> Result<(), TerminalError> {
        self.sent.push(text.to_string());
        Ok(())
    }

    async fn recv(&mut self, _buf_size: usize) -> Result<RecvStatus, TerminalError> {
        match self.queue.pop_front() {
            Some(chunk) => Ok(RecvStatus::Data(chunk)),
            None if self.active => Ok(RecvStatus::NotReady),
            None => Ok(RecvStatus::Closed),
        }
    }

    async fn resize_pty(&mut self, _cols: u16, _rows: u16) -> Result<(), TerminalError> {
        Ok(())
    }

    fn set_keepalive(&mut self, _interval: Option<Duration>) {}

    fn is_active(&self) -> bool {
        !self.closed
    }

    async fn close(&mut self) -> Result<(), TerminalError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_chunks_are_returned_in_order() {
        let mut ch = FakeChannel::new().push_recv("first").push_recv("second");
        assert_eq!(ch.recv(64).await.unwrap(), RecvStatus::Data("first".into()));
        assert_eq!(ch.recv(64).await.unwrap(), RecvStatus::Data("second".into()));
        assert_eq!(ch.recv(64).await.unwrap(), RecvStatus::NotReady);
    }

    #[tokio::test]
    async fn closes_after_queue_when_configured() {
        let mut ch = FakeChannel::new().push_recv("x").close_after_queue();
        let _ = ch.recv(64).await;
        assert_eq!(ch.recv(64).await.unwrap(), RecvStatus::Closed);
    }

    #[tokio::test]
    async fn sent_log_records_every_send() {
        let mut ch = FakeChannel::new();
        ch.send("whoami\n").await.unwrap();
        assert_eq!(ch.sent_log(), ["whoami\n"]);
    }
}
