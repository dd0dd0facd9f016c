//! `DataExchange`: an append-only, timestamped record of everything sent to
//! and received from a terminal, with redaction of hidden sends.
//!
//! Modeled on `remotelogin/connections/base/data.py`'s parallel
//! `_data_sent`/`_data_recv` lists: every [`DataExchange::new_sent`] call
//! opens a fresh receive accumulator, and every [`DataExchange::new_received`]
//! call appends to whichever accumulator is currently open. So
//! [`DataExchange::get_last_recv`] returns everything received since the
//! *last* send, concatenated, not just the bytes handed to the most recent
//! `new_received` call — the original's `self._data_recv[-1].getvalue()`.

use chrono::{DateTime, Utc};

/// One outbound send: `sent[i]` paired index-for-index with `received[i]`,
/// the accumulator of everything received before the next send (spec §3's
/// `sent[]`/`sentMeta[]`/`received[]`, kept here as one struct per entry
/// rather than three parallel vectors since `sent`/`sentMeta` are always
/// written together).
#[derive(Debug, Clone)]
pub struct Entry {
    pub timestamp: DateTime<Utc>,
    pub data: String,
    pub hidden: bool,
    pub title: Option<String>,
}

/// Looks up a human label for a lone ASCII control byte, for debug-log
/// formatting (e.g. `"CTL[ Bell ]"` instead of a raw unprintable byte).
pub fn control_label(byte: u8) -> Option<&'static str> {
    const NAMES: [&str; 33] = [
        "Null", "Start Of Heading", "Start Of Text", "End Of Text", "End Of Transmission",
        "Enquiry", "Acknowledge", "Bell", "Backspace", "Horizontal Tab", "Line Feed",
        "Vertical Tab", "Form Feed", "Carriage Return", "Shift Out", "Shift In",
        "Data Link Escape", "Device Control 1", "Device Control 2", "Device Control 3",
        "Device Control 4", "Negative Acknowledge", "Synchronous Idle",
        "End Of Transmission Block", "Cancel", "End Of Medium", "Substitute", "Escape",
        "File Separator", "Group Separator", "Record Separator", "Unit Separator", "Delete",
    ];
    match byte {
        0..=31 => Some(NAMES[byte as usize]),
        127 => Some(NAMES[32]),
        _ => None,
    }
}

pub struct DataExchange {
    sent: Vec<Entry>,
    /// Parallel to `sent`: `received[i]` accumulates every chunk passed to
    /// `new_received` between `sent[i]`'s send and the next one.
    received: Vec<String>,
    hidden_data_msg: String,
    remove_empty_on_stream: bool,
}

impl DataExchange {
    pub fn new(hidden_data_msg: impl Into<String>, remove_empty_on_stream: bool) -> Self {
        DataExchange {
            sent: Vec::new(),
            received: Vec::new(),
            hidden_data_msg: hidden_data_msg.into(),
            remove_empty_on_stream,
        }
    }

    /// Records an outbound send and opens a fresh receive accumulator for
    /// it. When `hidden` is true the stored text is replaced by the
    /// configured placeholder so transcripts never retain passwords or
    /// other secrets.
    pub fn new_sent(&mut self, data: &str, hidden: bool, title: Option<&str>) {
        if self.remove_empty_on_stream && data.trim().is_empty() {
            return;
        }
        let stored = if hidden { self.hidden_data_msg.clone() } else { data.to_string() };
        self.sent.push(Entry {
            timestamp: Utc::now(),
            data: stored,
            hidden,
            title: title.map(str::to_string),
        });
        self.received.push(String::new());
    }

    /// Appends `data` to the accumulator opened by the most recent
    /// `new_sent`. If nothing has been sent yet (e.g. a banner arriving
    /// before the first send), opens one implicitly rather than dropping
    /// the data.
    pub fn new_received(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        if self.received.is_empty() {
            self.received.push(String::new());
        }
        self.received.last_mut().expect("just ensured non-empty").push_str(data);
    }

    /// Everything received since the last send, concatenated across every
    /// `recv()` chunk that arrived in between — not just the most recent
    /// chunk.
    pub fn get_last_recv(&self) -> Option<&str> {
        self.received.last().map(String::as_str)
    }

    /// Flattened `[sent_0, received_0, sent_1, received_1, ...]`, in send
    /// order.
    pub fn get_conversation_list(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.sent.len() * 2);
        for (sent, recv) in self.sent.iter().zip(self.received.iter()) {
            out.push(sent.data.as_str());
            out.push(recv.as_str());
        }
        out
    }

    pub fn get_timed_conversation_list(&self) -> Vec<(DateTime<Utc>, &str, &str)> {
        self.sent
            .iter()
            .zip(self.received.iter())
            .map(|(sent, recv)| (sent.timestamp, sent.data.as_str(), recv.as_str()))
            .collect()
    }

    /// The `sent[]`/`sentMeta[]` half of the model; pair by index with
    /// whatever `get_last_recv`/`get_conversation_list` report for
    /// `received[]`.
    pub fn entries(&self) -> &[Entry] {
        &self.sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_sends_are_redacted() {
        let mut d = DataExchange::new("**HIDDEN**", false);
        d.new_sent("s3cr3t\n", true, Some("password"));
        assert_eq!(d.get_conversation_list(), vec!["**HIDDEN**", ""]);
    }

    #[test]
    fn visible_sends_are_kept_verbatim() {
        let mut d = DataExchange::new("**HIDDEN**", false);
        d.new_sent("whoami\n", false, None);
        assert_eq!(d.get_conversation_list(), vec!["whoami\n", ""]);
    }

    #[test]
    fn last_recv_ignores_sent_entries() {
        let mut d = DataExchange::new("**HIDDEN**", false);
        d.new_sent("whoami\n", false, None);
        d.new_received("root\n");
        assert_eq!(d.get_last_recv(), Some("root\n"));
    }

    #[test]
    fn last_recv_accumulates_every_chunk_since_the_last_send() {
        let mut d = DataExchange::new("**HIDDEN**", false);
        d.new_sent("cat bigfile\n", false, None);
        d.new_received("ro");
        d.new_received("ot");
        d.new_received("\n");
        assert_eq!(d.get_last_recv(), Some("root\n"));
    }

    #[test]
    fn new_sent_opens_a_fresh_accumulator() {
        let mut d = DataExchange::new("**HIDDEN**", false);
        d.new_sent("whoami\n", false, None);
        d.new_received("root\n");
        d.new_sent("id\n", false, None);
        assert_eq!(d.get_last_recv(), Some(""));
        assert_eq!(d.get_conversation_list(), vec!["whoami\n", "root\n", "id\n", ""]);
    }

    #[test]
    fn control_label_known_and_unknown() {
        assert_eq!(control_label(7), Some("Bell"));
        assert_eq!(control_label(b'A'), None);
    }
}
