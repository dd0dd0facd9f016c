//! Alcatel exec shell: the same command family as Cisco IOS but with its
//! own prompt-setting and `tty` sizing syntax, and a 150-row/column clamp.

use crate::{not_supported, OsAdapter};
use rlogin_core::TerminalError;

#[derive(Debug, Default, Clone, Copy)]
pub struct AlcatelAdapter;

const MAX_DIMENSION: u16 = 150;

impl OsAdapter for AlcatelAdapter {
    fn name(&self) -> &'static str {
        "alcatel"
    }

    fn cat_program(&self) -> &'static str {
        "type"
    }

    fn has_base64(&self) -> bool {
        false
    }

    fn can_change_prompt(&self) -> bool {
        true
    }

    fn cat_to_file(&self, _file_path: &str, _message: &str) -> Result<String, TerminalError> {
        Err(not_supported("cat_to_file", self.name()))
    }

    fn resize_pty(&self, cols: u16, rows: u16) -> String {
        let clamp = |v: u16| v.clamp(0, MAX_DIMENSION);
        format!("tty {} {}", clamp(rows), clamp(cols))
    }

    fn remove(&self, _file_path: &str) -> Result<String, TerminalError> {
        Err(not_supported("remove", self.name()))
    }

    fn list_file(&self, _file_path: &str) -> Result<String, TerminalError> {
        Err(not_supported("list_file", self.name()))
    }

    fn set_prompt(&self, prompt: &str) -> Option<String> {
        Some(format!("session prompt default  {prompt}"))
    }

    fn base64_encode(&self, _file: &str) -> Result<String, TerminalError> {
        Err(not_supported("base64 encode", self.name()))
    }

    fn base64_encode_to_file(&self, _decoded: &str, _encoded: &str) -> Result<String, TerminalError> {
        Err(not_supported("base64 encode-to-file", self.name()))
    }

    fn base64_decode_to_file(&self, _encoded: &str, _decoded: &str) -> Result<String, TerminalError> {
        Err(not_supported("base64 decode-to-file", self.name()))
    }

    fn md5checksum(&self, file_path: &str) -> String {
        format!("checksum md5 {file_path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_pty_clamps_to_150() {
        let a = AlcatelAdapter;
        assert_eq!(a.resize_pty(400, 400), "tty 150 150");
    }
}
