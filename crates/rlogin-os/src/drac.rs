//! Dell DRAC `racadm` shell: a fixed `racadm> ` prompt and no PTY resize
//! support. File operations are modeled as unsupported, like iLO, since
//! `racadm` has no general-purpose file-transfer command set.

use crate::{not_supported, OsAdapter};
use rlogin_core::TerminalError;

#[derive(Debug, Default, Clone, Copy)]
pub struct DellDracAdapter;

impl OsAdapter for DellDracAdapter {
    fn name(&self) -> &'static str {
        "drac"
    }

    fn cat_program(&self) -> &'static str {
        ""
    }

    fn has_base64(&self) -> bool {
        false
    }

    fn can_resize_pty(&self) -> bool {
        false
    }

    fn expected_prompt(&self) -> Option<&str> {
        Some("racadm> ")
    }

    fn cat_to_file(&self, _file_path: &str, _message: &str) -> Result<String, TerminalError> {
        Err(not_supported("cat_to_file", self.name()))
    }

    fn remove(&self, _file_path: &str) -> Result<String, TerminalError> {
        Err(not_supported("remove", self.name()))
    }

    fn list_file(&self, _file_path: &str) -> Result<String, TerminalError> {
        Err(not_supported("list_file", self.name()))
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

    fn md5checksum(&self, _file_path: &str) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drac_has_fixed_prompt_and_no_resize() {
        let a = DellDracAdapter;
        assert_eq!(a.expected_prompt(), Some("racadm> "));
        assert!(!a.can_resize_pty());
    }
}
