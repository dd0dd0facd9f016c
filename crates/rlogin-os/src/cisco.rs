//! Cisco IOS exec shell. `cat_to_file`/`remove`/`list_file` have no IOS
//! equivalent in the general case, so they're surfaced as unsupported the
//! same way BusyBox's missing base64 support is.

use crate::{not_supported, OsAdapter};
use rlogin_core::TerminalError;

#[derive(Debug, Default, Clone, Copy)]
pub struct CiscoIosAdapter;

impl OsAdapter for CiscoIosAdapter {
    fn name(&self) -> &'static str {
        "cisco-ios"
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

    fn resize_pty(&self, cols: u16, _rows: u16) -> String {
        format!("terminal length 0\nterminal width {cols}")
    }

    fn remove(&self, _file_path: &str) -> Result<String, TerminalError> {
        Err(not_supported("remove", self.name()))
    }

    fn list_file(&self, _file_path: &str) -> Result<String, TerminalError> {
        Err(not_supported("list_file", self.name()))
    }

    fn set_prompt(&self, prompt: &str) -> Option<String> {
        Some(format!("set prompt {prompt}"))
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
        format!("verify /md5 {file_path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_pty_uses_terminal_commands() {
        let a = CiscoIosAdapter;
        assert_eq!(a.resize_pty(132, 0), "terminal length 0\nterminal width 132");
    }

    #[test]
    fn md5checksum_uses_verify() {
        assert_eq!(CiscoIosAdapter.md5checksum("flash:image.bin"), "verify /md5 flash:image.bin");
    }
}
