//! HP iLO management shell: exposes none of `cat_to_file`/`remove`/
//! `list_file` and has no base64 tooling at all.

use crate::{not_supported, OsAdapter};
use rlogin_core::TerminalError;

#[derive(Debug, Default, Clone, Copy)]
pub struct IloAdapter;

impl OsAdapter for IloAdapter {
    fn name(&self) -> &'static str {
        "ilo"
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
