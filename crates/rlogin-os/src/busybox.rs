//! BusyBox profile, layered on Linux, minus the `base64` binary BusyBox
//! builds typically drop.

use crate::linux::LinuxAdapter;
use crate::{not_supported, OsAdapter};
use rlogin_core::TerminalError;

#[derive(Debug, Default, Clone, Copy)]
pub struct BusyBoxAdapter {
    inner: LinuxAdapter,
}

impl OsAdapter for BusyBoxAdapter {
    fn name(&self) -> &'static str {
        "busybox"
    }

    fn cat_program(&self) -> &'static str {
        self.inner.cat_program()
    }

    fn has_base64(&self) -> bool {
        false
    }

    fn can_change_prompt(&self) -> bool {
        self.inner.can_change_prompt()
    }

    fn can_disable_history(&self) -> bool {
        self.inner.can_disable_history()
    }

    fn cat_to_file(&self, file_path: &str, message: &str) -> Result<String, TerminalError> {
        self.inner.cat_to_file(file_path, message)
    }

    fn remove(&self, file_path: &str) -> Result<String, TerminalError> {
        self.inner.remove(file_path)
    }

    fn list_file(&self, file_path: &str) -> Result<String, TerminalError> {
        Ok(format!("ls -le {file_path}"))
    }

    fn set_prompt(&self, prompt: &str) -> Option<String> {
        self.inner.set_prompt(prompt)
    }

    fn disable_history(&self) -> Option<String> {
        self.inner.disable_history()
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
        self.inner.md5checksum(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busybox_has_no_base64() {
        let a = BusyBoxAdapter::default();
        assert!(!a.has_base64());
        assert!(a.base64_encode("/tmp/x").is_err());
    }
}
