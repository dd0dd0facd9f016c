//! Linux profile, layered on the generic Unix command set. Device-management
//! extras (`restart`, `add_user`, NTP, routing) are out of this engine's
//! scope; only the terminal-automation-relevant command set lives here.

use crate::unix::UnixAdapter;
use crate::OsAdapter;
use rlogin_core::TerminalError;

#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxAdapter {
    inner: UnixAdapter,
}

impl OsAdapter for LinuxAdapter {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn cat_program(&self) -> &'static str {
        self.inner.cat_program()
    }

    fn has_base64(&self) -> bool {
        self.inner.has_base64()
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
        self.inner.list_file(file_path)
    }

    fn set_prompt(&self, prompt: &str) -> Option<String> {
        self.inner.set_prompt(prompt)
    }

    fn disable_history(&self) -> Option<String> {
        self.inner.disable_history()
    }

    fn enable_history(&self) -> Option<String> {
        self.inner.enable_history()
    }

    fn base64_encode(&self, file: &str) -> Result<String, TerminalError> {
        self.inner.base64_encode(file)
    }

    fn base64_encode_to_file(&self, decoded: &str, encoded: &str) -> Result<String, TerminalError> {
        self.inner.base64_encode_to_file(decoded, encoded)
    }

    fn base64_decode_to_file(&self, encoded: &str, decoded: &str) -> Result<String, TerminalError> {
        self.inner.base64_decode_to_file(encoded, decoded)
    }

    fn md5checksum(&self, file_path: &str) -> String {
        self.inner.md5checksum(file_path)
    }

    fn sudo_prefix(&self) -> Option<&'static str> {
        self.inner.sudo_prefix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_to_unix_for_shared_commands() {
        let a = LinuxAdapter::default();
        assert_eq!(a.md5checksum("/etc/passwd"), "md5sum \"/etc/passwd\"");
        assert_eq!(a.name(), "linux");
    }
}
