//! Generic POSIX shell command set, shared by most other profiles.

use crate::OsAdapter;
use rlogin_core::TerminalError;

#[derive(Debug, Default, Clone, Copy)]
pub struct UnixAdapter;

impl OsAdapter for UnixAdapter {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn cat_program(&self) -> &'static str {
        "cat"
    }

    fn has_base64(&self) -> bool {
        true
    }

    fn can_change_prompt(&self) -> bool {
        true
    }

    fn can_disable_history(&self) -> bool {
        true
    }

    fn cat_to_file(&self, file_path: &str, message: &str) -> Result<String, TerminalError> {
        const DELIM: &str = "$$$FILE_DELIMITER_DEVICECONN$$$";
        Ok(format!("cat > {file_path} << {DELIM}\n{message}\n{DELIM}"))
    }

    fn remove(&self, file_path: &str) -> Result<String, TerminalError> {
        Ok(format!("rm -f {file_path}"))
    }

    fn list_file(&self, file_path: &str) -> Result<String, TerminalError> {
        Ok(format!("ls -l --time-style long-iso {file_path}"))
    }

    fn set_prompt(&self, prompt: &str) -> Option<String> {
        Some(format!("export PS1='{prompt}'"))
    }

    fn disable_history(&self) -> Option<String> {
        Some("set +o history".to_string())
    }

    fn enable_history(&self) -> Option<String> {
        Some("set -o history".to_string())
    }

    fn base64_encode(&self, file: &str) -> Result<String, TerminalError> {
        Ok(format!("base64 \"{file}\""))
    }

    fn base64_encode_to_file(&self, decoded: &str, encoded: &str) -> Result<String, TerminalError> {
        Ok(format!("base64 \"{decoded}\" > \"{encoded}\""))
    }

    fn base64_decode_to_file(&self, encoded: &str, decoded: &str) -> Result<String, TerminalError> {
        Ok(format!("base64 -d \"{encoded}\" > \"{decoded}\""))
    }

    fn md5checksum(&self, file_path: &str) -> String {
        format!("md5sum \"{file_path}\"")
    }

    fn sudo_prefix(&self) -> Option<&'static str> {
        Some("sudo ")
    }

    fn shell_app(&self) -> &'static str {
        "/bin/bash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_prompt_uses_ps1_export() {
        let a = UnixAdapter;
        assert_eq!(a.set_prompt("$ ").unwrap(), "export PS1='$ '");
    }

    #[test]
    fn base64_roundtrip_commands() {
        let a = UnixAdapter;
        assert_eq!(
            a.base64_encode_to_file("/tmp/a", "/tmp/a.b64").unwrap(),
            "base64 \"/tmp/a\" > \"/tmp/a.b64\""
        );
        assert_eq!(
            a.base64_decode_to_file("/tmp/a.b64", "/tmp/a").unwrap(),
            "base64 -d \"/tmp/a.b64\" > \"/tmp/a\""
        );
    }
}
