//! Windows `cmd.exe` profile. Deliberately thinner than the Unix family:
//! there's less common ground across cmd/PowerShell tooling to lean on for
//! the file-transfer primitives this engine needs.

use crate::OsAdapter;
use rlogin_core::TerminalError;

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsAdapter;

impl OsAdapter for WindowsAdapter {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn cat_program(&self) -> &'static str {
        "type"
    }

    fn has_base64(&self) -> bool {
        true
    }

    fn can_resize_pty(&self) -> bool {
        true
    }

    fn shell_app(&self) -> &'static str {
        "cmd.exe"
    }

    fn cat_to_file(&self, file_path: &str, message: &str) -> Result<String, TerminalError> {
        let mut cmd = String::new();
        for line in message.lines() {
            cmd.push_str(&format!("echo {} >> {} & ", escape_cmd(line), file_path));
        }
        Ok(cmd)
    }

    fn resize_pty(&self, cols: u16, rows: u16) -> String {
        format!("mode CON: COLS={cols} LINES={rows}")
    }

    fn exit_cmd(&self) -> &'static str {
        "exit"
    }

    fn remove(&self, file_path: &str) -> Result<String, TerminalError> {
        Ok(format!("del -f {file_path}"))
    }

    fn list_file(&self, file_path: &str) -> Result<String, TerminalError> {
        Ok(format!("dir {file_path}"))
    }

    fn set_prompt(&self, prompt: &str) -> Option<String> {
        const ESCAPES: [(char, &str); 7] = [
            ('$', "$$"),
            ('&', "$A"),
            ('|', "$B"),
            ('>', "$G"),
            ('<', "$L"),
            ('=', "$Q"),
            (' ', "$S"),
        ];
        let mut escaped = prompt.to_string();
        for (c, esc) in ESCAPES {
            escaped = escaped.replace(c, esc);
        }
        Some(format!("PROMPT={escaped}"))
    }

    fn base64_encode(&self, file: &str) -> Result<String, TerminalError> {
        Ok(format!(
            "certutil -encode \"{file}\" __base64temp__ & type __base64temp__ & del __base64temp__"
        ))
    }

    fn base64_encode_to_file(&self, decoded: &str, encoded: &str) -> Result<String, TerminalError> {
        Ok(format!("certutil -encode \"{decoded}\" \"{encoded}\""))
    }

    fn base64_decode_to_file(&self, encoded: &str, decoded: &str) -> Result<String, TerminalError> {
        Ok(format!("certutil -decode \"{encoded}\" \"{decoded}\""))
    }

    fn md5checksum(&self, file_path: &str) -> String {
        format!("certutil -hashfile \"{file_path}\" MD5")
    }
}

/// `escape_cmd_msg`: escapes a line for safe inclusion in a `cmd.exe` `echo`.
fn escape_cmd(line: &str) -> String {
    const REPLACEMENTS: [(char, &str); 18] = [
        ('%', "%%"),
        ('^', "^^"),
        ('&', "^&"),
        ('<', "^<"),
        ('>', "^>"),
        ('|', "^|"),
        ('\'', "^'"),
        ('`', "^`"),
        (',', "^,"),
        (';', "^;"),
        ('=', "^="),
        ('(', "^("),
        (')', "^)"),
        ('!', "^^!"),
        ('\\', "\\\\"),
        ('[', "\\["),
        (']', "\\]"),
        ('"', "\\\""),
    ];
    let mut out = line.to_string();
    for (c, esc) in REPLACEMENTS {
        out = out.replace(c, esc);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_prompt_escapes_special_characters() {
        let a = WindowsAdapter;
        assert_eq!(a.set_prompt("C:\\> ").unwrap(), "PROMPT=C:\\$G$S");
    }

    #[test]
    fn escape_cmd_handles_ampersand_and_pipe() {
        assert_eq!(escape_cmd("a&b|c"), "a^&b^|c");
    }
}
