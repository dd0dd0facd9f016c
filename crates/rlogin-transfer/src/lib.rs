//! Primitives for the base64-over-terminal file-transfer fallback used when
//! a hop has no native SFTP/SCP path reachable: a streaming base64 decoder
//! that decodes as data arrives rather than buffering the whole transfer in
//! memory first, plus path-resolution and remote-listing helpers.
//! `TerminalCore` (in `rlogin-terminal`) owns the actual send/expect
//! choreography; this crate only supplies the OS-independent byte-level and
//! path-resolution pieces.

mod decoder;
mod listing;
mod paths;

pub use decoder::Base64StreamDecoder;
pub use listing::{parse_unix_list_file, FileAttributes};
pub use paths::local_path_for_remote;

use md5::Digest;

/// Base64-encodes `bytes`: standard alphabet, no trailing newline.
pub fn encode_base64(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Lowercase hex MD5 digest, for comparing against a remote `md5sum`/
/// `certutil -hashfile`/`verify /md5` style output.
pub fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = md5::Md5::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Picks the first 32-character hex token out of a remote checksum command's
/// output (`md5sum` prints `<hex>  <filename>`; `certutil -hashfile` prints
/// the hex on its own line; Cisco's `verify /md5` embeds it mid-sentence).
pub fn extract_md5_token(output: &str) -> Option<String> {
    output
        .split(|c: char| c.is_whitespace() || c == ':')
        .find(|tok| tok.len() == 32 && tok.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|s| s.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_base64_has_no_trailing_newline() {
        let out = encode_base64(b"hello world");
        assert!(!out.ends_with('\n'));
        assert_eq!(out, "aGVsbG8gd29ybGQ=");
    }

    #[test]
    fn md5_hex_matches_known_vector() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn extract_md5_token_from_md5sum_output() {
        let out = "d41d8cd98f00b204e9800998ecf8427e  /tmp/a.bin\n";
        assert_eq!(extract_md5_token(out).as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e"));
    }

    #[test]
    fn extract_md5_token_from_certutil_output() {
        let out = "MD5 hash of file a.bin:\nD41D8CD98F00B204E9800998ECF8427E\nCertUtil: -hashfile command completed successfully.\n";
        assert_eq!(extract_md5_token(out).as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e"));
    }

    #[test]
    fn extract_md5_token_absent() {
        assert_eq!(extract_md5_token("no checksum here"), None);
    }
}
