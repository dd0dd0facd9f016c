//! `FileTransferFallback`: `put_file`/`get_file` on [`crate::TerminalCore`].
//!
//! When the current hop has a reachable native transfer protocol (SFTP over
//! a single-hop SSH session), we use it directly; otherwise we stream the
//! file as base64 through the same terminal the caller is already talking
//! to, verifying with the remote OS's own checksum command.

use crate::core::TerminalCore;
use crate::options::{GetFileOptions, PutFileOptions};
use rlogin_core::{TerminalError, TerminalErrorKind};
use rlogin_transfer::{encode_base64, extract_md5_token, local_path_for_remote, md5_hex, parse_unix_list_file, Base64StreamDecoder};
use std::path::Path;
use std::time::Duration;

const TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);

/// Size/checksum outcome of one `put_file`/`get_file` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTransferOutcome {
    pub remote_path: String,
    pub size: u64,
    pub md5_verified: bool,
}

impl TerminalCore {
    /// Uploads `local_path` to `remote_path`. Uses native SFTP when the
    /// current hop is the base connection and its channel supports it;
    /// otherwise base64-encodes the file and streams it through shell
    /// commands built by the hop's [`rlogin_os::OsAdapter`].
    pub async fn put_file(&mut self, local_path: &Path, remote_path: &str, opts: PutFileOptions) -> Result<FileTransferOutcome, TerminalError> {
        let bytes = std::fs::read(local_path).map_err(|e| {
            TerminalError::new(TerminalErrorKind::FileTransfer, format!("could not read local file {}: {e}", local_path.display()))
        })?;
        let local_md5 = md5_hex(&bytes);

        if self.is_base_hop() && self.native_transfer_available().await {
            return self.put_file_native(remote_path, &bytes, &local_md5, &opts).await;
        }
        self.put_file_base64(remote_path, &bytes, &local_md5, &opts).await
    }

    /// Downloads `remote_path`, picking a local destination per
    /// [`rlogin_transfer::local_path_for_remote`].
    pub async fn get_file(&mut self, remote_path: &str, opts: GetFileOptions) -> Result<(std::path::PathBuf, FileTransferOutcome), TerminalError> {
        let local_path = local_path_for_remote(remote_path, &opts.local_path, opts.replace, opts.local_folder.as_deref());

        let bytes = if self.is_base_hop() && self.native_transfer_available().await {
            self.transport_mut()?.native_get_file(remote_path).await?
        } else {
            self.get_file_base64(remote_path, &opts).await?
        };

        let md5_verified = if opts.check_md5 {
            let local_md5 = md5_hex(&bytes);
            let remote_md5 = self.remote_md5(remote_path, opts.use_sudo).await?;
            if local_md5 != remote_md5 {
                if opts.remove_if_bad_md5 {
                    std::fs::remove_file(&local_path).ok();
                }
                return Err(TerminalError::new(
                    TerminalErrorKind::FileTransfer,
                    format!("md5 mismatch downloading {remote_path}: local {local_md5} != remote {remote_md5}"),
                ));
            }
            true
        } else {
            false
        };

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
        std::fs::write(&local_path, &bytes)
            .map_err(|e| TerminalError::new(TerminalErrorKind::FileTransfer, format!("could not write {}: {e}", local_path.display())))?;

        Ok((local_path, FileTransferOutcome { remote_path: remote_path.to_string(), size: bytes.len() as u64, md5_verified }))
    }

    /// Remote file size/mtime, via native SFTP `stat` on the base hop or
    /// the OS adapter's `list_file` shell command otherwise.
    pub async fn stat_file(&mut self, remote_path: &str) -> Result<FileTransferOutcome, TerminalError> {
        if self.is_base_hop() && self.native_transfer_available().await {
            let (size, _mtime) = self.transport_mut()?.native_stat_file(remote_path).await?;
            return Ok(FileTransferOutcome { remote_path: remote_path.to_string(), size, md5_verified: false });
        }
        let os = self.current_hop_os()?;
        let cmd = os.list_file(remote_path)?;
        let output = self.check_output(&cmd, false, false).await?;
        let attrs = parse_unix_list_file(&output, remote_path)
            .ok_or_else(|| TerminalError::new(TerminalErrorKind::FileTransfer, format!("could not parse listing for {remote_path}: {output}")))?;
        Ok(FileTransferOutcome { remote_path: remote_path.to_string(), size: attrs.size, md5_verified: false })
    }

    async fn native_transfer_available(&mut self) -> bool {
        match self.transport_mut() {
            Ok(t) => t.supports_native_file_transfer(),
            Err(_) => false,
        }
    }

    async fn put_file_native(
        &mut self,
        remote_path: &str,
        bytes: &[u8],
        local_md5: &str,
        opts: &PutFileOptions,
    ) -> Result<FileTransferOutcome, TerminalError> {
        self.transport_mut()?.native_put_file(remote_path, bytes).await?;
        let md5_verified = if opts.check_md5 {
            let remote_md5 = self.remote_md5(remote_path, false).await?;
            if remote_md5 != local_md5 {
                if opts.remove_if_bad_md5 {
                    let os = self.current_hop_os()?;
                    let rm = os.remove(remote_path)?;
                    let _ = self.check_output(&rm, false, false).await;
                }
                return Err(TerminalError::new(
                    TerminalErrorKind::FileTransfer,
                    format!("md5 mismatch uploading {remote_path}: local {local_md5} != remote {remote_md5}"),
                ));
            }
            true
        } else {
            false
        };
        Ok(FileTransferOutcome { remote_path: remote_path.to_string(), size: bytes.len() as u64, md5_verified })
    }

    /// Writes the base64 text to a `.b64` sibling with a heredoc, decodes it
    /// into a `.tmp` file, drops the `.b64`, verifies, then atomically
    /// promotes the `.tmp` over the real path.
    async fn put_file_base64(
        &mut self,
        remote_path: &str,
        bytes: &[u8],
        local_md5: &str,
        opts: &PutFileOptions,
    ) -> Result<FileTransferOutcome, TerminalError> {
        let os = self.current_hop_os()?;
        if !os.has_base64() {
            return Err(TerminalError::new(TerminalErrorKind::FileTransfer, format!("{} has no base64 tooling for file transfer", os.name())));
        }
        let ext = &self.config().temp_file_extension;
        let b64_path = format!("{remote_path}{ext}");
        let tmp_path = format!("{remote_path}.tmp");
        let encoded = encode_base64(bytes);

        let cmd = os.cat_to_file(&b64_path, &encoded)?;
        self.send_cmd(&cmd, true).await?;
        self.expect_prompt(Some(TRANSFER_TIMEOUT)).await?;

        // Subsequent sends in this same exchange skip the pre-send flush:
        // we just synchronized on the prompt, so there is nothing stray
        // left to drain, and a real remote's flush-recv read window would
        // otherwise add needless latency to every step of the transfer.
        let decode_cmd = os.base64_decode_to_file(&b64_path, &tmp_path)?;
        self.send_cmd(&decode_cmd, false).await?;
        self.expect_prompt(Some(TRANSFER_TIMEOUT)).await?;

        let remove_cmd = os.remove(&b64_path)?;
        self.send_cmd(&remove_cmd, false).await?;
        self.expect_prompt(None).await?;

        let md5_verified = if opts.check_md5 {
            let remote_md5 = self.remote_md5(&tmp_path, false).await?;
            if remote_md5 != local_md5 {
                if opts.remove_if_bad_md5 {
                    let rm = os.remove(&tmp_path)?;
                    let _ = self.check_output(&rm, false, false).await;
                }
                return Err(TerminalError::new(
                    TerminalErrorKind::FileTransfer,
                    format!("md5 mismatch uploading {remote_path}: local {local_md5} != remote {remote_md5}"),
                ));
            }
            true
        } else {
            false
        };

        if opts.replace {
            let mv = os.move_file(&tmp_path, remote_path)?;
            self.send_cmd(&mv, false).await?;
            self.expect_prompt(None).await?;
        }

        Ok(FileTransferOutcome { remote_path: remote_path.to_string(), size: bytes.len() as u64, md5_verified })
    }

    /// Streams the base64 text back and decodes it line-by-line as it
    /// arrives rather than buffering the whole encoded transcript.
    async fn get_file_base64(&mut self, remote_path: &str, opts: &GetFileOptions) -> Result<Vec<u8>, TerminalError> {
        let os = self.current_hop_os()?;
        if !os.has_base64() {
            return Err(TerminalError::new(TerminalErrorKind::FileTransfer, format!("{} has no base64 tooling for file transfer", os.name())));
        }
        let mut cmd = os.base64_encode(remote_path)?;
        if opts.use_sudo {
            if let Some(prefix) = os.sudo_prefix() {
                cmd = format!("{prefix}{cmd}");
            }
        }

        let mut decoder = Base64StreamDecoder::new(cmd.clone());
        let mut out = Vec::new();
        self.send_and_stream(&cmd, TRANSFER_TIMEOUT, |chunk| {
            if let Ok(bytes) = decoder.feed(chunk) {
                out.extend(bytes);
            }
        })
        .await?;
        let tail = decoder.finish()?;
        out.extend(tail);
        Ok(out)
    }

    async fn remote_md5(&mut self, remote_path: &str, use_sudo: bool) -> Result<String, TerminalError> {
        let os = self.current_hop_os()?;
        let cmd = os.md5checksum(remote_path);
        let output = self.check_output(&cmd, use_sudo, false).await?;
        extract_md5_token(&output)
            .ok_or_else(|| TerminalError::new(TerminalErrorKind::FileTransfer, format!("could not parse md5 checksum output: {output}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TerminalOptions;
    use rlogin_channel::test_support::FakeChannel;
    use rlogin_channel::{ConnectionSpec, Protocol};
    use rlogin_core::TerminalConfig;
    use rlogin_os::UnixAdapter;
    use std::sync::Arc;

    fn spec() -> ConnectionSpec {
        ConnectionSpec::new(Protocol::LocalSubprocess, Arc::new(UnixAdapter::default())).with_expected_prompt(r"\$\s*$")
    }

    #[tokio::test]
    async fn put_file_base64_happy_path() {
        let mut core = TerminalCore::new(vec![spec()], TerminalConfig::default(), TerminalOptions::default());
        let channel = FakeChannel::new()
            .push_recv("alice@host:~$ ") // cat heredoc
            .push_recv("alice@host:~$ ") // base64 -d
            .push_recv("alice@host:~$ ") // rm
            .push_recv("alice@host:~$ "); // mv
        core.set_transport_for_test(Box::new(channel));
        core.push_shell_for_test(r"\$\s*$", Arc::new(UnixAdapter::default()));

        let dir = std::env::temp_dir().join(format!("rlogin-put-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let local = dir.join("empty.bin");
        std::fs::write(&local, b"").unwrap();

        let outcome = core
            .put_file(&local, "/tmp/x", PutFileOptions { replace: true, check_md5: false, remove_if_bad_md5: true })
            .await
            .unwrap();
        assert_eq!(outcome.remote_path, "/tmp/x");
        assert!(!outcome.md5_verified);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn remote_md5_parses_check_output() {
        let mut core = TerminalCore::new(vec![spec()], TerminalConfig::default(), TerminalOptions::default());
        let channel = FakeChannel::new().push_recv("d41d8cd98f00b204e9800998ecf8427e  /tmp/x\nalice@host:~$ ");
        core.set_transport_for_test(Box::new(channel));
        core.push_shell_for_test(r"\$\s*$", Arc::new(UnixAdapter::default()));

        let md5 = core.remote_md5("/tmp/x", false).await.unwrap();
        assert_eq!(md5, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[tokio::test]
    async fn get_file_base64_decodes_streamed_payload() {
        let mut core = TerminalCore::new(vec![spec()], TerminalConfig::default(), TerminalOptions::default());
        let cmd = UnixAdapter::default().base64_encode("/tmp/a.bin").unwrap();
        let encoded = encode_base64(b"hello world");
        let channel = FakeChannel::new().push_recv(&format!("{cmd}\n{encoded}\nalice@host:~$ "));
        core.set_transport_for_test(Box::new(channel));
        core.push_shell_for_test(r"\$\s*$", Arc::new(UnixAdapter::default()));

        let dir = std::env::temp_dir().join(format!("rlogin-get-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let (path, outcome) = core
            .get_file(
                "/tmp/a.bin",
                GetFileOptions { local_path: dir.join("a.bin").to_str().unwrap().to_string(), replace: true, ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
        assert_eq!(outcome.size, 11);
        std::fs::remove_dir_all(&dir).ok();
    }
}
