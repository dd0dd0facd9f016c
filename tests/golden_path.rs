//! Live round-trip tests against a real SSH endpoint. Disabled by default;
//! run with `cargo test --features docker-e2e -- --ignored` against a
//! container started from something like:
//!
//! ```sh
//! docker run -d --rm -p 2222:22 \
//!   -e PUBLIC_KEY_DIR=/tmp \
//!   -e USER_NAME=tester -e USER_PASSWORD=tester \
//!   -e PASSWORD_ACCESS=true \
//!   linuxserver/openssh-server
//! ```
//!
//! Host/port/credentials are read from `RLOGIN_E2E_*` environment variables
//! so the fixture isn't hardcoded to one compose file; see the env var names
//! below.
#![cfg(feature = "docker-e2e")]

use rlogin_channel::{ConnectionSpec, Protocol};
use rlogin_core::TerminalConfig;
use rlogin_os::UnixAdapter;
use rlogin_terminal::{GetFileOptions, PutFileOptions, TerminalCore, TerminalOptions};
use std::sync::Arc;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn ssh_spec() -> ConnectionSpec {
    let host = env_or("RLOGIN_E2E_SSH_HOST", "127.0.0.1");
    let port: u16 = env_or("RLOGIN_E2E_SSH_PORT", "2222").parse().expect("RLOGIN_E2E_SSH_PORT must be a u16");
    let username = env_or("RLOGIN_E2E_SSH_USER", "tester");
    let password = env_or("RLOGIN_E2E_SSH_PASSWORD", "tester");

    ConnectionSpec::new(
        Protocol::Ssh { host, port, key_filename: None, key_password: None, allow_unknown_host_key: true },
        Arc::new(UnixAdapter::default()),
    )
    .with_username(username)
    .with_password(password)
    .with_expected_prompt(r"[$#]\s*$")
}

#[tokio::test]
#[ignore]
async fn opens_logs_in_and_runs_a_command() {
    let mut core = TerminalCore::new(vec![ssh_spec()], TerminalConfig::default(), TerminalOptions::default());
    core.open().await.expect("ssh login should succeed against the e2e fixture");

    let out = core.check_output("echo golden-path-probe", false, false).await.unwrap();
    assert!(out.contains("golden-path-probe"));

    core.close().await.unwrap();
    core.close().await.unwrap();
    assert!(!core.is_open());
}

#[tokio::test]
#[ignore]
async fn put_then_get_round_trips_a_file_over_native_sftp() {
    let mut core = TerminalCore::new(vec![ssh_spec()], TerminalConfig::default(), TerminalOptions::default());
    core.open().await.expect("ssh login should succeed against the e2e fixture");

    let dir = std::env::temp_dir().join(format!("rlogin-golden-path-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let local_src = dir.join("upload.bin");
    std::fs::write(&local_src, b"golden path payload").unwrap();

    let put_outcome = core
        .put_file(&local_src, "/tmp/rlogin-golden-path.bin", PutFileOptions { replace: true, check_md5: true, remove_if_bad_md5: true })
        .await
        .unwrap();
    assert!(put_outcome.md5_verified);

    let (downloaded, get_outcome) = core
        .get_file(
            "/tmp/rlogin-golden-path.bin",
            GetFileOptions {
                local_path: dir.join("download.bin").to_str().unwrap().to_string(),
                replace: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(std::fs::read(&downloaded).unwrap(), b"golden path payload");
    assert_eq!(get_outcome.size, 20);

    core.check_output("rm -f /tmp/rlogin-golden-path.bin", false, false).await.ok();
    core.close().await.unwrap();
    std::fs::remove_dir_all(&dir).ok();
}
