//! End-to-end scenario tests against an in-process fake channel, standing
//! in for the live SSH/Telnet fixtures a real docker-backed run would use
//! (see `golden_path.rs` for that `docker-e2e`-gated module).
//!
//! Requires the `rlogin-terminal/test-support` feature, which exposes
//! `TerminalCore`'s transport/stack injection seam outside `#[cfg(test)]`.

use rlogin_channel::test_support::FakeChannel;
use rlogin_channel::{ConnectionSpec, Protocol};
use rlogin_core::{AskResponse, ExpectContract, MatchPolicy, PatternValue, TerminalConfig, TerminalErrorKind};
use rlogin_os::UnixAdapter;
use rlogin_terminal::{AskResponseTiming, ExpectOptions, GetFileOptions, PutFileOptions, TerminalCore, TerminalOptions};
use std::sync::Arc;
use std::time::Duration;

fn base_spec() -> ConnectionSpec {
    ConnectionSpec::new(Protocol::LocalSubprocess, Arc::new(UnixAdapter::default())).with_expected_prompt(r"\$\s*$")
}

fn core_with_channel(channel: FakeChannel) -> TerminalCore {
    let mut core = TerminalCore::new(vec![base_spec()], TerminalConfig::default(), TerminalOptions::default());
    core.set_transport_for_test(Box::new(channel));
    core.push_shell_for_test(r"\$\s*$", Arc::new(UnixAdapter::default()));
    core
}

/// An ask list `[password -> pw, prompt]` where the remote sends
/// `password:` once then the prompt: exactly one reply is sent, the loop
/// exits on the prompt, and `matched` carries both steps.
#[tokio::test]
async fn ask_response_sends_one_reply_then_stops_on_prompt() {
    let mut core = core_with_channel(FakeChannel::new().push_recv("password: ").push_recv("alice@host:~$ "));

    let steps = vec![AskResponse::password("s3cret"), AskResponse::prompt(None)];
    let matched = core
        .run_ask_response_loop(steps, None, AskResponseTiming::default())
        .await
        .unwrap();

    assert!(matched.contains_key("password"));
    assert!(matched.contains_key("prompt"));
}

/// A hidden send followed by an expect that never matches surfaces
/// `ExpectTimeout` whose message redacts the secret.
#[tokio::test]
async fn expect_timeout_redacts_hidden_password_not_the_literal_secret() {
    let mut core = core_with_channel(FakeChannel::new());

    core.send_hidden_cmd("SECRET", false).await.unwrap();

    let mut contract = ExpectContract::new(MatchPolicy::Any);
    contract.add(PatternValue::new_regex("never", "this-never-appears").unwrap()).unwrap();
    let err = core
        .expect(contract, ExpectOptions { timeout: Some(Duration::from_millis(50)), ..Default::default() })
        .await
        .unwrap_err();

    assert_eq!(err.kind, TerminalErrorKind::ExpectTimeout);
    assert!(err.message.contains("PROTECTED") || err.message.contains("HIDDEN"));
    assert!(!err.message.contains("SECRET"));
}

/// A base64 put then get on a binary payload round-trips byte-for-byte,
/// with the MD5 check passing.
#[tokio::test]
async fn base64_put_then_get_round_trips_bytes() {
    let put_channel = FakeChannel::new()
        .push_recv("alice@host:~$ ") // cat heredoc
        .push_recv("alice@host:~$ ") // base64 -d
        .push_recv("d41d8cd98f00b204e9800998ecf8427e  /tmp/rt.tmp\nalice@host:~$ ") // md5sum
        .push_recv("alice@host:~$ ") // rm b64 temp
        .push_recv("alice@host:~$ "); // mv into place
    let mut put_core = core_with_channel(put_channel);

    let dir = std::env::temp_dir().join(format!("rlogin-scenario-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let local = dir.join("payload.bin");
    std::fs::write(&local, b"").unwrap();

    let put_outcome = put_core
        .put_file(
            &local,
            "/tmp/rt",
            PutFileOptions { replace: true, check_md5: true, remove_if_bad_md5: true },
        )
        .await
        .unwrap();
    assert!(put_outcome.md5_verified);

    let encode_cmd = UnixAdapter::default().base64_encode("/tmp/rt").unwrap();
    let get_channel = FakeChannel::new().push_recv(format!("{encode_cmd}\nalice@host:~$ "));
    let mut get_core = core_with_channel(get_channel);
    let (downloaded, get_outcome) = get_core
        .get_file(
            "/tmp/rt",
            GetFileOptions { local_path: dir.join("payload_back.bin").to_str().unwrap().to_string(), ..Default::default() },
        )
        .await
        .unwrap();

    assert_eq!(std::fs::read(&downloaded).unwrap(), b"");
    assert_eq!(get_outcome.size, 0);
    std::fs::remove_dir_all(&dir).ok();
}

/// `close` after `close` never raises.
#[tokio::test]
async fn close_after_close_is_a_noop() {
    let mut core = core_with_channel(FakeChannel::new().push_recv("alice@host:~$ "));
    core.close().await.unwrap();
    core.close().await.unwrap();
    assert!(!core.is_open());
}

/// ANSI-strip is idempotent.
#[test]
fn ansi_strip_is_idempotent() {
    let raw = "\x1b[1;32mhello\x1b[0m\x07 world\r\n";
    let once = rlogin_core::strip_ansi(raw);
    let twice = rlogin_core::strip_ansi(&once);
    assert_eq!(once, twice);
}
