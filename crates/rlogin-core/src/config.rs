//! Engine-tunable constants, collected into one struct with a `Default` impl
//! so callers can override a single field without re-specifying the rest.

use std::time::Duration;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Default timeout for a single `expect` call with no explicit override.
    pub timeout_for_prompt: Duration,
    /// Deadline for the whole login/ask-response sequence on first connect.
    pub socket_timeout_for_login: Duration,
    /// Deadline for `flush_recv`'s drain loop.
    pub flush_recv_timeout: Duration,
    /// Sleep quantum used while polling a non-blocking channel for data.
    pub socket_time_sleep_no_data: Duration,
    /// How often a keepalive probe is sent on an idle channel.
    pub socket_keepalive_period: Duration,
    /// Chunk size requested from `Channel::recv`.
    pub buffer_size: usize,
    /// Bytes of buffer retained (from the tail) when an expect call times out,
    /// so the error message stays bounded even against a chatty remote.
    pub buffer_size_to_return_when_error: usize,
    /// Placeholder substituted for any `hidden = true` send in transcripts.
    pub hidden_data_msg: String,
    /// Suffix appended to the remote temp file used by the base64 fallback.
    pub temp_file_extension: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            timeout_for_prompt: Duration::from_secs(15),
            socket_timeout_for_login: Duration::from_secs(30),
            flush_recv_timeout: Duration::from_secs(2),
            socket_time_sleep_no_data: Duration::from_millis(50),
            socket_keepalive_period: Duration::from_secs(30),
            buffer_size: 4096,
            buffer_size_to_return_when_error: 2048,
            hidden_data_msg: "**HIDDEN**".to_string(),
            temp_file_extension: ".b64tmp".to_string(),
        }
    }
}
