//! Pattern matching, expect contracts, login negotiation steps, transcript
//! recording, and the shared error type used across the workspace.

mod ansi;
mod ask_response;
mod config;
mod data_exchange;
mod error;
mod expect;
mod pattern;

pub use ansi::strip_ansi;
pub use ask_response::{parse_count, AskResponse, CountRange};
pub use config::TerminalConfig;
pub use data_exchange::{control_label, DataExchange, Entry};
pub use error::{TerminalError, TerminalErrorKind};
pub use expect::{ExpectContract, MatchPolicy, ScanResult};
pub use pattern::{MatchData, PatternValue};
