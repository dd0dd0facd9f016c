//! `TerminalCore`: the multi-hop login/expect/send engine tying channels,
//! OS adapters and SSH proxy-jump together.

mod core;
mod open;
mod options;
mod shell_login;
mod transfer;

pub use core::{ExpectOptions, TerminalCore};
pub use open::{open_direct, open_via_proxy_jump, SETTLE_DELAY};
pub use options::{AskResponseOutcome, AskResponseTiming, GetFileOptions, PutFileOptions, TerminalOptions};
pub use shell_login::ShellLogin;
pub use transfer::FileTransferOutcome;
