//! # rlogin
//!
//! Programmable remote-login and terminal-automation: multi-hop SSH/Telnet/
//! subprocess connections, an expect-style pattern-matching engine, and a
//! base64-over-terminal file-transfer fallback for hops with no reachable
//! SFTP/SCP path.
//!
//! ## Crates
//!
//! - [`rlogin_core`]: pattern matching, expect contracts, login negotiation
//!   steps (`AskResponse`), transcript recording, and the shared error type.
//! - [`rlogin_os`]: the [`rlogin_os::OsAdapter`] trait and the per-OS shell
//!   command profiles (Unix, Linux, BusyBox, Cisco IOS, Alcatel, iLO, Dell
//!   DRAC, Windows).
//! - [`rlogin_channel`]: the [`rlogin_channel::Channel`] transport trait and
//!   its SSH/Telnet/local-subprocess/parent-terminal implementations, plus
//!   [`rlogin_channel::ConnectionSpec`] and native SSH proxy-jump tunneling.
//! - [`rlogin_transfer`]: OS-independent primitives for the base64
//!   file-transfer fallback (streaming decoder, path resolution, remote
//!   listing parser).
//! - [`rlogin_terminal`]: [`TerminalCore`], which ties the above together
//!   into the multi-hop login/expect/send/file-transfer engine applications
//!   actually drive.
//!
//! Most callers only need this crate's re-exports below; the sub-crates are
//! public so adapters or transports can be implemented against their traits
//! directly.

pub use rlogin_channel::{
    bridge_direct_tcpip, Channel, ConnectionSpec, Protocol, RecvStatus, SshAuth, SshChannel,
};
pub use rlogin_core::{
    control_label, parse_count, strip_ansi, AskResponse, CountRange, DataExchange, Entry,
    ExpectContract, MatchData, MatchPolicy, PatternValue, ScanResult, TerminalConfig,
    TerminalError, TerminalErrorKind,
};
pub use rlogin_os::{
    AlcatelAdapter, BusyBoxAdapter, CiscoIosAdapter, DellDracAdapter, IloAdapter, LinuxAdapter,
    OsAdapter, UnixAdapter, WindowsAdapter,
};
pub use rlogin_terminal::{
    open_direct, open_via_proxy_jump, AskResponseOutcome, AskResponseTiming, ExpectOptions,
    FileTransferOutcome, GetFileOptions, PutFileOptions, ShellLogin, TerminalCore,
    TerminalOptions, SETTLE_DELAY,
};
pub use rlogin_transfer::{
    encode_base64, extract_md5_token, local_path_for_remote, md5_hex, parse_unix_list_file,
    Base64StreamDecoder, FileAttributes,
};
