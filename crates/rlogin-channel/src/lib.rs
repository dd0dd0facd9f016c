//! Byte-level transports: `Channel` trait plus SSH/Telnet/local-subprocess/
//! parent-terminal implementations, `ConnectionSpec`, and native SSH
//! proxy-jump tunneling.

mod channel;
mod local;
mod parent;
mod proxy_jump;
mod spec;
mod ssh;
mod telnet;

pub mod test_support;

pub use channel::{Channel, RecvStatus};
pub use local::LocalSubprocessChannel;
pub use parent::CommandInParentTerminalChannel;
pub use proxy_jump::bridge_direct_tcpip;
pub use spec::{ConnectionSpec, Protocol};
pub use ssh::{SshAuth, SshChannel};
pub use telnet::TelnetChannel;
