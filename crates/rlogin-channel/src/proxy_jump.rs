//! `SSHProxyJump`: assembles a chain of SSH sessions where each hop after
//! the first is reached through a `direct-tcpip` channel opened on the
//! prior hop's session, instead of shelling out to `ssh -J`.
//!
//! The `ssh2` crate cannot hand a `Session` an arbitrary `Read + Write`
//! transport — `Session::set_tcp_stream` wants a real `TcpStream`. We bridge
//! the gap by opening a loopback `TcpListener`, accepting a connection to
//! it, and pumping bytes between that local socket and the `direct-tcpip`
//! channel on a background thread. The loopback socket then becomes the
//! next hop's transport, so the whole chain still counts as one socket
//! opened from the local host.

use rlogin_core::{TerminalError, TerminalErrorKind};
use ssh2::Session;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

/// Opens a loopback-bridged `TcpStream` that forwards to `(next_host,
/// next_port)` through a `direct-tcpip` channel on `via`.
pub fn bridge_direct_tcpip(
    via: &Session,
    next_host: &str,
    next_port: u16,
) -> Result<TcpStream, TerminalError> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(TerminalError::from)?;
    let local_addr = listener.local_addr().map_err(TerminalError::from)?;

    let mut tunnel = via
        .channel_direct_tcpip(next_host, next_port, None)
        .map_err(|e| TerminalError::new(TerminalErrorKind::ConnectionOpen, e.to_string()))?;

    // Connect to our own listener so `accept` below returns immediately;
    // this is the loopback leg the next hop's `Session` will be handed.
    let outbound = TcpStream::connect(local_addr).map_err(TerminalError::from)?;
    let (inbound, _) = listener.accept().map_err(TerminalError::from)?;

    inbound.set_nodelay(true).ok();
    outbound.set_nodelay(true).ok();

    let mut pump_write = inbound.try_clone().map_err(TerminalError::from)?;
    let mut pump_read = inbound;

    std::thread::spawn(move || {
        let mut buf = [0u8; 16 * 1024];
        loop {
            match tunnel.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if pump_write.write_all(&buf[..n]).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(_) => break,
            }
            let mut from_local = [0u8; 16 * 1024];
            match pump_read.read(&mut from_local) {
                Ok(0) => break,
                Ok(n) => {
                    if tunnel.write_all(&from_local[..n]).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(_) => break,
            }
        }
        let _ = tunnel.close();
    });

    Ok(outbound)
}

#[cfg(test)]
mod tests {
    // `bridge_direct_tcpip` requires a live SSH session to exercise; it is
    // covered by the `docker-e2e`-gated integration tests at the workspace
    // root, not by unit tests here.
}
