//! Listener configuration.
//!
//! The defaults reproduce the historical behaviour of the original demo
//! server exactly: wildcard IPv4 bind, port 8888, a backlog of 3 pending
//! connections, and a 2000-byte receive buffer.  Running `msgtap` with no
//! arguments therefore behaves identically to the original.

use std::net::{IpAddr, SocketAddr};

/// Default TCP port the listener binds to.
pub const DEFAULT_PORT: u16 = 8888;

/// Default depth of the OS queue of fully-established, not-yet-accepted
/// connections.  Connections beyond this depth may be dropped while a
/// session is active.
pub const DEFAULT_BACKLOG: u32 = 3;

/// Default size in bytes of the per-session receive buffer.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 2000;

/// Configuration for the listening endpoint and its sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerConfig {
    /// IP address to bind the listener to.  `0.0.0.0` binds all interfaces.
    pub bind_addr: IpAddr,
    /// TCP port to listen on.  Port 0 asks the OS for an ephemeral port,
    /// which the integration tests rely on.
    pub port: u16,
    /// Listen backlog depth.
    pub backlog: u32,
    /// Size of the receive buffer reused across reads within a session.
    pub recv_buffer_size: usize,
}

impl ListenerConfig {
    /// The socket address the listener will bind to.
    pub fn bind_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
