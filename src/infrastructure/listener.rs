//! Listening endpoint and the serial accept loop.
//!
//! The socket is set up in three explicit, individually fallible steps —
//! create, bind, listen — so each stage reports its own status event and its
//! own typed failure, mirroring the original demo's socket/bind/listen
//! sequence.  The listener is an owned value for the lifetime of
//! [`run_server`]; dropping it on any exit path releases the socket.
//!
//! The accept loop is strictly serial: an accepted connection's session is
//! awaited to completion before the next `accept`, so at most one session
//! exists at any instant.  Connections arriving in the meantime sit in the OS
//! backlog (bounded by `config.backlog`) and may be dropped on overflow.
//! Waits are readiness-driven; there is no sleep-and-retry polling.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::{ListenerConfig, ServerEvent};

/// Fatal server errors.  Any of these terminates the process (exit code 1).
///
/// Session-local read failures are *not* represented here; they are reported
/// as [`ServerEvent::ReceiveFailed`] and the accept loop resumes.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be created.
    #[error("socket creation failed: {source}")]
    SocketFailed {
        #[source]
        source: std::io::Error,
    },
    /// The listening socket could not be bound.
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The bound socket could not enter the listening state.
    #[error("listen failed: {source}")]
    ListenFailed {
        #[source]
        source: std::io::Error,
    },
    /// `accept` failed with a non-transient error; the listening socket is
    /// considered broken.
    #[error("accept failed: {source}")]
    AcceptFailed {
        #[source]
        source: std::io::Error,
    },
}

/// Creates, binds, and starts listening on the configured endpoint, emitting
/// one status event per completed step.
///
/// # Errors
///
/// Returns the [`ServerError`] variant for whichever setup step failed.
pub async fn bind_listener(
    config: &ListenerConfig,
    events: &mpsc::Sender<ServerEvent>,
) -> Result<TcpListener, ServerError> {
    let addr = config.bind_socket_addr();

    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(|source| ServerError::SocketFailed { source })?;
    let _ = events.send(ServerEvent::SocketCreated).await;

    socket
        .bind(addr)
        .map_err(|source| ServerError::BindFailed { addr, source })?;
    // Re-query the address so an ephemeral port (port 0) is resolved.
    let local_addr = socket
        .local_addr()
        .map_err(|source| ServerError::BindFailed { addr, source })?;
    let _ = events.send(ServerEvent::BindComplete { local_addr }).await;

    let listener = socket
        .listen(config.backlog)
        .map_err(|source| ServerError::ListenFailed { source })?;
    let _ = events.send(ServerEvent::Listening).await;

    info!(
        "listening on {local_addr} (backlog {}, recv buffer {} bytes)",
        config.backlog, config.recv_buffer_size
    );
    Ok(listener)
}

/// Binds the listening endpoint and runs the serial accept loop until a fatal
/// error occurs.
///
/// Each accepted connection is wrapped in a [`super::Session`] and awaited to
/// completion before the next accept — never spawned — which is what upholds
/// the at-most-one-session invariant.
///
/// # Errors
///
/// Returns a [`ServerError`] on setup failure or on a failed `accept`.  It
/// never returns `Ok`: under normal operation the loop runs until the process
/// is terminated externally.
pub async fn run_server(
    config: ListenerConfig,
    events: mpsc::Sender<ServerEvent>,
) -> Result<(), ServerError> {
    let listener = bind_listener(&config, &events).await?;

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|source| ServerError::AcceptFailed { source })?;
        info!("connection accepted from {peer}");
        let _ = events.send(ServerEvent::ConnectionAccepted { peer }).await;

        super::Session::new(stream, config.recv_buffer_size, events.clone())
            .run()
            .await;
        debug!("session ended; resuming accept loop");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
