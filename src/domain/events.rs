//! Observable server events.
//!
//! Every externally visible state change of the listener and session loops is
//! expressed as a [`ServerEvent`] and forwarded on an `mpsc` channel to the
//! console pump in `main`, which prints one fixed line per event.  Keeping the
//! vocabulary in one enum does two things:
//!
//! - the operator-facing output is byte-for-byte the set of lines the original
//!   demo printed, defined in exactly one place;
//! - tests assert on event *sequences* received from the channel instead of
//!   capturing stdout.
//!
//! Structured fields (addresses, error text) are carried for diagnostics and
//! tests; they deliberately do not appear in the console lines.

use std::net::SocketAddr;

/// An observable state change of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The listening socket was created.
    SocketCreated,
    /// The listening socket was bound to `local_addr`.
    BindComplete { local_addr: SocketAddr },
    /// The socket entered the listening state; the accept loop is about to run.
    Listening,
    /// A client connection was accepted.
    ConnectionAccepted { peer: SocketAddr },
    /// A read returned a non-empty payload; `text` is the rendered buffer
    /// content (see `session::render_payload`).
    MessageReceived { text: String },
    /// The peer performed an orderly close.
    ClientDisconnected,
    /// A read failed with a session-local error; the session was closed and
    /// the accept loop resumes.
    ReceiveFailed { error: String },
}

impl ServerEvent {
    /// The fixed console line printed for this event.
    pub fn console_line(&self) -> String {
        match self {
            ServerEvent::SocketCreated => "Socket created".to_string(),
            ServerEvent::BindComplete { .. } => "Bind done".to_string(),
            ServerEvent::Listening => "Waiting for incoming connections...".to_string(),
            ServerEvent::ConnectionAccepted { .. } => "Connection accepted".to_string(),
            ServerEvent::MessageReceived { text } => format!("Client message: {text}"),
            ServerEvent::ClientDisconnected => "Client disconnected".to_string(),
            ServerEvent::ReceiveFailed { .. } => "Receive failed".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
