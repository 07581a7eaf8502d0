//! msgtap — serial TCP message tap, entry point.
//!
//! Accepts one client connection at a time on a plain TCP socket, prints each
//! received payload to stdout, and goes back to accepting when the client
//! disconnects.  There is no framing, no replies, and no concurrent session
//! handling: while a session is active, further connections queue in the OS
//! backlog.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ console pump        -- Tokio task draining ServerEvents to stdout
//!  └─ run_server()
//!       ├─ bind_listener  -- socket / bind / listen, one event per step
//!       └─ accept loop    -- serial: one Session awaited at a time
//!            └─ Session   -- reads payloads until close or read error
//! ```
//!
//! # Usage
//!
//! ```text
//! msgtap [OPTIONS]
//!
//! Options:
//!   --port        <PORT>   TCP port to listen on [default: 8888]
//!   --bind        <ADDR>   IP address to bind [default: 0.0.0.0]
//!   --backlog     <N>      Listen backlog depth [default: 3]
//!   --recv-buffer <BYTES>  Receive buffer size [default: 2000]
//! ```
//!
//! Each option can also be set through an environment variable (`MSGTAP_PORT`,
//! `MSGTAP_BIND`, `MSGTAP_BACKLOG`, `MSGTAP_RECV_BUFFER`); CLI args take
//! precedence.  The defaults reproduce the original demo exactly.
//!
//! The process runs until terminated externally.  It exits with status 1 on a
//! setup failure (socket/bind/listen) or a fatal accept error; session-level
//! read failures only end the affected session.

use std::net::IpAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use msgtap::domain::{ListenerConfig, ServerEvent};
use msgtap::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Serial TCP message tap.
///
/// Listens for one TCP client at a time and prints every payload it sends.
#[derive(Debug, Parser)]
#[command(
    name = "msgtap",
    about = "Accepts one TCP client at a time and prints what it sends",
    version
)]
struct Cli {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 8888, env = "MSGTAP_PORT")]
    port: u16,

    /// IP address to bind to.
    ///
    /// Use `0.0.0.0` to accept connections from any interface, or
    /// `127.0.0.1` for local connections only.
    #[arg(long, default_value = "0.0.0.0", env = "MSGTAP_BIND")]
    bind: String,

    /// Listen backlog depth — how many established connections the OS queues
    /// while a session is active.
    #[arg(long, default_value_t = 3, env = "MSGTAP_BACKLOG")]
    backlog: u32,

    /// Receive buffer size in bytes.  The buffer is reused across reads
    /// within a session.
    #[arg(long, default_value_t = 2000, env = "MSGTAP_RECV_BUFFER")]
    recv_buffer: usize,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ListenerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address or
    /// `--recv-buffer` is zero.
    fn into_listener_config(self) -> anyhow::Result<ListenerConfig> {
        let bind_addr: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;

        anyhow::ensure!(self.recv_buffer > 0, "--recv-buffer must be at least 1");

        Ok(ListenerConfig {
            bind_addr,
            port: self.port,
            backlog: self.backlog,
            recv_buffer_size: self.recv_buffer,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    // Diagnostics go to stderr via tracing; the fixed operator lines below go
    // to stdout via the console pump.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_listener_config()?;

    // Console pump: one fixed stdout line per server event.  The channel is
    // FIFO, so printed order equals event order.
    let (tx, mut rx) = tokio::sync::mpsc::channel::<ServerEvent>(64);
    let pump = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{}", event.console_line());
        }
    });

    // The accept loop only returns on a fatal error.  Dropping `tx` when it
    // does closes the channel, so the pump drains remaining events and exits
    // before the error is reported.
    let result = run_server(config, tx).await;
    let _ = pump.await;

    result.context("server terminated")?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
