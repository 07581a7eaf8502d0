//! Network infrastructure: the serial accept loop and the per-client session.

pub mod listener;
pub mod session;

pub use listener::{run_server, ServerError};
pub use session::Session;
