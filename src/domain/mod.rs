//! Domain types: listener configuration and the observable event vocabulary.

pub mod config;
pub mod events;

pub use config::ListenerConfig;
pub use events::ServerEvent;
