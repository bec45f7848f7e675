//! ring-echo: a single-session TCP echo pair.
//!
//! - `server`: accepts one connection, stages received bytes in a
//!   fixed-capacity ring buffer and acknowledges every read event
//! - `client`: sends a scripted message sequence, one acknowledgment per
//!   message, with a fixed pause between messages
//! - `ring`: the bounded FIFO byte store (drop newest on overflow)
//!
//! Both binaries are configured via CLI arguments or a TOML file.

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod ring;
pub mod server;

pub use error::EchoError;

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
