//! ring-echo-server: single-session TCP echo server
//!
//! Listens on one endpoint, accepts exactly one client, stages each received
//! chunk in a fixed-capacity ring buffer and replies "Message received"
//! after every read. Exits when the client disconnects.

use ring_echo::config::ServerSettings;
use ring_echo::server;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServerSettings::load()?;

    ring_echo::init_tracing(&config.log_level);

    info!(
        listen = %config.listen,
        capacity = config.capacity,
        chunk_size = config.chunk_size,
        "Starting ring-echo server"
    );

    let report = server::run(&config)?.into_result()?;
    info!(
        chunks = report.chunks,
        acks = report.acks_sent,
        buffered = report.buffered,
        "Server stopped"
    );
    Ok(())
}
