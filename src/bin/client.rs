//! ring-echo-client: scripted client for ring-echo-server

use ring_echo::client;
use ring_echo::config::ClientSettings;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientSettings::load()?;

    ring_echo::init_tracing(&config.log_level);

    info!(
        connect = %config.connect,
        messages = config.messages.len(),
        pace_ms = config.pace.as_millis() as u64,
        "Starting ring-echo client"
    );

    client::run(&config)?;
    Ok(())
}
