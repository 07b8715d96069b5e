//! pg-broadcast client binary.
//!
//! Connects to the server, subscribes and logs notifications until the
//! connection closes or Ctrl-C is pressed.

use std::sync::Arc;

use pgbroadcast_client::logging::{self, LogConfig};
use pgbroadcast_client::{ClientConfig, StopSignal, TracingSink, WebSocketClient};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;

    logging::init(
        &LogConfig::new("info,pgbroadcast_client=debug").with_file(config.log_file.clone()),
    )?;

    config.validate()?;

    tracing::info!("Starting pg-broadcast client");
    tracing::info!("Server URL: {}", config.url);
    tracing::info!("Channel: {}", config.channel);

    let client = WebSocketClient::new(&config, Arc::new(TracingSink::new()));

    let stop = StopSignal::new();
    let close_handle = client.close_handle();
    stop.watch_ctrl_c(move || close_handle.close())?;

    client.run();

    // Releases the watcher if the server closed the connection first.
    stop.trigger();
    tracing::info!("Client stopped");

    Ok(())
}
