//! pg-broadcast server binary.
//!
//! Entry point for the WebSocket server forwarding PostgreSQL notifications.

use pgbroadcast_client::logging::{self, LogConfig};
use pgbroadcast_client::StopSignal;
use pgbroadcast_server::{AppState, NotificationListener, Server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;

    logging::init(
        &LogConfig::new("info,pgbroadcast_server=debug").with_file(config.log_file.clone()),
    )?;

    config.validate()?;

    let stop = StopSignal::new();
    let state = AppState::new(stop.clone());

    tracing::info!("Starting pg-broadcast server on {}", config.addr());

    match &config.database_url {
        Some(url) => {
            let listener =
                NotificationListener::connect(url, &config.notify_channel, state.clone()).await?;
            tokio::spawn(listener.run());
        }
        None => tracing::warn!("DATABASE_URL is empty, notifications disabled"),
    }

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutting down pg-broadcast server");
                stop.trigger();
            }
            Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    Server::new(config, state).run().await?;

    Ok(())
}
