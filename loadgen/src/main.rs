//! pg-broadcast load generator binary.
//!
//! Starts a client on its own thread, inserts rows until done or Ctrl-C, then
//! closes the client and waits for it to finish.

use std::sync::Arc;
use std::thread;

use anyhow::Context;
use pgbroadcast_client::logging::{self, LogConfig};
use pgbroadcast_client::{ClientConfig, StopSignal, TracingSink, WebSocketClient};
use pgbroadcast_loadgen::{LoadConfig, LoadService, PgRowWriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = LoadConfig::from_env()?;

    logging::init(
        &LogConfig::new("info,pgbroadcast_loadgen=debug,pgbroadcast_client=debug")
            .with_file(config.log_file.clone()),
    )?;

    config.validate()?;

    let client_config = ClientConfig::new(config.server_url.clone())
        .with_channel(config.channel.clone())
        .without_log_file();
    client_config.validate()?;

    tracing::info!("Starting pg-broadcast load generator");
    tracing::info!("Server URL: {}", config.server_url);
    tracing::info!("Rows: {}", config.rows);
    tracing::info!(
        "Delay range: {}ms - {}ms",
        config.min_delay_ms,
        config.max_delay_ms
    );

    let stop = StopSignal::new();

    let client = WebSocketClient::new(&client_config, Arc::new(TracingSink::new()));
    let close_handle = client.close_handle();
    let client_thread = thread::Builder::new()
        .name("ws-client".to_string())
        .spawn(move || client.run())
        .context("failed to spawn client thread")?;

    {
        let stop = stop.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => {
                        tracing::info!("Ctrl-C received, stopping");
                        stop.trigger();
                    }
                    Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
                },
                () = stop.triggered() => {}
            }
        });
    }

    {
        let stop = stop.clone();
        let close_handle = close_handle.clone();
        tokio::spawn(async move {
            stop.triggered().await;
            close_handle.close();
        });
    }

    let mut service = LoadService::new(config.clone())?;
    match PgRowWriter::connect(&config.database_url).await {
        Ok(mut writer) => {
            let report = service.run(&mut writer, &stop).await;
            tracing::info!(
                "Inserted {} rows ({} failed, {:.2} rows/s)",
                report.rows_inserted,
                report.failures,
                service.metrics().rows_per_second()
            );
            writer.close().await;
        }
        Err(e) => tracing::error!("Failed to connect to database: {}", e),
    }

    stop.trigger();
    close_handle.close();
    tokio::task::spawn_blocking(move || client_thread.join())
        .await
        .context("client join task failed")?
        .map_err(|_| anyhow::anyhow!("client thread panicked"))?;

    tracing::info!("Test finished. Parse the log to get latencies.");

    Ok(())
}
