use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use telemetry_bridge::api::{self, AppState};
use telemetry_bridge::{Config, Driver, DriverHandle, Latest, logging};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Time the driver gets to finish its current tick after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "telemetry-bridge")]
#[command(about = "Bridge a hex line-protocol telemetry device to typed readings")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "telemetry-bridge.toml")]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    logging::init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    info!(
        host = %config.device.host,
        port = config.device.port,
        interval = config.device.interval,
        poll_period_ms = config.poll.period_ms,
        http_addr = %config.server.http_addr,
        "Starting telemetry-bridge"
    );

    let cancel = CancellationToken::new();
    let latest = Latest::new();

    let driver = Driver::connect(&config.device, &config.poll, latest.sinks()).await;
    let (handle, commands) = DriverHandle::channel(16, driver.subscribe());
    let cancel_for_driver = cancel.clone();
    let mut driver_handle = tokio::spawn(driver.run(commands, cancel_for_driver));

    // HTTP server
    let http_addr = config.server.http_addr;
    let axum_app = api::router(AppState {
        driver: handle,
        latest,
    });
    let axum_listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, "HTTP server listening");

    let cancel_for_http = cancel.clone();

    tokio::select! {
        result = axum::serve(axum_listener, axum_app).with_graceful_shutdown(async move {
            cancel_for_http.cancelled().await;
        }) => {
            if let Err(e) = result {
                error!(error = ?e, "HTTP server error");
            }
            info!("HTTP server shut down");
            cancel.cancel();
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            cancel.cancel();
        }
    }

    // A read stalled on the device cannot observe the token, so bound the wait.
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut driver_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = ?e, "Driver task failed"),
        Err(_) => {
            warn!("Driver did not stop in time, aborting");
            driver_handle.abort();
        }
    }

    info!("telemetry-bridge shut down complete");
    Ok(())
}
