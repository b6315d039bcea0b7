//! Monitor binary that watches addresses for cross-chain activity.

use std::io;

use tokio_util::sync::CancellationToken;
use tracing::info;
use xchain_watch_domain::config::BootstrapConfig;
use xchain_watch_domain::services::telemetry::{init_telemetry, TelemetryConfig};
use xchain_watch_monitor::{run_monitor, MonitorError};

#[tokio::main]
async fn main() -> io::Result<()> {
    if let Err(err) = bootstrap().await {
        eprintln!("[monitor] bootstrap failed: {err}");
        return Err(io::Error::other(err.to_string()));
    }

    Ok(())
}

async fn bootstrap() -> Result<(), MonitorError> {
    let config = BootstrapConfig::load_from_env()?;
    let telemetry_config = TelemetryConfig::from_env("MONITOR");
    init_telemetry(&telemetry_config)?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    run_monitor(config, cancel).await?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_on_signal(cancel: CancellationToken) {
    wait_for_signal().await;
    info!("shutdown signal received");
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
