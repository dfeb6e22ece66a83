//! Station entry point.
//!
//! Usage: `homestation [CONFIG]`. The config path falls back to
//! `HOMESTATION_CONFIG`, then to built-in defaults. `RUST_LOG` overrides the
//! configured log filter.
//!
//! Keys typed on stdin are pressed on the simulated keypad.

use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use homestation_core::StationConfig;
use homestation_core::config::ENV_CONFIG_PATH;
use homestation_firmware::{Runtime, spawn_drift, spawn_line_reader};

/// How often the simulated readings change.
const DRIFT_PERIOD: Duration = Duration::from_secs(1);

fn load_config() -> anyhow::Result<StationConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(ENV_CONFIG_PATH).ok());

    let mut config = match path {
        Some(path) => StationConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => StationConfig::default(),
    };
    config.apply_env().context("applying environment overrides")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .init();

    info!(
        version = homestation_core::VERSION,
        hostname = %config.hostname,
        variant = %config.variant,
        "Starting station"
    );

    let runtime = Runtime::start(&config).await?;
    info!("Dashboard at http://{}.local/ ({})", config.hostname, runtime.local_addr());

    let drift = spawn_drift(
        runtime.sensors().clone(),
        DRIFT_PERIOD,
        runtime.subscribe_shutdown(),
    );

    let console = match runtime.keypad() {
        Some(keypad) => {
            info!("Type keypad keys on stdin, {} to submit", config.access.submit_key);
            let stdin = std::io::BufReader::new(std::io::stdin());
            Some(spawn_line_reader(stdin, keypad)?)
        }
        None => None,
    };

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown requested");

    if let Some(console) = console {
        console.abort();
    }
    let station = runtime.shutdown().await?;
    drift.await.context("drift task")?;

    if let Some(panel) = station.panel() {
        let stats = panel.controller().stats();
        info!(
            granted = stats.granted,
            denied = stats.denied,
            "Keypad access summary"
        );
    }

    Ok(())
}
