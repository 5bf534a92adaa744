//! yured - background motion-telemetry streaming daemon
//!
//! Samples the device accelerometer and streams batches to a collection
//! endpoint over a persistent WebSocket, buffering and reconnecting through
//! connectivity loss.

#![deny(unused_imports)]
#![deny(unused_mut)]
#![warn(unused_must_use)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yure_client::config::Settings;
use yure_client::sensor::{AccelerometerSource, SensorHost, SyntheticSensorHost};
use yure_client::status::LogStatusSink;
use yure_client::streamer::{ConnectionManager, StreamerMetrics, StreamingService, WsTransport};
use yure_client::types::{client_tag, Mode};
use yure_client::device_id;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the settings file
    #[arg(short, long, default_value = "yure.toml")]
    config: PathBuf,

    /// Collection endpoint URL (overrides the settings file)
    #[arg(short, long, env = "YURE_SERVER_URL")]
    server_url: Option<String>,

    /// Sample source ("device" or "simulation")
    #[arg(short, long, default_value = "device")]
    mode: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    info!("🚀 starting yured v{}", env!("CARGO_PKG_VERSION"));

    let mut settings = load_settings(&args.config)?;
    if let Some(url) = args.server_url {
        settings.server_url = url;
        settings.validate().context("invalid server URL override")?;
    }

    let mode = match args.mode.as_str() {
        "simulation" => Mode::Simulation,
        "device" => Mode::Device,
        other => {
            warn!("unknown mode '{}', defaulting to device", other);
            Mode::Device
        }
    };

    let id_path = args.config.with_file_name("yure_id");
    let device_id = device_id::load_or_create(&id_path).context("failed to load device id")?;
    info!("device id: {}", device_id);
    info!("endpoint: {}", settings.server_url);
    info!(
        "flush threshold: {} samples at {} Hz",
        settings.buffer_size, settings.sample_rate_hz
    );

    let host: Arc<dyn SensorHost> = match mode {
        Mode::Simulation => Arc::new(SyntheticSensorHost::new()),
        Mode::Device => device_sensor_host()?,
    };
    let source = AccelerometerSource::new(
        host,
        device_id,
        Some(client_tag()),
        settings.sample_rate_hz,
    );

    let status = Arc::new(LogStatusSink);
    let metrics = Arc::new(StreamerMetrics::new());
    let connection = ConnectionManager::new(
        settings.server_url.clone(),
        Arc::new(WsTransport),
        status.clone(),
        metrics.clone(),
    );
    let service = StreamingService::new(connection, status, metrics.clone(), settings.buffer_size);

    service
        .start(&source)
        .await
        .context("failed to start streaming service")?;
    info!("✅ streaming service started");

    run_until_shutdown(&service, &metrics).await;

    service.stop().await;
    info!("shut down cleanly");
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "yure_client=debug,yured=debug,info"
    } else {
        "yure_client=info,yured=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Load settings with fallback to defaults
fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        warn!(
            "settings file '{}' not found, using defaults",
            path.display()
        );
    }
    Settings::from_file_with_env(path)
        .with_context(|| format!("failed to load settings from {}", path.display()))
}

#[cfg(target_os = "linux")]
fn device_sensor_host() -> Result<Arc<dyn SensorHost>> {
    use yure_client::sensor::IioSensorHost;

    match IioSensorHost::discover() {
        Some(host) => Ok(Arc::new(host)),
        None => anyhow::bail!(
            "no motion sensor found; run with --mode simulation to use the synthetic source"
        ),
    }
}

#[cfg(not(target_os = "linux"))]
fn device_sensor_host() -> Result<Arc<dyn SensorHost>> {
    anyhow::bail!("device mode needs a Linux IIO accelerometer; run with --mode simulation")
}

/// Wait for ctrl-c, logging a telemetry snapshot once a minute.
async fn run_until_shutdown(service: &StreamingService, metrics: &StreamerMetrics) {
    let mut stats_interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
    stats_interval.tick().await;

    loop {
        tokio::select! {
            _ = stats_interval.tick() => {
                let snapshot = metrics.snapshot();
                info!(
                    captured = snapshot.samples_captured,
                    sent = snapshot.samples_sent,
                    batches = snapshot.batches_sent,
                    send_failures = snapshot.send_failures,
                    reconnects = snapshot.reconnects_scheduled,
                    buffered = service.buffered(),
                    state = ?service.connection_state(),
                    "telemetry"
                );
            }

            _ = tokio::signal::ctrl_c() => {
                info!("🛑 shutdown signal received");
                break;
            }
        }
    }
}
