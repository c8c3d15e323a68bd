mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use parkwarden_core::{
    load_config, metrics, validate_config, BatchOrchestrator, BatchSummary, Config,
    DirectoryLayout, HttpTicketingClient, SanitizedConfig, TicketingClient,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // The subscriber may not be installed yet.
        eprintln!("Fatal error: {:#}", e);
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("PARKWARDEN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    // Log partition for the lifetime of the process
    let startup_layout = DirectoryLayout::resolve(&config.paths, &Local::now());
    startup_layout
        .ensure()
        .context("Failed to create working directories")?;
    let _log_guard = logging::init(&startup_layout.log).context("Failed to initialize logging")?;

    info!(version = VERSION, config = ?config_path, "Starting parkwarden");
    info!(
        "Configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );
    info!(config_hash = %config_hash(&config), "Configuration loaded");

    let client: Arc<dyn TicketingClient> = Arc::new(
        HttpTicketingClient::new(config.remote.clone())
            .context("Failed to create ticketing client")?,
    );
    info!(client = client.name(), base_url = %config.remote.base_url(), "Ticketing client ready");

    let orchestrator = BatchOrchestrator::new(&config, client);

    match config.runner.watch_interval_secs {
        None => {
            let summary = orchestrator
                .run_once()
                .await
                .context("Batch run failed")?;
            publish_metrics(&config);
            log_summary(&summary);
        }
        Some(secs) => watch_inbox(&orchestrator, &config, Duration::from_secs(secs)).await,
    }

    info!("Shutdown complete");
    Ok(())
}

/// Repeat the batch every `interval` until a shutdown signal arrives.
///
/// A signal received mid-batch takes effect once the batch completes.
async fn watch_inbox(orchestrator: &BatchOrchestrator, config: &Config, interval: Duration) {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    info!(interval_secs = interval.as_secs(), "Watching inbox");

    loop {
        match orchestrator.run_once().await {
            Ok(summary) => log_summary(&summary),
            Err(e) => error!("Batch run failed: {:#}", anyhow::Error::new(e)),
        }
        publish_metrics(config);

        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown_rx.changed() => break,
        }
    }

    info!("Shutdown signal received");
}

fn log_summary(summary: &BatchSummary) {
    for report in summary.archives.iter().filter(|r| r.error.is_some()) {
        warn!(
            tag = %report.tag,
            archive = %report.archive,
            error = report.error.as_deref().unwrap_or(""),
            "Archive failed"
        );
    }
    info!(
        batch_id = %summary.batch_id,
        archives = summary.total(),
        ok = summary.succeeded,
        failed = summary.failed,
        "Batch summary"
    );
}

fn publish_metrics(config: &Config) {
    if let Some(path) = &config.runner.metrics_textfile {
        write_metrics(path);
    }
}

fn write_metrics(path: &Path) {
    if let Err(e) = metrics::write_textfile(path) {
        warn!(path = %path.display(), error = %e, "Failed to write metrics textfile");
    }
}

/// SHA-256 of the serialized configuration, first 16 hex digits.
fn config_hash(config: &Config) -> String {
    let config_json = serde_json::to_string(config).unwrap_or_default();
    let digest = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    digest[..16].to_string()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
