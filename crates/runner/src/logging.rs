//! Tracing setup: console output plus a plain-text log file.
//!
//! Environment variables:
//!   LOG_FORMAT - "json" or "text" console output (default: "text")
//!   RUST_LOG   - standard env filter (default: "info")

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file written inside the month partition.
pub const LOG_FILE_NAME: &str = "parkwarden.log";

/// Installs the global subscriber. The returned guard flushes the file writer
/// on drop and must be held until exit.
pub fn init(log_dir: &Path) -> Result<WorkerGuard, TryInitError> {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false); // no ANSI in files

    let (json_layer, text_layer) = if json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    Ok(guard)
}
