//! Tracing setup
//!
//! Logs go to a daily-rolling file so that command output stays clean.
//! `RUST_LOG` overrides the configured level.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LEVEL: &str = "info";
const LOG_FILE_PREFIX: &str = "teamboard.log";

/// Install the global subscriber writing under `log_dir`.
///
/// The returned guard flushes buffered lines when dropped and must be kept
/// alive for the lifetime of the program.
pub fn init(log_dir: &Path, level: Option<&str>) -> Result<WorkerGuard, String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("Failed to create log directory {:?}: {}", log_dir, e))?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or(DEFAULT_LEVEL)))
        .map_err(|e| format!("Invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    Ok(guard)
}
