//! Logging setup: a terminal layer plus daily-rotated files.
//!
//! Files under the log directory:
//! - `catalog_extract.log`: compact text without ANSI colors
//! - `catalog_extract.json.log`: one JSON object per event, when enabled
//!
//! Filtering follows `RUST_LOG` (default `info`), e.g.
//! `RUST_LOG=catalog_extract=debug,reqwest=warn` to see per-card skips.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const TEXT_LOG_FILE: &str = "catalog_extract.log";
pub const JSON_LOG_FILE: &str = "catalog_extract.json.log";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Flushes the background file writers when dropped. Hold it for the life of
/// the program.
#[must_use]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

fn env_filter() -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new("info")?),
    }
}

/// Install the global subscriber.
pub fn init_logging<P: AsRef<Path>>(log_dir: P, json_file: bool) -> Result<LogGuards, LoggingError> {
    let log_path = log_dir.as_ref();
    std::fs::create_dir_all(log_path)?;

    let mut guards = Vec::with_capacity(2);

    let text_appender = tracing_appender::rolling::daily(log_path, TEXT_LOG_FILE);
    let (text_writer, text_guard) = tracing_appender::non_blocking(text_appender);
    guards.push(text_guard);

    let text_layer = fmt::layer()
        .with_writer(text_writer)
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_filter(env_filter()?);

    let json_layer = if json_file {
        let json_appender = tracing_appender::rolling::daily(log_path, JSON_LOG_FILE);
        let (json_writer, json_guard) = tracing_appender::non_blocking(json_appender);
        guards.push(json_guard);
        Some(
            fmt::layer()
                .json()
                .with_writer(json_writer)
                .with_target(true)
                .with_current_span(true)
                .with_filter(env_filter()?),
        )
    } else {
        None
    };

    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(env_filter()?);

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(stdout_layer)
        .try_init()?;

    tracing::debug!("logging to {}", log_path.join(TEXT_LOG_FILE).display());

    Ok(LogGuards { _guards: guards })
}
