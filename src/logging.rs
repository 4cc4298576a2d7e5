//! File-based logging module for spotify-session
//!
//! This module sets up tracing-based logging that writes to a file instead of stdout,
//! since the console driver uses stdout for the session view.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const LOG_DIR: &str = ".logs";
const LOG_FILE_PREFIX: &str = "spotify-session";

/// Initialize the logging system.
///
/// Logs are written to `<log_dir>/spotify-session.YYYY-MM-DD.log` with daily rotation.
/// The log level can be controlled via the `RUST_LOG` environment variable.
///
/// Default log levels:
/// - `spotify_session` modules: DEBUG
/// - `reqwest`: INFO
/// - Other crates: WARN
///
/// The returned guard flushes the background writer when dropped, so keep it
/// alive for the lifetime of the application.
pub fn init_logging(log_dir: &str) -> anyhow::Result<WorkerGuard> {
    let dir = Path::new(log_dir);
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);

    // Non-blocking so log writes never stall the runtime
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spotify_session=debug,reqwest=info,warn"));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("Logging initialized - logs written to {}/", log_dir);

    Ok(guard)
}

/// Log the outcome of a Web API request
#[macro_export]
macro_rules! log_api_result {
    ($operation:expr, $result:expr) => {
        match &$result {
            Ok(_) => tracing::info!(operation = $operation, "API request successful"),
            Err(e) => tracing::error!(operation = $operation, error = %e, "API request failed"),
        }
    };
}

/// Log a Web API request with additional context
#[macro_export]
macro_rules! log_api_request {
    ($operation:expr, $($field:tt)*) => {
        tracing::debug!(operation = $operation, $($field)*, "API request started");
    };
}
