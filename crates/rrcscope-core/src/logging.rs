//! File logging for analysis runs
//!
//! Library code only emits `tracing` events, and every recorded anomaly is
//! logged at `warn`. A driver installs [`init`] or [`init_with_dir`] once per
//! process to keep those records in a daily-rotated file next to the report.

use std::path::{Path, PathBuf};

use tracing::Subscriber;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV_VAR: &str = "RRCSCOPE_LOG";

/// Prefix of the rotated log files (`rrcscope.log.YYYY-MM-DD`)
pub const LOG_FILE_PREFIX: &str = "rrcscope.log";

const DEFAULT_FILTER: &str = "rrcscope=info,warn";

/// Install the file logger under the per-user data directory
///
/// Returns the directory the log files are written to.
pub fn init() -> Result<PathBuf> {
    let log_dir = log_directory();
    init_with_dir(&log_dir)?;
    Ok(log_dir)
}

/// Install the file logger writing into `log_dir`
///
/// # Errors
/// [`Error::Io`] if the directory cannot be created, [`Error::Config`] if the
/// appender cannot be opened or a global subscriber is already installed.
pub fn init_with_dir(log_dir: &Path) -> Result<()> {
    file_subscriber(log_dir)?
        .try_init()
        .map_err(|e| Error::config(format!("Failed to install logger: {e}")))?;

    tracing::info!("rrcscope logging started");
    tracing::info!("Log directory: {}", log_dir.display());
    Ok(())
}

/// Subscriber that writes plain-text records into `log_dir`
///
/// The level filter comes from [`LOG_ENV_VAR`], defaulting to `info` for
/// rrcscope crates and `warn` for everything else.
pub fn file_subscriber(log_dir: &Path) -> Result<impl Subscriber + Send + Sync + 'static> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
        .map_err(|e| Error::config(format!("Failed to open log file: {e}")))?;

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    Ok(tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::ChronoLocal::new(
                "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            )),
    ))
}

/// Default log directory, `<data-local>/rrcscope/logs`
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rrcscope")
        .join("logs")
}
