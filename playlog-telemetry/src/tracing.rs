//! Tracing subscriber initialization.
//!
//! Development runs log human-readable lines to stdout. Production runs additionally write
//! JSON lines to a daily-rolling file so unattended scheduled runs leave a trail behind.

use std::io;
use std::path::PathBuf;
use std::sync::Once;

use playlog_config::Environment;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable that overrides the directory of rolling log files.
const LOGS_DIR_ENV_NAME: &str = "APP_LOGS_DIR";

/// Directory of rolling log files relative to the working directory.
const DEFAULT_LOGS_DIR: &str = "logs";

/// Environment variable that enables tracing output in tests.
const ENABLE_TEST_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    /// The runtime environment could not be determined.
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Flushes buffered log lines when dropped.
///
/// Must be held for the lifetime of the process, otherwise lines written through the
/// non-blocking file writer may be lost.
#[must_use]
pub struct LogFlusher {
    _guard: Option<WorkerGuard>,
}

/// Installs the global tracing subscriber for `app_name`.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    let environment = Environment::load()?;

    let guard = if environment.is_prod() {
        let logs_dir = std::env::var_os(LOGS_DIR_ENV_NAME)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGS_DIR));
        let file_appender = tracing_appender::rolling::daily(logs_dir, format!("{app_name}.log"));
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt::layer().json().with_writer(file_writer))
            .with(fmt::layer().with_target(false))
            .try_init()?;

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt::layer().with_target(false))
            .try_init()?;

        None
    };

    tracing::info!(app = app_name, %environment, "tracing initialized");

    Ok(LogFlusher { _guard: guard })
}

/// Initializes tracing once for tests when `ENABLE_TRACING` is set.
pub fn init_test_tracing() {
    if std::env::var_os(ENABLE_TEST_TRACING_ENV_NAME).is_none() {
        return;
    }

    INIT_TEST_TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}
