//! Logging setup
//!
//! Installs a `tracing` subscriber. Output goes to stderr, or to a daily
//! rolling file when a log directory is configured.

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "shadow_env_guard=info";

/// Logging options
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Write to `<dir>/shadow-guard.log.<date>` instead of stderr
    pub log_dir: Option<String>,
}

impl LogConfig {
    /// Read `SHADOW_GUARD_LOG_JSON` and `SHADOW_GUARD_LOG_DIR`
    pub fn from_env() -> Self {
        Self {
            json: std::env::var("SHADOW_GUARD_LOG_JSON")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_dir: std::env::var("SHADOW_GUARD_LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }
}

fn env_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?)
}

fn install_failed(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!("failed to install subscriber: {}", e)
}

/// Initialize the global subscriber
///
/// Keep the returned guard alive for the life of the process when logging to
/// a file, or buffered lines are lost.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter()?);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "shadow-guard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let builder = builder.with_writer(writer).with_ansi(false);
            if config.json {
                builder.json().try_init().map_err(install_failed)?;
            } else {
                builder.try_init().map_err(install_failed)?;
            }
            Ok(Some(guard))
        }
        None => {
            let builder = builder.with_writer(std::io::stderr);
            if config.json {
                builder.json().try_init().map_err(install_failed)?;
            } else {
                builder.try_init().map_err(install_failed)?;
            }
            Ok(None)
        }
    }
}
