//! Tracing setup: console output plus a daily rolling `sprintview.log`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogSection;

pub const LOG_FILE: &str = "sprintview.log";

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(level: &str) -> String {
    format!("sprintview={},tower_http=warn", level.trim())
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. The returned guard flushes the
/// log file on drop and must be held for the life of the process; it is
/// `None` when file output is disabled.
pub fn init(config: &LogSection) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(&config.level)))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let (file_layer, guard) = if config.file {
        ensure_writable(&config.dir)?;
        let appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Fail when logs cannot be written to `dir`.
fn ensure_writable(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("Log directory {} does not exist", dir.display());
    }
    let probe = dir.join(".sprintview-write-test");
    std::fs::write(&probe, b"")
        .with_context(|| format!("Can't write to logging dir: {}", dir.display()))?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}
