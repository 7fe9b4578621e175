use std::fs;
use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

pub const LOG_FILE_PREFIX: &str = "civictrack-admin.log";

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Level used when `RUST_LOG` is unset. Each `-v` raises it one step above
/// `warn`; a configured level that is already more verbose wins.
#[must_use]
pub fn effective_level(configured: &str, verbose: u8) -> String {
    if verbose == 0 {
        return configured.to_string();
    }
    let requested = (1 + usize::from(verbose)).min(LEVELS.len() - 1);
    let current = LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(configured));
    match current {
        Some(current) if current > requested => configured.to_string(),
        _ => LEVELS[requested].to_string(),
    }
}

/// Installs the global subscriber.
///
/// Human-readable output goes to stderr so stdout stays clean for reports.
/// When a log directory is configured a daily-rolling JSON file is added; the
/// returned guard must live until exit so buffered lines are flushed.
pub fn init(config: &LoggingConfig, verbose: u8) -> anyhow::Result<Option<WorkerGuard>> {
    let level = effective_level(&config.level, verbose);
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(filter());

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|error| {
                anyhow::anyhow!("failed to create log directory {}: {error}", dir.display())
            })?;
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .json()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    if let Some(dir) = &config.directory {
        tracing::debug!(directory = %dir.display(), "file logging enabled");
    }
    Ok(guard)
}
