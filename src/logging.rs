use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Console filter when `RUST_LOG` is unset
const DEFAULT_CONSOLE_FILTER: &str = "keepa_deals=info,inspect_product=info,warn";

/// The log file records every request and field decision
const FILE_FILTER: &str = "keepa_deals=debug,inspect_product=debug,info";

/// Initialize console and debug-file logging.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the program.
pub fn init(log_file: &Path) -> Result<WorkerGuard> {
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).context("Failed to create log directory")?;

    let file_name = log_file
        .file_name()
        .context("Log file path has no file name")?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(
            fmt::layer().with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_CONSOLE_FILTER.into()),
            ),
        )
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(EnvFilter::new(FILE_FILTER)),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
