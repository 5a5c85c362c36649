//! Structured logging and tracing for acbridge
//!
//! Console, rolling-file and broadcast layers are stacked on one registry.
//! The broadcast layer always captures everything; the web log stream applies
//! its own runtime level on top.

mod broadcast;
mod level;
mod state;
mod structured;

pub use broadcast::subscribe_log_lines;
pub use level::{parse_line_level, parse_log_level, should_emit_to_web};
pub use state::{get_web_log_level, set_web_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use crate::config::LoggingConfig;
use crate::error::{AcBridgeError, Result};
use broadcast::{BroadcastMakeWriter, get_or_init_log_tx};
use level::min_level;
use state::{INIT_ERROR, INIT_ONCE, LOG_GUARD};
use std::path::Path;
use tracing::{Level, Subscriber, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging system based on configuration
///
/// Only the first call installs the subscriber; later calls return the
/// outcome of the first one.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        if let Err(e) = install(config) {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(AcBridgeError::config(err.clone()));
    }
    Ok(())
}

fn install(config: &LoggingConfig) -> Result<()> {
    let base_level = parse_log_level(&config.level)?;
    let web_level = match config.web_level.as_deref() {
        Some(s) => parse_log_level(s)?,
        None => base_level,
    };
    set_web_log_level(web_level);

    let filter = build_env_filter(min_level(base_level, web_level));
    let broadcast_layer = fmt_layer(
        BroadcastMakeWriter {
            tx: get_or_init_log_tx(),
        },
        config.json_format,
        false,
        Level::TRACE,
    );
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(broadcast_layer);

    if should_use_console_only() {
        registry
            .with(fmt_layer(std::io::stdout, config.json_format, true, base_level))
            .init();
        info!(
            "Logging initialized - level: {:?}, web_level: {:?}, console-only",
            base_level, web_level
        );
        return Ok(());
    }

    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("acbridge")
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build(log_directory(&config.file))
        .map_err(|e| AcBridgeError::io(format!("Failed to create log file appender: {}", e)))?;
    let (writer, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let registry = registry.with(fmt_layer(writer, config.json_format, false, base_level));
    if config.console_output {
        registry
            .with(fmt_layer(std::io::stdout, config.json_format, true, base_level))
            .init();
    } else {
        registry.init();
    }

    info!(
        "Logging initialized - level: {:?}, web_level: {:?}, file: {}",
        base_level, web_level, config.file
    );
    Ok(())
}

fn fmt_layer<S, W>(
    writer: W,
    json: bool,
    ansi: bool,
    level: Level,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json {
        base.json().with_filter(LevelFilter::from_level(level)).boxed()
    } else {
        base.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

/// A configured file path logs into its parent directory
fn log_directory(file: &str) -> &Path {
    let p = Path::new(file);
    if p.extension().is_some() {
        p.parent().unwrap_or(p)
    } else {
        p
    }
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("acbridge={},tokio_serial=warn", level).into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("ACBRIDGE_DISABLE_FILE_LOG").is_some()
}
