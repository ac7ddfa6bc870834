//! Logging initialization
//!
//! Structured logging over the tracing ecosystem: console output with an
//! environment override (DUEBELL_LOG) and optional daily-rotated file
//! output.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingSettings;

/// Default log directory
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("duebell")
        .join("logs")
}

/// Initialize the logging system.
///
/// Returns the file writer guard when file output is enabled; keep it
/// alive for the lifetime of the process or buffered lines are lost.
///
/// # Environment Variables
/// - `DUEBELL_LOG`: Override the level filter (e.g. "duebell=debug")
pub fn init_logging(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_env("DUEBELL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("duebell={}", settings.level)));

    let console_layer = tracing_subscriber::fmt::layer().with_target(true);

    if settings.file_output {
        let dir = settings.file_path.clone().unwrap_or_else(default_log_dir);
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "duebell.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .boxed();

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init();
        Some(guard)
    } else {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .try_init();
        None
    }
}
