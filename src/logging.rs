//! Rotating log system
//!
//! Logs to both console and rotating files in the log directory.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging system with rotating file logs
pub fn init_logging(log_dir: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,race_vert=debug,tower_http=debug"));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    // Console-only when the log directory can't be created
    let dir_error = std::fs::create_dir_all(Path::new(log_dir)).err();
    let file_layer = if dir_error.is_none() {
        // Rotates daily: race_vert.log.YYYY-MM-DD
        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "race_vert.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Logging lasts the whole program
        std::mem::forget(guard);

        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed(),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    match dir_error {
        None => tracing::info!("Logging initialized. Log directory: {}", log_dir),
        Some(e) => tracing::warn!("Cannot create log directory {}: {}; console only", log_dir, e),
    }
}
