//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this
//! crate, `shared`, `tower_http` and the `security` target.

use std::path::Path;

use tracing_subscriber::EnvFilter;

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,civic_server={level},shared={level},tower_http={level},security={level}"
        ))
    })
}

/// Initialize the logger with stdout output at `info`
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

/// Initialize the logger, optionally as JSON and/or into a daily rolling file
///
/// A second call is a no-op so tests can call it freely.
pub fn init_logger_with_file(log_level: Option<&str>, json: bool, log_dir: Option<&str>) {
    let filter = default_filter(log_level.unwrap_or("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if let Err(e) = std::fs::create_dir_all(log_path) {
            eprintln!("Cannot create log directory {dir}: {e}, logging to stdout");
        } else {
            let file_appender = tracing_appender::rolling::daily(log_path, "civic-server");
            let result = if json {
                builder
                    .json()
                    .with_ansi(false)
                    .with_writer(file_appender)
                    .try_init()
            } else {
                builder.with_ansi(false).with_writer(file_appender).try_init()
            };
            let _ = result;
            return;
        }
    }

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
