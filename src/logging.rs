//! Tracing setup: console output plus a daily rolling log file.

use std::error::Error;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Daily log files kept in the log directory.
pub const RETAINED_LOG_FILES: usize = 7;

/// Daily rotating `app.YYYY-MM-DD.log` files under `dir`.
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender, Box<dyn Error>> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("app")
        .filename_suffix("log")
        .max_log_files(RETAINED_LOG_FILES)
        .build(dir)?;
    Ok(appender)
}

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the program.
pub fn init(log_level: &str, log_dir: &Path) -> Result<WorkerGuard, Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(log_dir)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(fmt::time::UtcTime::rfc_3339()),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339()),
        )
        .try_init()?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_appender_writes_dated_file() {
        let dir = std::env::temp_dir().join(format!("digest_logs_{}", std::process::id()));
        let mut appender = file_appender(&dir.join("nested")).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.join("nested"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("app."));
        assert!(names[0].ends_with(".log"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
