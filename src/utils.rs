//! Utility functions for log shortening, JSON error classification, and file system checks.

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to the nearest
/// character boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM reply is cut off (e.g. by a token limit), parsing fails with
/// an EOF error. Such replies are worth asking for again; other syntax errors
/// are not.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a marker file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let marker_path = format!("{}/..__write_check__", path.trim_end_matches('/'));
    stdfs::File::create(&marker_path)?;
    let _ = stdfs::remove_file(&marker_path);
    info!("Output directory is writable");
    Ok(())
}
