//! JSON snapshot of the daily report.
//!
//! The snapshot sits next to the markdown report and shares its timestamped
//! stem, so `daily_report_20250506_093000.md` pairs with
//! `daily_report_20250506_093000.json`.

use crate::models::DailyReport;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `report` as pretty-printed JSON to `{output_dir}/{stem}.json`.
///
/// # Errors
///
/// Returns an error if serialization, directory creation, or the write fails.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), stem = %stem))]
pub async fn write_snapshot(
    report: &DailyReport,
    output_dir: &Path,
    stem: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = output_dir.join(format!("{}.json", stem));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON snapshot");
    Ok(path)
}
