//! Archival markdown report on disk.

use crate::models::DailyReport;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// File stem for a report: `daily_report_YYYYMMDD_HHMMSS`.
pub fn report_stem(report: &DailyReport) -> String {
    format!("daily_report_{}", report.report_date.format("%Y%m%d_%H%M%S"))
}

/// Write [`DailyReport::to_markdown`] to `{output_dir}/{stem}.md`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), stem = %stem))]
pub async fn save_report(
    report: &DailyReport,
    output_dir: &Path,
    stem: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(format!("{}.md", stem));
    fs::write(&path, report.to_markdown()).await?;
    info!(path = %path.display(), "Wrote markdown report");
    Ok(path)
}
