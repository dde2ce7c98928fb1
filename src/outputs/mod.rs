//! Report files written to the output directory.
//!
//! # Submodules
//!
//! - [`markdown`]: the archival markdown report
//! - [`json`]: a JSON snapshot of the same report
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── daily_report_20250506_093000.md
//! └── daily_report_20250506_093000.json
//! ```

pub mod json;
pub mod markdown;

use crate::models::DailyReport;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Write both report files. Returns the markdown path.
pub async fn save_all(report: &DailyReport, output_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let stem = markdown::report_stem(report);
    let path = markdown::save_report(report, output_dir, &stem).await?;
    json::write_snapshot(report, output_dir, &stem).await?;
    Ok(path)
}
