//! JSON run log.
//!
//! One pretty-printed [`RunMetrics`] document per run:
//! ```text
//! output_dir/
//! └── run_log_20240115_103000.json
//! ```

use crate::metrics::RunMetrics;
use crate::utils::stamped_path;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub const RUN_LOG_PREFIX: &str = "run_log";

/// Write the run log for `metrics` into `output_dir`.
///
/// The file name carries the run timestamp from `metrics`.
///
/// # Returns
///
/// The path written, or an error if directory creation or writing fails.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_run_log(
    metrics: &RunMetrics,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(metrics)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create run log dir");
        return Err(e.into());
    }

    let path = stamped_path(output_dir, RUN_LOG_PREFIX, &metrics.run_timestamp, "json");
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote run log");

    Ok(path)
}
