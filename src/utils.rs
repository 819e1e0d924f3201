//! Utility functions for string manipulation, output naming, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging and case conversion for hashtags
//! - Timestamped output file names
//! - File system validation for the output directory

use chrono::{DateTime, Utc};
use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to a
/// character boundary) with an ellipsis and byte count indicator appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if shorter than `max`, otherwise a truncated version
/// with `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Capitalize the first character of a string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(upcase("hello"), "Hello");
/// assert_eq!(upcase(""), "");
/// ```
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Convert a snake_case or spaced name to PascalCase.
///
/// Words are split on any non-alphanumeric character; the rest of each word
/// keeps its case, so acronyms survive.
///
/// ```ignore
/// assert_eq!(pascal_case("zero_day_response"), "ZeroDayResponse");
/// assert_eq!(pascal_case("IAM"), "IAM");
/// ```
pub fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(upcase)
        .collect()
}

/// `YYYYMMDD_HHMMSS` stamp used in output file names.
pub fn run_stamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y%m%d_%H%M%S").to_string()
}

/// `{dir}/{prefix}_{stamp}.{ext}`
///
/// # Examples
///
/// ```ignore
/// // output/content_candidates_20240115_103000.csv
/// stamped_path(Path::new("output"), "content_candidates", &ts, "csv");
/// ```
pub fn stamped_path(dir: &Path, prefix: &str, ts: &DateTime<Utc>, ext: &str) -> PathBuf {
    dir.join(format!("{prefix}_{}.{ext}", run_stamp(ts)))
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
