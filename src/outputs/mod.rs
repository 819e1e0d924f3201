//! Files written at the end of a run.
//!
//! # Submodules
//!
//! - [`csv`]: Curated candidates and drafted posts as CSV
//! - [`json`]: The run log with [`crate::metrics::RunMetrics`]
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── content_candidates_20240115_103000.csv
//! ├── linkedin_posts_20240115_103000.csv   # only with --generate
//! └── run_log_20240115_103000.json
//! ```

pub mod csv;
pub mod json;
