//! Command-line interface definitions for the content agent.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every scalar can be provided via a command-line flag or an environment
//! variable; a `.env` file in the working directory is loaded first.

use clap::Parser;

/// Command-line arguments for the content agent.
///
/// # Examples
///
/// ```sh
/// # Live run with defaults, writing into ./output
/// content_agent
///
/// # Offline run against canned articles, verbose logging
/// content_agent --mock -v
///
/// # Custom scoring and keyword file, then draft LinkedIn posts
/// content_agent --config config.yaml --recency-weight 0.5 --relevance-weight 0.5 --generate
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for CSV files and run logs
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: String,

    /// Optional path to a YAML file overriding theme keywords
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use canned sample articles instead of fetching
    #[arg(long)]
    pub mock: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,

    /// Days over which the recency score decays to zero
    #[arg(long, env = "RECENCY_WINDOW_DAYS", default_value_t = 30, allow_negative_numbers = true)]
    pub recency_window_days: i64,

    /// Maximum number of candidates to select
    #[arg(long, env = "TARGET_SELECTED", default_value_t = 10, allow_negative_numbers = true)]
    pub target_selected: i64,

    /// Minimum overall score (0-100) for a candidate to qualify
    #[arg(long, env = "MIN_SCORE_THRESHOLD", default_value_t = 0.0, allow_negative_numbers = true)]
    pub min_score_threshold: f64,

    /// Weight of the recency score
    #[arg(long, env = "RECENCY_WEIGHT", default_value_t = 0.4, allow_negative_numbers = true)]
    pub recency_weight: f64,

    /// Weight of the relevance score
    #[arg(long, env = "RELEVANCE_WEIGHT", default_value_t = 0.6, allow_negative_numbers = true)]
    pub relevance_weight: f64,

    /// Maximum articles fetched from each source
    #[arg(long, env = "MAX_ARTICLES_PER_SOURCE", default_value_t = 50, allow_negative_numbers = true)]
    pub max_articles_per_source: i64,

    /// Seconds to wait before each HTTP request
    #[arg(long, env = "REQUEST_DELAY_SECONDS", default_value_t = 1.0, allow_negative_numbers = true)]
    pub request_delay_seconds: f64,

    /// Retries per HTTP request
    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Google Drive folder to upload outputs into (upload skipped when unset)
    #[arg(long, env = "GOOGLE_DRIVE_FOLDER_ID")]
    pub drive_folder_id: Option<String>,

    /// OAuth access token for the Drive API
    #[arg(long, env = "GOOGLE_DRIVE_ACCESS_TOKEN", hide_env_values = true)]
    pub drive_access_token: Option<String>,

    /// Draft LinkedIn posts for the selected candidates with Ollama
    #[arg(long)]
    pub generate: bool,

    /// Skip post generation even if --generate is set
    #[arg(long)]
    pub skip_generation: bool,

    /// Ollama model used for post generation
    #[arg(long, env = "OLLAMA_MODEL", default_value = "llama4:scout")]
    pub model: String,

    /// Ollama request timeout in seconds
    #[arg(long, env = "OLLAMA_TIMEOUT", default_value_t = 120)]
    pub timeout: u64,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,
}
