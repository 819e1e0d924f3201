//! Run configuration.
//!
//! Scalars come from the CLI (each flag also readable from the environment, see
//! [`crate::cli::Cli`]); theme keywords and technical keywords may be replaced
//! from an optional YAML file. [`Settings::validate`] reports every problem at
//! once so a misconfigured run fails before any network traffic.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::cli::Cli;
use crate::models::ThemeKeywords;

/// Tolerance when checking that the score weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Weights for combining recency and relevance into the overall score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub recency: f64,
    pub relevance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            recency: 0.4,
            relevance: 0.6,
        }
    }
}

/// Everything the pure curation stages need.
#[derive(Debug, Clone, PartialEq)]
pub struct CurationSettings {
    pub recency_window_days: i64,
    pub target_selected: i64,
    pub min_score_threshold: f64,
    pub weights: ScoreWeights,
    pub themes: ThemeKeywords,
    /// When non-empty, only articles mentioning one of these survive.
    pub technical_keywords: Vec<String>,
}

impl Default for CurationSettings {
    fn default() -> Self {
        Self {
            recency_window_days: 30,
            target_selected: 10,
            min_score_threshold: 0.0,
            weights: ScoreWeights::default(),
            themes: ThemeKeywords::default(),
            technical_keywords: Vec::new(),
        }
    }
}

impl CurationSettings {
    /// Target count as a length; non-positive targets select nothing.
    pub fn target_count(&self) -> usize {
        usize::try_from(self.target_selected).unwrap_or(0)
    }
}

/// HTTP behaviour of the source fetchers.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub max_articles_per_source: i64,
    pub request_delay_seconds: f64,
    pub max_retries: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_articles_per_source: 50,
            request_delay_seconds: 1.0,
            max_retries: 3,
        }
    }
}

impl FetchSettings {
    pub fn limit(&self) -> usize {
        usize::try_from(self.max_articles_per_source).unwrap_or(0)
    }
}

/// Ollama connection for post generation.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub num_ctx: u32,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama4:scout".to_string(),
            timeout_seconds: 120,
            num_ctx: 16384,
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub curation: CurationSettings,
    pub fetch: FetchSettings,
    pub output_dir: PathBuf,
    pub drive_folder_id: Option<String>,
    pub drive_access_token: Option<String>,
    pub generate_posts: bool,
    pub ollama: OllamaSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            curation: CurationSettings::default(),
            fetch: FetchSettings::default(),
            output_dir: PathBuf::from("output"),
            drive_folder_id: None,
            drive_access_token: None,
            generate_posts: false,
            ollama: OllamaSettings::default(),
        }
    }
}

/// Optional YAML overrides (`--config`).
///
/// ```yaml
/// keywords:
///   identity_and_access: [IAM, SSO, MFA]
///   devsecops: [shift left]
/// technical_keywords: [announcing, now available, how to]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub keywords: Option<ThemeKeywords>,
    #[serde(default)]
    pub technical_keywords: Option<Vec<String>>,
}

impl FileConfig {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            themes = parsed.keywords.as_ref().map(|k| k.len()).unwrap_or(0),
            technical_keywords = parsed.technical_keywords.as_ref().map(|k| k.len()).unwrap_or(0),
            "Loaded config file"
        );
        Ok(parsed)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is a valid "no overrides" config.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

impl Settings {
    /// Resolve settings from parsed CLI arguments, reading `--config` if given.
    ///
    /// Does not validate; call [`Settings::validate`] before using the result.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(Path::new(path))?,
            None => FileConfig::default(),
        };

        let mut settings = Self {
            curation: CurationSettings {
                recency_window_days: cli.recency_window_days,
                target_selected: cli.target_selected,
                min_score_threshold: cli.min_score_threshold,
                weights: ScoreWeights {
                    recency: cli.recency_weight,
                    relevance: cli.relevance_weight,
                },
                ..Default::default()
            },
            fetch: FetchSettings {
                max_articles_per_source: cli.max_articles_per_source,
                request_delay_seconds: cli.request_delay_seconds,
                max_retries: cli.max_retries,
            },
            output_dir: PathBuf::from(&cli.output_dir),
            drive_folder_id: non_blank(cli.drive_folder_id.as_deref()),
            drive_access_token: non_blank(cli.drive_access_token.as_deref()),
            generate_posts: cli.generate && !cli.skip_generation,
            ollama: OllamaSettings {
                base_url: cli.ollama_url.clone(),
                model: cli.model.clone(),
                timeout_seconds: cli.timeout,
                ..Default::default()
            },
        };
        settings.apply_file(file);
        debug!(?settings.curation.weights, window = settings.curation.recency_window_days, "Resolved settings");
        Ok(settings)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(keywords) = file.keywords {
            self.curation.themes = keywords;
        }
        if let Some(technical) = file.technical_keywords {
            self.curation.technical_keywords = technical
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
    }

    /// Check every constraint and report all violations together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.curation;
        let f = &self.fetch;
        let mut errors = Vec::new();

        if c.recency_window_days < 1 {
            errors.push(format!(
                "recency_window_days must be at least 1 (got {})",
                c.recency_window_days
            ));
        }
        if c.target_selected < 1 {
            errors.push(format!(
                "target_selected must be at least 1 (got {})",
                c.target_selected
            ));
        }
        if f.max_articles_per_source < 1 {
            errors.push(format!(
                "max_articles_per_source must be at least 1 (got {})",
                f.max_articles_per_source
            ));
        }
        if !(0.0..=100.0).contains(&c.min_score_threshold) {
            errors.push(format!(
                "min_score_threshold must be between 0 and 100 (got {})",
                c.min_score_threshold
            ));
        }
        for (name, weight) in [("recency_weight", c.weights.recency), ("relevance_weight", c.weights.relevance)] {
            if !(0.0..=1.0).contains(&weight) {
                errors.push(format!("{name} must be between 0 and 1 (got {weight})"));
            }
        }
        let sum = c.weights.recency + c.weights.relevance;
        if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            errors.push(format!("recency_weight + relevance_weight must equal 1.0 (got {sum})"));
        }
        if !(f.request_delay_seconds >= 0.0 && f.request_delay_seconds.is_finite()) {
            errors.push(format!(
                "request_delay_seconds must be non-negative (got {})",
                f.request_delay_seconds
            ));
        }
        if c.themes.is_empty() {
            errors.push("at least one theme must be configured".to_string());
        }
        for (theme, _) in c.themes.iter() {
            if theme.trim().is_empty() {
                errors.push("theme names must not be blank".to_string());
            }
        }
        for theme in c.themes.empty_themes() {
            errors.push(format!("theme '{theme}' has no keywords"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
