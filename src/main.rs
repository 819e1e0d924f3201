//! # Content Agent
//!
//! A curation pipeline that collects security and cloud blog posts, scores
//! them for recency and topical relevance, and writes a ranked shortlist of
//! LinkedIn content candidates.
//!
//! ## Features
//!
//! - Fetches the AWS News Blog and the Microsoft Purview Blog (RSS/Atom with
//!   an HTML fallback), or canned sample articles with `--mock`
//! - Normalizes, deduplicates, scores, summarizes and selects articles
//! - Writes a candidates CSV and a JSON run log, optionally uploaded to Google Drive
//! - Optionally drafts Hook-Value-CTA posts with a local Ollama model
//!
//! ## Usage
//!
//! ```sh
//! content_agent -o ./output --config config.yaml --generate
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: Every source is fetched concurrently; failures are isolated
//! 2. **Curation**: normalize → filter → dedup → score → enrich → select
//! 3. **Output**: Candidates CSV, Drive upload, run log
//! 4. **Drafting**: Optional post generation and posts CSV
//!
//! ## Exit codes
//!
//! `0` success, `1` invalid configuration, `2` no candidates were written.

use chrono::{DateTime, Utc};
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod curation;
mod generator;
mod metrics;
mod models;
mod outputs;
mod retry;
mod scrapers;
mod upload;
mod utils;

use api::{OllamaAsk, RetryAsk};
use cli::Cli;
use config::{FetchSettings, Settings};
use curation::curate;
use generator::PostGenerator;
use metrics::{RunMetrics, UploadStatus, log_stage_counts};
use models::ScoredArticle;
use outputs::csv::{write_candidates_csv, write_posts_csv};
use outputs::json::write_run_log;
use scrapers::blog::{BlogFetcher, BlogProfile};
use scrapers::{SourceFetcher, fetch_all, mock};
use upload::{DriveUploader, GoogleDriveUploader};
use utils::ensure_writable_dir;

const EXIT_CONFIG: i32 = 1;
const EXIT_NO_OUTPUT: i32 = 2;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    // --- Tracing init ---
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("content_agent starting up");
    debug!(output_dir = %args.output_dir, mock = args.mock, "Parsed CLI arguments");

    let settings = match Settings::from_cli(&args).and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&settings.output_dir).await {
        error!(
            path = %settings.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let run_ts = Utc::now();
    let mut metrics = RunMetrics::new(run_ts);

    // ---- Fetch ----
    let fetchers = if args.mock {
        info!("Mock mode enabled; using sample articles");
        mock::sample_fetchers(run_ts)
    } else {
        live_fetchers(&settings.fetch)?
    };
    let fetched = fetch_all(&fetchers, settings.fetch.limit()).await;
    log_stage_counts("fetched", fetched.articles.len());
    metrics.fetched_count_by_source = fetched.counts.clone();
    metrics.errors.extend(fetched.errors.iter().cloned());

    // ---- Curate ----
    let outcome = curate(&fetched.articles, &settings.curation, run_ts);
    let report = &outcome.report;
    log_stage_counts("normalized", report.normalized_count);
    log_stage_counts("deduped", report.deduped_count);
    log_stage_counts("scored", report.scored_count);
    log_stage_counts("selected", report.selected_count);
    metrics.record_curation(report, &outcome.selected);

    // ---- Candidates CSV ----
    let candidates_csv =
        match write_candidates_csv(&outcome.selected, &settings.output_dir, &run_ts).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!(error = %e, "Failed to write candidates CSV");
                metrics.errors.push(format!("candidates CSV: {e}"));
                None
            }
        };

    // ---- Drive upload ----
    let uploader = drive_uploader(&settings)?;
    match (&uploader, &candidates_csv) {
        (Some(uploader), Some(path)) => {
            let result = uploader.upload(path).await;
            if result.success {
                metrics.upload_status = UploadStatus::Success;
                metrics.uploaded_file_id = result.file_id;
            } else {
                metrics.upload_status = UploadStatus::Failed;
                metrics
                    .errors
                    .push(format!("upload: {}", result.error.unwrap_or_default()));
            }
        }
        (Some(_), None) => {
            warn!("No candidates CSV to upload");
            metrics.upload_status = UploadStatus::Skipped;
        }
        (None, _) => {
            info!("Drive upload not configured; skipping");
            metrics.upload_status = UploadStatus::Skipped;
        }
    }

    // ---- Run log ----
    if let Err(e) = write_run_log(&metrics, &settings.output_dir).await {
        error!(error = %e, "Failed to write run log");
    }

    // ---- Post drafting ----
    if settings.generate_posts {
        if outcome.selected.is_empty() {
            info!("No candidates selected; skipping post generation");
        } else if let Err(e) = draft_posts(
            &settings,
            &outcome.selected,
            uploader.as_ref().map(|u| u as &dyn DriveUploader),
            &run_ts,
        )
        .await
        {
            error!(error = %e, "Post generation aborted");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        elapsed_secs = elapsed.as_secs_f64(),
        selected = outcome.selected.len(),
        errors = metrics.errors.len(),
        "Execution complete"
    );

    if candidates_csv.is_none() || outcome.selected.is_empty() {
        warn!("Pipeline produced no candidates");
        std::process::exit(EXIT_NO_OUTPUT);
    }

    Ok(())
}

/// One [`BlogFetcher`] per production blog.
fn live_fetchers(settings: &FetchSettings) -> Result<Vec<Box<dyn SourceFetcher>>, reqwest::Error> {
    BlogProfile::defaults()
        .into_iter()
        .map(|profile| {
            BlogFetcher::new(profile, settings).map(|f| Box::new(f) as Box<dyn SourceFetcher>)
        })
        .collect()
}

/// A Drive uploader when both a folder and an access token are configured.
fn drive_uploader(settings: &Settings) -> Result<Option<GoogleDriveUploader>, reqwest::Error> {
    match (&settings.drive_folder_id, &settings.drive_access_token) {
        (Some(folder), Some(token)) => Ok(Some(GoogleDriveUploader::new(folder, token)?)),
        (Some(_), None) => {
            warn!("Drive folder configured without an access token; skipping upload");
            Ok(None)
        }
        _ => Ok(None),
    }
}

/// Draft posts for the selection, write them to CSV and upload the file.
#[instrument(level = "info", skip_all, fields(model = %settings.ollama.model, articles = selected.len()))]
async fn draft_posts(
    settings: &Settings,
    selected: &[ScoredArticle],
    uploader: Option<&dyn DriveUploader>,
    run_ts: &DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    let ollama = OllamaAsk::new(
        &settings.ollama.base_url,
        &settings.ollama.model,
        StdDuration::from_secs(settings.ollama.timeout_seconds),
        settings.ollama.num_ctx,
    )?;
    ollama.ensure_model().await?;

    let generator = PostGenerator::new(RetryAsk::new(ollama), &settings.ollama.model);
    let batch = generator.generate_batch(selected).await?;
    for (title, message) in &batch.failed {
        warn!(%title, error = %message, "Post not generated");
    }
    if batch.successful.is_empty() {
        warn!("No posts generated");
        return Ok(());
    }

    let path = write_posts_csv(&batch.successful, &settings.output_dir, run_ts).await?;
    if let Some(uploader) = uploader {
        upload_posts(uploader, &path).await;
    }
    Ok(())
}

async fn upload_posts(uploader: &dyn DriveUploader, path: &Path) {
    let result = uploader.upload(path).await;
    if result.success {
        info!(file_id = ?result.file_id, "Uploaded posts CSV");
    } else {
        warn!(error = ?result.error, "Posts CSV upload failed");
    }
}
