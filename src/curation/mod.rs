//! The curation pipeline.
//!
//! Turns a batch of scraped [`RawArticle`]s into a ranked shortlist of
//! [`ScoredArticle`]s. Every stage is a pure function over owned data; the
//! only side effects are `tracing` events.
//!
//! # Stages
//!
//! 1. [`normalizer`]: clean text, canonicalize URLs, parse dates
//! 2. [`filter`]: optional technical-content filter
//! 3. [`dedup`]: collapse duplicates by URL, then by title
//! 4. [`scorer`]: recency, relevance and overall scores
//! 5. [`summarizer`]: summary, topics, framing, angle, hashtags
//! 6. [`selector`]: threshold, rank, truncate
//!
//! Helpers for URL/title canonicalization live in [`text`] and date parsing
//! in [`dates`].

pub mod dates;
pub mod dedup;
pub mod filter;
pub mod normalizer;
pub mod scorer;
pub mod selector;
pub mod summarizer;
pub mod text;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::config::CurationSettings;
use crate::models::{RawArticle, ScoredArticle};

/// Per-stage counts for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageReport {
    pub raw_count: usize,
    pub normalized_count: usize,
    /// Records dropped for missing a title or URL.
    pub dropped_count: usize,
    /// Records removed by the technical-content filter.
    pub filtered_count: usize,
    pub deduped_count: usize,
    pub removed_by_url: usize,
    pub removed_by_title: usize,
    pub scored_count: usize,
    pub selected_count: usize,
    pub warnings: Vec<String>,
}

/// Output of [`curate`].
#[derive(Debug, Clone, Default)]
pub struct CurationOutcome {
    /// Best first.
    pub selected: Vec<ScoredArticle>,
    pub report: StageReport,
}

/// Run every stage over `raws`.
///
/// Per-record problems never fail the run: unusable records are dropped and
/// unparsable dates are recorded as warnings.
///
/// # Arguments
///
/// * `raws` - Articles as fetched, from any number of sources
/// * `settings` - Window, weights, threshold, target count and keywords
/// * `now` - Reference time for recency and the `collected_at` stamp
#[instrument(level = "info", skip_all, fields(raw = raws.len()))]
pub fn curate(
    raws: &[RawArticle],
    settings: &CurationSettings,
    now: DateTime<Utc>,
) -> CurationOutcome {
    let mut report = StageReport {
        raw_count: raws.len(),
        ..Default::default()
    };

    let batch = normalizer::normalize_batch(raws);
    report.normalized_count = batch.articles.len();
    report.dropped_count = batch.dropped.len();
    report.warnings = batch.warnings;
    report
        .warnings
        .extend(batch.dropped.iter().map(|e| format!("dropped: {e}")));
    info!(stage = "normalize", count = report.normalized_count, dropped = report.dropped_count, "Stage complete");

    let technical = filter::filter_technical(batch.articles, &settings.technical_keywords);
    report.filtered_count = report.normalized_count - technical.len();
    if !settings.technical_keywords.is_empty() {
        info!(stage = "filter", count = technical.len(), removed = report.filtered_count, "Stage complete");
    }

    let deduped = dedup::deduplicate(technical);
    report.deduped_count = deduped.articles.len();
    report.removed_by_url = deduped.removed_by_url;
    report.removed_by_title = deduped.removed_by_title;
    info!(
        stage = "dedup",
        count = report.deduped_count,
        removed_by_url = report.removed_by_url,
        removed_by_title = report.removed_by_title,
        "Stage complete"
    );

    let scores = scorer::score_articles(deduped.articles, settings, now);
    report.scored_count = scores.len();
    info!(stage = "score", count = report.scored_count, "Stage complete");

    let enriched: Vec<ScoredArticle> = scores
        .into_iter()
        .map(|s| summarizer::enrich(s, &settings.themes, now))
        .collect();

    let selected = selector::select(
        enriched,
        settings.target_count(),
        settings.min_score_threshold,
    );
    report.selected_count = selected.len();
    info!(stage = "select", count = report.selected_count, "Stage complete");

    CurationOutcome { selected, report }
}
