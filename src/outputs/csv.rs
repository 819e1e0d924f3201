//! CSV exports: curated candidates and drafted posts.
//!
//! Multi-valued fields are joined with `;`, dates are RFC 3339 and scores
//! carry two decimals.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

use crate::curation::dates::format_date;
use crate::generator::GeneratedPost;
use crate::models::ScoredArticle;
use crate::utils::stamped_path;

pub const CANDIDATES_PREFIX: &str = "content_candidates";
pub const POSTS_PREFIX: &str = "linkedin_posts";

#[derive(Debug, Serialize)]
struct CandidateRow<'a> {
    source: &'a str,
    title: &'a str,
    url: &'a str,
    published_date: String,
    author: &'a str,
    summary: &'a str,
    key_topics: String,
    why_it_matters: &'a str,
    suggested_linkedin_angle: &'a str,
    suggested_hashtags: String,
    score_overall: String,
    score_recency: String,
    score_relevance: String,
    collected_at: String,
}

impl<'a> From<&'a ScoredArticle> for CandidateRow<'a> {
    fn from(a: &'a ScoredArticle) -> Self {
        Self {
            source: &a.article.source,
            title: &a.article.title,
            url: &a.article.canonical_url,
            published_date: a.article.published_date.as_ref().map(format_date).unwrap_or_default(),
            author: a.article.author.as_deref().unwrap_or(""),
            summary: &a.summary,
            key_topics: a.key_topics.iter().join(";"),
            why_it_matters: &a.why_it_matters,
            suggested_linkedin_angle: &a.suggested_angle,
            suggested_hashtags: a.suggested_hashtags.iter().join(";"),
            score_overall: format!("{:.2}", a.score_overall),
            score_recency: format!("{:.2}", a.score_recency),
            score_relevance: format!("{:.2}", a.score_relevance),
            collected_at: format_date(&a.collected_at),
        }
    }
}

#[derive(Debug, Serialize)]
struct PostRow<'a> {
    source_url: &'a str,
    hook: &'a str,
    value: &'a str,
    cta: &'a str,
    full_text: &'a str,
    hashtags: String,
    character_count: usize,
    model_used: &'a str,
    generated_at: String,
}

impl<'a> From<&'a GeneratedPost> for PostRow<'a> {
    fn from(p: &'a GeneratedPost) -> Self {
        Self {
            source_url: &p.source_url,
            hook: &p.hook,
            value: &p.value,
            cta: &p.cta,
            full_text: &p.full_text,
            hashtags: p.hashtags.iter().join(";"),
            character_count: p.character_count,
            model_used: &p.model_used,
            generated_at: format_date(&p.generated_at),
        }
    }
}

const CANDIDATE_HEADERS: [&str; 14] = [
    "source",
    "title",
    "url",
    "published_date",
    "author",
    "summary",
    "key_topics",
    "why_it_matters",
    "suggested_linkedin_angle",
    "suggested_hashtags",
    "score_overall",
    "score_recency",
    "score_relevance",
    "collected_at",
];

const POST_HEADERS: [&str; 9] = [
    "source_url",
    "hook",
    "value",
    "cta",
    "full_text",
    "hashtags",
    "character_count",
    "model_used",
    "generated_at",
];

/// Serialize rows to CSV bytes. The header row is written even when there
/// are no rows.
fn to_csv<S: Serialize>(headers: &[&str], rows: impl IntoIterator<Item = S>) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

async fn write_file(path: &Path, bytes: Vec<u8>) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;
    Ok(())
}

/// Write `content_candidates_{stamp}.csv` into `output_dir`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), rows = articles.len()))]
pub async fn write_candidates_csv(
    articles: &[ScoredArticle],
    output_dir: &Path,
    run_ts: &DateTime<Utc>,
) -> Result<PathBuf, Box<dyn Error>> {
    let bytes = to_csv(&CANDIDATE_HEADERS, articles.iter().map(CandidateRow::from))?;
    let path = stamped_path(output_dir, CANDIDATES_PREFIX, run_ts, "csv");
    write_file(&path, bytes).await?;
    info!(path = %path.display(), "Wrote candidates CSV");
    Ok(path)
}

/// Write `linkedin_posts_{stamp}.csv` into `output_dir`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), rows = posts.len()))]
pub async fn write_posts_csv(
    posts: &[GeneratedPost],
    output_dir: &Path,
    run_ts: &DateTime<Utc>,
) -> Result<PathBuf, Box<dyn Error>> {
    let bytes = to_csv(&POST_HEADERS, posts.iter().map(PostRow::from))?;
    let path = stamped_path(output_dir, POSTS_PREFIX, run_ts, "csv");
    write_file(&path, bytes).await?;
    info!(path = %path.display(), "Wrote posts CSV");
    Ok(path)
}
