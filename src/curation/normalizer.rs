//! Raw scraped records → [`NormalizedArticle`]s.

use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::dates::parse_date;
use super::text::{normalize_optional, normalize_text, normalize_url};
use crate::models::{NormalizedArticle, RawArticle};

/// Why a raw record could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("article from {feed} has no title")]
    MissingTitle { feed: String },
    #[error("article '{title}' from {feed} has no URL")]
    MissingUrl { feed: String, title: String },
}

/// Output of [`normalize_batch`].
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Normalized records in input order.
    pub articles: Vec<NormalizedArticle>,
    /// Records that were dropped, with the reason.
    pub dropped: Vec<NormalizeError>,
    /// Soft problems, e.g. a date string nothing could parse.
    pub warnings: Vec<String>,
}

/// Normalize a single raw record.
///
/// Title and URL are required. The published date is parsed leniently; an
/// unrecognized date leaves `published_date` empty rather than failing.
pub fn normalize(raw: &RawArticle) -> Result<NormalizedArticle, NormalizeError> {
    let title = normalize_optional(raw.title.as_deref()).ok_or_else(|| {
        NormalizeError::MissingTitle {
            feed: raw.source.clone(),
        }
    })?;

    let url = raw
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| NormalizeError::MissingUrl {
            feed: raw.source.clone(),
            title: title.clone(),
        })?;

    Ok(NormalizedArticle {
        source: normalize_text(&raw.source),
        title,
        canonical_url: normalize_url(url),
        published_date: parse_date(raw.published_date.as_deref()),
        author: raw
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string),
        summary_text: normalize_optional(raw.teaser.as_deref()),
    })
}

/// Normalize a batch, dropping unusable records.
///
/// Order is preserved, and every record with a title and URL comes out the
/// other side.
#[instrument(level = "info", skip_all, fields(count = raws.len()))]
pub fn normalize_batch(raws: &[RawArticle]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for raw in raws {
        match normalize(raw) {
            Ok(article) => {
                let raw_date = raw.published_date.as_deref().map(str::trim).unwrap_or("");
                if !raw_date.is_empty() && article.published_date.is_none() {
                    warn!(url = %article.canonical_url, date = %raw_date, "Could not parse published date");
                    batch.warnings.push(format!(
                        "unparsable date '{raw_date}' for {}",
                        article.canonical_url
                    ));
                }
                batch.articles.push(article);
            }
            Err(err) => {
                warn!(source = %raw.source, error = %err, "Dropping article");
                batch.dropped.push(err);
            }
        }
    }

    debug!(
        normalized = batch.articles.len(),
        dropped = batch.dropped.len(),
        "Normalization finished"
    );
    batch
}
