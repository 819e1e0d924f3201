//! Blog sources and the fan-out that collects raw articles from them.
//!
//! Each source implements [`SourceFetcher`]. Fetching is two-phase per
//! source:
//!
//! 1. **Feed**: Read the RSS or Atom feed
//! 2. **Fallback**: If the feed fails or is empty, scrape the blog's HTML index
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | AWS News Blog | [`blog`] | RSS, HTML fallback | `aws.amazon.com/blogs/aws` |
//! | Microsoft Purview Blog | [`blog`] | RSS, HTML fallback | Tech Community board |
//! | Sample data | [`mock`] | In memory | `--mock` runs |
//!
//! A failing source never fails the run: [`fetch_all`] records the error and
//! a zero count and moves on.

pub mod blog;
pub mod mock;

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::models::RawArticle;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {err}")]
    Http {
        url: String,
        #[source]
        err: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("feed could not be parsed: {0}")]
    Feed(String),
    #[error("invalid selector '{0}'")]
    Selector(String),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("no articles found")]
    Empty,
}

impl FetchError {
    /// Transport errors, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Feed(_)
            | FetchError::Selector(_)
            | FetchError::Url(_)
            | FetchError::Empty => false,
        }
    }
}

/// A source of raw blog articles.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Identifier stamped on every article, e.g. `"AWS News Blog"`.
    fn source_name(&self) -> &str;

    /// Fetch at most `limit` articles.
    async fn fetch(&self, limit: usize) -> Result<Vec<RawArticle>, FetchError>;
}

/// Everything collected from one pass over the sources.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub articles: Vec<RawArticle>,
    /// Articles fetched per source; failed sources count 0.
    pub counts: BTreeMap<String, usize>,
    /// `"{source}: {error}"` for each failed source.
    pub errors: Vec<String>,
}

/// Fetch from every source concurrently. Requests within one source stay
/// sequential, each behind that source's delay.
///
/// # Arguments
///
/// * `fetchers` - The sources to query
/// * `limit` - Maximum articles per source
///
/// # Returns
///
/// A [`FetchReport`]; articles keep source order.
#[instrument(level = "info", skip_all, fields(sources = fetchers.len(), limit = limit))]
pub async fn fetch_all(fetchers: &[Box<dyn SourceFetcher>], limit: usize) -> FetchReport {
    let results = join_all(fetchers.iter().map(|f| f.fetch(limit))).await;

    let mut report = FetchReport::default();
    for (fetcher, result) in fetchers.iter().zip(results) {
        let name = fetcher.source_name().to_string();
        match result {
            Ok(mut articles) => {
                articles.truncate(limit);
                info!(source = %name, count = articles.len(), "Fetched source");
                report.counts.insert(name, articles.len());
                report.articles.extend(articles);
            }
            Err(e) => {
                error!(source = %name, error = %e, "Source fetch failed");
                report.errors.push(format!("{name}: {e}"));
                report.counts.insert(name, 0);
            }
        }
    }

    info!(total = report.articles.len(), failed = report.errors.len(), "Fetch complete");
    report
}
