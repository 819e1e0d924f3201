//! Keeps technical content (launches, releases, walkthroughs) and drops
//! opinion or event posts, when a technical keyword list is configured.

use tracing::{debug, instrument};

use crate::models::NormalizedArticle;

/// Whether `article` mentions any of `keywords` in its title or summary.
///
/// An empty keyword list disables the filter.
pub fn is_technical(article: &NormalizedArticle, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = searchable_text(article);
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| haystack.contains(&k))
}

/// Order-preserving filter over [`is_technical`].
#[instrument(level = "debug", skip_all, fields(count = articles.len(), keywords = keywords.len()))]
pub fn filter_technical(
    articles: Vec<NormalizedArticle>,
    keywords: &[String],
) -> Vec<NormalizedArticle> {
    if keywords.is_empty() {
        return articles;
    }
    let before = articles.len();
    let kept: Vec<_> = articles
        .into_iter()
        .filter(|a| {
            let keep = is_technical(a, keywords);
            if !keep {
                debug!(url = %a.canonical_url, "Filtered non-technical article");
            }
            keep
        })
        .collect();
    debug!(removed = before - kept.len(), "Content-type filter done");
    kept
}

/// Lowercased `title + " " + summary`.
pub(crate) fn searchable_text(article: &NormalizedArticle) -> String {
    format!(
        "{} {}",
        article.title,
        article.summary_text.as_deref().unwrap_or_default()
    )
    .to_lowercase()
}
