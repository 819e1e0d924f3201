//! Duplicate removal.
//!
//! Two passes: first by canonical URL, then by normalized title (the same post
//! syndicated under two URLs). Within a group the earliest-published article
//! survives. Dated beats undated, and ties go to whichever came first. The
//! survivor takes the position of its group's first member, so output order
//! follows input order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::text::normalize_title;
use crate::models::NormalizedArticle;

/// Output of [`deduplicate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupResult {
    pub articles: Vec<NormalizedArticle>,
    pub removed_count: usize,
    pub removed_by_url: usize,
    pub removed_by_title: usize,
}

/// Remove duplicates by canonical URL, then by normalized title.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub fn deduplicate(articles: Vec<NormalizedArticle>) -> DedupResult {
    let before = articles.len();

    let by_url = dedup_by_key(articles, |a| a.canonical_url.clone());
    let removed_by_url = before - by_url.len();

    let after_url = by_url.len();
    let by_title = dedup_by_key(by_url, |a| normalize_title(&a.title));
    let removed_by_title = after_url - by_title.len();

    debug!(removed_by_url, removed_by_title, kept = by_title.len(), "Deduplication finished");

    DedupResult {
        removed_count: removed_by_url + removed_by_title,
        removed_by_url,
        removed_by_title,
        articles: by_title,
    }
}

/// Collapse groups sharing `key` to one survivor each.
fn dedup_by_key<F>(articles: Vec<NormalizedArticle>, key: F) -> Vec<NormalizedArticle>
where
    F: Fn(&NormalizedArticle) -> String,
{
    // key -> slot in `survivors`
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut survivors: Vec<NormalizedArticle> = Vec::with_capacity(articles.len());

    for article in articles {
        match slots.get(&key(&article)) {
            Some(&slot) => {
                if published_earlier(article.published_date, survivors[slot].published_date) {
                    survivors[slot] = article;
                }
            }
            None => {
                slots.insert(key(&article), survivors.len());
                survivors.push(article);
            }
        }
    }
    survivors
}

/// Strictly earlier; an undated candidate never displaces anything.
fn published_earlier(candidate: Option<DateTime<Utc>>, current: Option<DateTime<Utc>>) -> bool {
    match (candidate, current) {
        (Some(c), Some(k)) => c < k,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn article(title: &str, url: &str, date: Option<(i32, u32, u32)>) -> NormalizedArticle {
        NormalizedArticle {
            source: "Src".to_string(),
            title: title.to_string(),
            canonical_url: url.to_string(),
            published_date: date.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()),
            author: None,
            summary_text: None,
        }
    }

    #[test]
    fn test_same_url_keeps_earliest() {
        let items = vec![
            article("Later title", "https://example.com/post", Some((2024, 1, 5))),
            article("Earlier title", "https://example.com/post", Some((2024, 1, 1))),
        ];
        let result = deduplicate(items);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].title, "Earlier title");
        assert_eq!(result.removed_by_url, 1);
        assert_eq!(result.removed_by_title, 0);
        assert_eq!(result.removed_count, 1);
    }

    #[test]
    fn test_same_title_different_url() {
        let items = vec![
            article("New IAM Feature", "https://a.com/1", Some((2024, 1, 5))),
            article("  new iam   feature", "https://b.com/2", Some((2024, 1, 2))),
        ];
        let result = deduplicate(items);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].canonical_url, "https://b.com/2");
        assert_eq!(result.removed_by_title, 1);
    }

    #[test]
    fn test_dated_beats_undated_and_ties_keep_first() {
        let items = vec![
            article("Undated", "https://x.com/a", None),
            article("Dated", "https://x.com/a", Some((2024, 3, 1))),
        ];
        assert_eq!(deduplicate(items).articles[0].title, "Dated");

        let items = vec![
            article("First", "https://x.com/a", None),
            article("Second", "https://x.com/a", None),
        ];
        assert_eq!(deduplicate(items).articles[0].title, "First");

        let items = vec![
            article("First", "https://x.com/a", Some((2024, 3, 1))),
            article("Second", "https://x.com/a", Some((2024, 3, 1))),
        ];
        assert_eq!(deduplicate(items).articles[0].title, "First");
    }

    #[test]
    fn test_survivor_keeps_first_member_position() {
        let items = vec![
            article("A", "https://x.com/a", Some((2024, 1, 9))),
            article("B", "https://x.com/b", None),
            article("A again", "https://x.com/a", Some((2024, 1, 1))),
        ];
        let titles: Vec<String> = deduplicate(items).articles.into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["A again", "B"]);
    }

    #[test]
    fn test_empty_input() {
        let result = deduplicate(vec![]);
        assert!(result.articles.is_empty());
        assert_eq!(result.removed_count, 0);
    }

    fn arb_article() -> impl Strategy<Value = NormalizedArticle> {
        (0u8..6, 0u8..6, prop::option::of(1u32..28)).prop_map(|(u, t, day)| {
            article(
                &format!("Title {t}"),
                &format!("https://example.com/{u}"),
                day.map(|d| (2024, 1, d)),
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_dedup_unique_keys_and_counts(items in prop::collection::vec(arb_article(), 0..20)) {
            let n = items.len();
            let result = deduplicate(items);

            let urls: HashSet<_> = result.articles.iter().map(|a| a.canonical_url.clone()).collect();
            let titles: HashSet<_> = result.articles.iter().map(|a| normalize_title(&a.title)).collect();
            prop_assert_eq!(urls.len(), result.articles.len());
            prop_assert_eq!(titles.len(), result.articles.len());
            prop_assert_eq!(result.removed_count, result.removed_by_url + result.removed_by_title);
            prop_assert_eq!(result.removed_count, n - result.articles.len());
        }
    }
}
