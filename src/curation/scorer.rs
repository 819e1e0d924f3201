//! Recency and relevance scoring.
//!
//! Both scores live in `[0, 100]`:
//!
//! - **Recency** decays linearly from 100 (published now or in the future) to
//!   0 at the end of the window. Undated articles score 0.
//! - **Relevance** awards [`RELEVANCE_POINTS_PER_KEYWORD`] for every distinct
//!   theme keyword found in the title or summary, saturating at 100.
//!
//! The overall score is the weighted sum of the two.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::config::{CurationSettings, ScoreWeights};
use crate::models::{NormalizedArticle, ThemeKeywords};

/// Points per distinct matched keyword. Five matches saturate the score.
pub const RELEVANCE_POINTS_PER_KEYWORD: f64 = 20.0;

const MAX_SCORE: f64 = 100.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Which themes and keywords matched an article's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMatches {
    pub themes: BTreeSet<String>,
    /// Lowercased, so keywords differing only in case count once.
    pub keywords: BTreeSet<String>,
}

/// Scores for one article, carrying the article.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleScore {
    pub article: NormalizedArticle,
    pub recency: f64,
    pub relevance: f64,
    pub overall: f64,
}

/// Case-insensitive substring search of every theme keyword in `text`.
pub fn match_keywords(text: &str, themes: &ThemeKeywords) -> KeywordMatches {
    let haystack = text.to_lowercase();
    let mut matches = KeywordMatches::default();

    for (theme, keywords) in themes.iter() {
        for keyword in keywords {
            let needle = keyword.trim().to_lowercase();
            if !needle.is_empty() && haystack.contains(&needle) {
                matches.themes.insert(theme.clone());
                matches.keywords.insert(needle);
            }
        }
    }
    matches
}

/// Linear time decay over `window_days`.
///
/// Age is measured in fractional days. Future dates count as age zero.
pub fn recency_score(
    published: Option<DateTime<Utc>>,
    window_days: i64,
    now: DateTime<Utc>,
) -> f64 {
    let Some(published) = published else {
        return 0.0;
    };
    if window_days <= 0 {
        return 0.0;
    }

    let age_days = (now - published).num_milliseconds() as f64 / MILLIS_PER_DAY;
    let window = window_days as f64;
    if age_days <= 0.0 {
        MAX_SCORE
    } else if age_days >= window {
        0.0
    } else {
        (MAX_SCORE * (1.0 - age_days / window)).clamp(0.0, MAX_SCORE)
    }
}

/// Score from the number of distinct keywords matched in title and summary.
pub fn relevance_score(title: &str, summary: Option<&str>, themes: &ThemeKeywords) -> f64 {
    let text = format!("{} {}", title, summary.unwrap_or_default());
    let matched = match_keywords(&text, themes).keywords.len();
    (matched as f64 * RELEVANCE_POINTS_PER_KEYWORD).min(MAX_SCORE)
}

/// Weighted sum of the two component scores, clamped to `[0, 100]`.
pub fn overall_score(recency: f64, relevance: f64, weights: &ScoreWeights) -> f64 {
    (weights.recency * recency + weights.relevance * relevance).clamp(0.0, MAX_SCORE)
}

/// Score a single article.
pub fn score_article(
    article: NormalizedArticle,
    settings: &CurationSettings,
    now: DateTime<Utc>,
) -> ArticleScore {
    let recency = recency_score(article.published_date, settings.recency_window_days, now);
    let relevance = relevance_score(
        &article.title,
        article.summary_text.as_deref(),
        &settings.themes,
    );
    let overall = overall_score(recency, relevance, &settings.weights);

    debug!(
        url = %article.canonical_url,
        recency,
        relevance,
        overall,
        "Scored article"
    );

    ArticleScore {
        article,
        recency,
        relevance,
        overall,
    }
}

/// Score every article, preserving length and order.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub fn score_articles(
    articles: Vec<NormalizedArticle>,
    settings: &CurationSettings,
    now: DateTime<Utc>,
) -> Vec<ArticleScore> {
    articles
        .into_iter()
        .map(|a| score_article(a, settings, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
    }

    fn themes() -> ThemeKeywords {
        let mut map = BTreeMap::new();
        map.insert(
            "identity_and_access".to_string(),
            vec!["IAM".to_string(), "SSO".to_string(), "iam".to_string()],
        );
        map.insert("cloud_security".to_string(), vec!["Zero Trust".to_string()]);
        ThemeKeywords::new(map)
    }

    fn article(title: &str, summary: Option<&str>, date: Option<DateTime<Utc>>) -> NormalizedArticle {
        NormalizedArticle {
            source: "AWS News Blog".to_string(),
            title: title.to_string(),
            canonical_url: "https://example.com/a".to_string(),
            published_date: date,
            author: None,
            summary_text: summary.map(str::to_string),
        }
    }

    #[test]
    fn test_recency_boundaries() {
        let now = now();
        assert_eq!(recency_score(Some(now), 30, now), 100.0);
        assert_eq!(recency_score(Some(now + Duration::days(2)), 30, now), 100.0);
        assert_eq!(recency_score(Some(now - Duration::days(30)), 30, now), 0.0);
        assert_eq!(recency_score(Some(now - Duration::days(45)), 30, now), 0.0);
        assert_eq!(recency_score(None, 30, now), 0.0);
        assert_eq!(recency_score(Some(now), 0, now), 0.0);
    }

    #[test]
    fn test_recency_is_linear() {
        let now = now();
        let score = recency_score(Some(now - Duration::days(15)), 30, now);
        assert!((score - 50.0).abs() < 1e-9);
        let score = recency_score(Some(now - Duration::hours(36)), 30, now);
        assert!((score - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_counts_distinct_keywords() {
        let themes = themes();
        assert_eq!(relevance_score("Nothing here", None, &themes), 0.0);
        // "IAM" and "iam" are the same keyword once lowercased.
        assert_eq!(relevance_score("New IAM feature", None, &themes), 20.0);
        assert_eq!(
            relevance_score("New IAM feature", Some("Adds SSO for Zero Trust"), &themes),
            60.0
        );
    }

    #[test]
    fn test_relevance_saturates() {
        let mut map = BTreeMap::new();
        map.insert(
            "t".to_string(),
            ["a1", "b2", "c3", "d4", "e5", "f6", "g7"].iter().map(|s| s.to_string()).collect(),
        );
        let themes = ThemeKeywords::new(map);
        assert_eq!(relevance_score("a1 b2 c3 d4 e5 f6 g7", None, &themes), 100.0);
    }

    #[test]
    fn test_match_keywords_reports_themes() {
        let matches = match_keywords("AWS announces new IAM feature for Zero Trust", &themes());
        assert_eq!(
            matches.themes,
            BTreeSet::from(["cloud_security".to_string(), "identity_and_access".to_string()])
        );
        assert_eq!(
            matches.keywords,
            BTreeSet::from(["iam".to_string(), "zero trust".to_string()])
        );
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let weights = ScoreWeights {
            recency: 0.4,
            relevance: 0.6,
        };
        assert!((overall_score(50.0, 100.0, &weights) - 80.0).abs() < 1e-9);
        assert_eq!(overall_score(0.0, 0.0, &weights), 0.0);
    }

    #[test]
    fn test_score_articles_preserves_order_and_invariant() {
        let settings = CurationSettings {
            themes: themes(),
            ..Default::default()
        };
        let now = now();
        let items = vec![
            article("IAM update", None, Some(now - Duration::days(3))),
            article("Unrelated", None, None),
        ];
        let scores = score_articles(items, &settings, now);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].article.title, "IAM update");
        for s in &scores {
            let expected = settings.weights.recency * s.recency + settings.weights.relevance * s.relevance;
            assert!((s.overall - expected).abs() < 1e-9);
        }
        assert_eq!(scores[1].overall, 0.0);
    }

    proptest! {
        #[test]
        fn prop_recency_bounded_and_monotonic(a in 0i64..100_000, b in 0i64..100_000, window in 1i64..90) {
            let now = now();
            let (young, old) = if a <= b { (a, b) } else { (b, a) };
            let s_young = recency_score(Some(now - Duration::minutes(young)), window, now);
            let s_old = recency_score(Some(now - Duration::minutes(old)), window, now);
            prop_assert!((0.0..=100.0).contains(&s_young));
            prop_assert!((0.0..=100.0).contains(&s_old));
            prop_assert!(s_young >= s_old);
        }

        #[test]
        fn prop_scores_bounded(title in "[a-zA-Z ]{0,60}", recency in 0.0f64..=100.0, w in 0.0f64..=1.0) {
            let relevance = relevance_score(&title, None, &ThemeKeywords::default());
            prop_assert!((0.0..=100.0).contains(&relevance));
            let weights = ScoreWeights { recency: w, relevance: 1.0 - w };
            let overall = overall_score(recency, relevance, &weights);
            prop_assert!((0.0..=100.0).contains(&overall));
        }
    }
}
