//! Final candidate selection.

use tracing::{debug, instrument};

use crate::models::ScoredArticle;

/// Keep articles scoring at least `min_threshold`, best first, at most
/// `target_count` of them.
///
/// The sort is stable, so equal scores keep their input order.
#[instrument(level = "info", skip_all, fields(count = scored.len(), target_count = target_count, min_threshold = min_threshold))]
pub fn select(
    scored: Vec<ScoredArticle>,
    target_count: usize,
    min_threshold: f64,
) -> Vec<ScoredArticle> {
    let mut qualifying: Vec<ScoredArticle> = scored
        .into_iter()
        .filter(|a| a.score_overall >= min_threshold)
        .collect();
    let qualified = qualifying.len();

    qualifying.sort_by(|a, b| b.score_overall.total_cmp(&a.score_overall));
    qualifying.truncate(target_count);

    debug!(qualified, selected = qualifying.len(), "Selection finished");
    qualifying
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedArticle;
    use chrono::Utc;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn scored(id: usize, score: f64) -> ScoredArticle {
        ScoredArticle {
            article: NormalizedArticle {
                source: "Src".to_string(),
                title: format!("Article {id}"),
                canonical_url: format!("https://example.com/{id}"),
                published_date: None,
                author: None,
                summary_text: None,
            },
            summary: "Summary.".to_string(),
            key_topics: BTreeSet::new(),
            why_it_matters: String::new(),
            suggested_angle: String::new(),
            suggested_hashtags: Vec::new(),
            score_overall: score,
            score_recency: score,
            score_relevance: score,
            collected_at: Utc::now(),
        }
    }

    #[test]
    fn test_threshold_sort_and_truncate() {
        // 15 articles, three of them under the threshold of 20.
        let scores = [55.0, 10.0, 80.0, 25.0, 19.9, 40.0, 90.0, 33.0, 21.0, 5.0, 60.0, 70.0, 45.0, 20.0, 65.0];
        let items: Vec<_> = scores.iter().enumerate().map(|(i, s)| scored(i, *s)).collect();

        let selected = select(items, 10, 20.0);
        assert_eq!(selected.len(), 10);
        let got: Vec<f64> = selected.iter().map(|a| a.score_overall).collect();
        assert_eq!(got, vec![90.0, 80.0, 70.0, 65.0, 60.0, 55.0, 45.0, 40.0, 33.0, 25.0]);
    }

    #[test]
    fn test_fewer_qualifying_than_target() {
        let items = vec![scored(0, 50.0), scored(1, 5.0)];
        let selected = select(items, 10, 20.0);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_threshold_is_inclusive_and_ties_stable() {
        let items = vec![scored(0, 20.0), scored(1, 30.0), scored(2, 20.0)];
        let titles: Vec<String> = select(items, 10, 20.0)
            .into_iter()
            .map(|a| a.article.title)
            .collect();
        assert_eq!(titles, vec!["Article 1", "Article 0", "Article 2"]);
    }

    #[test]
    fn test_zero_target_selects_nothing() {
        assert!(select(vec![scored(0, 99.0)], 0, 0.0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_selection_correct(
            scores in prop::collection::vec(0.0f64..=100.0, 0..30),
            target in 0usize..15,
            threshold in 0.0f64..=100.0,
        ) {
            let items: Vec<_> = scores.iter().enumerate().map(|(i, s)| scored(i, *s)).collect();
            let qualifying = scores.iter().filter(|s| **s >= threshold).count();
            let selected = select(items, target, threshold);

            prop_assert_eq!(selected.len(), target.min(qualifying));
            prop_assert!(selected.iter().all(|a| a.score_overall >= threshold));
            prop_assert!(selected.windows(2).all(|w| w[0].score_overall >= w[1].score_overall));
        }
    }
}
