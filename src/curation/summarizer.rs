//! Post metadata for selected candidates: summary, key topics, why it matters,
//! a suggested LinkedIn angle, and hashtags.
//!
//! Everything here is template-driven and deterministic. A "sentence" ends at
//! a `.`, `!` or `?` followed by whitespace or the end of the text.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::filter::searchable_text;
use super::scorer::{ArticleScore, match_keywords};
use crate::models::{NormalizedArticle, ScoredArticle, ThemeKeywords};
use crate::utils::pascal_case;

const MAX_SUMMARY_SENTENCES: usize = 3;

/// Themes mentioned in an article, per [`match_keywords`].
pub fn extract_key_topics(article: &NormalizedArticle, themes: &ThemeKeywords) -> BTreeSet<String> {
    match_keywords(&searchable_text(article), themes).themes
}

/// First one to three sentences of the article text, or a sentence built
/// from the title when there is no usable text.
pub fn generate_summary(article: &NormalizedArticle) -> String {
    let sentences = article
        .summary_text
        .as_deref()
        .map(split_sentences)
        .unwrap_or_default();

    if sentences.is_empty() {
        return title_sentence(article);
    }

    let mut summary = sentences
        .into_iter()
        .take(MAX_SUMMARY_SENTENCES)
        .collect::<Vec<_>>()
        .join(" ");
    if !summary.ends_with(['.', '!', '?']) {
        summary.push('.');
    }
    summary
}

fn title_sentence(article: &NormalizedArticle) -> String {
    let title = as_clause(&article.title);
    if title.is_empty() {
        format!("New post from {}.", as_clause(&article.source))
    } else {
        format!("{title}.")
    }
}

/// Two sentences framing the article in security-outcome terms.
///
/// The framing follows the first topic in theme-name order; without topics
/// the text refers only to the source.
pub fn generate_why_it_matters(article: &NormalizedArticle, topics: &BTreeSet<String>) -> String {
    match topics.iter().next() {
        Some(primary) => format!(
            "{} {}. Security teams should evaluate this for their environment.",
            as_clause(&article.title),
            topic_framing(primary)
        ),
        None => format!(
            "This update from {} may impact your cloud security strategy. Review for potential benefits.",
            as_clause(&article.source)
        ),
    }
}

fn topic_framing(theme: &str) -> &'static str {
    match theme {
        "cloud_security" => "strengthens your cloud security posture",
        "identity_and_access" => "improves identity and access controls",
        "governance_and_compliance" => "supports governance and compliance requirements",
        "data_protection" => "enhances data protection capabilities",
        "auditing_and_retention" => "improves audit and monitoring capabilities",
        "devsecops" => "enables security automation in your DevOps pipeline",
        _ => "helps organizations improve their security posture",
    }
}

/// A single-sentence LinkedIn angle, picked from three templates by the
/// character count of the title without its trailing `.`, `!` or `?`.
pub fn generate_angle(article: &NormalizedArticle) -> String {
    let title = as_clause(&article.title);
    let stem = article.title.trim_end_matches(['.', '!', '?']);
    match stem.chars().count() % 3 {
        0 => format!(
            "Share how {title} from {} can benefit your organization's security strategy.",
            as_clause(&article.source)
        ),
        1 => format!("Discuss the practical implications of {title} for enterprise security teams."),
        _ => format!("Highlight key takeaways from {title} that security leaders should know."),
    }
}

/// Hashtags (without `#`) for the given topics.
///
/// Known themes have three curated tags; any other theme becomes its
/// PascalCase name. Duplicates are dropped, first occurrence wins.
pub fn generate_hashtags(topics: &BTreeSet<String>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for topic in topics {
        let mapped: Vec<String> = match theme_hashtags(topic) {
            Some(known) => known.iter().map(|t| t.to_string()).collect(),
            None => vec![unknown_theme_tag(topic)],
        };
        for tag in mapped {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

fn theme_hashtags(theme: &str) -> Option<[&'static str; 3]> {
    let tags = match theme {
        "cloud_security" => ["CloudSecurity", "CyberSecurity", "InfoSec"],
        "identity_and_access" => ["IAM", "IdentityManagement", "ZeroTrust"],
        "governance_and_compliance" => ["Compliance", "GRC", "RiskManagement"],
        "data_protection" => ["DataProtection", "DataSecurity", "DLP"],
        "auditing_and_retention" => ["Audit", "SecurityMonitoring", "Logging"],
        "devsecops" => ["DevSecOps", "SecurityAutomation", "ShiftLeft"],
        _ => return None,
    };
    Some(tags)
}

fn unknown_theme_tag(theme: &str) -> String {
    let tag = pascal_case(theme);
    if tag.is_empty() {
        theme.split_whitespace().collect()
    } else {
        tag
    }
}

/// Attach summary, topics, framing, angle and hashtags to a scored article.
pub fn enrich(
    score: ArticleScore,
    themes: &ThemeKeywords,
    collected_at: DateTime<Utc>,
) -> ScoredArticle {
    let ArticleScore {
        article,
        recency,
        relevance,
        overall,
    } = score;
    let key_topics = extract_key_topics(&article, themes);

    ScoredArticle {
        summary: generate_summary(&article),
        why_it_matters: generate_why_it_matters(&article, &key_topics),
        suggested_angle: generate_angle(&article),
        suggested_hashtags: generate_hashtags(&key_topics),
        key_topics,
        score_overall: overall,
        score_recency: recency,
        score_relevance: relevance,
        collected_at,
        article,
    }
}

/// Split text into trimmed sentences. A trailing fragment without terminal
/// punctuation is kept as its own sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|next| next.is_whitespace());
        if at_boundary {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);
    sentences
}

fn push_trimmed(out: &mut Vec<String>, s: &str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s.to_string());
    }
}

/// Text rendered as a clause with no sentence boundaries of its own, for
/// embedding into a template sentence.
fn as_clause(text: &str) -> String {
    split_sentences(text)
        .iter()
        .map(|s| s.trim_end_matches(['.', '!', '?']).trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Number of sentence-terminal marks in `text`.
#[cfg(test)]
fn count_sentence_marks(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            matches!(c, '.' | '!' | '?') && chars.get(i + 1).is_none_or(|n| n.is_whitespace())
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn article(title: &str, summary: Option<&str>) -> NormalizedArticle {
        NormalizedArticle {
            source: "AWS News Blog".to_string(),
            title: title.to_string(),
            canonical_url: "https://example.com/post".to_string(),
            published_date: None,
            author: None,
            summary_text: summary.map(str::to_string),
        }
    }

    fn topics(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_topics_for_iam_and_zero_trust() {
        let mut map = BTreeMap::new();
        map.insert("identity_and_access".to_string(), vec!["IAM".to_string()]);
        map.insert("cloud_security".to_string(), vec!["Zero Trust".to_string()]);
        let themes = ThemeKeywords::new(map);

        let a = article("AWS announces new IAM feature for Zero Trust", None);
        assert_eq!(
            extract_key_topics(&a, &themes),
            topics(&["cloud_security", "identity_and_access"])
        );
    }

    #[test]
    fn test_summary_takes_first_three_sentences() {
        let a = article("T", Some("One. Two! Three? Four. Five."));
        assert_eq!(generate_summary(&a), "One. Two! Three?");
    }

    #[test]
    fn test_summary_terminates_fragment() {
        let a = article("T", Some("A single fragment without a stop"));
        assert_eq!(generate_summary(&a), "A single fragment without a stop.");
    }

    #[test]
    fn test_summary_ignores_inner_dots() {
        let a = article("T", Some("Amazon S3.Express is faster. Version 1.2 ships today."));
        let summary = generate_summary(&a);
        assert_eq!(summary, "Amazon S3.Express is faster. Version 1.2 ships today.");
        assert_eq!(count_sentence_marks(&summary), 2);
    }

    #[test]
    fn test_summary_falls_back_to_title() {
        assert_eq!(generate_summary(&article("New IAM feature", None)), "New IAM feature.");
        assert_eq!(
            generate_summary(&article("Is it here? Yes!", Some("   "))),
            "Is it here; Yes."
        );
        assert_eq!(generate_summary(&article("...", None)), "New post from AWS News Blog.");
    }

    #[test]
    fn test_why_it_matters_uses_primary_topic() {
        let a = article("New IAM feature", None);
        let text = generate_why_it_matters(&a, &topics(&["identity_and_access"]));
        assert_eq!(
            text,
            "New IAM feature improves identity and access controls. Security teams should evaluate this for their environment."
        );
        assert_eq!(count_sentence_marks(&text), 2);
    }

    #[test]
    fn test_why_it_matters_without_topics_mentions_only_source() {
        let a = article("Quarterly roundup", None);
        let text = generate_why_it_matters(&a, &BTreeSet::new());
        assert!(text.contains("AWS News Blog"));
        assert!(!text.contains("Quarterly roundup"));
        assert_eq!(count_sentence_marks(&text), 2);
    }

    #[test]
    fn test_angle_template_by_title_length() {
        // 3, 4 and 5 characters
        assert!(generate_angle(&article("abc", None)).starts_with("Share how abc from AWS News Blog"));
        assert!(generate_angle(&article("abcd", None)).starts_with("Discuss the practical implications"));
        assert!(generate_angle(&article("abcde", None)).starts_with("Highlight key takeaways"));
    }

    #[test]
    fn test_angle_ignores_trailing_punctuation() {
        // "abc" with any trailing marks still counts as 3 characters
        assert!(generate_angle(&article("abc.", None)).starts_with("Share how abc from"));
        assert!(generate_angle(&article("abc?!", None)).starts_with("Share how abc from"));
        assert!(generate_angle(&article("abcd!", None)).starts_with("Discuss the practical implications"));
    }

    #[test]
    fn test_angle_is_one_sentence_even_with_punctuated_title() {
        let angle = generate_angle(&article("Breaking! New feature. Try it?", None));
        assert_eq!(count_sentence_marks(&angle), 1);
    }

    #[test]
    fn test_hashtags_known_unknown_and_empty() {
        assert_eq!(
            generate_hashtags(&topics(&["identity_and_access"])),
            vec!["IAM", "IdentityManagement", "ZeroTrust"]
        );
        assert_eq!(generate_hashtags(&topics(&["zero_day_response"])), vec!["ZeroDayResponse"]);
        assert!(generate_hashtags(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_hashtags_deduplicated() {
        let tags = generate_hashtags(&topics(&["IAM", "identity_and_access"]));
        assert_eq!(tags, vec!["IAM", "IdentityManagement", "ZeroTrust"]);
    }

    #[test]
    fn test_enrich_carries_scores() {
        let score = ArticleScore {
            article: article("New IAM feature", Some("Adds IAM roles.")),
            recency: 50.0,
            relevance: 20.0,
            overall: 32.0,
        };
        let collected = Utc::now();
        let scored = enrich(score, &ThemeKeywords::default(), collected);
        assert_eq!(scored.summary, "Adds IAM roles.");
        assert_eq!(scored.key_topics, topics(&["identity_and_access"]));
        assert_eq!(scored.suggested_hashtags.len(), 3);
        assert_eq!(scored.score_overall, 32.0);
        assert_eq!(scored.collected_at, collected);
    }

    proptest! {
        #[test]
        fn prop_summary_has_one_to_three_sentences(
            title in "[a-zA-Z .!?]{1,40}",
            summary in prop::option::of("[a-zA-Z .!?\n]{0,200}"),
        ) {
            let a = article(&title, summary.as_deref());
            let marks = count_sentence_marks(&generate_summary(&a));
            prop_assert!((1..=3).contains(&marks));
        }

        #[test]
        fn prop_angle_is_exactly_one_sentence(title in "[a-zA-Z .!?]{1,40}") {
            let angle = generate_angle(&article(&title, None));
            prop_assert_eq!(count_sentence_marks(&angle), 1);
        }
    }
}
