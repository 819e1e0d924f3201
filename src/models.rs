//! Data models for blog articles as they move through the curation pipeline.
//!
//! This module defines the records exchanged between pipeline stages:
//! - [`RawArticle`]: An article as scraped from a source, before any cleanup
//! - [`NormalizedArticle`]: A cleaned article with a canonical URL and parsed date
//! - [`ScoredArticle`]: A selected article enriched with scores and post metadata
//! - [`ThemeKeywords`]: The theme → keyword mapping used for relevance scoring
//!
//! Records are never mutated once built; each stage produces new values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An article as fetched from a source, before normalization.
///
/// Fetchers guarantee a source identifier. Everything else may be missing;
/// the normalizer decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArticle {
    /// Source identifier, e.g. `"AWS News Blog"`.
    pub source: String,
    /// Title as scraped.
    pub title: Option<String>,
    /// URL as scraped, possibly carrying tracking parameters.
    pub url: Option<String>,
    /// Publication date in whatever format the source renders.
    pub published_date: Option<String>,
    /// Author name if the source exposes one.
    pub author: Option<String>,
    /// Teaser or first paragraph.
    pub teaser: Option<String>,
}

impl RawArticle {
    /// Convenience constructor for the two fields every usable record needs.
    #[cfg(test)]
    pub fn new(source: &str, title: &str, url: &str) -> Self {
        Self {
            source: source.to_string(),
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            ..Default::default()
        }
    }
}

/// An article after normalization.
///
/// The canonical URL never carries known tracking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedArticle {
    pub source: String,
    /// Display title: NFC, trimmed, whitespace collapsed. Case is kept.
    pub title: String,
    pub canonical_url: String,
    pub published_date: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub summary_text: Option<String>,
}

/// A selected article with scores and generated post metadata.
///
/// `score_overall` is always `w_recency * score_recency + w_relevance * score_relevance`
/// for the weights the run was configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    /// The article this record was enriched from.
    pub article: NormalizedArticle,
    /// One to three sentences.
    pub summary: String,
    /// Names of the themes that matched.
    pub key_topics: BTreeSet<String>,
    pub why_it_matters: String,
    /// Exactly one sentence.
    pub suggested_angle: String,
    /// Hashtags without the leading `#`.
    pub suggested_hashtags: Vec<String>,
    pub score_overall: f64,
    pub score_recency: f64,
    pub score_relevance: f64,
    pub collected_at: DateTime<Utc>,
}

/// Theme name → keywords/phrases.
///
/// Loaded once per run and passed explicitly to every stage that needs it.
/// Iteration order is the theme name order, which keeps topic and hashtag
/// output deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeKeywords(BTreeMap<String, Vec<String>>);

impl ThemeKeywords {
    #[cfg(test)]
    pub fn new(themes: BTreeMap<String, Vec<String>>) -> Self {
        Self(themes)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Themes whose keyword list is empty (a configuration error).
    pub fn empty_themes(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, kws)| kws.iter().all(|k| k.trim().is_empty()))
            .map(|(theme, _)| theme.as_str())
            .collect()
    }
}

impl Default for ThemeKeywords {
    fn default() -> Self {
        let themes: [(&str, &[&str]); 6] = [
            (
                "cloud_security",
                &[
                    "cloud security",
                    "security posture",
                    "threat detection",
                    "vulnerability",
                    "security monitoring",
                    "zero trust",
                    "encryption",
                    "security best practices",
                ],
            ),
            (
                "identity_and_access",
                &[
                    "identity",
                    "access management",
                    "IAM",
                    "authentication",
                    "authorization",
                    "SSO",
                    "single sign-on",
                    "MFA",
                    "multi-factor",
                    "privileged access",
                    "role-based access",
                    "RBAC",
                ],
            ),
            (
                "governance_and_compliance",
                &[
                    "governance",
                    "compliance",
                    "regulatory",
                    "audit",
                    "policy",
                    "GDPR",
                    "HIPAA",
                    "SOC 2",
                    "PCI DSS",
                    "FedRAMP",
                    "risk management",
                ],
            ),
            (
                "data_protection",
                &[
                    "data protection",
                    "data security",
                    "data governance",
                    "DLP",
                    "data loss prevention",
                    "data classification",
                    "sensitive data",
                    "PII",
                    "encryption at rest",
                    "encryption in transit",
                ],
            ),
            (
                "auditing_and_retention",
                &[
                    "auditing",
                    "audit log",
                    "retention",
                    "data retention",
                    "logging",
                    "monitoring",
                    "trail",
                    "forensics",
                ],
            ),
            (
                "devsecops",
                &[
                    "DevSecOps",
                    "automation",
                    "policy-as-code",
                    "infrastructure as code",
                    "IaC",
                    "CI/CD security",
                    "shift left",
                    "security automation",
                    "SAST",
                    "DAST",
                ],
            ),
        ];

        Self(
            themes
                .iter()
                .map(|(theme, kws)| {
                    (
                        theme.to_string(),
                        kws.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}
