//! LinkedIn post drafting for curated articles.
//!
//! [`PostGenerator`] turns a [`ScoredArticle`] into a [`GeneratedPost`] by
//! building a Hook-Value-CTA prompt ([`prompt`]), asking any [`AskAsync`]
//! backend for a draft, and parsing the tagged reply ([`parse`]).

pub mod parse;
pub mod prompt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{AskAsync, AskError};
use crate::models::ScoredArticle;
use parse::{compose_post, extract_hashtags, parse_response, truncate_post};
use prompt::{HookStyle, PromptBuilder};

/// Articles below this overall score are not worth a post.
pub const MIN_SCORE_THRESHOLD: f64 = 50.0;

/// A drafted post, ready for review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPost {
    /// Hook, value, CTA and hashtags joined by blank lines.
    pub full_text: String,
    pub hook: String,
    pub value: String,
    pub cta: String,
    /// With the leading `#`.
    pub hashtags: Vec<String>,
    pub model_used: String,
    pub generated_at: DateTime<Utc>,
    pub source_url: String,
    pub character_count: usize,
}

/// Outcome of [`PostGenerator::generate_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub successful: Vec<GeneratedPost>,
    /// `(article title, error message)` for each failure.
    pub failed: Vec<(String, String)>,
    /// Articles attempted; skipped low-score articles are not counted.
    pub total_processed: usize,
    /// `successful / total_processed`, 0 when nothing was attempted.
    pub success_rate: f64,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM server unreachable: {0}")]
    Connection(String),
    #[error("model not available: {0}")]
    ModelNotAvailable(String),
    #[error("failed to generate post for '{title}': {message}")]
    Failed { title: String, message: String },
}

impl GenerationError {
    /// Errors that make every further request pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GenerationError::Connection(_) | GenerationError::ModelNotAvailable(_)
        )
    }

    fn from_ask(e: AskError, title: &str) -> Self {
        match e {
            AskError::Connection { .. } => GenerationError::Connection(e.to_string()),
            AskError::ModelNotFound(model) => GenerationError::ModelNotAvailable(model),
            other => GenerationError::Failed {
                title: title.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Drafts posts through an LLM backend.
pub struct PostGenerator<A> {
    api: A,
    prompts: PromptBuilder,
    model: String,
}

impl<A> PostGenerator<A>
where
    A: AskAsync<Response = String>,
{
    /// # Arguments
    ///
    /// * `api` - Backend to ask, usually a [`crate::api::RetryAsk`]
    /// * `model` - Model name recorded on each post
    pub fn new(api: A, model: &str) -> Self {
        Self::with_prompts(api, model, PromptBuilder::default())
    }

    pub fn with_prompts(api: A, model: &str, prompts: PromptBuilder) -> Self {
        Self {
            api,
            prompts,
            model: model.to_string(),
        }
    }

    /// Draft one post with a randomly weighted hook style.
    pub async fn generate(&self, article: &ScoredArticle) -> Result<GeneratedPost, GenerationError> {
        let style = HookStyle::pick(&mut rand::rng());
        self.generate_with_style(article, style).await
    }

    /// Draft one post with the given hook style.
    #[instrument(level = "info", skip_all, fields(title = %article.article.title, style = style.label()))]
    pub async fn generate_with_style(
        &self,
        article: &ScoredArticle,
        style: HookStyle,
    ) -> Result<GeneratedPost, GenerationError> {
        let title = &article.article.title;
        let prompt = self.prompts.build(article, style);
        let response = self
            .api
            .ask(&prompt, self.prompts.system_prompt())
            .await
            .map_err(|e| GenerationError::from_ask(e, title))?;

        let sections = parse_response(&response);
        if sections.hook.is_empty() && sections.value.is_empty() && sections.cta.is_empty() {
            return Err(GenerationError::Failed {
                title: title.clone(),
                message: "empty response from model".to_string(),
            });
        }
        let hashtags = extract_hashtags(&response);
        let full_text = truncate_post(&compose_post(&sections, &hashtags), &hashtags);
        let character_count = full_text.chars().count();
        debug!(character_count, hashtags = ?hashtags, "Post drafted");

        Ok(GeneratedPost {
            full_text,
            hook: sections.hook,
            value: sections.value,
            cta: sections.cta,
            hashtags,
            model_used: self.model.clone(),
            generated_at: Utc::now(),
            source_url: article.article.canonical_url.clone(),
            character_count,
        })
    }

    /// Draft posts for every article scoring at least [`MIN_SCORE_THRESHOLD`].
    ///
    /// Per-article failures are collected; connection and model errors abort
    /// the batch.
    #[instrument(level = "info", skip_all, fields(articles = articles.len()))]
    pub async fn generate_batch(
        &self,
        articles: &[ScoredArticle],
    ) -> Result<BatchResult, GenerationError> {
        let (eligible, skipped): (Vec<&ScoredArticle>, Vec<&ScoredArticle>) = articles
            .iter()
            .partition(|a| a.score_overall >= MIN_SCORE_THRESHOLD);

        if !skipped.is_empty() {
            info!(
                skipped = skipped.len(),
                threshold = MIN_SCORE_THRESHOLD,
                "Skipping low-score articles"
            );
            for article in &skipped {
                debug!(title = %article.article.title, score = article.score_overall, "Skipped");
            }
        }

        let total = eligible.len();
        let mut result = BatchResult::default();
        for (index, article) in eligible.into_iter().enumerate() {
            let title = &article.article.title;
            info!(index = index + 1, total, title = %title, "Generating post");
            match self.generate(article).await {
                Ok(post) => result.successful.push(post),
                Err(e) if e.is_fatal() => {
                    error!(index = index + 1, total, error = %e, "Aborting batch");
                    return Err(e);
                }
                Err(e) => {
                    warn!(title = %title, error = %e, "Post generation failed");
                    result.failed.push((title.clone(), e.to_string()));
                }
            }
        }

        result.total_processed = result.successful.len() + result.failed.len();
        result.success_rate = if result.total_processed == 0 {
            0.0
        } else {
            result.successful.len() as f64 / result.total_processed as f64
        };
        info!(
            successful = result.successful.len(),
            failed = result.failed.len(),
            success_rate = result.success_rate,
            "Batch generation complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedArticle;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    const REPLY: &str = "[HOOK]Identity is the new perimeter.[/HOOK]\n[VALUE]IAM gained X.[/VALUE]\n[CTA]How are you adapting?[/CTA]\n[HASHTAGS]#IAM #ZeroTrust #Cloud[/HASHTAGS]";

    struct FakeAsk {
        replies: Mutex<Vec<Result<String, AskError>>>,
    }

    impl FakeAsk {
        fn new(mut replies: Vec<Result<String, AskError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
            }
        }
    }

    impl AskAsync for FakeAsk {
        type Response = String;

        async fn ask(&self, _prompt: &str, _system: &str) -> Result<String, AskError> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(AskError::Decode("no reply".to_string())))
        }
    }

    fn article(title: &str, score: f64) -> ScoredArticle {
        ScoredArticle {
            article: NormalizedArticle {
                source: "AWS News Blog".to_string(),
                title: title.to_string(),
                canonical_url: format!("https://example.com/{}", title.len()),
                published_date: None,
                author: None,
                summary_text: None,
            },
            summary: "Summary.".to_string(),
            key_topics: BTreeSet::from(["identity_and_access".to_string()]),
            why_it_matters: "It matters.".to_string(),
            suggested_angle: "Angle.".to_string(),
            suggested_hashtags: vec!["IAM".to_string()],
            score_overall: score,
            score_recency: score,
            score_relevance: score,
            collected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_generate_parses_sections() {
        let generator = PostGenerator::new(FakeAsk::new(vec![Ok(REPLY.to_string())]), "llama4:scout");
        let post = generator
            .generate_with_style(&article("IAM update", 80.0), HookStyle::Contrarian)
            .await
            .unwrap();
        assert_eq!(post.hook, "Identity is the new perimeter.");
        assert_eq!(post.cta, "How are you adapting?");
        assert_eq!(post.hashtags, vec!["#IAM", "#ZeroTrust", "#Cloud"]);
        assert_eq!(
            post.full_text,
            "Identity is the new perimeter.\n\nIAM gained X.\n\nHow are you adapting?\n\n#IAM #ZeroTrust #Cloud"
        );
        assert_eq!(post.character_count, post.full_text.chars().count());
        assert_eq!(post.model_used, "llama4:scout");
    }

    #[tokio::test]
    async fn test_batch_skips_low_scores_and_collects_failures() {
        let api = FakeAsk::new(vec![
            Ok(REPLY.to_string()),
            Err(AskError::Timeout),
        ]);
        let generator = PostGenerator::new(api, "m");
        let articles = vec![
            article("first", 90.0),
            article("low", 10.0),
            article("second", 50.0),
        ];
        let result = generator.generate_batch(&articles).await.unwrap();
        assert_eq!(result.successful.len(), 1);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].0, "second");
        assert_eq!(result.total_processed, 2);
        assert_eq!(result.success_rate, 0.5);
    }

    #[tokio::test]
    async fn test_batch_aborts_on_connection_error() {
        let api = FakeAsk::new(vec![
            Err(AskError::Connection {
                url: "http://localhost:11434".to_string(),
                message: "refused".to_string(),
            }),
            Ok(REPLY.to_string()),
        ]);
        let generator = PostGenerator::new(api, "m");
        let err = generator
            .generate_batch(&[article("a", 90.0), article("b", 90.0)])
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, GenerationError::Connection(_)));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let generator = PostGenerator::new(FakeAsk::new(vec![]), "m");
        let result = generator.generate_batch(&[article("low", 1.0)]).await.unwrap();
        assert_eq!(result.total_processed, 0);
        assert_eq!(result.success_rate, 0.0);
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let e = GenerationError::from_ask(AskError::ModelNotFound("x".to_string()), "t");
        assert!(e.is_fatal());
        let e = GenerationError::from_ask(AskError::Timeout, "t");
        assert!(!e.is_fatal());
    }
}
