//! LLM API interaction with exponential backoff retry logic.
//!
//! This module provides the interface for drafting posts with a local Ollama
//! server. It includes automatic retry logic with exponential backoff and
//! jitter to handle transient failures gracefully.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`OllamaAsk`]: Talks to Ollama's `/api/chat` endpoint
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//! - A missing model is never retried

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::retry::Backoff;
use crate::utils::truncate_for_log;

/// Failure talking to the LLM.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("cannot connect to LLM server at {url}: {message}")]
    Connection { url: String, message: String },
    #[error("model '{0}' is not available")]
    ModelNotFound(String),
    #[error("LLM request timed out")]
    Timeout,
    #[error("LLM server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unexpected LLM response: {0}")]
    Decode(String),
}

impl AskError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AskError::Connection { .. } | AskError::Timeout => true,
            AskError::Http { status, .. } => *status == 429 || *status >= 500,
            AskError::ModelNotFound(_) | AskError::Decode(_) => false,
        }
    }
}

/// Trait for async LLM interaction.
///
/// Implementors of this trait can send a prompt to an LLM and receive a response.
/// This abstraction allows for different LLM backends or decorators (like retry logic).
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send a prompt to the LLM and receive a response.
    ///
    /// # Arguments
    ///
    /// * `prompt` - The user message
    /// * `system` - The system prompt framing the conversation
    async fn ask(&self, prompt: &str, system: &str) -> Result<Self::Response, AskError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    backoff: Backoff,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Wrap `inner` with the standard LLM schedule (see [`Backoff::for_llm`]).
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = OllamaAsk::new(&settings.ollama)?;
    /// let retry_client = RetryAsk::new(client);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::with_backoff(inner, Backoff::for_llm())
    }

    pub fn with_backoff(inner: T, backoff: Backoff) -> Self {
        Self { inner, backoff }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.backoff.max_retries)
            .field("base_delay", &self.backoff.base_delay)
            .field("max_delay", &self.backoff.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, prompt: &str, system: &str) -> Result<Self::Response, AskError> {
        self.backoff
            .retry("ask", || self.inner.ask(prompt, system), AskError::is_retryable)
            .await
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    num_ctx: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Ollama chat client.
#[derive(Debug, Clone)]
pub struct OllamaAsk {
    client: Client,
    base_url: String,
    model: String,
    num_ctx: u32,
}

impl OllamaAsk {
    pub fn new(
        base_url: &str,
        model: &str,
        timeout: StdDuration,
        num_ctx: u32,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            num_ctx,
        })
    }

    /// Names of the models the server has pulled.
    #[instrument(level = "info", skip_all, fields(base_url = %self.base_url))]
    pub async fn list_models(&self) -> Result<Vec<String>, AskError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        if !status.is_success() {
            return Err(AskError::Http {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }
        parse_tags(&body)
    }

    /// Fail early if the configured model is not pulled.
    pub async fn ensure_model(&self) -> Result<(), AskError> {
        let models = self.list_models().await?;
        if model_available(&models, &self.model) {
            info!(model = %self.model, "Model available");
            Ok(())
        } else {
            warn!(model = %self.model, available = ?models, "Model not found");
            Err(AskError::ModelNotFound(self.model.clone()))
        }
    }

    fn map_transport(&self, e: reqwest::Error) -> AskError {
        if e.is_timeout() {
            AskError::Timeout
        } else if e.is_connect() || e.is_request() {
            AskError::Connection {
                url: self.base_url.clone(),
                message: e.to_string(),
            }
        } else {
            AskError::Decode(e.to_string())
        }
    }
}

impl AskAsync for OllamaAsk {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, prompt: &str, system: &str) -> Result<Self::Response, AskError> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            options: ChatOptions {
                num_ctx: self.num_ctx,
            },
        };

        let url = format!("{}/api/chat", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        let dt = t0.elapsed();

        if status == StatusCode::NOT_FOUND {
            return Err(AskError::ModelNotFound(self.model.clone()));
        }
        if !status.is_success() {
            warn!(elapsed_ms = dt.as_millis(), status = status.as_u16(), "API call failed");
            return Err(AskError::Http {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        debug!(
            elapsed_ms = dt.as_millis(),
            response_preview = %truncate_for_log(&body, 200),
            "API call succeeded"
        );
        parse_chat(&body)
    }
}

fn parse_chat(body: &str) -> Result<String, AskError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| AskError::Decode(e.to_string()))?;
    let content = parsed.message.map(|m| m.content).unwrap_or_default();
    if content.trim().is_empty() {
        return Err(AskError::Decode("empty message content".to_string()));
    }
    Ok(content)
}

fn parse_tags(body: &str) -> Result<Vec<String>, AskError> {
    let parsed: TagsResponse =
        serde_json::from_str(body).map_err(|e| AskError::Decode(e.to_string()))?;
    Ok(parsed.models.into_iter().map(|m| m.name).collect())
}

/// `llama4:scout` matches itself; a bare `llama4` matches `llama4:latest`.
pub fn model_available(models: &[String], wanted: &str) -> bool {
    models.iter().any(|m| {
        m == wanted || (!wanted.contains(':') && m.split(':').next() == Some(wanted))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct ScriptedAsk {
        replies: Mutex<Vec<Result<String, AskError>>>,
    }

    impl ScriptedAsk {
        fn new(mut replies: Vec<Result<String, AskError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
            }
        }

        fn remaining(&self) -> usize {
            self.replies.lock().unwrap().len()
        }
    }

    impl AskAsync for ScriptedAsk {
        type Response = String;

        async fn ask(&self, _prompt: &str, _system: &str) -> Result<String, AskError> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(AskError::Decode("script exhausted".to_string())))
        }
    }

    fn quick() -> Backoff {
        Backoff {
            max_retries: 3,
            base_delay: StdDuration::from_millis(1),
            max_delay: StdDuration::from_millis(1),
            max_jitter: StdDuration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_retry_ask_recovers_from_transient_errors() {
        let inner = ScriptedAsk::new(vec![
            Err(AskError::Timeout),
            Err(AskError::Http {
                status: 503,
                body: String::new(),
            }),
            Ok("post".to_string()),
        ]);
        let api = RetryAsk::with_backoff(inner, quick());
        assert_eq!(api.ask("p", "s").await.unwrap(), "post");
        assert_eq!(api.inner().remaining(), 0);
    }

    #[tokio::test]
    async fn test_retry_ask_does_not_retry_missing_model() {
        let inner = ScriptedAsk::new(vec![
            Err(AskError::ModelNotFound("llama4:scout".to_string())),
            Ok("never".to_string()),
        ]);
        let api = RetryAsk::with_backoff(inner, quick());
        assert!(matches!(api.ask("p", "s").await, Err(AskError::ModelNotFound(_))));
        assert_eq!(api.inner().remaining(), 1);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AskError::Timeout.is_retryable());
        assert!(AskError::Http { status: 429, body: String::new() }.is_retryable());
        assert!(!AskError::Http { status: 400, body: String::new() }.is_retryable());
        assert!(!AskError::Decode("x".to_string()).is_retryable());
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "llama4:scout",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            stream: false,
            options: ChatOptions { num_ctx: 16384 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_ctx"], 16384);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"model":"llama4:scout","message":{"role":"assistant","content":"[HOOK] Hi"},"done":true}"#;
        assert_eq!(parse_chat(body).unwrap(), "[HOOK] Hi");
        assert!(parse_chat(r#"{"message":{"role":"assistant","content":"  "}}"#).is_err());
        assert!(parse_chat("not json").is_err());
    }

    #[test]
    fn test_parse_tags_and_model_matching() {
        let body = r#"{"models":[{"name":"llama4:scout","size":1},{"name":"mistral:latest"}]}"#;
        let models = parse_tags(body).unwrap();
        assert_eq!(models, vec!["llama4:scout", "mistral:latest"]);
        assert!(model_available(&models, "llama4:scout"));
        assert!(model_available(&models, "mistral"));
        assert!(!model_available(&models, "llama4:maverick"));
    }
}
