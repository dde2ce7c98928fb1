//! LLM API interaction with exponential backoff retry logic.
//!
//! This module talks to an OpenAI-compatible chat-completions endpoint. It is
//! built from small composable pieces:
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`ChatClient`]: `reqwest` implementation of [`AskAsync`]
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! Retries follow the shared [`RetryPolicy`]: exponential backoff starting at
//! the base delay, capped at the maximum delay, plus 0-250ms of random jitter.

use crate::retry::{RetryPolicy, retry_with_backoff};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Trait for async LLM interaction.
///
/// Implementors send one user message to an LLM and return its reply. The
/// analysis stage only depends on this trait, so tests can substitute a mock.
pub trait AskAsync {
    /// Send `text` as the user message and return the model's reply text.
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>>;
}

/// Connection and sampling settings for the chat-completions endpoint.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// [`AskAsync`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    settings: LlmSettings,
}

impl ChatClient {
    pub fn new(http: Client, settings: LlmSettings) -> Self {
        Self { http, settings }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.api_base.trim_end_matches('/'))
    }
}

impl AskAsync for ChatClient {
    #[instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let body = ChatRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: text,
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis() as u64,
                %status,
                "API call failed"
            );
            return Err(format!("LLM endpoint returned {}: {}", status, detail).into());
        }

        let parsed: ChatResponse = response.json().await?;
        let content = extract_reply(parsed)?;
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = content.len(),
            "API call succeeded"
        );
        Ok(content)
    }
}

fn extract_reply(response: ChatResponse) -> Result<String, Box<dyn Error>> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| "LLM response contained no message content".into())
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = ChatClient::new(http, settings);
    /// let retry_client = RetryAsk::new(client, RetryPolicy::default());
    /// ```
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        retry_with_backoff(&self.policy, "ask", || self.inner.ask(text)).await
    }
}
