//! LLM client: the single point of entry for all chat-completion calls.
//!
//! ARCHITECTURAL RULE: No other module may talk to a provider API directly.
//! The interview engine only ever sees `dyn ChatModel`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod prompts;
pub mod selector;
#[cfg(test)]
pub mod testing;

/// Sampling temperature shared by every backend.
pub const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 1024;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A configured chat backend: given a system instruction and a prompt,
/// return the completion text or fail.
///
/// Sessions hold it as `Arc<dyn ChatModel>`; it never changes for the
/// lifetime of a session.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider-side model id, for logging.
    fn model_name(&self) -> &str;

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Builds the HTTP client every provider uses.
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, LlmError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Sends a request built by `build`, retrying on 429 (rate limit), 5xx and
/// transport errors with exponential backoff. Other non-success statuses are
/// returned immediately with the body passed through `error_message`.
pub(crate) async fn send_with_retry<F>(
    build: F,
    error_message: fn(&str) -> Option<String>,
) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "LLM call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            last_error = Some(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        return Ok(response);
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: MAX_RETRIES,
    }))
}

/// Reads a successful response body and decodes it as JSON.
/// Transport failures stay `Http`; a body that does not match `T` is `Parse`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, LlmError> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Rejects completions that carry no usable text.
pub(crate) fn non_empty(text: Option<String>) -> Result<String, LlmError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(LlmError::EmptyContent),
    }
}
