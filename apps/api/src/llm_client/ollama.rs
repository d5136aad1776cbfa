//! Local Ollama backend. Needs no secret, only a reachable daemon.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_http_client, non_empty, read_json, send_with_retry, ChatModel, LlmError};
use super::TEMPERATURE;

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    stream: bool,
    options: OllamaOptions,
    messages: Vec<OllamaMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Option<OllamaResponseMessage>,
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

fn ollama_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OllamaError>(body).ok().map(|e| e.error)
}

pub struct OllamaClient {
    client: Client,
    chat_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            chat_url: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model,
        })
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let request_body = OllamaRequest {
            model: &self.model,
            stream: false,
            options: OllamaOptions {
                temperature: TEMPERATURE,
            },
            messages: vec![
                OllamaMessage {
                    role: "system",
                    content: system,
                },
                OllamaMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = send_with_retry(
            || self.client.post(&self.chat_url).json(&request_body),
            ollama_error_message,
        )
        .await?;

        let body: OllamaResponse = read_json(response).await?;
        debug!(
            "Ollama call succeeded: model={}, eval_count={:?}",
            self.model, body.eval_count
        );

        non_empty(body.message.map(|m| m.content))
    }
}
