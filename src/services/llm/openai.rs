// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{Config, Provider};
use crate::error::{Error, Result};

use super::SYSTEM_PROMPT;
use super::retry::send_with_retry;

const REFERER: &str = "https://github.com/rozeraf/git-auto-commit";
const APP_TITLE: &str = "Git Auto Commit";

/// Chat-completions client for OpenAI and OpenAI-compatible gateways
/// such as OpenRouter.
pub struct OpenAiProvider {
    client: Client,
    provider_name: String,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    attribution: bool,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    context_length: Option<usize>,
}

impl OpenAiProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            provider_name: config.provider.to_string(),
            base_url: config.base_url(),
            model: config.model.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            attribution: config.provider == Provider::OpenRouter,
            max_retries: config.max_retries,
        }
    }

    fn provider_error(&self, message: impl Into<String>) -> Error {
        Error::Provider {
            provider: self.provider_name.clone(),
            message: message.into(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Authorization", format!("Bearer {}", self.api_key));
        if self.attribution {
            request
                .header("HTTP-Referer", REFERER)
                .header("X-Title", APP_TITLE)
        } else {
            request
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelEntry>> {
        let url = format!("{}/models", self.base_url);

        let response =
            send_with_retry(self.max_retries, || self.authorized(self.client.get(&url)))
                .await
                .map_err(|e| self.provider_error(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(self.provider_error("invalid API key"));
        }

        if !response.status().is_success() {
            let status = response.status();
            return Err(self.provider_error(format!("HTTP {status} listing models")));
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| self.provider_error(format!("unexpected models response: {e}")))?;

        Ok(list.data)
    }

    pub async fn verify_connection(&self) -> Result<()> {
        let models = self.list_models().await?;

        // An empty list says nothing about the model
        if !models.is_empty() && !models.iter().any(|m| m.id == self.model) {
            return Err(Error::ModelNotFound {
                model: self.model.clone(),
                available: models.into_iter().map(|m| m.id).take(20).collect(),
            });
        }

        Ok(())
    }

    /// Context window reported by the models endpoint (OpenRouter does,
    /// OpenAI does not).
    pub async fn context_length(&self) -> Option<usize> {
        match self.list_models().await {
            Ok(models) => models
                .into_iter()
                .find(|m| m.id == self.model)
                .and_then(|m| m.context_length),
            Err(e) => {
                debug!(provider = %self.provider_name, error = %e, "context length lookup failed");
                None
            }
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        token_tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                Message {
                    role: "user".into(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        };

        let sent = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            sent = send_with_retry(self.max_retries, || {
                self.authorized(self.client.post(&url)).json(&request)
            }) => sent,
        };

        let response = sent.map_err(|e| {
            if e.is_timeout() {
                self.provider_error("request timed out")
            } else {
                self.provider_error(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.provider_error(format!("HTTP {status}: {body}")));
        }

        let mut stream = response.bytes_stream();
        let mut full_response = String::new();
        let mut line_buffer = String::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::Cancelled);
                }
                chunk = stream.next() => {
                    let Some(chunk) = chunk else { break };

                    let chunk = chunk.map_err(|e| self.provider_error(e.to_string()))?;

                    line_buffer.push_str(&String::from_utf8_lossy(&chunk));

                    while let Some(newline_pos) = line_buffer.find('\n') {
                        let line = line_buffer[..newline_pos].to_string();
                        line_buffer = line_buffer[newline_pos + 1..].to_string();

                        let line = line.trim();
                        // OpenRouter sends ": OPENROUTER PROCESSING" keep-alive comments
                        if line.is_empty() || line.starts_with(':') || line == "data: [DONE]" {
                            continue;
                        }

                        let Some(data) = line.strip_prefix("data: ") else {
                            continue;
                        };

                        if let Ok(chunk) = serde_json::from_str::<ChatChunk>(data) {
                            for choice in &chunk.choices {
                                if let Some(ref content) = choice.delta.content {
                                    let _ = token_tx.send(content.clone()).await;
                                    full_response.push_str(content);
                                }
                                if choice.finish_reason.is_some() {
                                    return Ok(full_response.trim().to_string());
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(full_response.trim().to_string())
    }

    pub fn name(&self) -> &str {
        &self.provider_name
    }
}
