// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};

use super::SYSTEM_PROMPT;
use super::retry::send_with_retry;

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    system: String,
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
struct StreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    delta: Option<ContentDelta>,
}

#[derive(Deserialize)]
struct ContentDelta {
    text: Option<String>,
}

impl AnthropicProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url(),
            model: config.model.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        }
    }

    fn provider_error(message: impl Into<String>) -> Error {
        Error::Provider {
            provider: "anthropic".into(),
            message: message.into(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
    }

    /// Checks the key against the models endpoint.
    pub async fn verify_connection(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Self::provider_error("API key not configured"));
        }

        let url = format!("{}/models", self.base_url);
        let response =
            send_with_retry(self.max_retries, || self.authorized(self.client.get(&url)))
                .await
                .map_err(|e| Self::provider_error(e.to_string()))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            reqwest::StatusCode::UNAUTHORIZED => Err(Self::provider_error("invalid API key")),
            s => Err(Self::provider_error(format!("HTTP {s} listing models"))),
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        token_tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let url = format!("{}/messages", self.base_url);

        let request = MessagesRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.into(),
            messages: vec![Message {
                role: "user".into(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        };

        let sent = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            sent = send_with_retry(self.max_retries, || {
                self.authorized(self.client.post(&url))
                    .header("content-type", "application/json")
                    .json(&request)
            }) => sent,
        };

        let response = sent.map_err(|e| {
            if e.is_timeout() {
                Self::provider_error("request timed out")
            } else {
                Self::provider_error(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::provider_error(format!("HTTP {status}: {body}")));
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

                    let chunk = chunk.map_err(|e| Self::provider_error(e.to_string()))?;

                    line_buffer.push_str(&String::from_utf8_lossy(&chunk));

                    while let Some(newline_pos) = line_buffer.find('\n') {
                        let line = line_buffer[..newline_pos].to_string();
                        line_buffer = line_buffer[newline_pos + 1..].to_string();

                        // "event: <type>" lines carry nothing the data line lacks
                        let Some(data) = line.trim().strip_prefix("data: ") else {
                            continue;
                        };

                        let Ok(event) = serde_json::from_str::<StreamEvent>(data) else {
                            continue;
                        };

                        match event.event_type.as_str() {
                            "content_block_delta" => {
                                if let Some(text) = event.delta.and_then(|d| d.text) {
                                    let _ = token_tx.send(text.clone()).await;
                                    full_response.push_str(&text);
                                }
                            }
                            "message_stop" => {
                                return Ok(full_response.trim().to_string());
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        Ok(full_response.trim().to_string())
    }

    pub fn name(&self) -> &str {
        "anthropic"
    }
}
