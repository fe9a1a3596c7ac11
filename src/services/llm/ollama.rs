// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

use super::SYSTEM_PROMPT;
use super::retry::send_with_retry;

pub struct OllamaProvider {
    client: Client,
    host: String,
    model: String,
    temperature: f32,
    num_predict: u32,
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    done: bool,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Deserialize)]
struct ShowResponse {
    #[serde(default)]
    model_info: HashMap<String, serde_json::Value>,
}

impl OllamaProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            // Sanitize: remove trailing slashes to avoid //api/generate
            host: config.base_url(),
            model: config.model.clone(),
            temperature: config.temperature,
            num_predict: config.max_tokens,
            max_retries: config.max_retries,
        }
    }

    fn provider_error(message: impl Into<String>) -> Error {
        Error::Provider {
            provider: "ollama".into(),
            message: message.into(),
        }
    }

    /// List locally available models.
    pub async fn health_check(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.host);

        let response = send_with_retry(self.max_retries, || self.client.get(&url))
            .await
            .map_err(|_| Error::OllamaNotRunning {
                host: self.host.clone(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::provider_error(format!("HTTP {status} listing models")));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| Self::provider_error(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    pub async fn verify_model(&self) -> Result<()> {
        let available = self.health_check().await?;

        // "llama3" matches "llama3:latest"
        let found = available.iter().any(|name| {
            name == &self.model
                || name
                    .strip_suffix(":latest")
                    .is_some_and(|base| base == self.model)
        });

        if !found {
            return Err(Error::ModelNotFound {
                model: self.model.clone(),
                available,
            });
        }

        Ok(())
    }

    /// Context window from `/api/show` (`<arch>.context_length`).
    pub async fn context_length(&self) -> Option<usize> {
        let url = format!("{}/api/show", self.host);

        let request = ShowRequest { model: &self.model };
        let response = match send_with_retry(self.max_retries, || {
            self.client.post(&url).json(&request)
        })
        .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!(status = %r.status(), "ollama show failed");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "ollama show failed");
                return None;
            }
        };

        let show: ShowResponse = response.json().await.ok()?;
        show.model_info
            .iter()
            .find(|(key, _)| key.ends_with(".context_length"))
            .and_then(|(_, value)| value.as_u64())
            .and_then(|n| usize::try_from(n).ok())
    }

    pub async fn generate(
        &self,
        prompt: &str,
        token_tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.host);

        let request = GenerateRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.into(),
            prompt: prompt.to_string(),
            stream: true,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.num_predict,
            },
        };

        let sent = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            sent = send_with_retry(self.max_retries, || {
                self.client.post(&url).json(&request)
            }) => sent,
        };

        let response = sent.map_err(|e| {
            if e.is_connect() {
                Error::OllamaNotRunning {
                    host: self.host.clone(),
                }
            } else if e.is_timeout() {
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

        // Chunks from bytes_stream() are NOT aligned to newlines
        let mut line_buffer = String::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::Cancelled);
                }
                chunk = stream.next() => {
                    let Some(chunk) = chunk else {
                        break;
                    };

                    let chunk = chunk.map_err(|e| Self::provider_error(e.to_string()))?;

                    line_buffer.push_str(&String::from_utf8_lossy(&chunk));

                    // Newline-delimited JSON
                    while let Some(newline_pos) = line_buffer.find('\n') {
                        let line = line_buffer[..newline_pos].to_string();
                        line_buffer = line_buffer[newline_pos + 1..].to_string();

                        if line.is_empty() {
                            continue;
                        }

                        if let Ok(resp) = serde_json::from_str::<GenerateResponse>(&line) {
                            let _ = token_tx.send(resp.response.clone()).await;
                            full_response.push_str(&resp.response);

                            if resp.done {
                                return Ok(full_response.trim().to_string());
                            }
                        }
                    }
                }
            }
        }

        // Final line without a trailing newline
        if !line_buffer.is_empty()
            && let Ok(resp) = serde_json::from_str::<GenerateResponse>(&line_buffer)
        {
            let _ = token_tx.send(resp.response.clone()).await;
            full_response.push_str(&resp.response);
        }

        Ok(full_response.trim().to_string())
    }

    pub fn name(&self) -> &str {
        "ollama"
    }
}
