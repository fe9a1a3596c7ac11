// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod retry;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, Provider};
use crate::error::Result;

pub(crate) const SYSTEM_PROMPT: &str = r#"You write git commit messages following the Conventional Commits specification.

RULES:
1. Output ONLY the commit message text. No explanations, analysis, markdown or code blocks.
2. Format: type(scope): subject
   - subject: imperative mood ("add", not "added"), at most 50 characters, no trailing period
   - scope: a specific module or component (api, ui, config, parser); omit it only for broad changes
3. Types: feat, fix, refactor, perf, test, docs, style, build, ci, chore, revert
4. Optional body after one blank line: hyphen bullet points, each starting with a verb,
   explaining what changed and why for non-trivial changes.
5. Footer "BREAKING CHANGE: ..." only when applicable."#;

/// The configured model backend.
pub enum LlmProvider {
    OpenAi(openai::OpenAiProvider),
    Ollama(ollama::OllamaProvider),
    Anthropic(anthropic::AnthropicProvider),
}

impl LlmProvider {
    /// Generate with streaming tokens and cancellation support
    pub async fn generate(
        &self,
        prompt: &str,
        token_tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<String> {
        match self {
            Self::OpenAi(p) => p.generate(prompt, token_tx, cancel).await,
            Self::Ollama(p) => p.generate(prompt, token_tx, cancel).await,
            Self::Anthropic(p) => p.generate(prompt, token_tx, cancel).await,
        }
    }

    /// Check that the backend is reachable and the credentials are usable.
    pub async fn verify(&self) -> Result<()> {
        match self {
            Self::OpenAi(p) => p.verify_connection().await,
            Self::Ollama(p) => p.verify_model().await,
            Self::Anthropic(p) => p.verify_connection().await,
        }
    }

    /// Model context window in tokens, when the backend reports one.
    pub async fn context_length(&self) -> Option<usize> {
        match self {
            Self::OpenAi(p) => p.context_length().await,
            Self::Ollama(p) => p.context_length().await,
            Self::Anthropic(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::OpenAi(p) => p.name(),
            Self::Ollama(p) => p.name(),
            Self::Anthropic(p) => p.name(),
        }
    }
}

pub fn create_provider(config: &Config) -> Result<LlmProvider> {
    Ok(match config.provider {
        Provider::OpenRouter | Provider::OpenAI => {
            LlmProvider::OpenAi(openai::OpenAiProvider::new(config))
        }
        Provider::Ollama => LlmProvider::Ollama(ollama::OllamaProvider::new(config)),
        Provider::Anthropic => LlmProvider::Anthropic(anthropic::AnthropicProvider::new(config)),
    })
}
