// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::{Error, Result};

/// Commit message format configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitFormat {
    /// Maximum subject line length in characters (default: 70)
    #[serde(default = "default_max_subject_length")]
    pub max_subject_length: usize,

    /// Warn when feat/fix/refactor/perf commits have no body (default: true)
    #[serde(default = "default_true")]
    pub require_body_for_features: bool,

    /// Additional regexes whose matches are stripped from model replies
    #[serde(default)]
    pub extra_strip_patterns: Vec<String>,

    /// Keep the body of a reply that is a single fenced block (default: false)
    #[serde(default)]
    pub unwrap_fenced_reply: bool,

    /// Remove quotes wrapped around the whole reply (default: false)
    #[serde(default)]
    pub strip_quotes: bool,
}

impl Default for CommitFormat {
    fn default() -> Self {
        Self {
            max_subject_length: default_max_subject_length(),
            require_body_for_features: true,
            extra_strip_patterns: Vec::new(),
            unwrap_fenced_reply: false,
            strip_quotes: false,
        }
    }
}

/// Diff budgeting policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Line limit when the model context length is unknown
    #[serde(default = "default_diff_max_lines")]
    pub default_max_lines: usize,

    /// Character limit when the model context length is unknown
    #[serde(default = "default_diff_max_chars")]
    pub default_max_chars: usize,

    /// Tokens reserved for the system prompt and the response
    #[serde(default = "default_context_reserve")]
    pub context_reserve: usize,

    /// Percentage of the remaining tokens given to the diff
    #[serde(default = "default_diff_share_percent")]
    pub diff_share_percent: usize,

    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    #[serde(default = "default_chars_per_line")]
    pub chars_per_line: usize,

    /// Hard cap on the character budget
    #[serde(default = "default_budget_max_chars")]
    pub max_chars: usize,

    /// Floor for the character budget on tiny context windows
    #[serde(default = "default_budget_min_chars")]
    pub min_chars: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            default_max_lines: default_diff_max_lines(),
            default_max_chars: default_diff_max_chars(),
            context_reserve: default_context_reserve(),
            diff_share_percent: default_diff_share_percent(),
            chars_per_token: default_chars_per_token(),
            chars_per_line: default_chars_per_line(),
            max_chars: default_budget_max_chars(),
            min_chars: default_budget_min_chars(),
        }
    }
}

/// Automatic context hint detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_true")]
    pub auto_detect: bool,

    #[serde(default = "default_wip_keywords")]
    pub wip_keywords: Vec<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            auto_detect: true,
            wip_keywords: default_wip_keywords(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenRouter,
    OpenAI,
    Ollama,
    Anthropic,
}

impl Provider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openrouter" => Some(Self::OpenRouter),
            "openai" => Some(Self::OpenAI),
            "ollama" | "local" => Some(Self::Ollama),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }

    /// Environment variable holding this provider's API key
    pub fn key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenRouter => write!(f, "openrouter"),
            Self::OpenAI => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: Provider,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Override the provider's base URL (OpenAI-compatible proxies, remote Ollama)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Force a context length instead of asking the provider
    #[serde(default)]
    pub context_length: Option<usize>,

    /// Request timeout in seconds (default 45)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for throttled (429) or failing (5xx) requests (default 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// LLM temperature (0.0-2.0, default 0.3)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate (default 1000)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub format: CommitFormat,

    #[serde(default)]
    pub diff: DiffConfig,

    #[serde(default)]
    pub context: ContextConfig,
}

fn default_model() -> String {
    "deepseek/deepseek-chat-v3.1:free".into()
}
fn default_timeout_secs() -> u64 {
    45
}
fn default_max_retries() -> u32 {
    3
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_max_subject_length() -> usize {
    70
}
fn default_diff_max_lines() -> usize {
    100
}
fn default_diff_max_chars() -> usize {
    8_000
}
fn default_context_reserve() -> usize {
    4_000
}
fn default_diff_share_percent() -> usize {
    80
}
fn default_chars_per_token() -> usize {
    4
}
fn default_chars_per_line() -> usize {
    80
}
fn default_budget_max_chars() -> usize {
    20_000
}
fn default_budget_min_chars() -> usize {
    800
}
fn default_wip_keywords() -> Vec<String> {
    ["TODO", "FIXME", "WIP", "HACK", "XXX", "NOTE"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            api_key: None,
            base_url: None,
            context_length: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            format: CommitFormat::default(),
            diff: DiffConfig::default(),
            context: ContextConfig::default(),
        }
    }
}

impl Config {
    /// Load with priority: CLI > ENV > user config > project config > defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        let config = Self::load_unchecked(cli)?;
        config.validate()?;
        Ok(config)
    }

    /// Layered load without `validate()`, for diagnostics.
    pub fn load_unchecked(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Project-level config (.git-auto-commit.toml in the working directory)
        if let Ok(cwd) = std::env::current_dir() {
            let project_config = cwd.join(".git-auto-commit.toml");
            if project_config.exists() {
                figment = figment.merge(Toml::file(&project_config));
            }
        }

        if let Some(path) = Self::config_path()
            && path.exists()
        {
            figment = figment.merge(Toml::file(&path));
        }

        // GIT_AUTO_COMMIT_MODEL, GIT_AUTO_COMMIT_FORMAT__MAX_SUBJECT_LENGTH, ...
        figment = figment.merge(Env::prefixed("GIT_AUTO_COMMIT_").split("__"));

        let mut config: Config = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.apply_cli(cli)?;

        if config.api_key.is_none() {
            config.api_key = config
                .provider
                .key_env_var()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.trim().is_empty());
        }

        Ok(config)
    }

    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "git-auto-commit").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Endpoint for the configured provider, honouring `base_url`.
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    fn apply_cli(&mut self, cli: &Cli) -> Result<()> {
        if let Some(ref p) = cli.provider {
            self.provider = Provider::parse(p).ok_or_else(|| {
                Error::Config(format!(
                    "unknown provider '{p}'. Use openrouter, openai, ollama or anthropic"
                ))
            })?;
        }
        if let Some(ref m) = cli.model {
            self.model = m.clone();
        }
        if cli.no_auto_context {
            self.context.auto_detect = false;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Config("model cannot be empty".into()));
        }

        if let Some(var) = self.provider.key_env_var()
            && self.api_key.is_none()
        {
            return Err(Error::Config(format!(
                "{} requires an API key. Set GIT_AUTO_COMMIT_API_KEY or {var}",
                self.provider
            )));
        }

        let base_url = self.base_url();
        match url::Url::parse(&base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(Error::Config(format!(
                    "base_url must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "base_url '{base_url}' is not a valid URL: {e}"
                )));
            }
        }

        if !(1..=3600).contains(&self.timeout_secs) {
            return Err(Error::Config(format!(
                "timeout_secs must be 1–3600, got {}",
                self.timeout_secs
            )));
        }

        if self.max_retries > 10 {
            return Err(Error::Config(format!(
                "max_retries must be 0–10, got {}",
                self.max_retries
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be 0.0–2.0, got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be positive".into()));
        }

        if self.context_length == Some(0) {
            return Err(Error::Config("context_length must be positive".into()));
        }

        if !(10..=500).contains(&self.format.max_subject_length) {
            return Err(Error::Config(format!(
                "format.max_subject_length must be 10–500, got {}",
                self.format.max_subject_length
            )));
        }

        let diff = &self.diff;
        if diff.default_max_lines == 0 || diff.default_max_chars == 0 {
            return Err(Error::Config(
                "diff.default_max_lines and diff.default_max_chars must be positive".into(),
            ));
        }

        if diff.chars_per_token == 0 || diff.chars_per_line == 0 {
            return Err(Error::Config(
                "diff.chars_per_token and diff.chars_per_line must be positive".into(),
            ));
        }

        if !(1..=100).contains(&diff.diff_share_percent) {
            return Err(Error::Config(format!(
                "diff.diff_share_percent must be 1–100, got {}",
                diff.diff_share_percent
            )));
        }

        if diff.min_chars == 0 || diff.min_chars > diff.max_chars {
            return Err(Error::Config(format!(
                "diff.min_chars must be positive and at most diff.max_chars ({}), got {}",
                diff.max_chars, diff.min_chars
            )));
        }

        Ok(())
    }

    /// Create default config file with secure permissions
    pub fn create_default() -> Result<PathBuf> {
        let Some(dir) = Self::config_dir() else {
            return Err(Error::Config("Cannot determine config directory".into()));
        };

        fs::create_dir_all(&dir)?;

        let path = dir.join("config.toml");
        let content = r#"# git-auto-commit configuration

# LLM provider: openrouter, openai, ollama, anthropic
provider = "openrouter"

# Model name as the provider knows it
model = "deepseek/deepseek-chat-v3.1:free"

# API key (or use OPENROUTER_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY)
# api_key = "..."

# Custom endpoint for OpenAI-compatible proxies or a remote Ollama
# base_url = "http://localhost:11434"

# Force a context length (tokens) instead of asking the provider
# context_length = 32768

timeout_secs = 45

# Retries with exponential backoff on HTTP 429/5xx
max_retries = 3

temperature = 0.3
max_tokens = 1000

[format]
max_subject_length = 70

# Warn when feat/fix/refactor/perf commits come without a body
require_body_for_features = true

# Extra regexes stripped from model replies (case-insensitive)
# extra_strip_patterns = ["(?m)^Here is my analysis[^\n]*"]

# Use the inside of a reply that is one ``` block instead of discarding it
unwrap_fenced_reply = false

# Remove quotes around the whole reply
strip_quotes = false

[diff]
# Budget used when the model context length is unknown
default_max_lines = 100
default_max_chars = 8000

# Tokens kept free for the prompt and the response
context_reserve = 4000
diff_share_percent = 80
chars_per_token = 4
chars_per_line = 80
max_chars = 20000
min_chars = 800

[context]
auto_detect = true
wip_keywords = ["TODO", "FIXME", "WIP", "HACK", "XXX", "NOTE"]
"#;

        fs::write(&path, content)?;

        // Set secure permissions (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(path)
    }
}
