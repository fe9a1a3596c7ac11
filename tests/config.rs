// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use git_auto_commit::config::{Config, Provider};
use git_auto_commit::error::Error;

fn keyed(provider: Provider) -> Config {
    Config {
        provider,
        api_key: Some("test-key".into()),
        ..Config::default()
    }
}

fn assert_config_error(config: &Config, needle: &str) {
    match config.validate() {
        Err(Error::Config(message)) => assert!(
            message.contains(needle),
            "expected {needle:?} in {message:?}"
        ),
        other => panic!("expected config error containing {needle:?}, got {other:?}"),
    }
}

// ─── Default values ──────────────────────────────────────────────────────────

#[test]
fn default_config_values() {
    let config = Config::default();
    assert_eq!(config.provider, Provider::OpenRouter);
    assert_eq!(config.model, "deepseek/deepseek-chat-v3.1:free");
    assert!(config.api_key.is_none());
    assert!(config.base_url.is_none());
    assert!(config.context_length.is_none());
    assert_eq!(config.timeout_secs, 45);
    assert_eq!(config.max_retries, 3);
    assert!((config.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(config.max_tokens, 1000);
    assert_eq!(config.format.max_subject_length, 70);
    assert!(config.format.require_body_for_features);
    assert!(config.format.extra_strip_patterns.is_empty());
    assert!(!config.format.unwrap_fenced_reply);
    assert!(!config.format.strip_quotes);
    assert_eq!(config.diff.default_max_lines, 100);
    assert_eq!(config.diff.default_max_chars, 8000);
    assert!(config.context.auto_detect);
    assert_eq!(
        config.context.wip_keywords,
        vec!["TODO", "FIXME", "WIP", "HACK", "XXX", "NOTE"]
    );
}

// ─── TOML deserialization ────────────────────────────────────────────────────

#[test]
fn load_from_valid_toml() {
    let toml_str = r#"
provider = "ollama"
model = "llama3"
base_url = "http://gpu-box:11434/"
context_length = 8192

[format]
max_subject_length = 50
extra_strip_patterns = ["^note:.*"]
strip_quotes = true

[diff]
default_max_lines = 300

[context]
auto_detect = false
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.provider, Provider::Ollama);
    assert_eq!(config.model, "llama3");
    assert_eq!(config.base_url(), "http://gpu-box:11434");
    assert_eq!(config.context_length, Some(8192));
    assert_eq!(config.format.max_subject_length, 50);
    assert_eq!(config.format.extra_strip_patterns, vec!["^note:.*"]);
    assert!(config.format.strip_quotes);
    assert!(!config.format.unwrap_fenced_reply);
    assert_eq!(config.diff.default_max_lines, 300);
    assert_eq!(config.diff.default_max_chars, 8000);
    assert!(!config.context.auto_detect);
    assert!(config.validate().is_ok());
}

#[test]
fn empty_toml_uses_all_defaults() {
    let config: Config = toml::from_str("").unwrap();
    let default = Config::default();
    assert_eq!(config.provider, default.provider);
    assert_eq!(config.model, default.model);
    assert_eq!(config.diff.max_chars, default.diff.max_chars);
}

#[test]
fn invalid_toml_returns_error() {
    let result: std::result::Result<Config, _> = toml::from_str("provider = [invalid");
    assert!(result.is_err(), "invalid TOML should return an error");
}

#[test]
fn unknown_provider_in_toml_is_rejected() {
    let result: std::result::Result<Config, _> = toml::from_str(r#"provider = "bard""#);
    assert!(result.is_err());
}

// ─── Provider ────────────────────────────────────────────────────────────────

#[test]
fn provider_display_format() {
    assert_eq!(Provider::OpenRouter.to_string(), "openrouter");
    assert_eq!(Provider::OpenAI.to_string(), "openai");
    assert_eq!(Provider::Ollama.to_string(), "ollama");
    assert_eq!(Provider::Anthropic.to_string(), "anthropic");
}

#[test]
fn provider_parse_accepts_aliases() {
    assert_eq!(Provider::parse("OpenRouter"), Some(Provider::OpenRouter));
    assert_eq!(Provider::parse("local"), Some(Provider::Ollama));
    assert_eq!(Provider::parse("bard"), None);
}

#[test]
fn cloud_providers_name_their_key_variable() {
    assert_eq!(
        Provider::OpenRouter.key_env_var(),
        Some("OPENROUTER_API_KEY")
    );
    assert_eq!(Provider::OpenAI.key_env_var(), Some("OPENAI_API_KEY"));
    assert_eq!(Provider::Anthropic.key_env_var(), Some("ANTHROPIC_API_KEY"));
    assert_eq!(Provider::Ollama.key_env_var(), None);
}

#[test]
fn base_url_falls_back_to_provider_default() {
    assert_eq!(
        keyed(Provider::OpenRouter).base_url(),
        "https://openrouter.ai/api/v1"
    );
    assert_eq!(
        Config {
            provider: Provider::Ollama,
            ..Config::default()
        }
        .base_url(),
        "http://localhost:11434"
    );
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[test]
fn default_ollama_config_is_valid() {
    let config = Config {
        provider: Provider::Ollama,
        ..Config::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn cloud_provider_requires_key() {
    assert_config_error(&Config::default(), "OPENROUTER_API_KEY");
    assert!(keyed(Provider::OpenRouter).validate().is_ok());
}

#[test]
fn base_url_must_be_http() {
    let config = Config {
        base_url: Some("ftp://example.com".into()),
        ..keyed(Provider::OpenAI)
    };
    assert_config_error(&config, "http or https");

    let config = Config {
        base_url: Some("not a url".into()),
        ..keyed(Provider::OpenAI)
    };
    assert_config_error(&config, "not a valid URL");
}

#[test]
fn numeric_ranges_are_checked() {
    let mut config = keyed(Provider::Anthropic);
    config.timeout_secs = 0;
    assert_config_error(&config, "timeout_secs");

    let mut config = keyed(Provider::Anthropic);
    config.max_retries = 11;
    assert_config_error(&config, "max_retries");

    let mut config = keyed(Provider::Anthropic);
    config.temperature = 2.5;
    assert_config_error(&config, "temperature");

    let mut config = keyed(Provider::Anthropic);
    config.context_length = Some(0);
    assert_config_error(&config, "context_length");

    let mut config = keyed(Provider::Anthropic);
    config.format.max_subject_length = 5;
    assert_config_error(&config, "max_subject_length");
}

#[test]
fn diff_policy_is_checked() {
    let mut config = keyed(Provider::OpenAI);
    config.diff.min_chars = config.diff.max_chars + 1;
    assert_config_error(&config, "diff.min_chars");

    let mut config = keyed(Provider::OpenAI);
    config.diff.diff_share_percent = 0;
    assert_config_error(&config, "diff_share_percent");

    let mut config = keyed(Provider::OpenAI);
    config.diff.chars_per_line = 0;
    assert_config_error(&config, "chars_per_line");
}
