// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

// miette's Diagnostic derive generates code that triggers this false positive
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("No staged changes found")]
    #[diagnostic(
        code(git_auto_commit::git::no_staged),
        help("Stage files with: git add <files> (or git add -p for hunks)")
    )]
    NoStagedChanges,

    #[error("Not a git repository")]
    #[diagnostic(
        code(git_auto_commit::git::not_repo),
        help("Run this command inside a git repository")
    )]
    NotAGitRepo,

    #[error("Merge in progress")]
    #[diagnostic(
        code(git_auto_commit::git::merge),
        help("Complete or abort the merge: git merge --abort")
    )]
    MergeInProgress,

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Cannot connect to Ollama at {host}")]
    #[diagnostic(
        code(git_auto_commit::ollama::not_running),
        help("Start Ollama with: ollama serve")
    )]
    OllamaNotRunning { host: String },

    #[error("Model '{model}' not found. Available: {}", available.join(", "))]
    #[diagnostic(
        code(git_auto_commit::provider::model_not_found),
        help("Pick one of the available models with --model")
    )]
    ModelNotFound {
        model: String,
        available: Vec<String>,
    },

    #[error("Provider '{provider}' error: {message}")]
    #[diagnostic(
        code(git_auto_commit::provider::error),
        help("Check connectivity and credentials with: git-auto-commit doctor")
    )]
    Provider { provider: String, message: String },

    #[error("Invalid commit message: {0}")]
    #[diagnostic(code(git_auto_commit::commit::invalid))]
    InvalidCommitMessage(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(git_auto_commit::config::error))]
    Config(String),

    #[error("Git error: {0}")]
    #[diagnostic(code(git_auto_commit::git::error))]
    Git(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),
}

impl From<dialoguer::Error> for Error {
    fn from(e: dialoguer::Error) -> Self {
        Error::Dialog(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
