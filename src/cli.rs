// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "git-auto-commit")]
#[command(version)]
#[command(about = "AI-powered conventional commit messages for staged changes", long_about = None)]
pub struct Cli {
    /// LLM provider (openrouter, openai, ollama, anthropic)
    #[arg(short, long, env = "GIT_AUTO_COMMIT_PROVIDER")]
    pub provider: Option<String>,

    /// Model name, e.g. anthropic/claude-3.5-sonnet
    #[arg(short, long, env = "GIT_AUTO_COMMIT_MODEL")]
    pub model: Option<String>,

    /// Auto-confirm and commit without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print message only, don't commit
    #[arg(long)]
    pub dry_run: bool,

    /// Show the prompt sent to LLM
    #[arg(long)]
    pub show_prompt: bool,

    /// Verbose output
    #[arg(short, long, visible_alias = "debug")]
    pub verbose: bool,

    /// Custom hint passed to the model (takes precedence over --context)
    #[arg(short = 'i', long)]
    pub hint: Option<String>,

    /// Preset context for the commit, e.g. "wip"
    #[arg(short, long)]
    pub context: Option<String>,

    /// Don't derive context hints from the diff
    #[arg(long)]
    pub no_auto_context: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Initialize config file
    Init,
    /// Show current configuration
    Config,
    /// Check repository, credentials and provider connectivity
    Doctor,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
