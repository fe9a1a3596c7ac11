// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::io::IsTerminal;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::domain::{DiffStats, ParsedCommit, PromptContext};
use crate::error::{Error, Result};
use crate::services::{
    budget::{BudgetPolicy, DiffBudgeter},
    git::GitService,
    hints::ContextDetector,
    llm::{self, LlmProvider},
    normalizer::ResponseNormalizer,
};

const CHOICES: [&str; 3] = ["Commit", "Regenerate", "Cancel"];

/// What the user chose to do with a generated message.
enum Choice {
    Commit,
    Regenerate,
    Cancel,
}

pub struct App {
    cli: Cli,
    config: Config,
    cancel_token: CancellationToken,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self> {
        let config = match cli.command {
            // Neither command needs credentials
            Some(Commands::Init | Commands::Completions { .. }) => Config::default(),
            Some(Commands::Doctor) => Config::load_unchecked(&cli)?,
            _ => Config::load(&cli)?,
        };
        debug!(
            provider = %config.provider,
            model = %config.model,
            context_length = ?config.context_length,
            "config loaded"
        );
        Ok(Self {
            cli,
            config,
            cancel_token: CancellationToken::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let cancel = self.cancel_token.clone();
        tokio::spawn(async move {
            signal::ctrl_c().await.ok();
            cancel.cancel();
        });

        if let Some(ref cmd) = self.cli.command {
            return self.handle_command(cmd).await;
        }

        self.generate_commit().await
    }

    async fn generate_commit(&self) -> Result<()> {
        self.check_cancelled()?;

        self.print_status("Reading staged changes...");
        let git = GitService::discover()?;
        let diff = git.staged_diff().await?;

        let provider = llm::create_provider(&self.config)?;
        let context_length = self.resolve_context_length(&provider).await?;

        let budgeter = DiffBudgeter::new(BudgetPolicy::from(&self.config.diff));
        let budgeted = budgeter.budget(&diff, context_length);
        let stats = &budgeted.stats;

        self.print_info(&format!(
            "{} files changed (+{} -{})",
            stats.files_changed, stats.lines_added, stats.lines_removed
        ));
        if budgeted.content.len() < diff.len() {
            self.print_info(&format!(
                "Diff reduced to {} of {} characters to fit the model",
                budgeted.content.len(),
                diff.len()
            ));
        }
        if budgeted.is_large {
            debug!("large change set");
        }

        let hints = self.context_hints(&diff, stats);
        debug!(hints = ?hints, "context hints");

        let prompt = PromptContext::new(&budgeted, hints).to_prompt();
        debug!(prompt_chars = prompt.len(), "prompt built");

        if self.cli.show_prompt {
            eprintln!("{}", style("--- PROMPT ---").dim());
            eprintln!("{}", prompt);
            eprintln!("{}", style("--- END PROMPT ---").dim());
        }

        let normalizer = ResponseNormalizer::from_format(&self.config.format)?;
        let interactive = std::io::stdout().is_terminal() && std::io::stdin().is_terminal();

        let parsed = loop {
            self.check_cancelled()?;

            let raw = self.stream_reply(&provider, &prompt).await?;
            if raw.is_empty() {
                return Err(Error::Provider {
                    provider: provider.name().into(),
                    message: "empty response".into(),
                });
            }

            debug!(raw_len = raw.len(), "normalizing response");
            let parsed = normalizer.normalize(&raw);
            self.report(&parsed);

            if self.cli.dry_run {
                println!("{}", parsed.to_message());
                return Ok(());
            }

            if self.cli.yes {
                break parsed;
            }

            if !interactive {
                self.print_warning("Not a terminal. Use --yes to commit from scripts.");
                println!("{}", parsed.to_message());
                return Ok(());
            }

            match self.choose()? {
                Choice::Commit => break parsed,
                Choice::Regenerate => {
                    self.print_status("Regenerating...");
                    continue;
                }
                Choice::Cancel => return Err(Error::Cancelled),
            }
        };

        if parsed.subject.is_empty() {
            return Err(Error::InvalidCommitMessage("subject line is empty".into()));
        }

        git.commit(&parsed.to_message()).await?;
        eprintln!("{} Committed!", style("✓").green().bold());

        Ok(())
    }

    /// Verify the provider, then settle the context length (config wins).
    async fn resolve_context_length(&self, provider: &LlmProvider) -> Result<Option<usize>> {
        let spinner = Self::spinner(format!(
            "Contacting {} ({})...",
            provider.name(),
            self.config.model
        ));

        if let Err(e) = provider.verify().await {
            spinner.finish_and_clear();
            return Err(e);
        }

        let context_length = match self.config.context_length {
            Some(n) => Some(n),
            None => provider.context_length().await,
        };
        spinner.finish_and_clear();

        match context_length {
            Some(n) => debug!(context_length = n, "model context length"),
            None => debug!("model context length unknown, using default budget"),
        }
        Ok(context_length)
    }

    /// `--hint`, then `--context`, then detection from the diff.
    fn context_hints(&self, diff: &str, stats: &DiffStats) -> Vec<String> {
        if let Some(ref hint) = self.cli.hint {
            return vec![hint.clone()];
        }
        if let Some(ref preset) = self.cli.context {
            return vec![preset.to_lowercase()];
        }
        if self.config.context.auto_detect {
            return ContextDetector::new(&self.config.context.wip_keywords).detect(diff, stats);
        }
        Vec::new()
    }

    async fn stream_reply(&self, provider: &LlmProvider, prompt: &str) -> Result<String> {
        eprintln!("{} Generating...\n", style("info:").cyan());

        let (tx, mut rx) = mpsc::channel::<String>(64);
        let cancel_for_printer = self.cancel_token.clone();
        let print_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_for_printer.cancelled() => break,
                    token = rx.recv() => match token {
                        Some(t) => eprint!("{}", style(t).dim()),
                        None => break,
                    }
                }
            }
        });

        let raw = provider
            .generate(prompt, tx, self.cancel_token.clone())
            .await;
        let _ = print_handle.await;
        eprintln!();

        raw
    }

    fn report(&self, parsed: &ParsedCommit) {
        for warning in &parsed.warnings {
            warn!(warning = %warning, "commit message check");
            self.print_warning(warning);
        }

        eprintln!("\n{}", style("Generated commit message:").bold());
        eprintln!("{}", style(&parsed.subject).green());
        if let Some(ref body) = parsed.description {
            eprintln!("\n{}", body);
        }
        eprintln!(
            "\n{}",
            style(format!(
                "{} words, {} characters",
                parsed.word_count(),
                parsed.char_count()
            ))
            .dim()
        );
    }

    fn choose(&self) -> Result<Choice> {
        let selection = dialoguer::Select::new()
            .with_prompt("What next?")
            .items(&CHOICES)
            .default(0)
            .interact_opt()?;

        Ok(match selection {
            Some(0) => Choice::Commit,
            Some(1) => Choice::Regenerate,
            _ => Choice::Cancel,
        })
    }

    async fn handle_command(&self, cmd: &Commands) -> Result<()> {
        match cmd {
            Commands::Init => {
                let path = Config::create_default()?;
                println!("Created config: {}", path.display());
                Ok(())
            }
            Commands::Config => {
                self.print_config();
                Ok(())
            }
            Commands::Doctor => self.run_doctor().await,
            Commands::Completions { shell } => {
                let mut cmd = <Cli as clap::CommandFactory>::command();
                clap_complete::generate(
                    *shell,
                    &mut cmd,
                    "git-auto-commit",
                    &mut std::io::stdout(),
                );
                Ok(())
            }
        }
    }

    fn print_config(&self) {
        let config = &self.config;
        let key_status = if config.api_key.is_some() { "set" } else { "not set" };

        println!("Provider: {}", config.provider);
        println!("Model: {}", config.model);
        println!("Base URL: {}", config.base_url());
        println!("API key: {key_status}");
        match config.context_length {
            Some(n) => println!("Context length: {n} (configured)"),
            None => println!("Context length: from provider"),
        }
        println!("Timeout: {}s", config.timeout_secs);
        println!("Max retries: {}", config.max_retries);
        println!("Temperature: {}", config.temperature);
        println!("Max tokens: {}", config.max_tokens);
        println!();
        println!("[format]");
        println!("  max_subject_length: {}", config.format.max_subject_length);
        println!(
            "  require_body_for_features: {}",
            config.format.require_body_for_features
        );
        println!(
            "  extra_strip_patterns: {}",
            config.format.extra_strip_patterns.len()
        );
        println!(
            "  unwrap_fenced_reply: {}",
            config.format.unwrap_fenced_reply
        );
        println!("  strip_quotes: {}", config.format.strip_quotes);
        println!();
        println!("[diff]");
        println!("  default_max_lines: {}", config.diff.default_max_lines);
        println!("  default_max_chars: {}", config.diff.default_max_chars);
        println!("  context_reserve: {}", config.diff.context_reserve);
        println!("  diff_share_percent: {}", config.diff.diff_share_percent);
        println!(
            "  max_chars: {} / min_chars: {}",
            config.diff.max_chars, config.diff.min_chars
        );
        println!();
        println!("[context]");
        println!("  auto_detect: {}", config.context.auto_detect);
        println!("  wip_keywords: {}", config.context.wip_keywords.join(", "));
    }

    async fn run_doctor(&self) -> Result<()> {
        eprintln!("{} Running diagnostics...\n", style("→").cyan());

        eprintln!("{}", style("Configuration").bold().underlined());
        eprintln!("  Provider:    {}", self.config.provider);
        eprintln!("  Model:       {}", self.config.model);
        eprintln!("  Endpoint:    {}", self.config.base_url());
        if let Some(ref path) = Config::config_path() {
            let status = if path.exists() { "found" } else { "not found" };
            eprintln!("  Config file: {} ({})", path.display(), status);
        }
        eprintln!();

        eprintln!("{}", style("Git Repository").bold().underlined());
        match GitService::discover() {
            Ok(git) => {
                eprintln!("  Repository: {}", style("found").green());
                match git.staged_files().await {
                    Ok(files) => eprintln!("  Staged files: {}", files.len()),
                    Err(e) => eprintln!("  Staged files: {}: {}", style("ERROR").red().bold(), e),
                }
            }
            Err(_) => eprintln!("  Repository: {}", style("NOT FOUND").red().bold()),
        }
        eprintln!();

        eprintln!("{}", style("Provider Check").bold().underlined());
        if self.config.provider.key_env_var().is_some() {
            eprint!("  API key: ");
            if self.config.api_key.is_some() {
                eprintln!("{}", style("configured").green());
            } else {
                eprintln!("{}", style("MISSING").red().bold());
            }
        }
        if let Err(e) = self.config.validate() {
            eprintln!("  Config: {}: {}", style("INVALID").red().bold(), e);
            eprintln!();
            eprintln!("{} Diagnostics stopped.", style("✗").red().bold());
            return Ok(());
        }

        let provider = llm::create_provider(&self.config)?;
        eprint!("  {} ({}): ", provider.name(), self.config.base_url());
        match provider.verify().await {
            Ok(()) => {
                eprintln!("{}", style("OK").green().bold());
                eprintln!(
                    "  Model '{}': {}",
                    self.config.model,
                    style("available").green()
                );
                match provider.context_length().await {
                    Some(n) => eprintln!("  Context length: {n} tokens"),
                    None => eprintln!("  Context length: unknown (default budget)"),
                }
            }
            Err(Error::OllamaNotRunning { .. }) => {
                eprintln!("{}", style("NOT RUNNING").red().bold());
                eprintln!("  Start with: {}", style("ollama serve").yellow());
            }
            Err(Error::ModelNotFound { ref available, .. }) => {
                eprintln!("{}", style("connected").green());
                eprintln!(
                    "  Model '{}': {}",
                    self.config.model,
                    style("NOT FOUND").red().bold()
                );
                if !available.is_empty() {
                    eprintln!("  Available: {}", available.join(", "));
                }
            }
            Err(e) => {
                eprintln!("{}: {}", style("ERROR").red().bold(), e);
            }
        }
        eprintln!();

        eprintln!("{} Diagnostics complete.", style("✓").green().bold());
        Ok(())
    }

    // ─── Output Helpers ───

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel_token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn spinner(message: String) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(template);
        }
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    fn print_status(&self, msg: &str) {
        eprintln!("{} {}", style("→").cyan(), msg);
    }

    fn print_info(&self, msg: &str) {
        eprintln!("{} {}", style("info:").cyan(), msg);
    }

    fn print_warning(&self, msg: &str) {
        eprintln!("{} {}", style("warning:").yellow().bold(), msg);
    }
}
