// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

pub struct GitService {
    repo: gix::Repository,
    work_dir: PathBuf,
}

impl GitService {
    pub fn discover() -> Result<Self> {
        Self::discover_at(".")
    }

    pub fn discover_at(path: impl AsRef<Path>) -> Result<Self> {
        let repo = gix::discover(path.as_ref()).map_err(|_| Error::NotAGitRepo)?;

        let work_dir = repo
            .workdir()
            .ok_or_else(|| Error::Git("Bare repository not supported".into()))?
            .to_path_buf();

        Ok(Self { repo, work_dir })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn check_state(&self) -> Result<()> {
        let state = self.repo.state();
        if matches!(state, Some(gix::state::InProgress::Merge)) {
            return Err(Error::MergeInProgress);
        }
        Ok(())
    }

    /// Names of staged files, one per entry.
    pub async fn staged_files(&self) -> Result<Vec<String>> {
        let stdout = self.run(&["diff", "--cached", "--name-only"]).await?;
        Ok(stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Full unified diff of the index against HEAD.
    pub async fn staged_diff(&self) -> Result<String> {
        self.check_state()?;

        let files = self.staged_files().await?;
        if files.is_empty() {
            return Err(Error::NoStagedChanges);
        }
        debug!(files = %files.join(", "), "staged files");

        // --no-ext-diff: don't use external diff tools
        let diff = self
            .run(&["diff", "--cached", "--no-ext-diff", "--no-color", "--unified=3"])
            .await?;

        if diff.trim().is_empty() {
            return Err(Error::NoStagedChanges);
        }

        Ok(diff)
    }

    pub async fn commit(&self, message: &str) -> Result<()> {
        let output = Command::new("git")
            .args(["commit", "-m", message])
            .current_dir(&self.work_dir)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(stderr.trim().to_string()));
        }

        debug!(subject = message.lines().next().unwrap_or(""), "commit created");
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
