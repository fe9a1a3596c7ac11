// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
    Revert,
}

impl CommitType {
    pub const ALL: &'static [&'static str] = &[
        "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore",
        "revert",
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "feat" => Some(Self::Feat),
            "fix" => Some(Self::Fix),
            "docs" => Some(Self::Docs),
            "style" => Some(Self::Style),
            "refactor" => Some(Self::Refactor),
            "perf" => Some(Self::Perf),
            "test" => Some(Self::Test),
            "build" => Some(Self::Build),
            "ci" => Some(Self::Ci),
            "chore" => Some(Self::Chore),
            "revert" => Some(Self::Revert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Docs => "docs",
            Self::Style => "style",
            Self::Refactor => "refactor",
            Self::Perf => "perf",
            Self::Test => "test",
            Self::Build => "build",
            Self::Ci => "ci",
            Self::Chore => "chore",
            Self::Revert => "revert",
        }
    }

    /// Types whose commits usually deserve a body.
    pub fn wants_description(&self) -> bool {
        matches!(self, Self::Feat | Self::Fix | Self::Refactor | Self::Perf)
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized commit message plus the outcome of validating it.
///
/// Validation problems are reported through `warnings`; an invalid commit
/// is still a usable value that the user may accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub subject: String,
    pub description: Option<String>,
    pub is_valid: bool,
    pub warnings: Vec<String>,
}

impl ParsedCommit {
    /// Full message text for `git commit -m`.
    pub fn to_message(&self) -> String {
        match &self.description {
            Some(body) => format!("{}\n\n{}", self.subject, body),
            None => self.subject.clone(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.subject.split_whitespace().count()
            + self
                .description
                .as_deref()
                .map_or(0, |d| d.split_whitespace().count())
    }

    pub fn char_count(&self) -> usize {
        self.subject.chars().count()
            + self.description.as_deref().map_or(0, |d| d.chars().count())
    }
}
