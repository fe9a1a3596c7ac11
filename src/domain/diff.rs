// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeMap;

/// Added plus removed lines above which a change counts as large.
pub const LARGE_CHANGE_LINES: usize = 50;

/// Files touched above which a change counts as large.
pub const LARGE_CHANGE_FILES: usize = 10;

/// File-type key used for paths without an extension.
pub const NO_EXTENSION: &str = "no_extension";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Test,
    Docs,
    Config,
    Dependency,
}

/// Aggregate statistics for one staged diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files_changed: usize,
    pub lines_added: usize,
    pub lines_removed: usize,
    /// Lower-cased extension -> number of files
    pub file_types: BTreeMap<String, usize>,
    pub has_tests: bool,
    pub has_docs: bool,
    pub has_config: bool,
    pub has_dependencies: bool,
}

impl DiffStats {
    /// Whether the change volume is big enough to call out, independent of
    /// any transport budget.
    pub fn is_large(&self) -> bool {
        self.lines_added + self.lines_removed > LARGE_CHANGE_LINES
            || self.files_changed > LARGE_CHANGE_FILES
    }

    pub fn mark(&mut self, kind: FileKind) {
        match kind {
            FileKind::Test => self.has_tests = true,
            FileKind::Docs => self.has_docs = true,
            FileKind::Config => self.has_config = true,
            FileKind::Dependency => self.has_dependencies = true,
        }
    }
}

/// Line and character budget for the diff embedded in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffLimits {
    pub lines: usize,
    pub chars: usize,
}

/// The diff text actually sent to the model, with its statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetedDiff {
    pub content: String,
    pub stats: DiffStats,
    pub is_large: bool,
}

impl BudgetedDiff {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
