// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::sync::LazyLock;

use regex::RegexSet;
use tracing::debug;

use crate::config::DiffConfig;
use crate::domain::{BudgetedDiff, DiffLimits, DiffStats, FileKind, NO_EXTENSION};

const FILE_HEADER: &str = "diff --git ";
const HUNK_HEADER: &str = "@@";

/// Path patterns per category, matched against the lower-cased path.
/// A path may fall into several categories.
const FILE_KIND_PATTERNS: &[(FileKind, &[&str])] = &[
    (
        FileKind::Test,
        &[r"test", r"spec", r"__tests?__", r"\.test\.", r"\.spec\."],
    ),
    (
        FileKind::Docs,
        &[
            r"readme",
            r"changelog",
            r"license",
            r"\.md$",
            r"\.txt$",
            r"\.rst$",
            r"(^|/)docs?/",
        ],
    ),
    (
        FileKind::Config,
        &[
            r"\.json$",
            r"\.ya?ml$",
            r"\.toml$",
            r"\.ini$",
            r"\.cfg$",
            r"\.conf$",
            r"(^|/)\.env(\.[a-z]+)?$",
        ],
    ),
    (
        FileKind::Dependency,
        &[
            r"(^|/)package\.json$",
            r"(^|/)package-lock\.json$",
            r"(^|/)yarn\.lock$",
            r"(^|/)pnpm-lock\.yaml$",
            r"(^|/)requirements[^/]*\.txt$",
            r"(^|/)pyproject\.toml$",
            r"(^|/)poetry\.lock$",
            r"(^|/)pipfile(\.lock)?$",
            r"(^|/)pom\.xml$",
            r"(^|/)build\.gradle(\.kts)?$",
            r"(^|/)cargo\.(toml|lock)$",
            r"(^|/)go\.(mod|sum)$",
            r"(^|/)gemfile(\.lock)?$",
            r"(^|/)composer\.(json|lock)$",
        ],
    ),
];

static FILE_KIND_SETS: LazyLock<Vec<(FileKind, RegexSet)>> = LazyLock::new(|| {
    FILE_KIND_PATTERNS
        .iter()
        .map(|(kind, patterns)| {
            (
                *kind,
                RegexSet::new(*patterns).expect("file kind patterns are valid"),
            )
        })
        .collect()
});

/// How the context window of a model translates into a diff budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetPolicy {
    pub default_max_lines: usize,
    pub default_max_chars: usize,
    pub context_reserve: usize,
    pub diff_share_percent: usize,
    pub chars_per_token: usize,
    pub chars_per_line: usize,
    pub max_chars: usize,
    pub min_chars: usize,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self::from(&DiffConfig::default())
    }
}

impl From<&DiffConfig> for BudgetPolicy {
    fn from(c: &DiffConfig) -> Self {
        Self {
            default_max_lines: c.default_max_lines,
            default_max_chars: c.default_max_chars,
            context_reserve: c.context_reserve,
            diff_share_percent: c.diff_share_percent,
            chars_per_token: c.chars_per_token,
            chars_per_line: c.chars_per_line,
            max_chars: c.max_chars,
            min_chars: c.min_chars,
        }
    }
}

/// Fits a staged diff into the budget a model can take.
pub struct DiffBudgeter {
    policy: BudgetPolicy,
}

impl DiffBudgeter {
    pub fn new(policy: BudgetPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BudgetPolicy {
        &self.policy
    }

    /// Line and character limits for a model with the given context length.
    pub fn compute_limits(&self, context_length: Option<usize>) -> DiffLimits {
        let p = &self.policy;

        let Some(context_length) = context_length else {
            return DiffLimits {
                lines: p.default_max_lines.max(1),
                chars: p.default_max_chars.max(1),
            };
        };

        let available_tokens = context_length.saturating_sub(p.context_reserve);
        let chars = available_tokens
            .saturating_mul(p.chars_per_token)
            .saturating_mul(p.diff_share_percent)
            / 100;

        let floor = p.min_chars.max(1);
        let chars = chars.min(p.max_chars).max(floor);
        let lines = (chars / p.chars_per_line.max(1)).max(1);

        DiffLimits { lines, chars }
    }

    /// Compute statistics for a unified diff. Never fails; unrecognized
    /// lines are simply not counted.
    pub fn analyze(diff: &str) -> DiffStats {
        let mut stats = DiffStats::default();

        for line in diff.lines() {
            if let Some(header) = line.strip_prefix(FILE_HEADER) {
                stats.files_changed += 1;
                if let Some(path) = Self::path_from_header(header) {
                    Self::classify(path, &mut stats);
                }
            } else if line.starts_with('+') && !line.starts_with("+++") {
                stats.lines_added += 1;
            } else if line.starts_with('-') && !line.starts_with("---") {
                stats.lines_removed += 1;
            }
        }

        stats
    }

    pub fn budget(&self, diff: &str, context_length: Option<usize>) -> BudgetedDiff {
        if diff.is_empty() {
            return BudgetedDiff::default();
        }

        let stats = Self::analyze(diff);
        let is_large = stats.is_large();
        let limits = self.compute_limits(context_length);

        let line_count = diff.lines().count();
        let char_count = diff.chars().count();

        let content = if line_count <= limits.lines && char_count <= limits.chars {
            diff.to_string()
        } else {
            let filtered = Self::filter_structural(diff, limits);
            debug!(
                original_lines = line_count,
                original_chars = char_count,
                kept_chars = filtered.chars().count(),
                line_limit = limits.lines,
                char_limit = limits.chars,
                "diff truncated to budget"
            );
            filtered
        };

        BudgetedDiff {
            content,
            stats,
            is_large,
        }
    }

    /// Keep file headers with their metadata and hunk headers, plus up to
    /// `limits.lines` +/- lines. The result never exceeds `limits.chars`.
    fn filter_structural(diff: &str, limits: DiffLimits) -> String {
        let mut output = String::new();
        let mut used_chars = 0usize;
        let mut kept_lines = 0usize;
        let mut kept_changes = 0usize;
        let mut in_file_header = false;

        for line in diff.split('\n') {
            let structural = if line.starts_with(FILE_HEADER) {
                in_file_header = true;
                true
            } else if line.starts_with(HUNK_HEADER) {
                in_file_header = false;
                true
            } else if in_file_header {
                // index, mode, rename, ---/+++ and "Binary files" lines
                true
            } else if line.starts_with('+') || line.starts_with('-') {
                if kept_changes >= limits.lines {
                    continue;
                }
                false
            } else {
                continue;
            };

            let separator = usize::from(kept_lines > 0);
            let line_chars = line.chars().count();

            if used_chars + separator + line_chars > limits.chars {
                if kept_lines == 0 && structural {
                    // Keep a char-safe prefix so the first header survives
                    output.extend(line.chars().take(limits.chars));
                }
                break;
            }

            if separator == 1 {
                output.push('\n');
            }
            output.push_str(line);
            used_chars += separator + line_chars;
            kept_lines += 1;
            if !structural {
                kept_changes += 1;
            }
        }

        output
    }

    /// `a/<path> b/<path>` -> `<path>`. Paths may contain spaces.
    fn path_from_header(header: &str) -> Option<&str> {
        let header = header.trim_end();
        if let Some(rest) = header.strip_prefix("a/") {
            let end = rest.find(" b/").unwrap_or(rest.len());
            return Some(&rest[..end]).filter(|p| !p.is_empty());
        }
        header.split_whitespace().next()
    }

    fn classify(path: &str, stats: &mut DiffStats) {
        *stats
            .file_types
            .entry(Self::extension_of(path))
            .or_insert(0) += 1;

        for kind in Self::kinds_of(path) {
            stats.mark(kind);
        }
    }

    /// Every category whose patterns match the path.
    pub fn kinds_of(path: &str) -> Vec<FileKind> {
        let lower = path.to_lowercase();
        FILE_KIND_SETS
            .iter()
            .filter(|(_, set)| set.is_match(&lower))
            .map(|(kind, _)| *kind)
            .collect()
    }

    fn extension_of(path: &str) -> String {
        let name = path.rsplit('/').next().unwrap_or(path);
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
            _ => NO_EXTENSION.to_string(),
        }
    }
}
