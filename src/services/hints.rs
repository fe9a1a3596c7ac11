// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeSet;

use crate::domain::DiffStats;

const LARGE_SIDE_LINES: usize = 100;
const SMALL_SIDE_LINES: usize = 20;

/// Derives short context hints for the prompt from a diff and its stats.
pub struct ContextDetector {
    wip_keywords: Vec<String>,
}

impl ContextDetector {
    pub fn new(wip_keywords: &[String]) -> Self {
        Self {
            wip_keywords: wip_keywords
                .iter()
                .map(|kw| kw.trim().to_uppercase())
                .filter(|kw| !kw.is_empty())
                .collect(),
        }
    }

    /// Sorted, de-duplicated hints.
    pub fn detect(&self, diff: &str, stats: &DiffStats) -> Vec<String> {
        let mut hints = BTreeSet::new();

        for line in diff.lines() {
            let Some(content) = line.strip_prefix('+') else {
                continue;
            };
            if line.starts_with("+++") {
                continue;
            }
            let upper = content.to_uppercase();
            // First keyword per line only
            if let Some(keyword) = self.wip_keywords.iter().find(|kw| upper.contains(kw.as_str()))
            {
                hints.insert(format!("wip_keyword_{}", keyword.to_lowercase()));
            }
        }

        let flags = [
            (stats.has_tests, "tests_modified"),
            (stats.has_docs, "docs_modified"),
            (stats.has_config, "config_modified"),
            (stats.has_dependencies, "deps_modified"),
        ];
        for (set, hint) in flags {
            if set {
                hints.insert(hint.to_string());
            }
        }

        if stats.lines_added > LARGE_SIDE_LINES && stats.lines_removed < SMALL_SIDE_LINES {
            hints.insert("large_feature".to_string());
        }
        if stats.lines_removed > LARGE_SIDE_LINES && stats.lines_added < SMALL_SIDE_LINES {
            hints.insert("large_refactor_or_removal".to_string());
        }

        hints.into_iter().collect()
    }
}
