// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use super::BudgetedDiff;

#[derive(Debug)]
pub struct PromptContext {
    pub diff: String,
    pub hints: Vec<String>,
}

impl PromptContext {
    pub fn new(budgeted: &BudgetedDiff, hints: Vec<String>) -> Self {
        Self {
            diff: budgeted.content.clone(),
            hints,
        }
    }

    /// Hint line embedded ahead of the diff, if any hints are present.
    pub fn hint_line(&self) -> Option<String> {
        if self.hints.is_empty() {
            return None;
        }
        let mut hints: Vec<&str> = self.hints.iter().map(String::as_str).collect();
        hints.sort_unstable();
        hints.dedup();
        Some(format!("Context hints: {}", hints.join(", ")))
    }

    pub fn to_prompt(&self) -> String {
        let request = format!("Create a commit message for these changes:\n{}", self.diff);
        match self.hint_line() {
            Some(hints) => format!("An important context to consider: {hints}\n\n{request}"),
            None => request,
        }
    }
}
