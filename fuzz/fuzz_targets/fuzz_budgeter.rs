// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

#![no_main]

use git_auto_commit::services::budget::{BudgetPolicy, DiffBudgeter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Option<u16>, &str)| {
    let (context_length, diff) = input;
    let budgeter = DiffBudgeter::new(BudgetPolicy::default());
    let context_length = context_length.map(usize::from);

    let limits = budgeter.compute_limits(context_length);
    let budgeted = budgeter.budget(diff, context_length);

    assert!(limits.lines >= 1 && limits.chars >= 1);
    if budgeted.content != diff {
        assert!(budgeted.content.chars().count() <= limits.chars);
    }
    assert_eq!(budgeted.stats, DiffBudgeter::analyze(diff));
});
