// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

mod helpers;

use git_auto_commit::domain::{DiffLimits, DiffStats, FileKind, NO_EXTENSION};
use git_auto_commit::services::budget::{BudgetPolicy, DiffBudgeter};
use helpers::{file_diff, multi_file_diff};
use proptest::prelude::*;

fn budgeter() -> DiffBudgeter {
    DiffBudgeter::new(BudgetPolicy::default())
}

fn tight_budgeter(lines: usize, chars: usize) -> DiffBudgeter {
    DiffBudgeter::new(BudgetPolicy {
        default_max_lines: lines,
        default_max_chars: chars,
        ..BudgetPolicy::default()
    })
}

// ─── compute_limits ──────────────────────────────────────────────────────────

#[test]
fn limits_without_context_length_use_defaults() {
    assert_eq!(
        budgeter().compute_limits(None),
        DiffLimits {
            lines: 100,
            chars: 8000
        }
    );
}

#[test]
fn limits_scale_with_context_length() {
    // (8192 - 4000) tokens * 4 chars * 80%
    assert_eq!(
        budgeter().compute_limits(Some(8192)),
        DiffLimits {
            lines: 167,
            chars: 13_414
        }
    );
}

#[test]
fn limits_are_capped_for_huge_windows() {
    assert_eq!(
        budgeter().compute_limits(Some(1_000_000)),
        DiffLimits {
            lines: 250,
            chars: 20_000
        }
    );
}

#[test]
fn limits_have_a_floor_for_tiny_windows() {
    for ctx in [0, 1, 512, 4000] {
        assert_eq!(
            budgeter().compute_limits(Some(ctx)),
            DiffLimits {
                lines: 10,
                chars: 800
            },
            "context length {ctx}"
        );
    }
}

#[test]
fn policy_comes_from_config() {
    let config = git_auto_commit::config::DiffConfig {
        default_max_lines: 42,
        ..Default::default()
    };
    let budgeter = DiffBudgeter::new(BudgetPolicy::from(&config));
    assert_eq!(budgeter.policy().default_max_lines, 42);
    assert_eq!(budgeter.compute_limits(None).lines, 42);
}

// ─── analyze ─────────────────────────────────────────────────────────────────

#[test]
fn analyze_counts_files_and_lines() {
    let diff = multi_file_diff(&[("src/main.rs", 3, 2), ("src/lib.rs", 1, 0)]);
    let stats = DiffBudgeter::analyze(&diff);

    assert_eq!(stats.files_changed, 2);
    assert_eq!(stats.lines_added, 4);
    assert_eq!(stats.lines_removed, 2);
    assert_eq!(stats.file_types.get("rs"), Some(&2));
    assert!(!stats.has_tests && !stats.has_docs && !stats.has_config && !stats.has_dependencies);
}

#[test]
fn analyze_ignores_file_markers() {
    let diff = "diff --git a/a.txt b/a.txt\n--- a/a.txt\n+++ b/a.txt\n@@ -1 +1 @@\n-x\n+y\n";
    let stats = DiffBudgeter::analyze(diff);
    assert_eq!(stats.lines_added, 1);
    assert_eq!(stats.lines_removed, 1);
}

#[test]
fn analyze_classifies_files() {
    let diff = multi_file_diff(&[
        ("tests/api_test.py", 1, 0),
        ("README.md", 1, 0),
        ("config/settings.yaml", 1, 0),
        ("Cargo.toml", 1, 0),
    ]);
    let stats = DiffBudgeter::analyze(&diff);

    assert!(stats.has_tests);
    assert!(stats.has_docs);
    assert!(stats.has_config);
    assert!(stats.has_dependencies);
    assert_eq!(stats.file_types.get("py"), Some(&1));
    assert_eq!(stats.file_types.get("md"), Some(&1));
    assert_eq!(stats.file_types.get("yaml"), Some(&1));
    assert_eq!(stats.file_types.get("toml"), Some(&1));
}

#[test]
fn analyze_uses_sentinel_for_missing_extension() {
    let diff = multi_file_diff(&[("Makefile", 1, 0), (".gitignore", 1, 0)]);
    let stats = DiffBudgeter::analyze(&diff);
    assert_eq!(stats.file_types.get(NO_EXTENSION), Some(&2));
}

#[test]
fn analyze_handles_paths_with_spaces() {
    let diff = file_diff("docs/user guide.md", 1, 0);
    let stats = DiffBudgeter::analyze(&diff);
    assert_eq!(stats.file_types.get("md"), Some(&1));
    assert!(stats.has_docs);
}

#[test]
fn kinds_of_is_case_insensitive() {
    assert_eq!(DiffBudgeter::kinds_of("CHANGELOG"), vec![FileKind::Docs]);
    assert!(DiffBudgeter::kinds_of("package.json").contains(&FileKind::Dependency));
    assert!(DiffBudgeter::kinds_of("package.json").contains(&FileKind::Config));
    assert!(DiffBudgeter::kinds_of("src/app.rs").is_empty());
}

#[test]
fn analyze_garbage_yields_empty_stats() {
    let stats = DiffBudgeter::analyze("not a diff\n\u{0}\u{1}");
    assert_eq!(stats, DiffStats::default());
}

#[test]
fn analyze_is_order_independent() {
    let forward = multi_file_diff(&[("a.rs", 3, 1), ("b.md", 2, 0), ("c.toml", 0, 4)]);
    let backward = multi_file_diff(&[("c.toml", 0, 4), ("b.md", 2, 0), ("a.rs", 3, 1)]);
    assert_eq!(
        DiffBudgeter::analyze(&forward),
        DiffBudgeter::analyze(&backward)
    );
}

// ─── is_large ────────────────────────────────────────────────────────────────

#[test]
fn is_large_line_boundary() {
    let at = DiffStats {
        lines_added: 25,
        lines_removed: 25,
        ..Default::default()
    };
    let over = DiffStats {
        lines_added: 26,
        lines_removed: 25,
        ..Default::default()
    };
    assert!(!at.is_large());
    assert!(over.is_large());
}

#[test]
fn is_large_file_boundary() {
    let at = DiffStats {
        files_changed: 10,
        ..Default::default()
    };
    let over = DiffStats {
        files_changed: 11,
        ..Default::default()
    };
    assert!(!at.is_large());
    assert!(over.is_large());
}

#[test]
fn budget_reports_is_large() {
    assert!(!budgeter().budget(&file_diff("a.rs", 50, 0), None).is_large);
    assert!(budgeter().budget(&file_diff("a.rs", 51, 0), None).is_large);

    let paths: Vec<(String, usize, usize)> =
        (0..11).map(|i| (format!("f{i}.rs"), 1, 0)).collect();
    let files: Vec<(&str, usize, usize)> =
        paths.iter().map(|(p, a, r)| (p.as_str(), *a, *r)).collect();
    assert!(!budgeter().budget(&multi_file_diff(&files[..10]), None).is_large);
    assert!(budgeter().budget(&multi_file_diff(&files), None).is_large);
}

// ─── budget ──────────────────────────────────────────────────────────────────

#[test]
fn empty_diff_gives_empty_result() {
    let budgeted = budgeter().budget("", Some(8192));
    assert!(budgeted.is_empty());
    assert_eq!(budgeted.stats, DiffStats::default());
    assert!(!budgeted.is_large);
}

#[test]
fn small_diff_passes_through() {
    let diff = file_diff("src/main.rs", 5, 3);
    let budgeted = budgeter().budget(&diff, None);
    assert_eq!(budgeted.content, diff);
    assert_eq!(budgeted.stats.lines_added, 5);
}

#[test]
fn diff_at_exact_line_limit_passes_through() {
    // 5 header lines + 95 changes, newline-terminated like git output
    let diff = file_diff("src/main.rs", 95, 0);
    assert_eq!(diff.lines().count(), 100);
    assert!(diff.ends_with('\n'));

    let budgeted = budgeter().budget(&diff, None);
    assert_eq!(budgeted.content, diff);
}

#[test]
fn diff_with_context_lines_at_line_limit_keeps_them() {
    let mut diff = String::from(
        "diff --git a/src/lib.rs b/src/lib.rs\n--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,6 +1,6 @@\n",
    );
    for i in 0..3 {
        diff.push_str(&format!(" context {i}\n"));
    }
    diff.push_str("-old\n+new\n");
    assert_eq!(diff.lines().count(), 9);

    let budgeted = tight_budgeter(9, 100_000).budget(&diff, None);
    assert_eq!(budgeted.content, diff);
    assert!(budgeted.content.contains(" context 2\n"));
}

#[test]
fn diff_one_line_over_the_limit_is_filtered() {
    let diff = file_diff("src/main.rs", 96, 0);
    let budgeted = budgeter().budget(&diff, None);

    // Filtering drops the trailing newline; all 96 changes fit the cap
    assert_ne!(budgeted.content, diff);
    assert_eq!(budgeted.content, diff.trim_end_matches('\n'));
}

#[test]
fn diff_at_exact_char_limit_passes_through() {
    let diff = file_diff("src/main.rs", 10, 4);
    let chars = diff.chars().count();

    let at = tight_budgeter(1000, chars).budget(&diff, None);
    assert_eq!(at.content, diff);

    let over = tight_budgeter(1000, chars - 1).budget(&diff, None);
    assert_ne!(over.content, diff);
    assert!(over.content.chars().count() < chars);
}

#[test]
fn large_diff_respects_char_limit_and_keeps_headers() {
    let diff = multi_file_diff(&[
        ("src/a.rs", 400, 100),
        ("src/b.rs", 300, 0),
        ("src/c.rs", 0, 200),
    ]);
    let limits = budgeter().compute_limits(None);
    let budgeted = budgeter().budget(&diff, None);

    assert_ne!(budgeted.content, diff);
    assert!(budgeted.content.chars().count() <= limits.chars);
    assert!(budgeted.content.starts_with("diff --git a/src/a.rs b/src/a.rs"));
    assert!(budgeted.content.contains("@@ -1,100 +1,400 @@"));
    // Stats always describe the whole diff
    assert_eq!(budgeted.stats.lines_added, 700);
}

#[test]
fn truncation_limits_change_lines() {
    let diff = file_diff("src/a.rs", 300, 0);
    let budgeted = tight_budgeter(20, 100_000).budget(&diff, None);

    let changes = budgeted
        .content
        .lines()
        .filter(|l| l.starts_with("+new"))
        .count();
    assert_eq!(changes, 20);
    assert!(budgeted.content.contains("+++ b/src/a.rs"));
}

#[test]
fn later_headers_survive_once_change_lines_run_out() {
    let diff = multi_file_diff(&[("src/a.rs", 300, 0), ("src/b.rs", 300, 0)]);
    let budgeted = tight_budgeter(10, 100_000).budget(&diff, None);
    assert!(budgeted.content.contains("diff --git a/src/b.rs b/src/b.rs"));
}

#[test]
fn oversized_first_header_is_cut_on_a_char_boundary() {
    let path = "ドキュメント/説明書/とても長いファイル名.md";
    let diff = file_diff(path, 200, 0);
    let budgeted = tight_budgeter(5, 20).budget(&diff, None);

    let header = format!("diff --git a/{path} b/{path}");
    let expected: String = header.chars().take(20).collect();
    assert_eq!(budgeted.content, expected);
}

#[test]
fn multibyte_changes_stay_within_bound() {
    let mut diff = String::from("diff --git a/i18n.txt b/i18n.txt\n@@ -0,0 +1,200 @@\n");
    for _ in 0..200 {
        diff.push_str("+héllo wörld 🚀 ünïcödé\n");
    }
    let budgeted = tight_budgeter(1000, 300).budget(&diff, None);
    assert!(budgeted.content.chars().count() <= 300);
    assert!(budgeted.content.starts_with("diff --git"));
}

// ─── Property tests ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn budget_never_panics(diff in any::<String>(), ctx in any::<Option<usize>>()) {
        let _ = budgeter().budget(&diff, ctx);
    }

    #[test]
    fn limits_are_always_positive(ctx in any::<Option<usize>>()) {
        let limits = budgeter().compute_limits(ctx);
        prop_assert!(limits.lines >= 1);
        prop_assert!(limits.chars >= 1);
    }

    #[test]
    fn content_never_exceeds_char_limit(diff in any::<String>(), ctx in proptest::option::of(0usize..200_000)) {
        let b = budgeter();
        let limits = b.compute_limits(ctx);
        let budgeted = b.budget(&diff, ctx);
        prop_assert!(budgeted.content.chars().count() <= limits.chars);
    }

    #[test]
    fn analyze_is_deterministic(diff in any::<String>()) {
        prop_assert_eq!(DiffBudgeter::analyze(&diff), DiffBudgeter::analyze(&diff));
    }

    #[test]
    fn analyze_counts_generated_diffs(
        files in proptest::collection::vec(("[a-z]{1,8}\\.(rs|md|toml)", 0usize..30, 0usize..30), 1..8)
    ) {
        let refs: Vec<(&str, usize, usize)> =
            files.iter().map(|(p, a, r)| (p.as_str(), *a, *r)).collect();
        let stats = DiffBudgeter::analyze(&multi_file_diff(&refs));

        prop_assert_eq!(stats.files_changed, files.len());
        prop_assert_eq!(stats.lines_added, files.iter().map(|f| f.1).sum::<usize>());
        prop_assert_eq!(stats.lines_removed, files.iter().map(|f| f.2).sum::<usize>());
    }

    #[test]
    fn diff_within_both_limits_is_unchanged(
        added in 0usize..60,
        removed in 0usize..60,
        spare_lines in 0usize..5,
        spare_chars in 0usize..50
    ) {
        let diff = file_diff("src/within.rs", added, removed);
        let b = tight_budgeter(
            diff.lines().count() + spare_lines,
            diff.chars().count() + spare_chars,
        );
        prop_assert_eq!(b.budget(&diff, None).content, diff);
    }

    #[test]
    fn truncated_diff_keeps_a_file_header(
        added in 200usize..600,
        ctx in proptest::option::of(0usize..50_000)
    ) {
        let diff = file_diff("src/generated.rs", added, 0);
        let budgeted = budgeter().budget(&diff, ctx);
        prop_assert!(budgeted.content.starts_with("diff --git a/src/generated.rs"));
    }
}
