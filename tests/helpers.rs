// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

/// One file section of a unified diff with the given added and removed lines.
#[allow(dead_code)]
pub fn file_diff(path: &str, added: usize, removed: usize) -> String {
    let mut out = format!(
        "diff --git a/{path} b/{path}\nindex 1111111..2222222 100644\n--- a/{path}\n+++ b/{path}\n@@ -1,{removed} +1,{added} @@\n"
    );
    for i in 0..removed {
        out.push_str(&format!("-old line {i}\n"));
    }
    for i in 0..added {
        out.push_str(&format!("+new line {i}\n"));
    }
    out
}

/// Concatenate file sections into one diff.
#[allow(dead_code)]
pub fn multi_file_diff(files: &[(&str, usize, usize)]) -> String {
    files
        .iter()
        .map(|(path, added, removed)| file_diff(path, *added, *removed))
        .collect()
}

/// A diff section whose added lines carry the given text.
#[allow(dead_code)]
pub fn diff_with_added(path: &str, lines: &[&str]) -> String {
    let mut out = format!(
        "diff --git a/{path} b/{path}\n--- a/{path}\n+++ b/{path}\n@@ -0,0 +1,{} @@\n",
        lines.len()
    );
    for line in lines {
        out.push('+');
        out.push_str(line);
        out.push('\n');
    }
    out
}
