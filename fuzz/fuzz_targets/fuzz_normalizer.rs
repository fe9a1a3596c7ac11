// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

#![no_main]

use git_auto_commit::services::normalizer::ResponseNormalizer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let normalizer = ResponseNormalizer::new(72);
    let parsed = normalizer.normalize(raw);

    assert!(!parsed.subject.contains('\n'));
    assert!(parsed.is_valid || !parsed.warnings.is_empty());
});
