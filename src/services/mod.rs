// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

pub mod budget;
pub mod git;
pub mod hints;
pub mod llm;
pub mod normalizer;
