// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

mod commit;
mod context;
mod diff;

pub use commit::*;
pub use context::*;
pub use diff::*;
