// logtriage - GPL-3.0-or-later
// This file is part of logtriage.
//
// Copyright (C) 2025 The logtriage authors
//
// logtriage is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// logtriage is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with logtriage.  If not, see <https://www.gnu.org/licenses/>.

use super::lexicon::{contains_any, FAIL_INDICATORS, PASS_INDICATORS};
use serde::{Deserialize, Serialize};

/// Result of a single test/log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Passed,
    Failed,
}

impl Outcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
        }
    }
}

/// Decide whether a line reports a pass, a failure, or neither.
///
/// Pass indicators are checked first, so a line mentioning both
/// (`"test passed but later failed"`) counts as passed.
#[must_use]
pub fn classify_line(text: &str) -> Option<Outcome> {
    let lowered = text.to_lowercase();

    if contains_any(&lowered, PASS_INDICATORS) {
        Some(Outcome::Passed)
    } else if contains_any(&lowered, FAIL_INDICATORS) {
        Some(Outcome::Failed)
    } else {
        None
    }
}
