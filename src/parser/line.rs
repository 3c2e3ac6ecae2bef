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

use crate::classify::Outcome;
use chrono::{DateTime, Local};
use serde::Serialize;

/// One line of the source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    /// 1-based position in the source file
    pub line_number: usize,
    /// Line text with surrounding whitespace removed
    pub content: String,
}

impl LogLine {
    pub fn new(content: &str, line_number: usize) -> Self {
        Self {
            line_number,
            content: content.trim().to_string(),
        }
    }
}

/// A line that reported a pass or a failure
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedLine {
    #[serde(flatten)]
    pub line: LogLine,
    #[serde(rename = "status")]
    pub outcome: Outcome,
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Local>,
}

impl ClassifiedLine {
    pub const fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed)
    }

    pub fn content(&self) -> &str {
        &self.line.content
    }

    pub const fn line_number(&self) -> usize {
        self.line.line_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let line = ClassifiedLine {
            line: LogLine::new("  [FAIL] DB test - FAILED \t", 3),
            outcome: Outcome::Failed,
            captured_at: Local::now(),
        };
        assert!(line.is_failed());

        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["line_number"], 3);
        assert_eq!(json["content"], "[FAIL] DB test - FAILED");
        assert_eq!(json["status"], "FAILED");
        assert!(json["timestamp"].is_string());
    }
}
