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

//! Log scanning: turns raw file content into passed and failed lines.

pub mod line;

use crate::classify::lexicon::{contains_any, ERROR_TAIL_INDICATORS};
use crate::classify::classify_line;
use chrono::Local;
use line::{ClassifiedLine, LogLine};
use std::borrow::Cow;

/// Characters ending a line, besides `\r\n` which counts as one break
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Split content on every line terminator, including a lone `\r`.
///
/// A trailing terminator does not produce an extra empty line.
pub fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    let mut rest = content;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(pos) = rest.find(LINE_BREAKS) else {
            return Some(std::mem::take(&mut rest));
        };
        let (line, tail) = rest.split_at(pos);
        let width = if tail.starts_with("\r\n") {
            2
        } else {
            tail.chars().next().map_or(0, char::len_utf8)
        };
        rest = &tail[width..];
        Some(line)
    })
}

/// Decode uploaded bytes, replacing invalid UTF-8 sequences.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Scan file content into classified lines, in file order.
///
/// Lines that report neither a pass nor a failure are dropped, but still
/// advance the line counter so numbers match the source file.
pub fn scan(content: &str) -> Vec<ClassifiedLine> {
    let captured_at = Local::now();

    let classified: Vec<ClassifiedLine> = split_lines(content)
        .enumerate()
        .filter_map(|(idx, raw)| {
            classify_line(raw).map(|outcome| ClassifiedLine {
                line: LogLine::new(raw, idx + 1),
                outcome,
                captured_at,
            })
        })
        .collect();

    tracing::debug!(
        "Scanned {} lines, {} classified",
        split_lines(content).count(),
        classified.len()
    );
    classified
}

/// Last `limit` lines mentioning an error, exception or failure.
pub fn recent_errors(content: &str, limit: usize) -> Vec<String> {
    let matching: Vec<&str> = split_lines(content)
        .filter(|line| contains_any(&line.to_lowercase(), ERROR_TAIL_INDICATORS))
        .collect();

    let skip = matching.len().saturating_sub(limit);
    matching
        .into_iter()
        .skip(skip)
        .map(|line| line.trim().to_string())
        .collect()
}
