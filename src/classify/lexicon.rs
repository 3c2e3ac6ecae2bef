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

//! Static keyword tables used by the classifiers.
//!
//! All keywords are lower-case and are matched as plain substrings against a
//! lower-cased copy of the line. Table order is significant wherever a
//! classifier resolves ties or precedence by position.

use super::error_type::ErrorType;

/// A single keyword and the points it contributes when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword {
    pub text: &'static str,
    pub weight: u32,
}

const fn weak(text: &'static str) -> Keyword {
    Keyword { text, weight: 1 }
}

const fn strong(text: &'static str) -> Keyword {
    Keyword { text, weight: 2 }
}

/// A category label with the keywords that vote for it.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub label: &'static str,
    pub keywords: &'static [Keyword],
}

impl KeywordRule {
    /// Number of keywords contained in `lowered`, ignoring weights.
    #[must_use]
    pub fn hits(&self, lowered: &str) -> u32 {
        self.keywords
            .iter()
            .filter(|kw| lowered.contains(kw.text))
            .count() as u32
    }

    /// Sum of the weights of all keywords contained in `lowered`.
    #[must_use]
    pub fn weighted_hits(&self, lowered: &str) -> u32 {
        self.keywords
            .iter()
            .filter(|kw| lowered.contains(kw.text))
            .map(|kw| kw.weight)
            .sum()
    }

    /// Keyword texts in table order.
    pub fn texts(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keywords.iter().map(|kw| kw.text)
    }
}

/// True if any of `needles` occurs in `lowered`.
#[must_use]
pub fn contains_any(lowered: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| lowered.contains(needle))
}

// ============================================================================
// Line outcome indicators
// ============================================================================

pub const PASS_INDICATORS: &[&str] = &[
    "passed",
    "success",
    "completed successfully",
    "test passed",
    "✓",
    "✅",
];

pub const FAIL_INDICATORS: &[&str] = &[
    "error",
    "exception",
    "failed",
    "timeout",
    "connection refused",
    "test failed",
    "✗",
    "❌",
    "fail",
];

/// Tokens used when tailing a log for recent error lines.
pub const ERROR_TAIL_INDICATORS: &[&str] = &["error", "exception", "failed"];

// ============================================================================
// Error types, in precedence order
// ============================================================================

pub const ERROR_TYPE_TRIGGERS: [(ErrorType, &[&str]); 10] = [
    (
        ErrorType::Connection,
        &["timeout", "connection refused", "connect", "network"],
    ),
    (
        ErrorType::Runtime,
        &["null pointer", "undefined", "index out of range", "null reference"],
    ),
    (
        ErrorType::Security,
        &["authentication", "unauthorized", "forbidden", "auth"],
    ),
    (
        ErrorType::Database,
        &["database", "sql", "query", "mysql", "postgresql"],
    ),
    (ErrorType::Protocol, &["soap", "soapfault", "xml"]),
    (
        ErrorType::RateLimit,
        &["rate limit", "throttle", "too many requests"],
    ),
    (
        ErrorType::Validation,
        &["validation", "invalid", "format", "parse"],
    ),
    (ErrorType::Memory, &["memory", "out of memory", "heap"]),
    (ErrorType::File, &["file", "file not found", "io", "path"]),
    (ErrorType::Permission, &["permission", "access denied"]),
];

// ============================================================================
// Developer roles (keyword-count routing), in tie-break order
// ============================================================================

pub const FRONTEND_DEVELOPER: &str = "Frontend developer";
pub const BACKEND_DEVELOPER: &str = "Backend developer";
pub const AI_ML_DEVELOPER: &str = "Ai-ML developer";
pub const DATABASE_DEVELOPER: &str = "Database developer";
pub const TESTER: &str = "Tester";

pub static ROLE_RULES: [KeywordRule; 5] = [
    KeywordRule {
        label: FRONTEND_DEVELOPER,
        keywords: &[
            weak("frontend"),
            weak("javascript"),
            weak("react"),
            weak("angular"),
            weak("vue"),
            weak("css"),
            weak("html"),
            weak("dom"),
            weak("browser"),
            weak("ui"),
            weak("client"),
        ],
    },
    KeywordRule {
        label: BACKEND_DEVELOPER,
        keywords: &[
            weak("backend"),
            weak("python"),
            weak("java"),
            weak("nodejs"),
            weak("php"),
            weak("api"),
            weak("server"),
            weak("endpoint"),
            weak("controller"),
            weak("service"),
            weak("route"),
            weak("middleware"),
        ],
    },
    KeywordRule {
        label: AI_ML_DEVELOPER,
        keywords: &[
            weak("ai"),
            weak("ml"),
            weak("machine learning"),
            weak("model"),
            weak("training"),
            weak("inference"),
            weak("neural"),
            weak("deep learning"),
            weak("artificial intelligence"),
        ],
    },
    KeywordRule {
        label: DATABASE_DEVELOPER,
        keywords: &[
            weak("database"),
            weak("sql"),
            weak("mysql"),
            weak("postgresql"),
            weak("mongodb"),
            weak("query"),
            weak("table"),
            weak("index"),
            weak("db_"),
            weak("database_"),
            weak("deadlock"),
        ],
    },
    KeywordRule {
        label: TESTER,
        keywords: &[
            weak("test"),
            weak("qa"),
            weak("quality"),
            weak("assertion"),
            weak("verification"),
            weak("validation"),
            weak("tester"),
            weak("testcase"),
            weak("test case"),
        ],
    },
];

// ============================================================================
// Technical domains (weighted routing), in tie-break order
// ============================================================================

pub static DOMAIN_RULES: [KeywordRule; 6] = [
    KeywordRule {
        label: "Database",
        keywords: &[
            strong("sql"),
            strong("mysql"),
            strong("postgresql"),
            strong("mongodb"),
            weak("database"),
            weak("connection"),
            weak("timeout"),
            weak("deadlock"),
            weak("query"),
            weak("table"),
            weak("index"),
            weak("db_"),
            weak("database_"),
        ],
    },
    KeywordRule {
        label: "Frontend",
        keywords: &[
            strong("javascript"),
            strong("react"),
            strong("angular"),
            strong("vue"),
            weak("css"),
            weak("html"),
            weak("dom"),
            weak("browser"),
            weak("frontend"),
            weak("ui"),
            weak("component"),
            weak("jsx"),
            weak("tsx"),
            weak("client-side"),
        ],
    },
    KeywordRule {
        label: "Backend",
        keywords: &[
            strong("python"),
            strong("java"),
            strong("nodejs"),
            strong("php"),
            weak("api"),
            weak("server"),
            weak("endpoint"),
            weak("backend"),
            weak("controller"),
            weak("service"),
            weak("route"),
            weak("middleware"),
        ],
    },
    KeywordRule {
        label: "Devops",
        keywords: &[
            strong("docker"),
            strong("kubernetes"),
            strong("aws"),
            strong("azure"),
            weak("deployment"),
            weak("infrastructure"),
            weak("ci/cd"),
            weak("pipeline"),
            weak("jenkins"),
            weak("gitlab"),
        ],
    },
    KeywordRule {
        label: "Security",
        keywords: &[
            strong("authentication"),
            strong("authorization"),
            strong("ssl"),
            weak("encryption"),
            weak("firewall"),
            weak("security"),
            weak("token"),
            weak("password"),
            weak("jwt"),
            weak("oauth"),
        ],
    },
    KeywordRule {
        label: "Network",
        keywords: &[
            strong("connection"),
            strong("timeout"),
            strong("dns"),
            weak("http"),
            weak("https"),
            weak("proxy"),
            weak("network"),
            weak("socket"),
            weak("tcp"),
            weak("udp"),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_lowercase() {
        let all_rules = ROLE_RULES.iter().chain(DOMAIN_RULES.iter());
        for rule in all_rules {
            for text in rule.texts() {
                assert_eq!(text, text.to_lowercase(), "{} has {text}", rule.label);
            }
        }
        for (error_type, triggers) in ERROR_TYPE_TRIGGERS {
            for trigger in triggers {
                assert_eq!(*trigger, trigger.to_lowercase(), "{error_type:?}");
            }
        }
    }

    #[test]
    fn test_overlapping_keywords_count_independently() {
        let database = &ROLE_RULES[3];
        // "database", "database_" and "db_" are all substrings here
        assert_eq!(database.hits("database_pool db_main"), 3);
    }

    #[test]
    fn test_weighted_hits() {
        let database = &DOMAIN_RULES[0];
        // sql (2) + mysql (2) + query (1)
        assert_eq!(database.weighted_hits("mysql query"), 5);
        assert_eq!(database.hits("mysql query"), 3);
    }
}
