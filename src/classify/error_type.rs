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

//! Error type and severity inference for failing lines.

use super::lexicon::{contains_any, ERROR_TYPE_TRIGGERS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "Connection Error")]
    Connection,
    #[serde(rename = "Runtime Error")]
    Runtime,
    #[serde(rename = "Security Error")]
    Security,
    #[serde(rename = "Database Error")]
    Database,
    #[serde(rename = "Protocol Error")]
    Protocol,
    #[serde(rename = "Rate Limit Error")]
    RateLimit,
    #[serde(rename = "Validation Error")]
    Validation,
    #[serde(rename = "Memory Error")]
    Memory,
    #[serde(rename = "File Error")]
    File,
    #[serde(rename = "Permission Error")]
    Permission,
    #[serde(rename = "General Error")]
    General,
}

impl ErrorType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connection => "Connection Error",
            Self::Runtime => "Runtime Error",
            Self::Security => "Security Error",
            Self::Database => "Database Error",
            Self::Protocol => "Protocol Error",
            Self::RateLimit => "Rate Limit Error",
            Self::Validation => "Validation Error",
            Self::Memory => "Memory Error",
            Self::File => "File Error",
            Self::Permission => "Permission Error",
            Self::General => "General Error",
        }
    }

    pub const fn severity(self) -> Severity {
        match self {
            Self::Security => Severity::Critical,
            Self::Connection
            | Self::Runtime
            | Self::Database
            | Self::Protocol
            | Self::Memory
            | Self::Permission => Severity::High,
            Self::RateLimit | Self::Validation | Self::File | Self::General => Severity::Medium,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity of a failure, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error type and severity inferred for one failing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorVerdict {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub severity: Severity,
}

/// Infer the error type of a failing line.
///
/// Triggers are checked in precedence order and the first category with a
/// matching substring wins, so `"timeout talking to database"` is a
/// connection error rather than a database error.
#[must_use]
pub fn infer(text: &str) -> ErrorVerdict {
    let lowered = text.to_lowercase();
    let error_type = ERROR_TYPE_TRIGGERS
        .iter()
        .find(|(_, triggers)| contains_any(&lowered, triggers))
        .map_or(ErrorType::General, |(error_type, _)| *error_type);

    ErrorVerdict {
        error_type,
        severity: error_type.severity(),
    }
}
