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


//! Health of the external collaborators, as reported by the status surface.

use serde::Serialize;

/// Result of probing one collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Health {
    Connected { detail: String },
    Failed { reason: String },
    Unconfigured,
}

impl Health {
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// One-line description for `service`
    pub fn describe(&self, service: &str) -> String {
        match self {
            Self::Connected { detail } => format!("{service}: {detail}"),
            Self::Failed { reason } => format!("{service}: connection failed ({reason})"),
            Self::Unconfigured => format!("{service}: not configured"),
        }
    }
}

/// Snapshot served by `status` and `GET /api/status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub jira_status: String,
    pub ai_status: String,
    pub server: String,
    pub project_key: String,
    pub jira_connected: bool,
    pub jira: Health,
    pub ai: Health,
}

impl StatusReport {
    pub fn new(jira: Health, ai: Health, project_key: &str) -> Self {
        Self {
            jira_status: jira.describe("Jira"),
            ai_status: ai.describe("AI"),
            server: server_line(),
            project_key: project_key.to_string(),
            jira_connected: jira.is_connected(),
            jira,
            ai,
        }
    }

    /// Report used before the first probe has finished
    pub fn pending(project_key: &str) -> Self {
        let pending = || Health::Failed {
            reason: "not probed yet".to_string(),
        };
        Self::new(pending(), pending(), project_key)
    }
}

/// Version line embedded at build time
pub fn server_line() -> String {
    format!(
        "logtriage {} ({}) running",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let connected = Health::Connected {
            detail: "project OPS reachable".to_string(),
        };
        assert_eq!(connected.describe("Jira"), "Jira: project OPS reachable");
        assert_eq!(Health::Unconfigured.describe("AI"), "AI: not configured");
        assert!(Health::Failed {
            reason: "HTTP 401".to_string()
        }
        .describe("Jira")
        .contains("HTTP 401"));
    }

    #[test]
    fn test_report_flags_jira_connection() {
        let report = StatusReport::new(
            Health::Connected {
                detail: "ok".to_string(),
            },
            Health::Unconfigured,
            "QA",
        );
        assert!(report.jira_connected);
        assert_eq!(report.project_key, "QA");
        assert!(!StatusReport::pending("QA").jira_connected);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ai"]["state"], "unconfigured");
        assert_eq!(json["jira"]["state"], "connected");
    }
}
