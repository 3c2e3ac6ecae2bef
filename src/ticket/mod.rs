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


//! Issue tracker integration.
//!
//! [`TicketRequest`] carries the rendered bug report; a [`TicketTracker`]
//! files it and hands back a [`TicketRef`]. Failures never abort a run.

pub mod jira;
pub mod roster;

use crate::classify::{ErrorVerdict, Severity};
use crate::config::JiraConfig;
use crate::core::status::Health;
use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

pub use jira::JiraTracker;
pub use roster::{Developer, Roster};

const SUMMARY_PREFIX_CHARS: usize = 50;
const MANUAL_SUMMARY_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketingFailure {
    #[error("issue tracker not configured")]
    Unconfigured,
    #[error("issue tracker unreachable: {0}")]
    Unreachable(String),
    #[error("issue tracker request timed out")]
    Timeout,
    #[error("issue tracker rejected the ticket (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected issue tracker response: {0}")]
    Malformed(String),
}

/// Tracker priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    Highest,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Highest => "Highest",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl From<Severity> for Priority {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Self::Highest,
            Severity::High => Self::High,
            Severity::Medium => Self::Medium,
            Severity::Low => Self::Low,
        }
    }
}

/// A bug report ready to be filed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRequest {
    pub summary: String,
    pub description: String,
    pub issue_type: &'static str,
    pub priority: Priority,
    pub labels: Vec<String>,
    /// Routed role, `None` when the line was unassigned
    pub assignee_role: Option<String>,
    /// Tracker account resolved from the roster
    pub assignee_account_id: Option<String>,
}

fn label_slug(label: &str) -> String {
    label.replace([' ', '_'], "-")
}

fn prefix(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

impl TicketRequest {
    /// Report for a failing line analyzed in a run
    pub fn for_failure(
        text: &str,
        verdict: ErrorVerdict,
        team: &str,
        assignee_role: Option<&str>,
        report: &str,
        detected_at: DateTime<Local>,
    ) -> Self {
        let error_type = verdict.error_type.label();
        let severity = verdict.severity.label();
        let description = format!(
            "h2. Error Details
* *Error Message*: {text}
* *Error Type*: {error_type}
* *Severity*: {severity}
* *Detected At*: {detected}
* *Assigned Team*: {team}

h2. Root Cause Analysis & Recommendations
{report}

h2. Technical Context
* *Source*: Log File Analysis
* *Detection Method*: Automated Error Detection
* *Priority*: {severity}

_This ticket was generated automatically by logtriage._",
            detected = detected_at.format("%Y-%m-%d %H:%M:%S"),
        );

        Self {
            summary: format!("{error_type}: {}...", prefix(text, SUMMARY_PREFIX_CHARS)),
            description,
            issue_type: "Bug",
            priority: verdict.severity.into(),
            labels: vec![
                label_slug(error_type),
                label_slug(team),
                "auto-generated".to_string(),
            ],
            assignee_role: assignee_role.map(str::to_string),
            assignee_account_id: None,
        }
    }

    /// Report for a message submitted by hand
    pub fn manual(message: &str, detected_at: DateTime<Local>) -> Self {
        Self {
            summary: format!(
                "Auto-Detected Log Error: {}",
                prefix(message, MANUAL_SUMMARY_CHARS)
            ),
            description: format!(
                "Error detected in logs at {}:\n\n{message}",
                detected_at.format("%Y-%m-%d %H:%M:%S")
            ),
            issue_type: "Bug",
            priority: Priority::Medium,
            labels: vec!["auto-generated".to_string()],
            assignee_role: None,
            assignee_account_id: None,
        }
    }

    /// Low-priority ticket checking that the tracker accepts new issues
    pub fn connection_test(project_key: &str, at: DateTime<Local>) -> Self {
        Self {
            summary: "Test Ticket - logtriage connection check".to_string(),
            description: format!(
                "h2. Test Ticket
This ticket was created by logtriage to check the issue tracker integration.

* *Created At*: {}
* *Project*: {project_key}

_This is a test ticket and can be deleted._",
                at.format("%Y-%m-%d %H:%M:%S")
            ),
            issue_type: "Bug",
            priority: Priority::Low,
            labels: vec!["test".to_string(), "auto-generated".to_string()],
            assignee_role: None,
            assignee_account_id: None,
        }
    }

    #[must_use]
    pub fn with_assignee(mut self, account_id: Option<String>) -> Self {
        self.assignee_account_id = account_id;
        self
    }
}

/// Reference to a filed ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRef {
    pub key: String,
    pub url: String,
}

/// External issue tracker
pub trait TicketTracker: Send + Sync {
    fn create_ticket(&self, request: &TicketRequest) -> Result<TicketRef, TicketingFailure>;

    fn health(&self) -> Health;

    fn project_key(&self) -> &str;
}

/// Stand-in used when tracker settings are incomplete
#[derive(Debug, Clone)]
pub struct UnconfiguredTracker {
    project_key: String,
}

impl UnconfiguredTracker {
    pub fn new(project_key: &str) -> Self {
        Self {
            project_key: project_key.to_string(),
        }
    }
}

impl TicketTracker for UnconfiguredTracker {
    fn create_ticket(&self, request: &TicketRequest) -> Result<TicketRef, TicketingFailure> {
        tracing::debug!("Tracker not configured, dropping '{}'", request.summary);
        Err(TicketingFailure::Unconfigured)
    }

    fn health(&self) -> Health {
        Health::Unconfigured
    }

    fn project_key(&self) -> &str {
        &self.project_key
    }
}

/// Build the tracker described by `config`, degrading to
/// [`UnconfiguredTracker`] when settings are missing or unusable.
pub fn from_config(config: &JiraConfig) -> Box<dyn TicketTracker> {
    if !config.is_complete() {
        tracing::warn!("Jira settings incomplete, tickets will not be filed");
        return Box::new(UnconfiguredTracker::new(&config.project_key));
    }

    match JiraTracker::new(config) {
        Ok(tracker) => Box::new(tracker),
        Err(e) => {
            tracing::error!("Failed to set up Jira client: {e}");
            Box::new(UnconfiguredTracker::new(&config.project_key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{infer_error, ErrorType};
    use chrono::TimeZone;

    fn detected_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_priority_mapping() {
        assert_eq!(Priority::from(Severity::Critical), Priority::Highest);
        assert_eq!(Priority::from(Severity::High), Priority::High);
        assert_eq!(Priority::from(Severity::Medium), Priority::Medium);
        assert_eq!(Priority::from(Severity::Low), Priority::Low);
    }

    #[test]
    fn test_failure_request() {
        let text = "[ERROR] SQL connection timeout after 30s";
        let verdict = infer_error(text);
        assert_eq!(verdict.error_type, ErrorType::Connection);

        let request = TicketRequest::for_failure(
            text,
            verdict,
            "Database developer",
            Some("Database developer"),
            "Root Cause Analysis: pool exhausted",
            detected_at(),
        );

        assert_eq!(
            request.summary,
            "Connection Error: [ERROR] SQL connection timeout after 30s..."
        );
        assert_eq!(request.priority, Priority::High);
        assert_eq!(request.issue_type, "Bug");
        assert_eq!(
            request.labels,
            vec!["Connection-Error", "Database-developer", "auto-generated"]
        );
        assert!(request.description.contains("*Detected At*: 2025-03-14 09:26:53"));
        assert!(request.description.contains("Root Cause Analysis: pool exhausted"));
        assert_eq!(request.assignee_account_id, None);
    }

    #[test]
    fn test_summary_truncates_on_chars() {
        let text = "é".repeat(80);
        let request = TicketRequest::for_failure(
            &text,
            infer_error(&text),
            "system",
            None,
            "",
            detected_at(),
        );
        assert_eq!(
            request.summary,
            format!("General Error: {}...", "é".repeat(50))
        );
        assert_eq!(request.labels[1], "system");
    }

    #[test]
    fn test_manual_request() {
        let request = TicketRequest::manual("disk quota exceeded", detected_at())
            .with_assignee(Some("acc-1".to_string()));
        assert_eq!(request.summary, "Auto-Detected Log Error: disk quota exceeded");
        assert!(request.description.ends_with("disk quota exceeded"));
        assert_eq!(request.assignee_account_id.as_deref(), Some("acc-1"));
    }

    #[test]
    fn test_connection_test_request() {
        let request = TicketRequest::connection_test("QA", detected_at());
        assert_eq!(request.priority, Priority::Low);
        assert_eq!(request.labels, vec!["test", "auto-generated"]);
        assert!(request.description.contains("*Project*: QA"));
        assert!(request.description.contains("*Created At*: 2025-03-14 09:26:53"));
    }

    #[test]
    fn test_unconfigured_tracker_fails() {
        let tracker = from_config(&JiraConfig::default());
        let request = TicketRequest::manual("x", detected_at());
        assert_eq!(
            tracker.create_ticket(&request),
            Err(TicketingFailure::Unconfigured)
        );
        assert_eq!(tracker.health(), Health::Unconfigured);
        assert_eq!(tracker.project_key(), "OPS");
    }
}
