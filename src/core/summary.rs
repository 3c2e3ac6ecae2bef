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


use crate::classify::{ErrorVerdict, RoutingDecision, RoutingStrategy};
use crate::parser::line::ClassifiedLine;
use serde::Serialize;
use std::fmt::Write;

/// Where an enrichment report came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EnrichmentSource {
    Model,
    Cache,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrichment {
    #[serde(flatten)]
    pub source: EnrichmentSource,
    pub report: String,
}

/// Analysis attached to a failed line
#[derive(Debug, Clone, Serialize)]
pub struct FailureAnalysis {
    #[serde(flatten)]
    pub verdict: ErrorVerdict,
    pub routing: RoutingDecision,
    /// Routed role, or the strategy's unassigned label
    pub team: &'static str,
    /// Roster developer for the routed role
    pub developer: Option<String>,
    pub enrichment: Enrichment,
    /// Whether the line fell within the ticket cap
    pub ticket_requested: bool,
    pub ticket_url: Option<String>,
}

/// One classified line and, for failures, its analysis
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    #[serde(flatten)]
    pub line: ClassifiedLine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureAnalysis>,
}

/// Result of analyzing one file
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub success: bool,
    pub no_test_cases: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub routing: RoutingStrategy,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub ticket_cap: usize,
    pub tickets_requested: usize,
    pub tickets_created: Vec<String>,
    pub tickets_skipped: usize,
    pub processed_errors: usize,
    pub records: Vec<AnalysisRecord>,
    pub summary: String,
}

impl RunSummary {
    /// Summary for input without a single pass or failure line
    pub fn no_test_cases(routing: RoutingStrategy, ticket_cap: usize) -> Self {
        let mut summary = Self {
            success: false,
            no_test_cases: true,
            message: Some("No test cases detected in the log file".to_string()),
            suggestion: Some(
                "The log file doesn't contain recognizable test case results.".to_string(),
            ),
            routing,
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            ticket_cap,
            tickets_requested: 0,
            tickets_created: Vec::new(),
            tickets_skipped: 0,
            processed_errors: 0,
            records: Vec::new(),
            summary: String::new(),
        };
        summary.summary = summary.render_text();
        summary
    }

    /// Aggregate analyzed records, kept in scan order
    pub fn from_records(
        records: Vec<AnalysisRecord>,
        routing: RoutingStrategy,
        ticket_cap: usize,
    ) -> Self {
        let failed_tests = records.iter().filter(|r| r.line.is_failed()).count();
        let failures = || records.iter().filter_map(|r| r.failure.as_ref());

        let tickets_requested = failures().filter(|f| f.ticket_requested).count();
        let tickets_created: Vec<String> = failures()
            .filter_map(|f| f.ticket_url.clone())
            .collect();
        let processed_errors = failures().count();

        let mut summary = Self {
            success: true,
            no_test_cases: false,
            message: None,
            suggestion: None,
            routing,
            total_tests: records.len(),
            passed_tests: records.len() - failed_tests,
            failed_tests,
            ticket_cap,
            tickets_requested,
            tickets_created,
            tickets_skipped: failed_tests - failed_tests.min(ticket_cap),
            processed_errors,
            records,
            summary: String::new(),
        };
        summary.summary = summary.render_text();
        summary
    }

    /// Plain-text report
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if self.no_test_cases {
            let _ = writeln!(out, "Log Analysis Complete\n");
            let _ = writeln!(out, "No test cases detected in the log file.");
            if let Some(suggestion) = &self.suggestion {
                let _ = writeln!(out, "{suggestion}");
            }
            return out;
        }

        let _ = writeln!(out, "Log Analysis Complete\n");
        let _ = writeln!(out, "Summary:");
        let _ = writeln!(out, "- Total Test Cases: {}", self.total_tests);
        let _ = writeln!(out, "- Passed Tests: {}", self.passed_tests);
        let _ = writeln!(out, "- Failed Tests: {}", self.failed_tests);
        let _ = writeln!(out, "- Tickets Created: {}", self.tickets_created.len());
        let _ = writeln!(
            out,
            "- Tickets Skipped (cap {}): {}",
            self.ticket_cap, self.tickets_skipped
        );
        let failed_requests = self.tickets_requested - self.tickets_created.len();
        if failed_requests > 0 {
            let _ = writeln!(out, "- Ticket Requests Failed: {failed_requests}");
        }

        let _ = writeln!(out, "\nKey Issues:");
        for record in &self.records {
            let Some(failure) = &record.failure else {
                continue;
            };
            let ticket = match (&failure.ticket_url, failure.ticket_requested) {
                (Some(url), _) => url.as_str(),
                (None, true) => "ticket failed",
                (None, false) => "no ticket",
            };
            let _ = writeln!(
                out,
                "- line {}: {} (Severity: {}) - Assigned to {} [{ticket}]",
                record.line.line_number(),
                failure.verdict.error_type,
                failure.verdict.severity,
                failure.team,
            );
        }
        if self.failed_tests == 0 {
            let _ = writeln!(out, "- none");
        }

        let _ = writeln!(out, "\nImmediate Actions Required:");
        if self.tickets_created.is_empty() {
            let _ = writeln!(out, "- Review the failed lines listed above");
        } else {
            let _ = writeln!(out, "- Review all created tickets");
        }
        let _ = writeln!(out, "- Assign team members based on error types");
        let _ = writeln!(out, "- Implement suggested fixes from the root cause reports");

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{infer_error, Outcome};
    use crate::parser::line::LogLine;
    use chrono::Local;

    fn line(n: usize, text: &str, outcome: Outcome) -> ClassifiedLine {
        ClassifiedLine {
            line: LogLine::new(text, n),
            outcome,
            captured_at: Local::now(),
        }
    }

    fn failed(n: usize, text: &str, ticket_url: Option<&str>, requested: bool) -> AnalysisRecord {
        AnalysisRecord {
            line: line(n, text, Outcome::Failed),
            failure: Some(FailureAnalysis {
                verdict: infer_error(text),
                routing: RoutingDecision::Unassigned,
                team: "system",
                developer: None,
                enrichment: Enrichment {
                    source: EnrichmentSource::Model,
                    report: "report".to_string(),
                },
                ticket_requested: requested,
                ticket_url: ticket_url.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_counts_and_skips() {
        let records = vec![
            AnalysisRecord {
                line: line(1, "ok passed", Outcome::Passed),
                failure: None,
            },
            failed(2, "timeout", Some("https://t/browse/OPS-1"), true),
            failed(3, "timeout", None, true),
            failed(5, "heap exhausted", None, false),
        ];

        let summary = RunSummary::from_records(records, RoutingStrategy::KeywordCount, 2);
        assert!(summary.success);
        assert_eq!(summary.total_tests, 4);
        assert_eq!(summary.passed_tests, 1);
        assert_eq!(summary.failed_tests, 3);
        assert_eq!(summary.tickets_requested, 2);
        assert_eq!(summary.tickets_created, vec!["https://t/browse/OPS-1"]);
        assert_eq!(summary.tickets_skipped, 1);
        assert_eq!(summary.processed_errors, 3);

        let text = &summary.summary;
        assert!(text.contains("- Tickets Created: 1"));
        assert!(text.contains("- Tickets Skipped (cap 2): 1"));
        assert!(text.contains("- Ticket Requests Failed: 1"));
        assert!(text.contains("- line 2: Connection Error (Severity: High) - Assigned to system [https://t/browse/OPS-1]"));
        assert!(text.contains("- line 3: Connection Error (Severity: High) - Assigned to system [ticket failed]"));
        assert!(text.contains("- line 5: Memory Error (Severity: High) - Assigned to system [no ticket]"));
    }

    #[test]
    fn test_no_test_cases() {
        let summary = RunSummary::no_test_cases(RoutingStrategy::WeightedDomain, 3);
        assert!(!summary.success);
        assert!(summary.no_test_cases);
        assert_eq!(summary.total_tests, 0);
        assert!(summary.summary.contains("No test cases detected"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["routing"], "weighted-domain");
        assert_eq!(json["tickets_created"], serde_json::json!([]));
    }

    #[test]
    fn test_record_json_shape() {
        let record = failed(7, "SQL deadlock", None, false);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["line_number"], 7);
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["failure"]["type"], "Database Error");
        assert_eq!(json["failure"]["severity"], "High");
        assert_eq!(json["failure"]["enrichment"]["source"], "model");
        assert_eq!(json["failure"]["routing"]["decision"], "unassigned");
        assert!(json["failure"]["ticket_url"].is_null());
    }
}
