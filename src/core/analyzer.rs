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


//! The analysis pass: classify, route, enrich and ticket every failing line.

use super::state::{SharedState, TicketRecord};
use super::status::StatusReport;
use super::summary::{AnalysisRecord, Enrichment, EnrichmentSource, FailureAnalysis, RunSummary};
use crate::classify::{infer_error, ErrorType, RoleRouter, RoutingDecision, Severity};
use crate::config::Config;
use crate::enrich::{self, fallback, Enricher, EnrichmentFailure};
use crate::parser::{self, line::ClassifiedLine};
use crate::ticket::{self, Developer, Roster, TicketRef, TicketRequest, TicketTracker, TicketingFailure};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Lines classified when no input is given to bulk classification
pub const SAMPLE_ERRORS: [&str; 6] = [
    "Database connection timeout error",
    "JavaScript undefined variable error",
    "Python API endpoint failed",
    "Docker container deployment failed",
    "SSL certificate authentication error",
    "Network connection refused",
];

/// Lines used to demonstrate role-to-developer mapping
pub const MAPPING_SAMPLES: [&str; 5] = [
    "Database connection timeout error",
    "JavaScript undefined variable error",
    "Python API endpoint failed",
    "Machine learning model training failed",
    "Test case assertion failed",
];

/// The only failure that aborts a run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("Uploaded file is empty")]
    EmptyFile,
}

/// Classification of a single text without side effects
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub error: String,
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub severity: Severity,
    pub team: &'static str,
    pub routing: RoutingDecision,
    pub developer: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleMapping {
    pub error: String,
    pub mapped_role: Option<&'static str>,
    pub developer_name: String,
    pub developer_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleKeywords {
    pub role: &'static str,
    pub keywords: Vec<&'static str>,
}

/// Roster, keyword table and sample routing of the active strategy
#[derive(Debug, Clone, Serialize)]
pub struct DeveloperMapping {
    pub developers: Vec<Developer>,
    pub role_keywords: Vec<RoleKeywords>,
    pub test_results: Vec<RoleMapping>,
}

pub struct Analyzer {
    router: Box<dyn RoleRouter>,
    enricher: Box<dyn Enricher>,
    tracker: Box<dyn TicketTracker>,
    roster: Roster,
    state: Arc<SharedState>,
}

impl Analyzer {
    pub fn new(
        router: Box<dyn RoleRouter>,
        enricher: Box<dyn Enricher>,
        tracker: Box<dyn TicketTracker>,
        roster: Roster,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            router,
            enricher,
            tracker,
            roster,
            state,
        }
    }

    /// Wire collaborators from configuration. Missing settings degrade the
    /// affected collaborator instead of failing.
    pub fn from_config(config: &Config) -> Self {
        let state = Arc::new(SharedState::new(
            config.analysis.history_limit,
            config.analysis.cache_limit,
            Duration::from_millis(config.llm.min_call_interval_ms),
        ));

        tracing::info!(
            "Analyzer ready: routing={}, ticket cap={}, {} developers",
            config.analysis.routing,
            config.analysis.ticket_cap,
            config.developers.len()
        );

        Self::new(
            config.analysis.routing.router(),
            enrich::from_config(&config.llm),
            ticket::from_config(&config.jira),
            Roster::new(config.developers.clone()),
            state,
        )
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn router(&self) -> &dyn RoleRouter {
        self.router.as_ref()
    }

    /// Analyze classified lines, filing at most `ticket_cap` tickets.
    pub fn analyze(&self, lines: &[ClassifiedLine], ticket_cap: usize) -> RunSummary {
        let strategy = self.router.strategy();
        if lines.is_empty() {
            tracing::info!("No test cases detected");
            return RunSummary::no_test_cases(strategy, ticket_cap);
        }

        let failed = lines.iter().filter(|line| line.is_failed()).count();
        tracing::info!(
            "Processing {} test cases ({} passed, {failed} failed)",
            lines.len(),
            lines.len() - failed
        );

        let mut tickets_requested = 0;
        let records: Vec<AnalysisRecord> = lines
            .iter()
            .map(|line| {
                let failure = line.is_failed().then(|| {
                    let may_file = tickets_requested < ticket_cap;
                    if may_file {
                        tickets_requested += 1;
                    }
                    self.analyze_failure(line, may_file)
                });
                AnalysisRecord {
                    line: line.clone(),
                    failure,
                }
            })
            .collect();

        let summary = RunSummary::from_records(records, strategy, ticket_cap);
        tracing::info!(
            "Run complete: {} tickets created, {} skipped",
            summary.tickets_created.len(),
            summary.tickets_skipped
        );
        summary
    }

    /// Analyze an uploaded file. Only missing or zero-byte input fails.
    pub fn analyze_upload(
        &self,
        upload: Option<&[u8]>,
        ticket_cap: usize,
    ) -> Result<RunSummary, InputError> {
        let bytes = upload.ok_or(InputError::MissingFile)?;
        if bytes.is_empty() {
            return Err(InputError::EmptyFile);
        }

        let content = parser::decode(bytes);
        Ok(self.analyze(&parser::scan(&content), ticket_cap))
    }

    fn analyze_failure(&self, line: &ClassifiedLine, may_file: bool) -> FailureAnalysis {
        let text = line.content();
        let verdict = infer_error(text);
        let routing = self.router.route(text);
        let team = self.router.team_label(&routing);
        let developer = routing.role().and_then(|role| self.roster.find_by_role(role));

        tracing::debug!(
            "Line {}: {} ({}), team {team}",
            line.line_number(),
            verdict.error_type,
            verdict.severity
        );

        let enrichment = self.enrich(text, verdict.error_type);

        let ticket_url = if may_file {
            let request = TicketRequest::for_failure(
                text,
                verdict,
                team,
                routing.role(),
                &enrichment.report,
                line.captured_at,
            )
            .with_assignee(developer.and_then(|dev| dev.account_id.clone()));
            self.file(&request, text).ok().map(|ticket| ticket.url)
        } else {
            None
        };

        FailureAnalysis {
            verdict,
            routing,
            team,
            developer: developer.map(|dev| dev.name.clone()),
            enrichment,
            ticket_requested: may_file,
            ticket_url,
        }
    }

    fn enrich(&self, text: &str, error_type: ErrorType) -> Enrichment {
        if let Some(report) = self.state.cached_report(text, error_type) {
            return Enrichment {
                source: EnrichmentSource::Cache,
                report,
            };
        }

        if self.enricher.is_configured() {
            self.state.throttle().wait();
        }

        match self.enricher.enrich(text, error_type) {
            Ok(report) => {
                self.state.cache_report(text, error_type, report.clone());
                Enrichment {
                    source: EnrichmentSource::Model,
                    report,
                }
            }
            Err(failure) => {
                if failure == EnrichmentFailure::Unconfigured {
                    tracing::debug!("Using fallback report: {failure}");
                } else {
                    tracing::warn!("Enrichment failed, using fallback report: {failure}");
                }
                Enrichment {
                    source: EnrichmentSource::Fallback {
                        reason: failure.to_string(),
                    },
                    report: fallback::report(text),
                }
            }
        }
    }

    fn file(&self, request: &TicketRequest, text: &str) -> Result<TicketRef, TicketingFailure> {
        match self.tracker.create_ticket(request) {
            Ok(ticket) => {
                self.state
                    .record_ticket(TicketRecord::new(ticket.url.clone(), text));
                Ok(ticket)
            }
            Err(failure) => {
                if failure == TicketingFailure::Unconfigured {
                    tracing::debug!("Ticket not filed: {failure}");
                } else {
                    tracing::error!("Failed to create ticket for '{}': {failure}", request.summary);
                }
                Err(failure)
            }
        }
    }

    /// File a ticket for a message submitted by hand
    pub fn create_manual_ticket(&self, message: &str) -> Result<TicketRef, TicketingFailure> {
        self.file(&TicketRequest::manual(message, Local::now()), message)
    }

    /// File a low-priority test ticket. Not recorded in the ticket history.
    pub fn create_test_ticket(&self) -> Result<TicketRef, TicketingFailure> {
        let request = TicketRequest::connection_test(self.tracker.project_key(), Local::now());
        let ticket = self.tracker.create_ticket(&request)?;
        tracing::info!("Test ticket created: {}", ticket.url);
        Ok(ticket)
    }

    /// Classify one text without enrichment or ticketing
    pub fn classify(&self, text: &str) -> Classification {
        let verdict = infer_error(text);
        let routing = self.router.route(text);
        let developer = routing.role().and_then(|role| self.roster.find_by_role(role));

        Classification {
            error: text.to_string(),
            error_type: verdict.error_type,
            severity: verdict.severity,
            team: self.router.team_label(&routing),
            routing,
            developer: developer.map_or_else(|| "system".to_string(), |dev| dev.name.clone()),
            email: developer.map_or_else(|| "system".to_string(), |dev| dev.email.clone()),
        }
    }

    /// Classify `texts`, or [`SAMPLE_ERRORS`] when empty
    pub fn classify_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Classification> {
        if texts.is_empty() {
            SAMPLE_ERRORS.iter().map(|text| self.classify(text)).collect()
        } else {
            texts.iter().map(|text| self.classify(text.as_ref())).collect()
        }
    }

    pub fn developer_mapping(&self) -> DeveloperMapping {
        let role_keywords = self
            .router
            .rules()
            .iter()
            .map(|rule| RoleKeywords {
                role: rule.label,
                keywords: rule.texts().collect(),
            })
            .collect();

        let test_results = MAPPING_SAMPLES
            .iter()
            .map(|text| {
                let mapped_role = self.router.route(text).role();
                let developer = mapped_role.and_then(|role| self.roster.find_by_role(role));
                RoleMapping {
                    error: (*text).to_string(),
                    mapped_role,
                    developer_name: developer
                        .map_or_else(|| "system".to_string(), |dev| dev.name.clone()),
                    developer_email: developer
                        .map_or_else(|| "system".to_string(), |dev| dev.email.clone()),
                }
            })
            .collect();

        DeveloperMapping {
            developers: self.roster.developers().to_vec(),
            role_keywords,
            test_results,
        }
    }

    pub fn recent_tickets(&self, n: usize) -> Vec<TicketRecord> {
        self.state.recent_tickets(n)
    }

    /// Probe both collaborators. Blocks on network calls.
    ///
    /// The model probe shares the enrichment throttle.
    pub fn status(&self) -> StatusReport {
        let jira = self.tracker.health();
        if self.enricher.is_configured() {
            self.state.throttle().wait();
        }
        StatusReport::new(jira, self.enricher.health(), self.tracker.project_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{lexicon, KeywordCountRouter, Outcome, WeightedDomainRouter};
    use crate::core::status::Health;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Calls(Arc<AtomicUsize>);

    impl Calls {
        fn bump(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct RecordingEnricher {
        calls: Calls,
        result: Result<String, EnrichmentFailure>,
    }

    impl Enricher for RecordingEnricher {
        fn enrich(&self, _text: &str, _t: ErrorType) -> Result<String, EnrichmentFailure> {
            self.calls.bump();
            self.result.clone()
        }

        fn health(&self) -> Health {
            Health::Connected {
                detail: "stub".to_string(),
            }
        }
    }

    struct RecordingTracker {
        calls: Calls,
        requests: Arc<Mutex<Vec<TicketRequest>>>,
        fail: bool,
    }

    impl TicketTracker for RecordingTracker {
        fn create_ticket(&self, request: &TicketRequest) -> Result<TicketRef, TicketingFailure> {
            self.calls.bump();
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(TicketingFailure::Rejected {
                    status: 500,
                    body: "down".to_string(),
                });
            }
            let key = format!("OPS-{}", self.calls.get());
            Ok(TicketRef {
                url: format!("https://jira.example.com/browse/{key}"),
                key,
            })
        }

        fn health(&self) -> Health {
            Health::Unconfigured
        }

        fn project_key(&self) -> &str {
            "OPS"
        }
    }

    struct Harness {
        analyzer: Analyzer,
        enrich_calls: Calls,
        ticket_calls: Calls,
        requests: Arc<Mutex<Vec<TicketRequest>>>,
    }

    fn harness(enrich: Result<String, EnrichmentFailure>, tracker_fails: bool) -> Harness {
        let enrich_calls = Calls::default();
        let ticket_calls = Calls::default();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let roster = Roster::new(vec![Developer {
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            role: "database developer".to_string(),
            account_id: Some("acc-dana".to_string()),
        }]);

        let analyzer = Analyzer::new(
            Box::new(KeywordCountRouter),
            Box::new(RecordingEnricher {
                calls: enrich_calls.clone(),
                result: enrich,
            }),
            Box::new(RecordingTracker {
                calls: ticket_calls.clone(),
                requests: Arc::clone(&requests),
                fail: tracker_fails,
            }),
            roster,
            Arc::new(SharedState::new(100, 100, Duration::ZERO)),
        );

        Harness {
            analyzer,
            enrich_calls,
            ticket_calls,
            requests,
        }
    }

    const SAMPLE_LOG: &str = "[INFO] Starting Test Suite Execution
[PASS] Login test - PASSED
[FAIL] DB test - FAILED
[ERROR] SQL connection timeout after 30s
";

    #[test]
    fn test_end_to_end() {
        let h = harness(Ok("model report".to_string()), false);
        let summary = h
            .analyzer
            .analyze_upload(Some(SAMPLE_LOG.as_bytes()), 3)
            .unwrap();

        assert!(summary.success);
        assert_eq!(summary.total_tests, 3);
        assert_eq!(summary.passed_tests, 1);
        assert_eq!(summary.failed_tests, 2);
        assert_eq!(summary.tickets_created.len(), 2);
        assert_eq!(summary.tickets_skipped, 0);

        let numbers: Vec<usize> = summary.records.iter().map(|r| r.line.line_number()).collect();
        assert_eq!(numbers, vec![2, 3, 4]);
        assert_eq!(summary.records[0].line.outcome, Outcome::Passed);
        assert!(summary.records[0].failure.is_none());

        let db_test = summary.records[1].failure.as_ref().unwrap();
        assert_eq!(db_test.team, lexicon::AI_ML_DEVELOPER);
        assert_eq!(db_test.developer, None);

        let sql = summary.records[2].failure.as_ref().unwrap();
        assert_eq!(sql.verdict.error_type, ErrorType::Connection);
        assert_eq!(sql.verdict.severity, Severity::High);
        assert_eq!(
            sql.routing,
            RoutingDecision::Assigned {
                role: lexicon::DATABASE_DEVELOPER,
                score: 1
            }
        );
        assert_eq!(sql.developer.as_deref(), Some("Dana"));
        assert_eq!(sql.enrichment.source, EnrichmentSource::Model);

        let requests = h.requests.lock().unwrap();
        assert_eq!(requests[0].assignee_account_id, None);
        assert_eq!(requests[1].assignee_account_id.as_deref(), Some("acc-dana"));
        assert_eq!(requests[1].assignee_role.as_deref(), Some("Database developer"));
        assert_eq!(h.analyzer.recent_tickets(10).len(), 2);
    }

    #[test]
    fn test_no_classifiable_lines_makes_no_calls() {
        let h = harness(Ok("r".to_string()), false);
        let summary = h
            .analyzer
            .analyze_upload(Some("[INFO] nothing to see\n\n".as_bytes()), 3)
            .unwrap();

        assert!(summary.no_test_cases);
        assert!(!summary.success);
        assert_eq!(summary.total_tests, 0);
        assert_eq!(h.enrich_calls.get(), 0);
        assert_eq!(h.ticket_calls.get(), 0);
    }

    #[test]
    fn test_input_errors() {
        let h = harness(Ok("r".to_string()), false);
        assert_eq!(
            h.analyzer.analyze_upload(None, 3).unwrap_err(),
            InputError::MissingFile
        );
        assert_eq!(
            h.analyzer.analyze_upload(Some("".as_bytes()), 3).unwrap_err(),
            InputError::EmptyFile
        );
    }

    #[test]
    fn test_ticket_cap() {
        let h = harness(Err(EnrichmentFailure::Timeout), false);
        let log: String = (0..5)
            .map(|n| format!("worker {n} crashed with exception\n"))
            .collect();

        let summary = h.analyzer.analyze_upload(Some(log.as_bytes()), 2).unwrap();

        assert_eq!(h.ticket_calls.get(), 2);
        assert_eq!(summary.failed_tests, 5);
        assert_eq!(summary.tickets_requested, 2);
        assert_eq!(summary.tickets_skipped, 3);

        let failures: Vec<&FailureAnalysis> = summary
            .records
            .iter()
            .filter_map(|r| r.failure.as_ref())
            .collect();
        assert_eq!(failures.len(), 5);
        assert_eq!(failures.iter().filter(|f| f.ticket_url.is_none()).count(), 3);
        assert!(failures[..2].iter().all(|f| f.ticket_requested));
        assert!(failures[2..].iter().all(|f| !f.ticket_requested));
    }

    #[test]
    fn test_zero_cap_files_nothing() {
        let h = harness(Ok("r".to_string()), false);
        let summary = h
            .analyzer
            .analyze_upload(Some("request failed\nanother error\n".as_bytes()), 0)
            .unwrap();

        assert_eq!(h.ticket_calls.get(), 0);
        assert_eq!(summary.tickets_skipped, 2);
    }

    #[test]
    fn test_enrichment_failure_uses_fallback() {
        let h = harness(Err(EnrichmentFailure::RateLimited), false);
        let summary = h
            .analyzer
            .analyze_upload(Some("SOAPFault returned by billing service: ERROR\n".as_bytes()), 3)
            .unwrap();

        let failure = summary.records[0].failure.as_ref().unwrap();
        assert_eq!(
            failure.enrichment.source,
            EnrichmentSource::Fallback {
                reason: EnrichmentFailure::RateLimited.to_string()
            }
        );
        assert_eq!(
            failure.enrichment.report,
            fallback::report("SOAPFault returned by billing service: ERROR")
        );
        assert_eq!(summary.tickets_created.len(), 1);
    }

    #[test]
    fn test_ticket_failure_keeps_running() {
        let h = harness(Ok("r".to_string()), true);
        let summary = h
            .analyzer
            .analyze_upload(Some("first error\nsecond error\n".as_bytes()), 3)
            .unwrap();

        assert!(summary.success);
        assert_eq!(h.ticket_calls.get(), 2);
        assert!(summary.tickets_created.is_empty());
        assert!(summary
            .records
            .iter()
            .all(|r| r.failure.as_ref().is_some_and(|f| f.ticket_url.is_none())));
        assert_eq!(h.analyzer.recent_tickets(10).len(), 0);
    }

    #[test]
    fn test_successful_enrichment_is_cached() {
        let h = harness(Ok("cached report".to_string()), false);
        h.analyzer
            .analyze_upload(Some("disk error on node\ndisk error on node\n".as_bytes()), 0)
            .unwrap();

        assert_eq!(h.enrich_calls.get(), 1);
        assert_eq!(h.analyzer.state().cached_reports(), 1);
    }

    #[test]
    fn test_failed_enrichment_is_not_cached() {
        let h = harness(Err(EnrichmentFailure::Timeout), false);
        h.analyzer
            .analyze_upload(Some("disk error on node\ndisk error on node\n".as_bytes()), 0)
            .unwrap();

        assert_eq!(h.enrich_calls.get(), 2);
        assert_eq!(h.analyzer.state().cached_reports(), 0);
    }

    #[test]
    fn test_classify_batch_defaults_to_samples() {
        let h = harness(Ok("r".to_string()), false);
        let results = h.analyzer.classify_batch::<String>(&[]);
        assert_eq!(results.len(), SAMPLE_ERRORS.len());
        assert_eq!(results[0].developer, "Dana");
        assert_eq!(h.enrich_calls.get(), 0);
        assert_eq!(h.ticket_calls.get(), 0);
    }

    #[test]
    fn test_classify_is_pure() {
        let h = harness(Ok("r".to_string()), false);
        let first = h.analyzer.classify("timeout connecting to database");
        let second = h.analyzer.classify("timeout connecting to database");
        assert_eq!(first.error_type, ErrorType::Connection);
        assert_eq!(first.severity, Severity::High);
        assert_eq!(first.routing, second.routing);
    }

    #[test]
    fn test_developer_mapping_uses_active_rules() {
        let analyzer = Analyzer::new(
            Box::new(WeightedDomainRouter),
            Box::new(enrich::UnconfiguredEnricher),
            Box::new(ticket::UnconfiguredTracker::new("OPS")),
            Roster::default(),
            Arc::new(SharedState::new(10, 100, Duration::ZERO)),
        );

        let mapping = analyzer.developer_mapping();
        assert_eq!(mapping.role_keywords.len(), 6);
        assert_eq!(mapping.role_keywords[0].role, "Database");
        assert!(mapping.role_keywords[0].keywords.contains(&"mysql"));
        assert_eq!(mapping.test_results.len(), MAPPING_SAMPLES.len());
        assert!(mapping.test_results.iter().all(|r| r.developer_name == "system"));
    }

    #[test]
    fn test_manual_ticket_is_recorded() {
        let h = harness(Ok("r".to_string()), false);
        let ticket = h.analyzer.create_manual_ticket("disk quota exceeded").unwrap();

        assert_eq!(ticket.key, "OPS-1");
        let recent = h.analyzer.recent_tickets(10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].summary, "disk quota exceeded");
    }

    #[test]
    fn test_connection_test_ticket_is_not_recorded() {
        let h = harness(Ok("r".to_string()), false);
        let ticket = h.analyzer.create_test_ticket().unwrap();

        assert_eq!(ticket.key, "OPS-1");
        assert!(h.analyzer.recent_tickets(10).is_empty());
        let requests = h.requests.lock().unwrap();
        assert_eq!(requests[0].priority, crate::ticket::Priority::Low);
        assert_eq!(requests[0].labels, vec!["test", "auto-generated"]);
    }

    #[test]
    fn test_connection_test_ticket_failure() {
        let h = harness(Ok("r".to_string()), true);
        assert!(matches!(
            h.analyzer.create_test_ticket(),
            Err(TicketingFailure::Rejected { status: 500, .. })
        ));
    }
}
