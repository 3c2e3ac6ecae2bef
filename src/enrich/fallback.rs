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

//! Canned reports used when the model gateway is unavailable.

use crate::classify::lexicon::contains_any;

/// Template families, checked in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    Connection,
    Database,
    Authentication,
    Protocol,
    RateLimit,
    Configuration,
    General,
}

const TRIGGERS: [(FallbackKind, &[&str]); 6] = [
    (FallbackKind::Connection, &["connection", "timeout"]),
    (FallbackKind::Database, &["database", "sql"]),
    (
        FallbackKind::Authentication,
        &["authentication", "unauthorized"],
    ),
    (FallbackKind::Protocol, &["soap", "xml"]),
    (
        FallbackKind::RateLimit,
        &["rate limit", "rate-limit", "throttle"],
    ),
    (FallbackKind::Configuration, &["config", "format"]),
];

impl FallbackKind {
    /// Pick the template family for a failing line.
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        let lowered = text.to_lowercase();
        TRIGGERS
            .iter()
            .find(|(_, needles)| contains_any(&lowered, needles))
            .map_or(Self::General, |(kind, _)| *kind)
    }

    pub const fn template(self) -> &'static str {
        match self {
            Self::Connection => CONNECTION,
            Self::Database => DATABASE,
            Self::Authentication => AUTHENTICATION,
            Self::Protocol => PROTOCOL,
            Self::RateLimit => RATE_LIMIT,
            Self::Configuration => CONFIGURATION,
            Self::General => GENERAL,
        }
    }
}

/// Deterministic report for `text`.
#[must_use]
pub fn report(text: &str) -> String {
    FallbackKind::for_text(text).template().to_string()
}

const CONNECTION: &str = "\
Root Cause Analysis:
The service could not reach a remote endpoint in time. The target host is down, \
unreachable from this network, or too slow to answer within the configured timeout.

Immediate Fix Steps:
1. Check that the target service is running and listening on the expected port.
2. Verify DNS resolution and firewall rules between the caller and the target.
3. Review connection pool limits and timeout settings for the client.

Prevention Measures:
- Add health checks and alerting for the dependency.
- Use retries with exponential backoff and a circuit breaker.

Technical Impact Assessment:
Requests depending on this connection fail or stall, which can cascade to callers.

Recommended Priority Level: High";

const DATABASE: &str = "\
Root Cause Analysis:
A database operation failed. Likely causes are an invalid query, a schema mismatch, \
lock contention, or an exhausted connection pool.

Immediate Fix Steps:
1. Inspect the failing statement and run it manually against the same schema.
2. Check database server logs for locks, deadlocks or resource limits.
3. Confirm migrations are applied in this environment.

Prevention Measures:
- Cover queries with integration tests against a real schema.
- Monitor slow queries and pool saturation.

Technical Impact Assessment:
Reads or writes for the affected feature fail; data consistency may be at risk.

Recommended Priority Level: High";

const AUTHENTICATION: &str = "\
Root Cause Analysis:
The caller was rejected by an authentication or authorization check. Credentials \
are missing, expired, or lack the required scope.

Immediate Fix Steps:
1. Verify the credentials or token used by the failing call.
2. Check token expiry and refresh logic.
3. Confirm the account has the permissions the operation needs.

Prevention Measures:
- Rotate secrets through a managed store and alert before expiry.
- Add tests for expired and under-privileged credentials.

Technical Impact Assessment:
Users or services are locked out of the affected functionality.

Recommended Priority Level: Critical";

const PROTOCOL: &str = "\
Root Cause Analysis:
A SOAP/XML exchange failed. The payload does not match the expected schema or the \
remote service returned a fault.

Immediate Fix Steps:
1. Capture the request and response envelopes for the failing call.
2. Validate the payload against the service WSDL/XSD.
3. Check the remote service for recent contract changes.

Prevention Measures:
- Add contract tests for the integration.
- Version the service contract and pin the client to it.

Technical Impact Assessment:
The integration with the remote service is broken for affected operations.

Recommended Priority Level: High";

const RATE_LIMIT: &str = "\
Root Cause Analysis:
The caller exceeded the request quota of a downstream service and was throttled.

Immediate Fix Steps:
1. Identify the client issuing the burst of requests.
2. Honor Retry-After headers and back off before retrying.
3. Request a higher quota if the load is legitimate.

Prevention Measures:
- Add client-side rate limiting and request batching.
- Cache responses that do not need to be fetched every time.

Technical Impact Assessment:
Requests are rejected until the quota window resets.

Recommended Priority Level: Medium";

const CONFIGURATION: &str = "\
Root Cause Analysis:
Input or configuration did not have the expected format, so it could not be parsed \
or validated.

Immediate Fix Steps:
1. Locate the offending value in the input or configuration file.
2. Compare it against the documented format.
3. Correct the value and rerun the failing step.

Prevention Measures:
- Validate configuration at startup and fail fast with a clear message.
- Add schema checks for externally supplied input.

Technical Impact Assessment:
The affected component runs with unusable settings or rejects valid work.

Recommended Priority Level: Medium";

const GENERAL: &str = "\
Root Cause Analysis:
The log line reports a failure that does not match a known pattern. Review the \
surrounding log context to narrow down the failing component.

Immediate Fix Steps:
1. Reproduce the failure locally with the same inputs.
2. Inspect the stack trace or neighbouring log lines.
3. Add targeted logging around the failing step if context is missing.

Prevention Measures:
- Add a regression test once the cause is known.
- Improve error messages so future failures are self-explanatory.

Technical Impact Assessment:
Unknown until the failing component is identified.

Recommended Priority Level: Medium";
