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


//! Jira REST v2 client.

use super::{TicketRef, TicketRequest, TicketTracker, TicketingFailure};
use crate::config::JiraConfig;
use crate::core::status::Health;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct CreateIssue<'a> {
    fields: IssueFields<'a>,
}

#[derive(Debug, Serialize)]
struct IssueFields<'a> {
    project: ProjectRef<'a>,
    summary: &'a str,
    description: &'a str,
    issuetype: NamedRef<'a>,
    priority: NamedRef<'a>,
    labels: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<AccountRef<'a>>,
}

#[derive(Debug, Serialize)]
struct ProjectRef<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct NamedRef<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct AccountRef<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

pub struct JiraTracker {
    client: Client,
    base_url: String,
    email: String,
    api_token: String,
    project_key: String,
}

impl JiraTracker {
    pub fn new(config: &JiraConfig) -> Result<Self, TicketingFailure> {
        let (Some(url), Some(email), Some(api_token)) =
            (&config.url, &config.email, &config.api_token)
        else {
            return Err(TicketingFailure::Unconfigured);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TicketingFailure::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            email: email.clone(),
            api_token: api_token.clone(),
            project_key: config.project_key.clone(),
        })
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.base_url)
    }
}

fn transport_failure(e: &reqwest::Error) -> TicketingFailure {
    if e.is_timeout() {
        TicketingFailure::Timeout
    } else {
        TicketingFailure::Unreachable(e.to_string())
    }
}

/// The client timeout can also fire while the body is being read.
fn body_failure(e: &reqwest::Error) -> TicketingFailure {
    if e.is_timeout() {
        TicketingFailure::Timeout
    } else {
        TicketingFailure::Malformed(e.to_string())
    }
}

impl TicketTracker for JiraTracker {
    fn create_ticket(&self, request: &TicketRequest) -> Result<TicketRef, TicketingFailure> {
        let body = CreateIssue {
            fields: IssueFields {
                project: ProjectRef {
                    key: &self.project_key,
                },
                summary: &request.summary,
                description: &request.description,
                issuetype: NamedRef {
                    name: request.issue_type,
                },
                priority: NamedRef {
                    name: request.priority.name(),
                },
                labels: &request.labels,
                assignee: request
                    .assignee_account_id
                    .as_deref()
                    .map(|id| AccountRef { id }),
            },
        };

        tracing::info!(
            "Creating Jira ticket in {} (assignee: {})",
            self.project_key,
            request.assignee_account_id.as_deref().unwrap_or("none")
        );

        let response = self
            .client
            .post(format!("{}/rest/api/2/issue", self.base_url))
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&body)
            .send()
            .map_err(|e| transport_failure(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TicketingFailure::Rejected {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let created: CreatedIssue = response.json().map_err(|e| body_failure(&e))?;

        let url = self.browse_url(&created.key);
        tracing::info!("Jira ticket created: {url}");
        Ok(TicketRef {
            key: created.key,
            url,
        })
    }

    fn health(&self) -> Health {
        let result = self
            .client
            .get(format!(
                "{}/rest/api/2/project/{}",
                self.base_url, self.project_key
            ))
            .basic_auth(&self.email, Some(&self.api_token))
            .send();

        match result {
            Ok(response) if response.status().is_success() => Health::Connected {
                detail: format!("connected to project {}", self.project_key),
            },
            Ok(response) => Health::Failed {
                reason: format!("HTTP {}", response.status().as_u16()),
            },
            Err(e) => Health::Failed {
                reason: transport_failure(&e).to_string(),
            },
        }
    }

    fn project_key(&self) -> &str {
        &self.project_key
    }
}
