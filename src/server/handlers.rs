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


use super::AppState;
use crate::core::{Classification, DeveloperMapping, InputError, RunSummary, StatusReport, TicketRecord};
use crate::parser;
use crate::ticket::TicketingFailure;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Multipart field carrying the log file
pub const UPLOAD_FIELD: &str = "logFile";

const RECENT_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Ticketing(#[from] TicketingFailure),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Input(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Ticketing(TicketingFailure::Unconfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Ticketing(TicketingFailure::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Self::Ticketing(
                TicketingFailure::Unreachable(_)
                | TicketingFailure::Rejected { .. }
                | TicketingFailure::Malformed(_),
            ) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::warn!("Rejected request: {self}");
        }
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `POST /api/analyze`
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RunSummary>, ApiError> {
    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            tracing::info!(
                "Received upload {}",
                field.file_name().unwrap_or("(unnamed)")
            );
            upload = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            );
        }
    }

    let analyzer = Arc::clone(&state.analyzer);
    let ticket_cap = state.config.analysis.ticket_cap;
    let summary =
        run_blocking(move || analyzer.analyze_upload(upload.as_deref(), ticket_cap)).await??;
    Ok(Json(summary))
}

/// `GET /api/status`
pub async fn status(State(state): State<AppState>) -> Json<Arc<StatusReport>> {
    Json(state.status.load_full())
}

#[derive(Debug, Serialize)]
pub struct TicketsResponse {
    pub tickets: Vec<TicketRecord>,
}

/// `GET /api/tickets`
pub async fn tickets(State(state): State<AppState>) -> Json<TicketsResponse> {
    Json(TicketsResponse {
        tickets: state.analyzer.recent_tickets(RECENT_LIMIT),
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateTicketResponse {
    pub success: bool,
    pub key: String,
    pub url: String,
}

/// `POST /api/create_ticket`
pub async fn create_ticket(
    State(state): State<AppState>,
    Json(body): Json<CreateTicketBody>,
) -> Result<Json<CreateTicketResponse>, ApiError> {
    let message = body
        .error_message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| "Unknown error".to_string());

    let analyzer = Arc::clone(&state.analyzer);
    let ticket = run_blocking(move || analyzer.create_manual_ticket(&message)).await??;
    Ok(Json(CreateTicketResponse {
        success: true,
        key: ticket.key,
        url: ticket.url,
    }))
}

#[derive(Debug, Serialize)]
pub struct TestTicketResponse {
    pub success: bool,
    pub message: &'static str,
    pub ticket_url: String,
    pub ticket_key: String,
    pub status: String,
}

/// `GET /api/test-jira`
pub async fn test_jira(
    State(state): State<AppState>,
) -> Result<Json<TestTicketResponse>, ApiError> {
    let analyzer = Arc::clone(&state.analyzer);
    let ticket = run_blocking(move || analyzer.create_test_ticket()).await??;
    Ok(Json(TestTicketResponse {
        success: true,
        message: "Test ticket created successfully",
        ticket_url: ticket.url,
        ticket_key: ticket.key,
        status: state.status.load().jira_status.clone(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TeamAssignmentBody {
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TeamAssignmentResponse {
    pub success: bool,
    pub results: Vec<Classification>,
}

/// `POST /api/test-team-assignment`
pub async fn test_team_assignment(
    State(state): State<AppState>,
    body: Option<Json<TeamAssignmentBody>>,
) -> Json<TeamAssignmentResponse> {
    let errors = body.map(|Json(body)| body.errors).unwrap_or_default();
    Json(TeamAssignmentResponse {
        success: true,
        results: state.analyzer.classify_batch(&errors),
    })
}

#[derive(Debug, Serialize)]
pub struct DeveloperMappingResponse {
    pub success: bool,
    #[serde(flatten)]
    pub mapping: DeveloperMapping,
}

/// `GET /api/test-developer-mapping`
pub async fn test_developer_mapping(
    State(state): State<AppState>,
) -> Json<DeveloperMappingResponse> {
    Json(DeveloperMappingResponse {
        success: true,
        mapping: state.analyzer.developer_mapping(),
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorsResponse {
    pub errors: Vec<String>,
}

/// `GET /api/errors`
pub async fn errors(State(state): State<AppState>) -> Json<ErrorsResponse> {
    let Some(path) = state.config.log_file_path.as_ref() else {
        return Json(ErrorsResponse { errors: Vec::new() });
    };

    let errors = match tokio::fs::read(path).await {
        Ok(bytes) => parser::recent_errors(&parser::decode(&bytes), RECENT_LIMIT),
        Err(e) => {
            tracing::warn!("Cannot read {}: {e}", path.display());
            Vec::new()
        }
    };
    Json(ErrorsResponse { errors })
}
