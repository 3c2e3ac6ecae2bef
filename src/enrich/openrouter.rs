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

//! Chat-completions client for an OpenAI-compatible gateway (`OpenRouter` by default).

use super::{Enricher, EnrichmentFailure};
use crate::classify::ErrorType;
use crate::config::LlmConfig;
use crate::core::status::Health;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenRouterEnricher {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenRouterEnricher {
    pub fn new(config: &LlmConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.endpoint)
    }

    fn send(&self, prompt: &str, max_tokens: u32) -> Result<String, EnrichmentFailure> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| transport_failure(&e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EnrichmentFailure::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let detail = if body.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                format!("HTTP {}: {body}", status.as_u16())
            };
            return Err(EnrichmentFailure::Transport(detail));
        }

        let parsed: ChatResponse = response.json().map_err(|e| body_failure(&e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| EnrichmentFailure::Malformed("response carried no choices".into()))
    }
}

fn transport_failure(e: &reqwest::Error) -> EnrichmentFailure {
    if e.is_timeout() {
        EnrichmentFailure::Timeout
    } else {
        EnrichmentFailure::Transport(e.to_string())
    }
}

/// The client timeout can also fire while the body is being read.
fn body_failure(e: &reqwest::Error) -> EnrichmentFailure {
    if e.is_timeout() {
        EnrichmentFailure::Timeout
    } else {
        EnrichmentFailure::Malformed(e.to_string())
    }
}

/// Prompt asking for a structured technical report
pub fn build_prompt(text: &str, error_type: ErrorType) -> String {
    format!(
        "Analyze this error log entry and provide detailed technical analysis:

Error: {text}
Error Type: {error_type}

Please provide:
1. Root Cause Analysis (2-3 sentences)
2. Immediate Fix Steps (numbered list)
3. Prevention Measures (2-3 points)
4. Technical Impact Assessment
5. Recommended Priority Level

Format as a structured technical report."
    )
}

impl Enricher for OpenRouterEnricher {
    fn enrich(&self, text: &str, error_type: ErrorType) -> Result<String, EnrichmentFailure> {
        let start = Instant::now();
        let report = self.send(&build_prompt(text, error_type), self.max_tokens)?;
        tracing::info!(
            "Model report for {error_type} received in {:?} ({} chars)",
            start.elapsed(),
            report.len()
        );
        Ok(report)
    }

    /// Lists the gateway's models, which checks the key without a billed completion.
    fn health(&self) -> Health {
        let result = self
            .client
            .get(self.models_url())
            .bearer_auth(&self.api_key)
            .send();

        match result {
            Ok(response) if response.status().is_success() => Health::Connected {
                detail: format!("AI integration active ({})", self.model),
            },
            Ok(response) => Health::Failed {
                reason: format!("HTTP {}", response.status().as_u16()),
            },
            Err(e) => Health::Failed {
                reason: transport_failure(&e).to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::io::Write;
    use std::net::TcpListener;

    fn enricher_at(endpoint: String, timeout_secs: u64) -> OpenRouterEnricher {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            endpoint,
            timeout_secs,
            ..LlmConfig::default()
        };
        OpenRouterEnricher::new(&config).expect("client")
    }

    fn enricher_for(server: &Server) -> OpenRouterEnricher {
        enricher_at(format!("{}/api/v1", server.url()), 5)
    }

    #[test]
    fn test_successful_report() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/api/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "openai/gpt-3.5-turbo",
                "max_tokens": 500
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  Root cause: pool exhausted  "}}]}"#)
            .create();

        let report = enricher_for(&server).enrich("db pool exhausted", ErrorType::Database);

        mock.assert();
        assert_eq!(report, Ok("Root cause: pool exhausted".to_string()));
    }

    #[test]
    fn test_rate_limited() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(429)
            .create();

        let report = enricher_for(&server).enrich("x", ErrorType::General);
        assert_eq!(report, Err(EnrichmentFailure::RateLimited));
    }

    #[test]
    fn test_server_error_is_transport_failure() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(502)
            .with_body("bad gateway")
            .create();

        let report = enricher_for(&server).enrich("x", ErrorType::General);
        assert_eq!(
            report,
            Err(EnrichmentFailure::Transport("HTTP 502: bad gateway".to_string()))
        );
    }

    #[test]
    fn test_missing_choices_is_malformed() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create();

        let report = enricher_for(&server).enrich("x", ErrorType::General);
        assert!(matches!(report, Err(EnrichmentFailure::Malformed(_))));
    }

    #[test]
    fn test_unanswered_request_times_out() {
        // Accepted by the kernel backlog but never answered.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/api/v1", listener.local_addr().unwrap());

        let report = enricher_at(endpoint, 1).enrich("x", ErrorType::General);
        assert_eq!(report, Err(EnrichmentFailure::Timeout));
        drop(listener);
    }

    #[test]
    fn test_stalled_body_times_out() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(br#"{"choices":"#)?;
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(b"[]}")
            })
            .create();

        let enricher = enricher_at(format!("{}/api/v1", server.url()), 1);
        assert_eq!(
            enricher.enrich("x", ErrorType::General),
            Err(EnrichmentFailure::Timeout)
        );
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create();

        let report = enricher_for(&server).enrich("x", ErrorType::General);
        assert!(matches!(report, Err(EnrichmentFailure::Malformed(_))));
    }

    #[test]
    fn test_health_lists_models_without_completion() {
        let mut server = Server::new();
        let models = server
            .mock("GET", "/api/v1/models")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create();
        let completions = server
            .mock("POST", "/api/v1/chat/completions")
            .expect(0)
            .create();

        assert!(enricher_for(&server).health().is_connected());
        models.assert();
        completions.assert();
    }

    #[test]
    fn test_health_reports_rejected_key() {
        let mut server = Server::new();
        server.mock("GET", "/api/v1/models").with_status(401).create();

        assert_eq!(
            enricher_for(&server).health(),
            Health::Failed {
                reason: "HTTP 401".to_string()
            }
        );
    }

    #[test]
    fn test_prompt_mentions_error_and_type() {
        let prompt = build_prompt("Null pointer in checkout", ErrorType::Runtime);
        assert!(prompt.contains("Error: Null pointer in checkout"));
        assert!(prompt.contains("Error Type: Runtime Error"));
    }
}
