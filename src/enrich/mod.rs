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

//! Root-cause enrichment of failing lines.
//!
//! An [`Enricher`] asks an external model for a structured report. Every
//! failure is typed so the analyzer can substitute [`fallback::report`]
//! without aborting the run.

pub mod fallback;
pub mod openrouter;

use crate::classify::ErrorType;
use crate::config::LlmConfig;
use crate::core::status::Health;
use thiserror::Error;

pub use openrouter::OpenRouterEnricher;

/// Why an enrichment request produced no report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichmentFailure {
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by the model gateway")]
    RateLimited,
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("no model gateway configured")]
    Unconfigured,
}

/// External source of root-cause reports
pub trait Enricher: Send + Sync {
    /// Produce a report for one failing line.
    fn enrich(&self, text: &str, error_type: ErrorType) -> Result<String, EnrichmentFailure>;

    /// Probe the collaborator.
    fn health(&self) -> Health;

    /// False for stand-ins that fail every call.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Stand-in used when no API key is available
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredEnricher;

impl Enricher for UnconfiguredEnricher {
    fn enrich(&self, _text: &str, _error_type: ErrorType) -> Result<String, EnrichmentFailure> {
        Err(EnrichmentFailure::Unconfigured)
    }

    fn health(&self) -> Health {
        Health::Unconfigured
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Build the enricher described by `config`, degrading to
/// [`UnconfiguredEnricher`] when settings are missing or unusable.
pub fn from_config(config: &LlmConfig) -> Box<dyn Enricher> {
    if config.api_key.as_deref().is_none_or(str::is_empty) {
        tracing::warn!("OPENROUTER_API_KEY not set, enrichment will use fallback reports");
        return Box::new(UnconfiguredEnricher);
    }

    match OpenRouterEnricher::new(config) {
        Ok(enricher) => Box::new(enricher),
        Err(e) => {
            tracing::error!("Failed to set up model gateway client: {e}");
            Box::new(UnconfiguredEnricher)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_degrades() {
        let enricher = from_config(&LlmConfig::default());
        assert!(!enricher.is_configured());
        assert_eq!(
            enricher.enrich("db down", ErrorType::Database),
            Err(EnrichmentFailure::Unconfigured)
        );
        assert_eq!(enricher.health(), Health::Unconfigured);
    }

    #[test]
    fn test_empty_key_degrades() {
        let config = LlmConfig {
            api_key: Some(String::new()),
            ..LlmConfig::default()
        };
        assert!(!from_config(&config).is_configured());
    }
}
