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

use crate::classify::RoutingStrategy;
use crate::ticket::roster::Developer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Issue tracker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    pub url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
    pub project_key: String,
    pub timeout_secs: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            url: None,
            email: None,
            api_token: None,
            project_key: "OPS".to_string(),
            timeout_secs: 20,
        }
    }
}

impl JiraConfig {
    /// All settings needed to file tickets are present
    pub fn is_complete(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        present(&self.url)
            && present(&self.email)
            && present(&self.api_token)
            && !self.project_key.is_empty()
    }
}

/// Model gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
    /// Minimum spacing between two gateway calls
    pub min_call_interval_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "openai/gpt-3.5-turbo".to_string(),
            endpoint: "https://openrouter.ai/api/v1".to_string(),
            max_tokens: 500,
            temperature: 0.3,
            timeout_secs: 30,
            min_call_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum number of tickets filed per analyzed file
    pub ticket_cap: usize,
    pub routing: RoutingStrategy,
    /// Number of filed tickets kept in memory
    pub history_limit: usize,
    /// Number of enrichment reports kept in memory, 0 disables caching
    pub cache_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ticket_cap: 3,
            routing: RoutingStrategy::default(),
            history_limit: 100,
            cache_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub jira: JiraConfig,
    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
    pub server: ServerConfig,
    /// Roster used to resolve routed roles to tracker accounts
    pub developers: Vec<Developer>,
    /// Log file tailed by the recent-errors endpoint
    pub log_file_path: Option<PathBuf>,
}

impl Config {
    /// Get the path to the default config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("logtriage").join("config.json"))
    }

    /// Load configuration from `explicit` or the default location, then apply
    /// environment overrides.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::read_from(path)?,
            None => match Self::config_path().filter(|path| path.exists()) {
                Some(path) => Self::read_from(&path)?,
                None => {
                    tracing::info!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a config file without applying environment overrides
    pub fn read_from(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("Loaded config with {} developers", config.developers.len());
        Ok(config)
    }

    /// Override settings from environment variables.
    ///
    /// `lookup` is `std::env::var` in production; unparsable numeric or
    /// strategy values are logged and ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("JIRA_URL") {
            self.jira.url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(email) = get("JIRA_EMAIL") {
            self.jira.email = Some(email);
        }
        if let Some(token) = get("JIRA_API_TOKEN") {
            self.jira.api_token = Some(token);
        }
        if let Some(key) = get("PROJECT_KEY") {
            self.jira.project_key = key;
        }
        if let Some(api_key) = get("OPENROUTER_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        if let Some(model) = get("OPENROUTER_MODEL") {
            self.llm.model = model;
        }
        if let Some(endpoint) = get("OPENROUTER_URL") {
            self.llm.endpoint = endpoint;
        }
        if let Some(path) = get("LOG_FILE_PATH") {
            self.log_file_path = Some(PathBuf::from(path));
        }
        if let Some(cap) = get("LOGTRIAGE_TICKET_CAP") {
            match cap.trim().parse() {
                Ok(cap) => self.analysis.ticket_cap = cap,
                Err(e) => tracing::warn!("Ignoring LOGTRIAGE_TICKET_CAP={cap:?}: {e}"),
            }
        }
        if let Some(routing) = get("LOGTRIAGE_ROUTING") {
            match routing.parse() {
                Ok(strategy) => self.analysis.routing = strategy,
                Err(e) => tracing::warn!("Ignoring LOGTRIAGE_ROUTING: {e}"),
            }
        }
    }

    /// Save configuration to `path`, or to the default location
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path().ok_or(ConfigError::NoConfigDir)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!("Saved config to {}", path.display());
        Ok(path)
    }
}
