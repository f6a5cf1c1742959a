//! Runtime configuration.
//!
//! Values come from the environment (after an optional `.env` file has been
//! loaded by the binary) and can be overridden by CLI flags.

use crate::llm::LlmProvider;
use crate::types::{AnalyticsError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "data/freelancer_earnings.db";
pub const DEFAULT_CSV_PATH: &str = "data/freelancer_earnings_bd.csv";
pub const DEFAULT_AUDIT_LOG: &str = "llm_results.log";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Language model settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name; also selects the provider
    pub model: String,
    /// API key for the selected provider
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl LlmConfig {
    /// Provider implied by the model name.
    pub fn provider(&self) -> LlmProvider {
        LlmProvider::from_model(&self.model)
    }

    /// API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AnalyticsError::ConfigError(format!(
                    "{} environment variable not set (model: {})",
                    self.provider().api_key_env(),
                    self.model
                ))
            })
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub db_path: PathBuf,
    /// Source CSV for `init`
    pub csv_path: PathBuf,
    /// Audit log of model results; `None` when disabled with an empty value
    pub audit_log: Option<PathBuf>,
    pub llm: LlmConfig,
}

/// Expand `~` and environment references in a path.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::ConfigError` if the timeout is not a number
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: &str| expand_path(&lookup(key).unwrap_or_else(|| default.to_string()));

        let model = lookup("EARNINGS_LLM_MODEL")
            .or_else(|| lookup("GEMINI_MODEL"))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_key = lookup(LlmProvider::from_model(&model).api_key_env());

        let timeout_secs = match lookup("EARNINGS_LLM_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AnalyticsError::ConfigError(format!(
                    "EARNINGS_LLM_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            db_path: path("EARNINGS_DB_PATH", DEFAULT_DB_PATH),
            csv_path: path("EARNINGS_CSV_PATH", DEFAULT_CSV_PATH),
            audit_log: match lookup("EARNINGS_AUDIT_LOG") {
                Some(raw) if raw.trim().is_empty() => None,
                Some(raw) => Some(expand_path(&raw)),
                None => Some(PathBuf::from(DEFAULT_AUDIT_LOG)),
            },
            llm: LlmConfig {
                model,
                api_key,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }

    /// Switch model; the API key is re-resolved for the new provider.
    pub fn with_model<F>(mut self, model: String, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.llm.api_key = lookup(LlmProvider::from_model(&model).api_key_env());
        self.llm.model = model;
        self
    }
}
