//! Service configuration loaded from TOML.
//!
//! Every section is `#[serde(default)]`, so a partial file (or no file at
//! all) yields a runnable configuration. Secrets are normally supplied
//! through environment variables rather than the file; see
//! [`ReputationConfig::apply_env_overrides`].

use std::fmt;
use std::path::PathBuf;

use reputation_search::{GatewayConfig, SearchError};
use serde::{Deserialize, Serialize};

use crate::error::{ReputationError, Result};

/// Environment variable holding the search provider API key.
pub const ENV_SEARCH_API_KEY: &str = "REPUTATION_SEARCH_API_KEY";
/// Environment variable holding the search engine id.
pub const ENV_SEARCH_ENGINE_ID: &str = "REPUTATION_SEARCH_ENGINE_ID";
/// Environment variable holding the analysis collaborator API key.
pub const ENV_ANALYSIS_API_KEY: &str = "REPUTATION_ANALYSIS_API_KEY";

/// Hard ceiling on countries per request.
pub const MAX_COUNTRIES_LIMIT: usize = 5;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Search provider, timeout and retry settings.
    pub search: GatewayConfig,
    /// Result cache settings.
    pub cache: CacheConfig,
    /// Analysis collaborator settings.
    pub analysis: AnalysisConfig,
    /// Request limits.
    pub limits: LimitsConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port (0 picks an ephemeral port).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached fetches.
    pub max_entries: u64,
    /// Lifetime of a cached fetch, in seconds. 0 disables reuse.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 500,
            ttl_secs: 3600,
        }
    }
}

/// Analysis collaborator settings.
///
/// Without a `base_url` the collaborator is not called and every analysis
/// is the neutral default.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// OpenAI-compatible API base URL (e.g. `https://api.openai.com`).
    pub base_url: Option<String>,
    /// Bearer token. Never logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name sent with each request.
    pub model: String,
    /// Request deadline in seconds.
    pub timeout_secs: u64,
    /// Maximum snippets sent as context per call.
    pub max_snippets: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "gpt-4o-mini".to_owned(),
            timeout_secs: 30,
            max_snippets: 12,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_snippets", &self.max_snippets)
            .finish()
    }
}

/// Request limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum countries accepted per request (1..=5).
    pub max_countries: usize,
    /// Articles echoed back per country.
    pub top_articles: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_countries: MAX_COUNTRIES_LIMIT,
            top_articles: 5,
        }
    }
}

impl ReputationConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ReputationError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ReputationError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    ///
    /// `REPUTATION_CONFIG_DIR` overrides the platform config directory.
    pub fn default_config_path() -> PathBuf {
        let dir = match std::env::var_os("REPUTATION_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .map(|d| d.join("reputation"))
                .unwrap_or_else(|| PathBuf::from("/tmp/reputation-config")),
        };
        dir.join("config.toml")
    }

    /// Fill secrets from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Fill secrets from `lookup`. Blank values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = get(ENV_SEARCH_API_KEY) {
            self.search.api_key = Some(key);
        }
        if let Some(cx) = get(ENV_SEARCH_ENGINE_ID) {
            self.search.engine_id = Some(cx);
        }
        if let Some(key) = get(ENV_ANALYSIS_API_KEY) {
            self.analysis.api_key = Some(key);
        }
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReputationError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.search.validate().map_err(|e| match e {
            SearchError::Config(msg) => ReputationError::Config(format!("search.{msg}")),
            other => ReputationError::Search(other),
        })?;
        if self.cache.max_entries == 0 {
            return Err(ReputationError::Config(
                "cache.max_entries must be greater than 0".into(),
            ));
        }
        if self.analysis.timeout_secs == 0 {
            return Err(ReputationError::Config(
                "analysis.timeout_secs must be greater than 0".into(),
            ));
        }
        if !(1..=MAX_COUNTRIES_LIMIT).contains(&self.limits.max_countries) {
            return Err(ReputationError::Config(format!(
                "limits.max_countries must be between 1 and {MAX_COUNTRIES_LIMIT}"
            )));
        }
        if let Some(base_url) = &self.analysis.base_url {
            url::Url::parse(base_url).map_err(|e| {
                ReputationError::Config(format!("analysis.base_url is invalid: {e}"))
            })?;
        }
        Ok(())
    }
}
