//! Configuration management for the fluoride dashboard.
//!
//! Loads settings from $FLUORIDE_CONFIG or /etc/fluoride/config.toml, falling
//! back to defaults, then applies environment overrides. The API key only ever
//! comes from the environment.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/fluoride/config.toml";

/// Environment variable pointing at an alternate config file
pub const CONFIG_PATH_ENV: &str = "FLUORIDE_CONFIG";

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Env file read by the binaries at startup
pub const DOTENV_PATH: &str = ".env";

/// Published CSV of state highest adjusted CWS fluoride averages
pub const DEFAULT_DATA_SOURCE: &str =
    "https://github.com/rmejia41/open_datasets/raw/main/StateHighestAnnualAverageFluoride.csv";

/// Chat-completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,

    /// Total attempts per feedback request, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Skip TLS certificate verification on the outbound call
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Taken from OPENAI_API_KEY, never from the file
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_timeout() -> f64 {
    30.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_tokens() -> u32 {
    350
}

impl LlmConfig {
    /// Per-attempt timeout as a Duration
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        timeout_from_secs(self.timeout_secs).ok_or(ConfigError::InvalidValue {
            key: "llm.timeout_secs",
            value: self.timeout_secs.to_string(),
        })
    }

    /// Longest a feedback call can take: every attempt hitting its timeout
    pub fn worst_case_duration(&self) -> Result<Duration, ConfigError> {
        self.timeout()?
            .checked_mul(self.max_retries.max(1))
            .ok_or(ConfigError::InvalidValue {
                key: "llm.max_retries",
                value: self.max_retries.to_string(),
            })
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}

/// None for zero, negative, non-finite or out-of-range values
fn timeout_from_secs(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok().filter(|d| !d.is_zero())
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            max_tokens: default_max_tokens(),
            accept_invalid_certs: false,
            api_key: None,
        }
    }
}

/// Dataset location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Local path or http(s) URL of the CSV
    #[serde(default = "default_data_source")]
    pub source: String,
}

fn default_data_source() -> String {
    DEFAULT_DATA_SOURCE.to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: default_data_source(),
        }
    }
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    // Bind to localhost only by default
    "127.0.0.1:8050".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load file config and environment overrides, requiring an API key
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_without_key()?;
        config.require_api_key()?;
        Ok(config)
    }

    /// Same as `load` but tolerates a missing API key (offline commands)
    pub fn load_without_key() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).exists() {
            let config = Self::load_from_path(&path)?;
            info!("Config loaded from {}", path);
            config
        } else {
            warn!("Config not found at {}, using defaults", path);
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.llm.timeout()?;
        Ok(config)
    }

    /// Read KEY=VALUE pairs from an env file into the process environment.
    /// Variables already set are kept. Returns false when the file is absent.
    pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
        match dotenvy::from_path(path) {
            Ok(()) => {
                info!("Environment loaded from {}", path.display());
                Ok(true)
            }
            Err(e) if e.not_found() => Ok(false),
            Err(e) => Err(ConfigError::EnvFile {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(endpoint) = lookup("FLUORIDE_LLM_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Some(value) = lookup("FLUORIDE_LLM_TIMEOUT") {
            self.llm.timeout_secs = value
                .parse::<f64>()
                .ok()
                .filter(|secs| timeout_from_secs(*secs).is_some())
                .ok_or(ConfigError::InvalidOverride {
                    key: "FLUORIDE_LLM_TIMEOUT",
                    value,
                })?;
        }
        if let Some(value) = lookup("FLUORIDE_LLM_RETRIES") {
            self.llm.max_retries = value.parse().map_err(|_| ConfigError::InvalidOverride {
                key: "FLUORIDE_LLM_RETRIES",
                value,
            })?;
        }
        if let Some(source) = lookup("FLUORIDE_DATA_SOURCE") {
            self.data.source = source;
        }
        if let Some(bind) = lookup("FLUORIDE_BIND") {
            self.server.bind = bind;
        }
        Ok(())
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.llm.api_key()
    }
}
