//! Error types for the fluoride dashboard.

use thiserror::Error;

/// Failure of a single chat-completion attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedbackError {
    #[error("Unauthorized access (HTTP 401)")]
    Unauthorized,

    #[error("HTTP error: status {0}")]
    Status(u16),

    #[error("Request error: {0}")]
    Network(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(f64),

    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),
}

impl FeedbackError {
    /// Only an authorization failure ends the retry loop early
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FeedbackError::Unauthorized)
    }
}

/// Dataset ingestion errors
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column '{0}' in dataset header")]
    MissingColumn(&'static str),

    #[error("Invalid year '{value}' on line {line}")]
    InvalidYear { value: String, line: u64 },

    #[error("Failed to fetch dataset: {0}")]
    Fetch(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("OpenAI API key not found. Please set the OPENAI_API_KEY environment variable.")]
    MissingApiKey,

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {key}")]
    InvalidOverride { key: &'static str, value: String },

    #[error("Invalid config value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to read env file {path}: {message}")]
    EnvFile { path: String, message: String },
}

/// Dashboard selection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown state abbreviation '{0}'")]
    UnknownState(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unauthorized_is_terminal() {
        assert!(!FeedbackError::Unauthorized.is_retryable());
        assert!(FeedbackError::Status(500).is_retryable());
        assert!(FeedbackError::Status(429).is_retryable());
        assert!(FeedbackError::Network("refused".into()).is_retryable());
        assert!(FeedbackError::Timeout(30.0).is_retryable());
        assert!(FeedbackError::InvalidResponse("no choices".into()).is_retryable());
    }

    #[test]
    fn test_missing_key_message() {
        let msg = ConfigError::MissingApiKey.to_string();
        assert!(msg.contains("OPENAI_API_KEY"));
    }
}
