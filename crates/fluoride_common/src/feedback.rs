//! Resilient feedback client
//!
//! Sends a feedback prompt to an OpenAI-compatible chat-completion endpoint
//! with a fixed number of attempts. Every failure is logged and folded into
//! one of two fixed user-visible strings; nothing propagates to the caller.
//!
//! Per call: `Attempting(1) -> Success | Unauthorized | Attempting(n+1) | Exhausted`.

use crate::config::LlmConfig;
use crate::error::FeedbackError;
use crate::guidelines::GuidelineDirectory;
use crate::prompt::{build_prompt, FeedbackRequest, SYSTEM_PROMPT};
use anyhow::Result;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, warn};

/// Shown when the endpoint rejects the API key
pub const UNAUTHORIZED_MESSAGE: &str = "Error: Unauthorized access. Please check your API key.";

/// Shown when every attempt failed
pub const EXHAUSTED_MESSAGE: &str = "Feedback generation failed after multiple attempts.";

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system", "user"
    pub content: String,
}

/// Chat-completion request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// One HTTP round trip to the completion endpoint
pub trait ChatTransport: Send + Sync {
    /// Returns the raw `choices[0].message.content` of a 2xx response
    fn send(&self, request: &ChatRequest) -> Result<String, FeedbackError>;
}

/// Blocking reqwest transport
pub struct HttpChatTransport {
    endpoint: String,
    api_key: String,
    timeout_secs: f64,
    client: reqwest::blocking::Client,
}

impl HttpChatTransport {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let timeout = config.timeout()?;
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for {}", config.endpoint);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    fn classify(&self, e: reqwest::Error) -> FeedbackError {
        if e.is_timeout() {
            FeedbackError::Timeout(self.timeout_secs)
        } else {
            FeedbackError::Network(e.to_string())
        }
    }
}

impl ChatTransport for HttpChatTransport {
    fn send(&self, request: &ChatRequest) -> Result<String, FeedbackError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(FeedbackError::Unauthorized);
        }
        if !status.is_success() {
            return Err(FeedbackError::Status(status.as_u16()));
        }

        let body = response.text().map_err(|e| self.classify(e))?;
        completion_content(&body)
    }
}

/// Extract `choices[0].message.content` from a completion body
pub fn completion_content(body: &str) -> Result<String, FeedbackError> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FeedbackError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    json.get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| FeedbackError::InvalidResponse("missing choices[0].message.content".to_string()))
}

/// Result of one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(String),
    Unauthorized,
    Retryable(FeedbackError),
}

impl From<Result<String, FeedbackError>> for AttemptOutcome {
    fn from(result: Result<String, FeedbackError>) -> Self {
        match result {
            Ok(text) => AttemptOutcome::Success(text.trim().to_string()),
            Err(e) if e.is_retryable() => AttemptOutcome::Retryable(e),
            Err(_) => AttemptOutcome::Unauthorized,
        }
    }
}

/// Terminal state of a feedback call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum FeedbackResult {
    Completion(String),
    Unauthorized,
    Exhausted,
}

impl FeedbackResult {
    /// Text to show the user, completion or a fixed failure string
    pub fn text(&self) -> &str {
        match self {
            FeedbackResult::Completion(text) => text,
            FeedbackResult::Unauthorized => UNAUTHORIZED_MESSAGE,
            FeedbackResult::Exhausted => EXHAUSTED_MESSAGE,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            FeedbackResult::Completion(text) => text,
            other => other.text().to_string(),
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, FeedbackResult::Completion(_))
    }
}

impl fmt::Display for FeedbackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Prompt builder + retry loop over a transport
pub struct FeedbackClient {
    transport: Box<dyn ChatTransport>,
    directory: GuidelineDirectory,
    model: String,
    max_tokens: u32,
    max_retries: u32,
}

impl FeedbackClient {
    /// Client over the HTTP transport with the built-in guideline directory
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let transport = HttpChatTransport::new(config, config.api_key()?)?;
        Ok(Self::new(Box::new(transport), config))
    }

    pub fn new(transport: Box<dyn ChatTransport>, config: &LlmConfig) -> Self {
        Self {
            transport,
            directory: GuidelineDirectory::builtin().clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        }
    }

    pub fn with_directory(mut self, directory: GuidelineDirectory) -> Self {
        self.directory = directory;
        self
    }

    pub fn directory(&self) -> &GuidelineDirectory {
        &self.directory
    }

    /// Request body for a feedback request
    pub fn chat_request(&self, request: &FeedbackRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(&self.directory, request),
                },
            ],
            max_tokens: self.max_tokens,
        }
    }

    /// Run the attempt loop to a terminal state
    pub fn generate(&self, request: &FeedbackRequest) -> FeedbackResult {
        let body = self.chat_request(request);

        for attempt in 1..=self.max_retries {
            match AttemptOutcome::from(self.transport.send(&body)) {
                AttemptOutcome::Success(text) => {
                    debug!("Feedback for {} {} on attempt {}", request.state_name, request.year, attempt);
                    return FeedbackResult::Completion(text);
                }
                AttemptOutcome::Unauthorized => {
                    error!("Unauthorized access - check your API key.");
                    return FeedbackResult::Unauthorized;
                }
                AttemptOutcome::Retryable(FeedbackError::Timeout(_)) => {
                    error!("Timeout on attempt {}", attempt);
                }
                AttemptOutcome::Retryable(e @ FeedbackError::Network(_)) => {
                    error!("Request error on attempt {}: {}", attempt, e);
                }
                AttemptOutcome::Retryable(e) => {
                    error!("HTTP error on attempt {}: {}", attempt, e);
                }
            }
        }

        FeedbackResult::Exhausted
    }

    /// Completion text, or one of the fixed failure strings
    pub fn generate_feedback(&self, request: &FeedbackRequest) -> String {
        self.generate(request).into_text()
    }
}

/// Scripted transport for tests
pub struct FakeChatTransport {
    responses: std::sync::Mutex<Vec<Result<String, FeedbackError>>>,
    requests: std::sync::Mutex<Vec<ChatRequest>>,
}

impl FakeChatTransport {
    /// Responses are consumed in order; the last one repeats
    pub fn new(responses: Vec<Result<String, FeedbackError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: Result<String, FeedbackError>) -> Self {
        Self::new(vec![response])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl ChatTransport for FakeChatTransport {
    fn send(&self, request: &ChatRequest) -> Result<String, FeedbackError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| FeedbackError::Network("fake transport poisoned".to_string()))?;
        match responses.len() {
            0 => Err(FeedbackError::Network("no scripted response".to_string())),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}

impl<T: ChatTransport + ?Sized> ChatTransport for std::sync::Arc<T> {
    fn send(&self, request: &ChatRequest) -> Result<String, FeedbackError> {
        (**self).send(request)
    }
}
