//! Fluoride Common - Shared data, prompt and feedback logic
//!
//! Everything the dashboard daemon and the control CLI need: the fluoridation
//! dataset, static state/guideline tables, the prompt builder and the
//! retrying chat-completion client.

pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod feedback;
pub mod guidelines;
pub mod prompt;
pub mod states;

pub use config::{Config, DataConfig, LlmConfig, ServerConfig};
pub use dashboard::{
    feedback_request, Dashboard, FeedbackGenerator, MapPoint, SelectionView, TableRow,
    SELECT_PROMPT_MESSAGE,
};
pub use dataset::{DataSource, FluorideDataset, FluorideRecord};
pub use error::{ConfigError, DatasetError, FeedbackError, SelectionError};
pub use feedback::{
    AttemptOutcome, ChatMessage, ChatRequest, ChatTransport, FakeChatTransport, FeedbackClient,
    FeedbackResult, HttpChatTransport, EXHAUSTED_MESSAGE, UNAUTHORIZED_MESSAGE,
};
pub use guidelines::GuidelineDirectory;
pub use prompt::{build_prompt, FeedbackRequest};
