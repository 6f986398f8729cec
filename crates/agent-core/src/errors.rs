use action_primitives::ActionError;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Errors emitted by the agent-core crate.
///
/// Tool failures never surface here; they are reported as
/// [`trailblaze_core_types::ToolResult`] values in chat history.
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM call failed after exhausting retries.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The screen state could not be captured for the next request.
    #[error("screen state unavailable: {0}")]
    ScreenState(String),

    /// A prompt template referenced a value that was not provided.
    #[error("template rendering failed: {0}")]
    Template(String),

    /// Raised when a request is malformed or missing required fields.
    #[error("invalid agent request: {0}")]
    InvalidRequest(String),

    /// Device action failed while executing a tool.
    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Helper for wrapping static string errors.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Helper for template failures.
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }
}
