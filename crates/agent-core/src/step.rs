//! Prompt steps: the natural-language objectives the agent executes.

use serde::{Deserialize, Serialize};

/// Immutable input to one objective execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptStep {
    /// Imperative instruction, e.g. "tap the login button".
    Direction { text: String },
    /// Assertion to check, e.g. "the order total is visible".
    Verification { text: String },
}

impl PromptStep {
    pub fn direction(text: impl Into<String>) -> Self {
        PromptStep::Direction { text: text.into() }
    }

    pub fn verification(text: impl Into<String>) -> Self {
        PromptStep::Verification { text: text.into() }
    }

    pub fn prompt(&self) -> &str {
        match self {
            PromptStep::Direction { text } | PromptStep::Verification { text } => text,
        }
    }

    pub fn is_verification(&self) -> bool {
        matches!(self, PromptStep::Verification { .. })
    }
}
