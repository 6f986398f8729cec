//! Configuration for the objective runner.

use serde::{Deserialize, Serialize};

use crate::gateway::RetryPolicy;

/// Tunables of one [`TrailblazeRunner`](super::TrailblazeRunner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentRunnerConfig {
    /// Maximum LLM round trips per objective.
    /// Default: 50
    pub max_steps: u32,

    /// Number of trailing chat history entries sent with each request.
    /// Default: 10
    pub history_window: usize,

    /// Retry policy applied to every LLM call.
    pub retry: RetryPolicy,
}

impl Default for AgentRunnerConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            history_window: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl AgentRunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small limits and no retry backoff, for tests.
    pub fn minimal() -> Self {
        Self {
            max_steps: 5,
            history_window: 4,
            retry: RetryPolicy::none(),
        }
    }

    /// Builder: set max steps.
    pub fn with_max_steps(mut self, steps: u32) -> Self {
        self.max_steps = steps;
        self
    }

    /// Builder: set the history window.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Builder: set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
