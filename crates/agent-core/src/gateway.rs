//! LLM call gateway with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::llm_client::{LlmClient, LlmError, LlmRequest, LlmResponseMessage};

/// Retry schedule for LLM calls.
///
/// After failed attempt `n` the gateway waits `base_delay_ms + (n - 1) * step_delay_ms`
/// before the next attempt. The last attempt's error is returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    /// Default: 3
    pub max_attempts: u32,
    /// Default: 1000
    pub base_delay_ms: u64,
    /// Default: 3000
    pub step_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            step_delay_ms: 3_000,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based), or `None` when
    /// the attempt was the last one.
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }
        let delay = self.base_delay_ms + u64::from(attempt - 1) * self.step_delay_ms;
        Some(Duration::from_millis(delay))
    }
}

/// Issues LLM requests on behalf of the runner.
#[derive(Clone)]
pub struct LlmGateway {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl LlmGateway {
    pub fn new(client: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Call the model, retrying transport failures per the [`RetryPolicy`].
    pub async fn call(&self, request: &LlmRequest) -> Result<Vec<LlmResponseMessage>, LlmError> {
        let mut attempt = 1;
        loop {
            let mut outgoing = request.clone();
            outgoing.id = Uuid::new_v4().to_string();
            debug!(request_id = %outgoing.id, attempt, "Calling LLM");

            match self.client.execute(&outgoing).await {
                Ok(response) => return Ok(response),
                Err(err) => match self.retry.backoff_after(attempt) {
                    Some(delay) => {
                        warn!(
                            attempt,
                            max_attempts = self.retry.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "LLM call failed, retrying: {}",
                            err
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(err),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{LlmModel, ToolChoice};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::time::Instant;

    struct FlakyClient {
        failures: u32,
        seen: Mutex<Vec<(String, Instant)>>,
    }

    #[async_trait]
    impl LlmClient for FlakyClient {
        async fn execute(
            &self,
            request: &LlmRequest,
        ) -> Result<Vec<LlmResponseMessage>, LlmError> {
            let mut seen = self.seen.lock();
            seen.push((request.id.clone(), Instant::now()));
            let attempt = seen.len() as u32;
            if attempt <= self.failures {
                Err(LlmError::Transport(format!("attempt {attempt} failed")))
            } else {
                Ok(vec![LlmResponseMessage::Assistant {
                    content: "ok".to_string(),
                }])
            }
        }
    }

    fn request() -> LlmRequest {
        LlmRequest::new(
            LlmModel::new("test-model", "test"),
            Vec::new(),
            Vec::new(),
            ToolChoice::Auto,
        )
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_after(1), Some(Duration::from_millis(1_000)));
        assert_eq!(policy.backoff_after(2), Some(Duration::from_millis(4_000)));
        assert_eq!(policy.backoff_after(3), None);
        assert_eq!(RetryPolicy::none().backoff_after(1), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let client = Arc::new(FlakyClient {
            failures: 2,
            seen: Mutex::new(Vec::new()),
        });
        let gateway = LlmGateway::new(client.clone(), RetryPolicy::default());
        let started = Instant::now();

        let response = gateway.call(&request()).await.unwrap();
        assert_eq!(response.len(), 1);

        let seen = client.seen.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].1 - started, Duration::from_millis(1_000));
        assert_eq!(seen[2].1 - started, Duration::from_millis(5_000));
        assert_ne!(seen[0].0, seen[1].0);
        assert_ne!(seen[1].0, seen[2].0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_failure_propagates_unchanged() {
        let client = Arc::new(FlakyClient {
            failures: 10,
            seen: Mutex::new(Vec::new()),
        });
        let gateway = LlmGateway::new(client.clone(), RetryPolicy::default());

        let err = gateway.call(&request()).await.unwrap_err();
        assert_eq!(err, LlmError::Transport("attempt 3 failed".to_string()));
        assert_eq!(client.seen.lock().len(), 3);
    }
}
