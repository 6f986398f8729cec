//! Session orchestration: runs prompt steps in order against one runner.

use std::sync::Arc;

use action_primitives::{DeviceCommandExecutor, ScreenStateProvider};
use agent_core::{
    AgentError, AgentTaskStatus, DeviceTrailblazeAgent, LlmClient, LogSink, PromptStep,
    TrailblazeRunner,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use trailblaze_core_types::SessionId;

use crate::config::TrailblazeConfig;

/// Outcome of one prompt step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: PromptStep,
    pub status: AgentTaskStatus,
}

/// Returned by [`TrailblazeSession::finish`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    /// Total LLM round trips across all steps.
    pub llm_calls: u32,
}

impl SessionSummary {
    /// True when every executed step succeeded.
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|report| report.status.is_success())
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

pub struct TrailblazeSession {
    runner: TrailblazeRunner,
    started_at: DateTime<Utc>,
    reports: Vec<StepReport>,
}

impl TrailblazeSession {
    pub fn new(runner: TrailblazeRunner) -> Self {
        Self {
            runner,
            started_at: Utc::now(),
            reports: Vec::new(),
        }
    }

    /// Wire a device-backed agent and a runner from configuration.
    pub fn from_config(
        config: &TrailblazeConfig,
        executor: Arc<dyn DeviceCommandExecutor>,
        screen_state_provider: Arc<dyn ScreenStateProvider>,
        llm_client: Arc<dyn LlmClient>,
        log_sink: Arc<dyn LogSink>,
    ) -> Self {
        let agent = DeviceTrailblazeAgent::new(executor, screen_state_provider.clone(), config.driver)
            .with_scroll_config(config.scroll.clone());
        let runner = TrailblazeRunner::new(
            Arc::new(agent),
            screen_state_provider,
            llm_client,
            config.llm.to_model(),
        )
        .with_config(config.agent.clone())
        .with_log_sink(log_sink);
        Self::new(runner)
    }

    pub fn session_id(&self) -> &SessionId {
        self.runner.session_id()
    }

    pub fn reports(&self) -> &[StepReport] {
        &self.reports
    }

    /// Extra context for the system prompt of all following steps.
    pub fn append_to_system_prompt(&mut self, context: &str) {
        self.runner.append_to_system_prompt(context);
    }

    /// Run a single step with a fresh step status.
    pub async fn run_step(&mut self, step: PromptStep) -> Result<AgentTaskStatus, AgentError> {
        let mut status = self.runner.new_step_status(step.clone());
        let result = self.runner.run(&step, &mut status).await?;
        self.reports.push(StepReport {
            step,
            status: result.clone(),
        });
        Ok(result)
    }

    /// Run steps in order, stopping at the first one that does not succeed.
    ///
    /// Returns whether every step succeeded.
    pub async fn run_steps(
        &mut self,
        steps: impl IntoIterator<Item = PromptStep>,
    ) -> Result<bool, AgentError> {
        for step in steps {
            let prompt = step.prompt().to_string();
            let result = self.run_step(step).await?;
            if !result.is_success() {
                warn!(
                    session = %self.session_id(),
                    prompt = %prompt,
                    status = result.label(),
                    "Step did not succeed, skipping remaining steps"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn finish(self) -> SessionSummary {
        let summary = SessionSummary {
            session_id: self.runner.session_id().clone(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            llm_calls: self
                .reports
                .iter()
                .map(|report| report.status.data().call_count)
                .sum(),
            steps: self.reports,
        };
        info!(
            session = %summary.session_id,
            steps = summary.steps.len(),
            llm_calls = summary.llm_calls,
            succeeded = summary.succeeded(),
            duration_ms = summary.duration_ms(),
            "Session finished"
        );
        summary
    }
}
