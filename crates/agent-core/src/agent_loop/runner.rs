//! Objective runner: drives one prompt step to a terminal status.

use std::sync::Arc;
use std::time::Instant;

use action_primitives::ScreenStateProvider;
use chrono::Utc;
use tracing::{debug, info, warn};
use trailblaze_core_types::{SessionId, TraceId, TraceOrigin};

use super::config::AgentRunnerConfig;
use super::prompt::ChatRequestBuilder;
use super::strategy::{strategy_for, StrategyContext, TurnDirective};
use crate::agent::TrailblazeAgent;
use crate::errors::AgentError;
use crate::executor::ToolCallExecutor;
use crate::gateway::LlmGateway;
use crate::llm_client::{LlmClient, LlmModel, LlmRequest};
use crate::log::{LogSink, TracingLogSink, TrailblazeLog};
use crate::status::{AgentTaskStatus, StepStatus};
use crate::step::PromptStep;
use crate::tools::ToolRegistry;

/// Runs prompt steps against one agent and one model.
///
/// Each iteration captures the screen, asks the model for the next tool
/// call and executes it, until a terminal status is set or `max_steps`
/// round trips have been made.
pub struct TrailblazeRunner {
    agent: Arc<dyn TrailblazeAgent>,
    screen_state_provider: Arc<dyn ScreenStateProvider>,
    llm_client: Arc<dyn LlmClient>,
    request_builder: ChatRequestBuilder,
    registry: Arc<ToolRegistry>,
    log_sink: Arc<dyn LogSink>,
    session: SessionId,
    config: AgentRunnerConfig,
}

impl TrailblazeRunner {
    pub fn new(
        agent: Arc<dyn TrailblazeAgent>,
        screen_state_provider: Arc<dyn ScreenStateProvider>,
        llm_client: Arc<dyn LlmClient>,
        model: LlmModel,
    ) -> Self {
        Self {
            agent,
            screen_state_provider,
            llm_client,
            request_builder: ChatRequestBuilder::new(model),
            registry: Arc::new(ToolRegistry::default()),
            log_sink: Arc::new(TracingLogSink),
            session: SessionId::new(),
            config: AgentRunnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AgentRunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_log_sink(mut self, log_sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = log_sink;
        self
    }

    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_session_id(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    pub fn with_system_prompt(mut self, template: impl Into<String>) -> Self {
        self.request_builder = self.request_builder.with_system_prompt(template);
        self
    }

    pub fn config(&self) -> &AgentRunnerConfig {
        &self.config
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    /// Extend the system prompt for all subsequent requests.
    pub fn append_to_system_prompt(&mut self, context: &str) {
        self.request_builder.append_to_system_prompt(context);
    }

    /// Fresh status for `step`, using the configured history window.
    pub fn new_step_status(&self, step: PromptStep) -> StepStatus {
        StepStatus::new(step).with_history_window(self.config.history_window)
    }

    /// Drive `step` until it reaches a terminal status.
    ///
    /// Tool failures are reported to the model through chat history.
    /// Two failures abort the objective instead: LLM errors that survive the
    /// retry policy, and a screen capture that fails at the start of a turn.
    /// Without a screen there is nothing to send the model, so the capture
    /// error is returned as [`AgentError::ScreenState`] and no terminal
    /// status is recorded.
    pub async fn run(
        &self,
        step: &PromptStep,
        status: &mut StepStatus,
    ) -> Result<AgentTaskStatus, AgentError> {
        if status.prompt_step() != step {
            return Err(AgentError::invalid_request(
                "step status belongs to a different prompt step",
            ));
        }
        if status.is_finished() {
            return Err(AgentError::invalid_request(
                "step status already has a terminal status",
            ));
        }
        let max_steps = self.config.max_steps;
        if max_steps == 0 {
            return Err(AgentError::invalid_request("max_steps must be at least 1"));
        }

        self.log_sink.log(TrailblazeLog::ObjectiveStart {
            session: self.session.clone(),
            task_id: status.task_id().clone(),
            prompt_step: step.clone(),
            timestamp: Utc::now(),
        });
        info!(task_id = %status.task_id(), prompt = step.prompt(), "Objective started");

        let strategy = strategy_for(step);
        let gateway = LlmGateway::new(self.llm_client.clone(), self.config.retry);
        let executor =
            ToolCallExecutor::new(self.registry.clone(), self.log_sink.clone(), self.session.clone());
        let tools = self.registry.descriptors_for_step(step);
        let tool_names: Vec<String> = tools.iter().map(|tool| tool.name.clone()).collect();
        let mut directive = TurnDirective::default();

        loop {
            let screen_state = self
                .screen_state_provider
                .screen_state()
                .await
                .map_err(|err| AgentError::ScreenState(err.to_string()))?;
            status.prepare_next_step(screen_state);

            let started_at = Utc::now();
            let started = Instant::now();
            let messages = self.request_builder.build(status, &directive)?;
            let trace_id = TraceId::generate(TraceOrigin::Llm);
            let request = LlmRequest::new(
                self.request_builder.model().clone(),
                messages,
                tools.clone(),
                directive.tool_choice,
            );

            debug!(
                task_id = %status.task_id(),
                trace_id = %trace_id,
                step = status.current_step(),
                tool_choice = ?directive.tool_choice,
                strategy = strategy.name(),
                "Requesting next tool call"
            );
            let responses = gateway.call(&request).await?;

            self.log_sink.log(TrailblazeLog::LlmRequest {
                session: self.session.clone(),
                task_id: status.task_id().clone(),
                trace_id: trace_id.clone(),
                step: status.current_step(),
                model_id: request.model.id.clone(),
                tool_choice: request.tool_choice,
                tool_names: tool_names.clone(),
                request: request.messages,
                response: responses.clone(),
                started_at,
                duration_ms: started.elapsed().as_millis() as u64,
            });

            let ctx = StrategyContext {
                executor: &executor,
                agent: self.agent.as_ref(),
                trace_id: &trace_id,
            };
            directive = strategy
                .process_tool_messages(&responses, status, &ctx, directive)
                .await;
            status.complete_round_trip();

            if status.is_finished() {
                break;
            }
            if status.current_step() >= max_steps {
                let result = AgentTaskStatus::MaxCallsLimitReached(status.status_data(max_steps));
                warn!(task_id = %status.task_id(), max_steps, "Objective hit the step limit");
                self.log_complete(step, &result);
                return Ok(result);
            }
        }

        let result = status.current_status().clone();
        info!(
            task_id = %status.task_id(),
            status = result.label(),
            calls = result.data().call_count,
            "Objective finished"
        );
        self.log_complete(step, &result);
        Ok(result)
    }

    fn log_complete(&self, step: &PromptStep, result: &AgentTaskStatus) {
        self.log_sink.log(TrailblazeLog::ObjectiveComplete {
            session: self.session.clone(),
            task_id: result.data().task_id.clone(),
            prompt_step: step.clone(),
            result: result.clone(),
            timestamp: Utc::now(),
        });
    }
}
