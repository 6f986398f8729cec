//! Tool call resolver and executor.
//!
//! Every outcome, including agent failures, is converted into a
//! [`ToolResult`] and appended to the step's chat history. Nothing raised
//! while executing a tool escapes this boundary.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use trailblaze_core_types::{SessionId, ToolError, ToolResult, TraceId};

use crate::agent::TrailblazeAgent;
use crate::errors::AgentError;
use crate::llm_client::ToolCall;
use crate::log::{LogSink, TrailblazeLog};
use crate::status::StepStatus;
use crate::tools::{ObjectiveStatusTool, ToolRegistry, TrailblazeTool};

/// What kind of tool produced a [`ToolOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcomeKind {
    ObjectiveStatus,
    Action,
    /// The call could not be resolved to a registered tool.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub tool_name: String,
    pub kind: ToolOutcomeKind,
    pub result: ToolResult,
}

impl ToolOutcome {
    /// A successful device action, as opposed to a status report.
    pub fn is_successful_action(&self) -> bool {
        self.kind == ToolOutcomeKind::Action && self.result.is_success()
    }
}

pub struct ToolCallExecutor {
    registry: Arc<ToolRegistry>,
    log_sink: Arc<dyn LogSink>,
    session: SessionId,
}

impl ToolCallExecutor {
    pub fn new(registry: Arc<ToolRegistry>, log_sink: Arc<dyn LogSink>, session: SessionId) -> Self {
        Self {
            registry,
            log_sink,
            session,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve and execute one tool call, then append the exchange to history.
    ///
    /// Tools not offered for the step resolve as unknown. Objective status
    /// effects are applied to `step` before the result is appended.
    pub async fn execute(
        &self,
        llm_message: Option<&str>,
        call: &ToolCall,
        step: &mut StepStatus,
        agent: &dyn TrailblazeAgent,
        trace_id: &TraceId,
    ) -> ToolOutcome {
        let started = Instant::now();

        let (kind, result) = match self.registry.resolve_for_step(call, step.prompt_step()) {
            Err(err) => (ToolOutcomeKind::Unresolved, ToolResult::Error(err)),
            Ok(TrailblazeTool::ObjectiveStatus(status)) => (
                ToolOutcomeKind::ObjectiveStatus,
                apply_objective_status(&status, step),
            ),
            Ok(tool) => {
                let executed = match step.current_screen_state() {
                    Some(screen_state) => agent.run_tool(&tool, screen_state, trace_id).await,
                    None => Err(AgentError::ScreenState(
                        "no screen state captured for this step".to_string(),
                    )),
                };
                let result = executed.unwrap_or_else(|err| {
                    warn!(trace_id = %trace_id, tool = tool.name(), "Tool raised an error: {}", err);
                    ToolResult::Error(ToolError::from_error(&err, Some(tool.to_json())))
                });
                (ToolOutcomeKind::Action, result)
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            trace_id = %trace_id,
            tool = %call.tool_name,
            success = result.is_success(),
            duration_ms,
            "Tool executed"
        );

        step.add_tool_exchange(llm_message, call.clone(), result.clone());
        self.log_sink.log(TrailblazeLog::ToolExecuted {
            session: self.session.clone(),
            trace_id: trace_id.clone(),
            tool_name: call.tool_name.clone(),
            args: call.raw_arguments.clone(),
            result: result.clone(),
            duration_ms,
            timestamp: Utc::now(),
        });

        ToolOutcome {
            tool_name: call.tool_name.clone(),
            kind,
            result,
        }
    }
}

/// `in_progress` leaves the step running, `completed` and `failed` end it.
/// A failed objective is still a successful tool call.
fn apply_objective_status(status: &ObjectiveStatusTool, step: &mut StepStatus) -> ToolResult {
    match status.status.as_str() {
        "in_progress" => ToolResult::Success,
        "failed" => {
            step.mark_as_failed(status.explanation.clone());
            ToolResult::Success
        }
        "completed" => {
            step.mark_as_complete();
            ToolResult::Success
        }
        _ => ToolResult::Error(ToolError::UnknownTrailblazeTool {
            tool: TrailblazeTool::from(status.clone()).to_json(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLogSink;
    use crate::status::AgentTaskStatus;
    use crate::step::PromptStep;
    use action_primitives::ActionError;
    use async_trait::async_trait;
    use serde_json::json;
    use trailblaze_core_types::{DevicePlatform, ScreenState, TraceOrigin, ViewHierarchyTreeNode};

    struct BrokenAgent;

    #[async_trait]
    impl TrailblazeAgent for BrokenAgent {
        async fn run_tool(
            &self,
            _tool: &TrailblazeTool,
            _screen_state: &ScreenState,
            _trace_id: &TraceId,
        ) -> Result<ToolResult, AgentError> {
            Err(ActionError::DeviceIo("adb connection reset".to_string()).into())
        }
    }

    fn executor(sink: Arc<MemoryLogSink>) -> ToolCallExecutor {
        ToolCallExecutor::new(Arc::new(ToolRegistry::default()), sink, SessionId::new())
    }

    fn step() -> StepStatus {
        let mut step = StepStatus::new(PromptStep::direction("tap login"));
        step.prepare_next_step(ScreenState::new(
            ViewHierarchyTreeNode::default(),
            1080,
            1920,
            DevicePlatform::Android,
        ));
        step
    }

    fn status_call(status: &str) -> ToolCall {
        ToolCall::new(
            "objectiveStatus",
            json!({"explanation": "login screen gone", "status": status}),
        )
    }

    #[tokio::test]
    async fn test_objective_status_semantics() {
        let sink = Arc::new(MemoryLogSink::new());
        let executor = executor(sink.clone());
        let trace = TraceId::generate(TraceOrigin::Llm);

        let mut running = step();
        let outcome = executor
            .execute(None, &status_call("in_progress"), &mut running, &BrokenAgent, &trace)
            .await;
        assert!(outcome.result.is_success());
        assert_eq!(outcome.kind, ToolOutcomeKind::ObjectiveStatus);
        assert!(!running.is_finished());

        let mut failing = step();
        let outcome = executor
            .execute(None, &status_call("failed"), &mut failing, &BrokenAgent, &trace)
            .await;
        assert!(outcome.result.is_success());
        assert!(matches!(
            failing.current_status(),
            AgentTaskStatus::Failed { reason, .. } if reason == "login screen gone"
        ));
        assert_eq!(
            failing.chat_history()[0].tool_result,
            Some(ToolResult::Success)
        );

        let mut done = step();
        executor
            .execute(None, &status_call("completed"), &mut done, &BrokenAgent, &trace)
            .await;
        assert!(done.current_status().is_success());

        let mut odd = step();
        let outcome = executor
            .execute(None, &status_call("paused"), &mut odd, &BrokenAgent, &trace)
            .await;
        assert!(matches!(
            outcome.result,
            ToolResult::Error(ToolError::UnknownTrailblazeTool { .. })
        ));
        assert!(!odd.is_finished());
        assert_eq!(sink.count("ToolExecuted"), 4);
    }

    #[tokio::test]
    async fn test_agent_errors_become_exception_results() {
        let executor = executor(Arc::new(MemoryLogSink::new()));
        let mut step = step();

        let outcome = executor
            .execute(
                Some("tapping"),
                &ToolCall::new("pressBack", json!({})),
                &mut step,
                &BrokenAgent,
                &TraceId::generate(TraceOrigin::Llm),
            )
            .await;

        match &outcome.result {
            ToolResult::Error(ToolError::ExceptionThrown {
                error_message,
                tool,
                ..
            }) => {
                assert_eq!(error_message, "Device I/O error: adb connection reset");
                assert_eq!(tool.as_ref().unwrap()["toolName"], "pressBack");
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(!outcome.is_successful_action());

        let entry = &step.chat_history()[0];
        assert_eq!(entry.content, "tapping");
        assert_eq!(entry.tool_call.as_ref().unwrap().tool_name, "pressBack");
    }
}
