//! Objective status and the per-objective mutable step state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trailblaze_core_types::{ScreenState, TaskId, ToolError, ToolResult};

use crate::llm_client::{ChatMessage, ToolCall};
use crate::step::PromptStep;

/// Bookkeeping attached to every [`AgentTaskStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTaskStatusData {
    pub task_id: TaskId,
    pub prompt: String,
    pub call_count: u32,
    pub task_start_time: DateTime<Utc>,
    pub total_duration_ms: u64,
}

/// Status of one objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentTaskStatus {
    InProgress(AgentTaskStatusData),
    Success(AgentTaskStatusData),
    Failed {
        data: AgentTaskStatusData,
        reason: String,
    },
    MaxCallsLimitReached(AgentTaskStatusData),
}

impl AgentTaskStatus {
    pub fn data(&self) -> &AgentTaskStatusData {
        match self {
            AgentTaskStatus::InProgress(data)
            | AgentTaskStatus::Success(data)
            | AgentTaskStatus::MaxCallsLimitReached(data) => data,
            AgentTaskStatus::Failed { data, .. } => data,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentTaskStatus::Success(_))
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AgentTaskStatus::InProgress(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentTaskStatus::InProgress(_) => "in_progress",
            AgentTaskStatus::Success(_) => "success",
            AgentTaskStatus::Failed { .. } => "failed",
            AgentTaskStatus::MaxCallsLimitReached(_) => "max_calls_limit_reached",
        }
    }
}

/// Mutable state of one objective execution.
///
/// Exclusively owned by the runner driving the objective.
#[derive(Debug, Clone)]
pub struct StepStatus {
    prompt_step: PromptStep,
    task_id: TaskId,
    task_created: DateTime<Utc>,
    current_step: u32,
    chat_history: Vec<ChatMessage>,
    current_screen_state: Option<ScreenState>,
    current_status: AgentTaskStatus,
    history_window: usize,
}

impl StepStatus {
    pub const DEFAULT_HISTORY_WINDOW: usize = 10;

    pub fn new(prompt_step: PromptStep) -> Self {
        let task_id = TaskId::new();
        let task_created = Utc::now();
        let current_status = AgentTaskStatus::InProgress(AgentTaskStatusData {
            task_id: task_id.clone(),
            prompt: prompt_step.prompt().to_string(),
            call_count: 0,
            task_start_time: task_created,
            total_duration_ms: 0,
        });

        Self {
            prompt_step,
            task_id,
            task_created,
            current_step: 0,
            chat_history: Vec::new(),
            current_screen_state: None,
            current_status,
            history_window: Self::DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn prompt_step(&self) -> &PromptStep {
        &self.prompt_step
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn task_created(&self) -> DateTime<Utc> {
        self.task_created
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn current_status(&self) -> &AgentTaskStatus {
        &self.current_status
    }

    pub fn current_screen_state(&self) -> Option<&ScreenState> {
        self.current_screen_state.as_ref()
    }

    /// Full, append-only chat history.
    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat_history
    }

    /// Tail of the history sent to the model.
    pub fn limited_history(&self) -> &[ChatMessage] {
        let start = self.chat_history.len().saturating_sub(self.history_window);
        &self.chat_history[start..]
    }

    /// Install the screen state captured for the upcoming round trip.
    pub fn prepare_next_step(&mut self, screen_state: ScreenState) {
        self.current_screen_state = Some(screen_state);
    }

    /// Count a finished request/response/tool round trip.
    pub fn complete_round_trip(&mut self) {
        self.current_step += 1;
    }

    pub fn add_tool_exchange(&mut self, llm_message: Option<&str>, call: ToolCall, result: ToolResult) {
        self.chat_history.push(
            ChatMessage::assistant(llm_message.unwrap_or_default()).with_tool_exchange(call, result),
        );
    }

    /// Record a turn in which the model produced no tool call.
    pub fn add_empty_turn(&mut self, llm_message: Option<&str>) {
        let mut message = ChatMessage::assistant(llm_message.unwrap_or_default());
        message.tool_result = Some(ToolResult::Error(ToolError::EmptyToolCall));
        self.chat_history.push(message);
    }

    /// Mark the objective complete. Ignored once a terminal status is set.
    pub fn mark_as_complete(&mut self) {
        if self.is_finished() {
            return;
        }
        self.current_status = AgentTaskStatus::Success(self.in_flight_data());
    }

    /// Mark the objective failed. Ignored once a terminal status is set.
    pub fn mark_as_failed(&mut self, reason: impl Into<String>) {
        if self.is_finished() {
            return;
        }
        self.current_status = AgentTaskStatus::Failed {
            data: self.in_flight_data(),
            reason: reason.into(),
        };
    }

    pub fn is_finished(&self) -> bool {
        self.current_status.is_terminal()
    }

    /// Status data with an explicit call count and the elapsed time so far.
    pub fn status_data(&self, call_count: u32) -> AgentTaskStatusData {
        let elapsed = Utc::now() - self.task_created;
        AgentTaskStatusData {
            task_id: self.task_id.clone(),
            prompt: self.prompt_step.prompt().to_string(),
            call_count,
            task_start_time: self.task_created,
            total_duration_ms: elapsed.num_milliseconds().max(0) as u64,
        }
    }

    // Terminal transitions happen mid round trip, which counts as a call.
    fn in_flight_data(&self) -> AgentTaskStatusData {
        self.status_data(self.current_step + 1)
    }
}
