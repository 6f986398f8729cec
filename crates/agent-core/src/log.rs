//! Structured audit events emitted by the agent loop.
//!
//! Sinks are fire-and-forget: a sink that fails to record an event must not
//! disturb the loop, so [`LogSink::log`] returns nothing.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use trailblaze_core_types::{SessionId, TaskId, ToolResult, TraceId};

use crate::llm_client::{ChatMessage, LlmResponseMessage, ToolChoice};
use crate::status::AgentTaskStatus;
use crate::step::PromptStep;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TrailblazeLog {
    ObjectiveStart {
        session: SessionId,
        task_id: TaskId,
        prompt_step: PromptStep,
        timestamp: DateTime<Utc>,
    },
    LlmRequest {
        session: SessionId,
        task_id: TaskId,
        trace_id: TraceId,
        step: u32,
        model_id: String,
        tool_choice: ToolChoice,
        tool_names: Vec<String>,
        request: Vec<ChatMessage>,
        response: Vec<LlmResponseMessage>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    },
    ToolExecuted {
        session: SessionId,
        trace_id: TraceId,
        tool_name: String,
        args: Map<String, Value>,
        result: ToolResult,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    ObjectiveComplete {
        session: SessionId,
        task_id: TaskId,
        prompt_step: PromptStep,
        result: AgentTaskStatus,
        timestamp: DateTime<Utc>,
    },
}

impl TrailblazeLog {
    pub fn kind(&self) -> &'static str {
        match self {
            TrailblazeLog::ObjectiveStart { .. } => "ObjectiveStart",
            TrailblazeLog::LlmRequest { .. } => "LlmRequest",
            TrailblazeLog::ToolExecuted { .. } => "ToolExecuted",
            TrailblazeLog::ObjectiveComplete { .. } => "ObjectiveComplete",
        }
    }
}

/// Receives [`TrailblazeLog`] events.
pub trait LogSink: Send + Sync {
    fn log(&self, event: TrailblazeLog);
}

/// Emits every event as JSON through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, event: TrailblazeLog) {
        match serde_json::to_string(&event) {
            Ok(json) => info!(target: "trailblaze::log", event = event.kind(), "{}", json),
            Err(err) => warn!(event = event.kind(), "failed to encode log event: {}", err),
        }
    }
}

/// Keeps events in memory, for tests and report builders.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    events: Mutex<Vec<TrailblazeLog>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrailblazeLog> {
        self.events.lock().clone()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, event: TrailblazeLog) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_counts_by_kind() {
        let sink = MemoryLogSink::new();
        let session = SessionId::new();
        let task_id = TaskId::new();
        sink.log(TrailblazeLog::ObjectiveStart {
            session: session.clone(),
            task_id,
            prompt_step: PromptStep::direction("tap"),
            timestamp: Utc::now(),
        });
        sink.log(TrailblazeLog::ToolExecuted {
            session,
            trace_id: TraceId("llm-1".to_string()),
            tool_name: "pressBack".to_string(),
            args: Map::new(),
            result: ToolResult::Success,
            duration_ms: 3,
            timestamp: Utc::now(),
        });

        assert_eq!(sink.count("ObjectiveStart"), 1);
        assert_eq!(sink.count("ToolExecuted"), 1);
        assert_eq!(sink.events().len(), 2);

        let json = serde_json::to_value(&sink.events()[1]).unwrap();
        assert_eq!(json["type"], "ToolExecuted");
        assert_eq!(json["result"]["result"], "success");

        sink.clear();
        assert!(sink.events().is_empty());
    }
}
