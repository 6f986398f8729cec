//! Trailblaze agent core.
//!
//! Turns natural-language prompt steps into device tool calls by repeatedly
//! asking an LLM for the next tool, executing it and feeding the resulting
//! screen state back in.

pub mod agent;
pub mod agent_loop;
pub mod errors;
pub mod executor;
pub mod gateway;
pub mod llm_client;
pub mod log;
pub mod memory;
pub mod status;
pub mod step;
pub mod tools;

pub use agent::{DeviceTrailblazeAgent, TrailblazeAgent};
pub use agent_loop::{AgentRunnerConfig, ChatRequestBuilder, TrailblazeRunner, TurnDirective};
pub use errors::AgentError;
pub use executor::{ToolCallExecutor, ToolOutcome, ToolOutcomeKind};
pub use gateway::{LlmGateway, RetryPolicy};
pub use llm_client::{
    Attachment, ChatMessage, ChatRole, LlmCapability, LlmClient, LlmError, LlmModel, LlmRequest,
    LlmResponseMessage, ToolCall, ToolChoice, ToolDescriptor,
};
pub use log::{LogSink, MemoryLogSink, TracingLogSink, TrailblazeLog};
pub use memory::AgentMemory;
pub use status::{AgentTaskStatus, AgentTaskStatusData, StepStatus};
pub use step::PromptStep;
pub use tools::{ToolDefinition, ToolKind, ToolRegistry, TrailblazeTool};
