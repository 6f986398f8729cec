//! Step tool strategies: how the tool calls of one LLM response are executed.

use async_trait::async_trait;
use tracing::{debug, warn};
use trailblaze_core_types::TraceId;

use crate::agent::TrailblazeAgent;
use crate::executor::{ToolCallExecutor, ToolOutcome, ToolOutcomeKind};
use crate::llm_client::{LlmResponseMessage, ToolCall, ToolChoice};
use crate::status::StepStatus;
use crate::step::PromptStep;

/// Per-turn request shaping, derived from the previous turn's outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnDirective {
    /// `Required` after a turn that produced no tool call.
    pub tool_choice: ToolChoice,
    /// Remind the model to report objective status after a successful action.
    pub status_reminder: bool,
}

impl TurnDirective {
    /// Directive following the given executed outcomes.
    fn after(outcomes: &[ToolOutcome], previous: TurnDirective) -> Self {
        let status_reminder = outcomes
            .iter()
            .fold(previous.status_reminder, |reminder, outcome| match outcome.kind {
                ToolOutcomeKind::ObjectiveStatus => false,
                _ if outcome.is_successful_action() => true,
                _ => reminder,
            });
        Self {
            tool_choice: ToolChoice::Auto,
            status_reminder,
        }
    }
}

/// Everything a strategy needs to execute tool calls for one turn.
pub struct StrategyContext<'a> {
    pub executor: &'a ToolCallExecutor,
    pub agent: &'a dyn TrailblazeAgent,
    pub trace_id: &'a TraceId,
}

#[async_trait]
pub trait StepToolStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Execute the tool calls of one response and return the next turn's directive.
    async fn process_tool_messages(
        &self,
        responses: &[LlmResponseMessage],
        step: &mut StepStatus,
        ctx: &StrategyContext<'_>,
        previous: TurnDirective,
    ) -> TurnDirective;
}

/// Direction steps: one tool call per turn.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleToolStrategy;

#[async_trait]
impl StepToolStrategy for SingleToolStrategy {
    fn name(&self) -> &'static str {
        "single"
    }

    async fn process_tool_messages(
        &self,
        responses: &[LlmResponseMessage],
        step: &mut StepStatus,
        ctx: &StrategyContext<'_>,
        previous: TurnDirective,
    ) -> TurnDirective {
        let text = assistant_text(responses);
        let calls = tool_calls(responses);

        let Some((first, ignored)) = calls.split_first() else {
            debug!(task_id = %step.task_id(), "No tool call in response, forcing one next turn");
            step.add_empty_turn(text.as_deref());
            return TurnDirective {
                tool_choice: ToolChoice::Required,
                status_reminder: previous.status_reminder,
            };
        };
        if !ignored.is_empty() {
            warn!(
                task_id = %step.task_id(),
                ignored = ignored.len(),
                "Response carried more than one tool call; only the first is executed"
            );
        }

        let outcome = ctx
            .executor
            .execute(text.as_deref(), first, step, ctx.agent, ctx.trace_id)
            .await;
        TurnDirective::after(&[outcome], previous)
    }
}

/// Verification steps: every tool call of a response, in order, against the
/// same screen state.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultipleToolStrategy;

#[async_trait]
impl StepToolStrategy for MultipleToolStrategy {
    fn name(&self) -> &'static str {
        "multiple"
    }

    async fn process_tool_messages(
        &self,
        responses: &[LlmResponseMessage],
        step: &mut StepStatus,
        ctx: &StrategyContext<'_>,
        previous: TurnDirective,
    ) -> TurnDirective {
        let text = assistant_text(responses);
        let calls = tool_calls(responses);

        if calls.is_empty() {
            step.add_empty_turn(text.as_deref());
            return TurnDirective {
                tool_choice: ToolChoice::Auto,
                status_reminder: previous.status_reminder,
            };
        }

        let mut outcomes = Vec::with_capacity(calls.len());
        for (position, call) in calls.iter().enumerate() {
            // The model's text belongs to the turn, not to each call.
            let message = if position == 0 { text.as_deref() } else { None };
            outcomes.push(
                ctx.executor
                    .execute(message, call, step, ctx.agent, ctx.trace_id)
                    .await,
            );
        }
        TurnDirective::after(&outcomes, previous)
    }
}

/// Strategy for a prompt step kind.
pub fn strategy_for(step: &PromptStep) -> Box<dyn StepToolStrategy> {
    match step {
        PromptStep::Direction { .. } => Box::new(SingleToolStrategy),
        PromptStep::Verification { .. } => Box::new(MultipleToolStrategy),
    }
}

fn tool_calls(responses: &[LlmResponseMessage]) -> Vec<&ToolCall> {
    responses
        .iter()
        .filter_map(|message| match message {
            LlmResponseMessage::ToolCall(call) => Some(call),
            LlmResponseMessage::Assistant { .. } => None,
        })
        .collect()
}

fn assistant_text(responses: &[LlmResponseMessage]) -> Option<String> {
    let parts: Vec<&str> = responses
        .iter()
        .filter_map(|message| match message {
            LlmResponseMessage::Assistant { content } if !content.trim().is_empty() => {
                Some(content.as_str())
            }
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}
