//! Chat request builder and prompt templates.
//!
//! Templates are bundled with the crate and rendered with `{{name}}`
//! placeholders. Rendering fails when a placeholder has no value.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::strategy::TurnDirective;
use crate::errors::AgentError;
use crate::llm_client::{Attachment, ChatMessage, LlmModel, ToolChoice};
use crate::status::StepStatus;
use crate::step::PromptStep;

pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../../resources/trailblaze_system_prompt.md");
pub const DEFAULT_USER_OBJECTIVE: &str =
    include_str!("../../resources/trailblaze_user_objective_template.md");
pub const DEFAULT_SCREEN_MESSAGE: &str =
    include_str!("../../resources/trailblaze_current_screen_user_prompt_template.md");

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("template placeholder regex"));

/// Render `{{name}}` placeholders from `values`.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> Result<String, AgentError> {
    let mut missing: Vec<String> = Vec::new();
    let rendered = PLACEHOLDER_RE.replace_all(template, |caps: &Captures<'_>| {
        let name = &caps[1];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => value.to_string(),
            None => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(AgentError::template(format!(
            "missing values for: {}",
            missing.join(", ")
        )))
    }
}

/// Reminder sent after the objective on every turn.
pub fn reminder_message(step: &PromptStep, directive: &TurnDirective) -> String {
    let mut reminder = match step {
        PromptStep::Direction { .. } if directive.status_reminder => {
            "Your last action was executed. Look at the current screen: if the objective is \
             complete call `objectiveStatus` with status `completed`, otherwise call the next \
             tool that moves toward the objective."
        }
        PromptStep::Direction { .. } => {
            "Call the one tool that makes the most progress toward the objective. Call \
             `objectiveStatus` once the objective is complete or cannot be completed."
        }
        PromptStep::Verification { .. } => {
            "This is a verification step. Do not change the state of the device. Check the \
             objective with the available tools, then call `objectiveStatus` with status \
             `completed` if it holds or `failed` if it does not."
        }
    }
    .to_string();

    if directive.tool_choice == ToolChoice::Required {
        reminder.push_str(
            "\n\nYour previous response did not contain a tool call. You must respond with a tool call.",
        );
    }
    reminder
}

/// Assembles the message list for the next LLM request.
#[derive(Debug, Clone)]
pub struct ChatRequestBuilder {
    model: LlmModel,
    system_prompt: String,
    user_objective: String,
    screen_message: String,
}

impl ChatRequestBuilder {
    pub fn new(model: LlmModel) -> Self {
        Self {
            model,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_objective: DEFAULT_USER_OBJECTIVE.to_string(),
            screen_message: DEFAULT_SCREEN_MESSAGE.to_string(),
        }
    }

    /// Replace the system prompt template.
    pub fn with_system_prompt(mut self, template: impl Into<String>) -> Self {
        self.system_prompt = template.into();
        self
    }

    pub fn model(&self) -> &LlmModel {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn append_to_system_prompt(&mut self, context: &str) {
        self.system_prompt.push('\n');
        self.system_prompt.push_str(context);
    }

    /// Messages in order: system, objective, reminder, history tail, current screen.
    pub fn build(
        &self,
        step_status: &StepStatus,
        directive: &TurnDirective,
    ) -> Result<Vec<ChatMessage>, AgentError> {
        let screen_state = step_status.current_screen_state().ok_or_else(|| {
            AgentError::ScreenState("no screen state captured for this step".to_string())
        })?;
        let prompt_step = step_status.prompt_step();

        let mut messages = Vec::with_capacity(step_status.limited_history().len() + 4);
        messages.push(ChatMessage::system(render_template(
            &self.system_prompt,
            &[("device_platform", screen_state.platform.display_name())],
        )?));
        messages.push(ChatMessage::user(render_template(
            &self.user_objective,
            &[("objective", prompt_step.prompt())],
        )?));
        messages.push(ChatMessage::user(reminder_message(prompt_step, directive)));
        messages.extend(step_status.limited_history().iter().cloned());

        let view_hierarchy = serde_json::to_string(&screen_state.view_hierarchy)?;
        let mut screen_message = ChatMessage::user(render_template(
            &self.screen_message,
            &[("view_hierarchy", view_hierarchy.as_str())],
        )?);
        if let Some(screenshot) = screen_state.screenshot() {
            if self.model.supports_vision() {
                screen_message = screen_message.with_attachment(Attachment::png(screenshot.to_vec()));
            }
        }
        messages.push(screen_message);

        Ok(messages)
    }
}
