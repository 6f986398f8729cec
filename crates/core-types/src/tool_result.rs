//! Tool result union.
//!
//! Every tool outcome, including device-layer failures, is reported back to
//! the LLM through [`ToolResult`]. Errors are values here, never panics.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of executing one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ToolResult {
    Success,
    Error(ToolError),
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success)
    }

    pub fn error(&self) -> Option<&ToolError> {
        match self {
            ToolResult::Success => None,
            ToolResult::Error(err) => Some(err),
        }
    }

    /// Text appended to chat history for this result.
    pub fn describe(&self) -> String {
        match self {
            ToolResult::Success => "Success".to_string(),
            ToolResult::Error(err) => format!("Error: {}", err.error_message()),
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        ToolResult::Error(err)
    }
}

/// Failure variants of [`ToolResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolError {
    /// The tool name is not registered, or its arguments could not be decoded.
    UnknownTool {
        function_name: String,
        function_args: Map<String, Value>,
    },
    /// The model answered without any tool call.
    EmptyToolCall,
    /// Execution failed; carries the error text and its rendered cause chain.
    ExceptionThrown {
        error_message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stack_trace: Option<String>,
    },
    MissingRequiredArgs {
        function_name: String,
        function_args: Map<String, Value>,
        required_args: Vec<String>,
    },
    /// The device layer rejected the command built from the tool arguments.
    CommandValidationError {
        error_message: String,
        command: Value,
    },
    /// A known tool was called with a value the agent has no mapping for.
    UnknownTrailblazeTool { tool: Value },
}

impl ToolError {
    pub fn error_message(&self) -> String {
        match self {
            ToolError::UnknownTool {
                function_name,
                function_args,
            } => format!(
                "Unknown tool call provided: {} with args: {}",
                function_name,
                Value::Object(function_args.clone())
            ),
            ToolError::EmptyToolCall => "No tool call provided, this is an error.\n\
                 Please always provide a tool call that will help complete the task."
                .to_string(),
            ToolError::ExceptionThrown { error_message, .. } => error_message.clone(),
            ToolError::MissingRequiredArgs {
                function_name,
                function_args,
                required_args,
            } => format!(
                "Tool call {} is missing required args. Provided args: {}. Required args: {:?}.",
                function_name,
                Value::Object(function_args.clone()),
                required_args
            ),
            ToolError::CommandValidationError { error_message, .. } => error_message.clone(),
            ToolError::UnknownTrailblazeTool { tool } => format!(
                "Unknown custom command {}, ensure there is a mapping between the custom command and device commands!",
                tool
            ),
        }
    }

    /// Build an `ExceptionThrown` from any error, rendering its source chain as the trace.
    pub fn from_error(err: &(dyn std::error::Error + 'static), tool: Option<Value>) -> Self {
        let mut trace = vec![format!("{:?}", err)];
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        let message = err.to_string();
        ToolError::ExceptionThrown {
            error_message: if message.is_empty() {
                "Unknown error".to_string()
            } else {
                message
            },
            tool,
            stack_trace: Some(trace.join("\n")),
        }
    }
}
