//! LLM client seam and the chat/request model exchanged with it.
//!
//! Provider SDKs and wire protocols live outside this crate; hosts plug them
//! in by implementing [`LlmClient`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use trailblaze_core_types::ToolResult;

/// Failure talking to the model provider.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("LLM response could not be decoded: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Binary attachment on a user message. Bytes are not serialized into logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub format: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            format: "png".to_string(),
            bytes,
        }
    }
}

/// Tool call emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub tool_name: String,
    #[serde(default)]
    pub raw_arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, raw_arguments: Value) -> Self {
        let raw_arguments = match raw_arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: None,
            tool_name: tool_name.into(),
            raw_arguments,
        }
    }
}

/// One chat message. Assistant entries in the history carry the tool call
/// they made together with the result that call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::Assistant, content.into())
    }

    fn plain(role: ChatRole, content: String) -> Self {
        Self {
            role,
            content,
            attachments: Vec::new(),
            tool_call: None,
            tool_result: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_tool_exchange(mut self, call: ToolCall, result: ToolResult) -> Self {
        self.tool_call = Some(call);
        self.tool_result = Some(result);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
}

/// Tool advertised to the model, with its JSON schema as parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmCapability {
    Tools,
    VisionImage,
}

/// Model selection plus the capabilities the request builder relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmModel {
    pub id: String,
    pub provider: String,
    #[serde(default)]
    pub capabilities: Vec<LlmCapability>,
}

impl LlmModel {
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            capabilities: vec![LlmCapability::Tools],
        }
    }

    pub fn with_capability(mut self, capability: LlmCapability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn supports_vision(&self) -> bool {
        self.capabilities.contains(&LlmCapability::VisionImage)
    }
}

/// Request handed to an [`LlmClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Opaque id; the gateway assigns a fresh one per attempt.
    pub id: String,
    pub model: LlmModel,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDescriptor>,
    pub tool_choice: ToolChoice,
}

impl LlmRequest {
    pub fn new(
        model: LlmModel,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDescriptor>,
        tool_choice: ToolChoice,
    ) -> Self {
        Self {
            id: String::new(),
            model,
            messages,
            tools,
            tool_choice,
        }
    }
}

/// One message of a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmResponseMessage {
    Assistant { content: String },
    ToolCall(ToolCall),
}

/// Abstraction over LLM providers so multiple vendors can plug into the agent core.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn execute(&self, request: &LlmRequest) -> Result<Vec<LlmResponseMessage>, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_ignores_non_object_arguments() {
        let call = ToolCall::new("pressBack", json!(null));
        assert!(call.raw_arguments.is_empty());

        let call = ToolCall::new("inputText", json!({"text": "hello"}));
        assert_eq!(call.raw_arguments["text"], "hello");
    }

    #[test]
    fn test_vision_capability_is_opt_in() {
        let model = LlmModel::new("gpt-4.1", "openai");
        assert!(!model.supports_vision());
        let model = model
            .with_capability(LlmCapability::VisionImage)
            .with_capability(LlmCapability::VisionImage);
        assert!(model.supports_vision());
        assert_eq!(model.capabilities.len(), 2);
    }

    #[test]
    fn test_attachment_bytes_stay_out_of_logs() {
        let message = ChatMessage::user("screen").with_attachment(Attachment::png(vec![1, 2, 3]));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["attachments"][0], json!({"format": "png"}));
    }
}
