//! Shared primitives for the Trailblaze agent crates.
//!
//! Identifiers, the device platform, the view hierarchy snapshot handed to the
//! LLM on every turn, element selectors and the tool result union that every
//! tool outcome is reported through.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod hierarchy;
pub mod tool_result;

pub use hierarchy::{Bounds, ElementSelector, ScreenState, ViewHierarchyTreeNode};
pub use tool_result::{ToolError, ToolResult};

/// Errors raised while parsing core primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown device platform: {0}")]
    UnknownPlatform(String),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one objective execution.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a trace id was minted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceOrigin {
    Llm,
    Tool,
    Device,
}

impl TraceOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceOrigin::Llm => "llm",
            TraceOrigin::Tool => "tool",
            TraceOrigin::Device => "device",
        }
    }
}

/// Correlates an LLM round-trip with the tool executions and device commands it caused.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn generate(origin: TraceOrigin) -> Self {
        Self(format!("{}-{}", origin.as_str(), Uuid::new_v4()))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform of the device under test.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePlatform {
    Android,
    Ios,
    Web,
}

impl DevicePlatform {
    /// Human readable name, interpolated into the system prompt.
    pub fn display_name(&self) -> &'static str {
        match self {
            DevicePlatform::Android => "Android",
            DevicePlatform::Ios => "iOS",
            DevicePlatform::Web => "Web",
        }
    }
}

impl fmt::Display for DevicePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for DevicePlatform {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(DevicePlatform::Android),
            "ios" => Ok(DevicePlatform::Ios),
            "web" => Ok(DevicePlatform::Web),
            other => Err(CoreError::UnknownPlatform(other.to_string())),
        }
    }
}
