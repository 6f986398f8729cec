//! Tool catalogue, schema-driven registry and the tool union.

mod catalogue;
mod registry;

pub use catalogue::*;
pub use registry::{ToolDefinition, ToolRegistry};

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Every tool the agent can execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "toolName", content = "args", rename_all = "camelCase")]
pub enum TrailblazeTool {
    ObjectiveStatus(ObjectiveStatusTool),
    TapOnPoint(TapOnPointTool),
    TapOnElementWithText(TapOnElementWithTextTool),
    InputText(InputTextTool),
    EraseText(EraseTextTool),
    HideKeyboard(HideKeyboardTool),
    PressBack(PressBackTool),
    OpenUrl(OpenUrlTool),
    LaunchApp(LaunchAppTool),
    Swipe(SwipeTool),
    Wait(WaitTool),
    ScrollUntilTextIsVisible(ScrollUntilTextIsVisibleTool),
    AssertVisibleWithText(AssertVisibleWithTextTool),
    RememberText(RememberTextTool),
    DumpMemory(DumpMemoryTool),
}

impl TrailblazeTool {
    pub fn name(&self) -> &'static str {
        match self {
            TrailblazeTool::ObjectiveStatus(_) => ObjectiveStatusTool::NAME,
            TrailblazeTool::TapOnPoint(_) => TapOnPointTool::NAME,
            TrailblazeTool::TapOnElementWithText(_) => TapOnElementWithTextTool::NAME,
            TrailblazeTool::InputText(_) => InputTextTool::NAME,
            TrailblazeTool::EraseText(_) => EraseTextTool::NAME,
            TrailblazeTool::HideKeyboard(_) => HideKeyboardTool::NAME,
            TrailblazeTool::PressBack(_) => PressBackTool::NAME,
            TrailblazeTool::OpenUrl(_) => OpenUrlTool::NAME,
            TrailblazeTool::LaunchApp(_) => LaunchAppTool::NAME,
            TrailblazeTool::Swipe(_) => SwipeTool::NAME,
            TrailblazeTool::Wait(_) => WaitTool::NAME,
            TrailblazeTool::ScrollUntilTextIsVisible(_) => ScrollUntilTextIsVisibleTool::NAME,
            TrailblazeTool::AssertVisibleWithText(_) => AssertVisibleWithTextTool::NAME,
            TrailblazeTool::RememberText(_) => RememberTextTool::NAME,
            TrailblazeTool::DumpMemory(_) => DumpMemoryTool::NAME,
        }
    }

    pub fn is_objective_status(&self) -> bool {
        matches!(self, TrailblazeTool::ObjectiveStatus(_))
    }

    /// JSON form used in tool errors and logs.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A concrete tool type that can be registered in a [`ToolRegistry`].
pub trait ToolKind: DeserializeOwned + JsonSchema + Into<TrailblazeTool> {
    /// Name the model calls the tool by.
    const NAME: &'static str;
    /// Read-only tools are offered to verification steps.
    const READ_ONLY: bool;
}

macro_rules! tool_kind {
    ($($ty:ident => $variant:ident, $name:literal, $read_only:literal;)*) => {
        $(
            impl ToolKind for $ty {
                const NAME: &'static str = $name;
                const READ_ONLY: bool = $read_only;
            }

            impl From<$ty> for TrailblazeTool {
                fn from(tool: $ty) -> Self {
                    TrailblazeTool::$variant(tool)
                }
            }
        )*
    };
}

tool_kind! {
    ObjectiveStatusTool => ObjectiveStatus, "objectiveStatus", true;
    TapOnPointTool => TapOnPoint, "tapOnPoint", false;
    TapOnElementWithTextTool => TapOnElementWithText, "tapOnElementWithText", false;
    InputTextTool => InputText, "inputText", false;
    EraseTextTool => EraseText, "eraseText", false;
    HideKeyboardTool => HideKeyboard, "hideKeyboard", false;
    PressBackTool => PressBack, "pressBack", false;
    OpenUrlTool => OpenUrl, "openUrl", false;
    LaunchAppTool => LaunchApp, "launchApp", false;
    SwipeTool => Swipe, "swipe", false;
    WaitTool => Wait, "wait", true;
    ScrollUntilTextIsVisibleTool => ScrollUntilTextIsVisible, "scrollUntilTextIsVisible", true;
    AssertVisibleWithTextTool => AssertVisibleWithText, "assertVisibleWithText", true;
    RememberTextTool => RememberText, "rememberText", true;
    DumpMemoryTool => DumpMemory, "dumpMemory", true;
}
