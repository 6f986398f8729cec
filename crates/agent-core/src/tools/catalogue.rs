//! Built-in tools offered to the model.
//!
//! Each struct's doc comment becomes the tool description and its fields the
//! JSON schema parameters.

use action_primitives::{ScrollDirection, ScrollStartPosition, SwipeDirection};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Report progress on the current objective. Call this with `completed` once the
/// objective has been achieved, `failed` if it cannot be achieved, or
/// `in_progress` when more actions are needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveStatusTool {
    /// Short explanation of why the objective has this status.
    pub explanation: String,
    /// One of `in_progress`, `completed` or `failed`.
    pub status: String,
}

/// Taps the screen at the provided pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TapOnPointTool {
    pub x: i32,
    pub y: i32,
    /// Hold the tap. Default is 'false'.
    #[serde(default)]
    pub long_press: bool,
}

/// Taps the element whose text matches the provided text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TapOnElementWithTextTool {
    /// Text of the element to tap.
    pub text: String,
    /// Element id, only needed when several elements share the text.
    #[serde(default)]
    pub id: Option<String>,
    /// 0-based index to disambiguate elements with the same text. Default is '0'.
    #[serde(default)]
    pub index: usize,
}

/// Types the provided text into the focused field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InputTextTool {
    pub text: String,
}

/// Erases characters from the focused field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EraseTextTool {
    /// Number of characters to erase. Default is '50'.
    #[serde(default = "default_erase_characters")]
    pub characters: u32,
}

fn default_erase_characters() -> u32 {
    50
}

/// Hides the on-screen keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HideKeyboardTool {}

/// Presses the system back button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PressBackTool {}

/// Opens the browser to the provided url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenUrlTool {
    pub url: String,
}

/// Launches the app with the provided id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchAppTool {
    /// Package name or bundle id.
    pub app_id: String,
    /// Stop the app before launching it. Default is 'true'.
    #[serde(default = "default_stop_app")]
    pub stop_app: bool,
}

fn default_stop_app() -> bool {
    true
}

/// Swipes across the screen in the provided direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwipeTool {
    pub direction: SwipeDirection,
}

/// Waits for the provided number of seconds before the next action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitTool {
    #[serde(default = "default_wait_seconds")]
    pub seconds: u64,
}

fn default_wait_seconds() -> u64 {
    5
}

/// Scrolls the screen in the specified direction until an element containing the
/// provided text becomes visible. The text does not need to be an exact match.
/// Only provide additional fields if multiple elements contain the same text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrollUntilTextIsVisibleTool {
    /// Text to search for while scrolling.
    pub text: String,
    /// The element id to scroll until.
    #[serde(default)]
    pub id: Option<String>,
    /// A 0-based index to disambiguate multiple views with the same text. Default is '0'.
    #[serde(default)]
    pub index: usize,
    /// Direction to scroll. Default is 'DOWN'.
    #[serde(default)]
    pub direction: ScrollDirection,
    /// Percentage of element visible in viewport. Default is '100'.
    #[serde(default = "default_visibility_percentage")]
    pub visibility_percentage: u8,
    /// Stop scrolling when the element is close to the screen center. Default is 'false'.
    #[serde(default)]
    pub center_element: bool,
    /// Which part of the screen to scroll from. Default is 'CENTER'.
    #[serde(default)]
    pub scroll_start_position: ScrollStartPosition,
}

fn default_visibility_percentage() -> u8 {
    100
}

/// Asserts that an element with the provided text is visible on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssertVisibleWithTextTool {
    pub text: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub index: usize,
}

/// Remembers a value under a variable name. Later tool arguments can reference
/// it as `${variable}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RememberTextTool {
    pub variable: String,
    pub text: String,
}

/// Dumps the remembered values from the agent's memory. Useful for debugging
/// tests that compare values across screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DumpMemoryTool {}
