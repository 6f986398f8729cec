//! Core data types for device action primitives

use std::fmt;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use trailblaze_core_types::ElementSelector;

/// Direction the finger travels during a swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwipeDirection {
    #[serde(alias = "up")]
    Up,
    #[serde(alias = "down")]
    Down,
    #[serde(alias = "left")]
    Left,
    #[serde(alias = "right")]
    Right,
}

impl SwipeDirection {
    pub fn is_vertical(&self) -> bool {
        matches!(self, SwipeDirection::Up | SwipeDirection::Down)
    }
}

/// Direction the content moves into view.
///
/// Scrolling DOWN reveals content below the fold, which means swiping UP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScrollDirection {
    #[serde(alias = "up")]
    Up,
    #[default]
    #[serde(alias = "down")]
    Down,
    #[serde(alias = "left")]
    Left,
    #[serde(alias = "right")]
    Right,
}

impl ScrollDirection {
    pub fn to_swipe_direction(self) -> SwipeDirection {
        match self {
            ScrollDirection::Down => SwipeDirection::Up,
            ScrollDirection::Up => SwipeDirection::Down,
            ScrollDirection::Right => SwipeDirection::Left,
            ScrollDirection::Left => SwipeDirection::Right,
        }
    }
}

/// Which part of the screen a scroll gesture starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScrollStartPosition {
    #[serde(alias = "top")]
    Top,
    #[serde(alias = "bottom")]
    Bottom,
    #[default]
    #[serde(alias = "center")]
    Center,
}

/// Device driver family; some gesture constants differ per driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverType {
    AndroidOnDevice,
    #[default]
    AndroidHost,
    Ios,
    Web,
}

/// Absolute pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Coordinate expressed as percentages of the screen size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativePoint {
    pub x_percent: u8,
    pub y_percent: u8,
}

impl RelativePoint {
    pub fn new(x_percent: u8, y_percent: u8) -> Self {
        Self {
            x_percent,
            y_percent,
        }
    }
}

impl fmt::Display for RelativePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x_percent, self.y_percent)
    }
}

/// Where a swipe starts (and, for relative swipes, ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwipeOrigin {
    /// Start at an absolute point; the driver picks the end point from the direction.
    Point { start: Point },
    /// Start and end given as screen percentages.
    Relative {
        start: RelativePoint,
        end: RelativePoint,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeCommand {
    pub direction: SwipeDirection,
    pub origin: SwipeOrigin,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_to_settle_timeout_ms: Option<u64>,
}

/// Command understood by a [`crate::DeviceCommandExecutor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DeviceCommand {
    Swipe(SwipeCommand),
    TapOnPoint { x: i32, y: i32, long_press: bool },
    TapOnElement { selector: ElementSelector },
    AssertVisible { selector: ElementSelector },
    InputText { text: String },
    EraseText { characters: u32 },
    HideKeyboard,
    Back,
    OpenLink { link: String },
    LaunchApp { app_id: String, stop_app: bool },
    WaitForMillis { millis: u64 },
}

impl DeviceCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::Swipe(_) => "swipe",
            DeviceCommand::TapOnPoint { .. } => "tap_on_point",
            DeviceCommand::TapOnElement { .. } => "tap_on_element",
            DeviceCommand::AssertVisible { .. } => "assert_visible",
            DeviceCommand::InputText { .. } => "input_text",
            DeviceCommand::EraseText { .. } => "erase_text",
            DeviceCommand::HideKeyboard => "hide_keyboard",
            DeviceCommand::Back => "back",
            DeviceCommand::OpenLink { .. } => "open_link",
            DeviceCommand::LaunchApp { .. } => "launch_app",
            DeviceCommand::WaitForMillis { .. } => "wait_for_millis",
        }
    }
}

/// Tunables of the scroll-until-visible search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Extra scroll attempts, after the first, spent trying to center an
    /// already visible element. Covers lists whose last element can never reach the exact center.
    /// Default: 4
    pub max_center_retries: u32,

    /// Visible fraction above which centering is attempted.
    /// Default: 0.1
    pub center_visibility_threshold: f64,

    /// Fraction of the screen size an element center may be away from the screen center.
    /// Default: 0.1
    pub center_buffer_ratio: f64,

    /// Swipe duration in milliseconds. Very short swipes fling past elements.
    /// Default: 40
    pub scroll_duration_ms: u64,

    /// Swipe duration used by on-device Android drivers.
    /// Default: 400
    pub on_device_scroll_duration_ms: u64,

    /// Search timeout in milliseconds.
    /// Default: 20000
    pub default_timeout_ms: u64,

    /// Scroll speed reported in diagnostics (0-100 scale).
    /// Default: 40
    pub default_speed: u32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            max_center_retries: 4,
            center_visibility_threshold: 0.1,
            center_buffer_ratio: 0.1,
            scroll_duration_ms: 40,
            on_device_scroll_duration_ms: 400,
            default_timeout_ms: 20_000,
            default_speed: 40,
        }
    }
}

impl ScrollConfig {
    pub fn scroll_duration_for(&self, driver: DriverType) -> u64 {
        match driver {
            DriverType::AndroidOnDevice => self.on_device_scroll_duration_ms,
            _ => self.scroll_duration_ms,
        }
    }

    /// Builder: set the search timeout.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.default_timeout_ms = ms;
        self
    }

    /// Builder: set the center retry budget.
    pub fn center_retries(mut self, retries: u32) -> Self {
        self.max_center_retries = retries;
        self
    }
}

/// One scroll-until-visible search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollUntilVisibleRequest {
    pub selector: ElementSelector,
    pub direction: ScrollDirection,
    /// Required visible percentage (0-100).
    pub visibility_percentage: u8,
    pub center_element: bool,
    pub scroll_start_position: ScrollStartPosition,
    pub timeout: Duration,
    pub scroll_duration_ms: u64,
    pub speed: Option<u32>,
    pub wait_to_settle_timeout_ms: Option<u64>,
}

impl ScrollUntilVisibleRequest {
    pub const DEFAULT_VISIBILITY_PERCENTAGE: u8 = 100;

    pub fn new(selector: ElementSelector, config: &ScrollConfig) -> Self {
        Self {
            selector,
            direction: ScrollDirection::default(),
            visibility_percentage: Self::DEFAULT_VISIBILITY_PERCENTAGE,
            center_element: false,
            scroll_start_position: ScrollStartPosition::default(),
            timeout: Duration::from_millis(config.default_timeout_ms),
            scroll_duration_ms: config.scroll_duration_ms,
            speed: Some(config.default_speed),
            wait_to_settle_timeout_ms: None,
        }
    }

    pub fn direction(mut self, direction: ScrollDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn visibility_percentage(mut self, percentage: u8) -> Self {
        self.visibility_percentage = percentage.min(100);
        self
    }

    pub fn center_element(mut self, center: bool) -> Self {
        self.center_element = center;
        self
    }

    pub fn start_position(mut self, position: ScrollStartPosition) -> Self {
        self.scroll_start_position = position;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn scroll_duration_ms(mut self, ms: u64) -> Self {
        self.scroll_duration_ms = ms;
        self
    }

    pub fn wait_to_settle_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.wait_to_settle_timeout_ms = ms;
        self
    }

    /// Visibility threshold normalized to 0.0-1.0.
    pub fn visibility_threshold(&self) -> f64 {
        f64::from(self.visibility_percentage) / 100.0
    }
}
