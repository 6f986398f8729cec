//! View hierarchy snapshot and element selectors.

use serde::{Deserialize, Serialize};

use crate::DevicePlatform;

/// Pixel rectangle of a node on screen, `(x1, y1)` inclusive, `(x2, y2)` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Bounds {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x1 + self.width() / 2, self.y1 + self.height() / 2)
    }

    /// Fraction (0.0-1.0) of this rectangle that lies inside a `width x height` viewport.
    pub fn visible_fraction(&self, screen_width: u32, screen_height: u32) -> f64 {
        let (width, height) = (self.width(), self.height());
        if width <= 0 || height <= 0 {
            return 0.0;
        }

        let visible_x = (self.x2.min(screen_width as i32) - self.x1.max(0)).max(0);
        let visible_y = (self.y2.min(screen_height as i32) - self.y1.max(0)).max(0);

        let visible_area = visible_x as f64 * visible_y as f64;
        let total_area = width as f64 * height as f64;
        visible_area / total_area
    }
}

/// One node of the device view hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewHierarchyTreeNode {
    #[serde(default)]
    pub node_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ViewHierarchyTreeNode>,
}

fn default_enabled() -> bool {
    true
}

impl ViewHierarchyTreeNode {
    /// Depth-first, pre-order walk over this node and all descendants.
    pub fn iter(&self) -> impl Iterator<Item = &ViewHierarchyTreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Texts a text selector is allowed to match against, in priority order.
    pub fn text_candidates(&self) -> impl Iterator<Item = &str> {
        [&self.text, &self.hint_text, &self.accessibility_text]
            .into_iter()
            .filter_map(|value| value.as_deref())
            .filter(|value| !value.is_empty())
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }
}

/// Snapshot of the device taken once per agent iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenState {
    pub view_hierarchy: ViewHierarchyTreeNode,
    #[serde(skip)]
    pub screenshot_bytes: Option<Vec<u8>>,
    pub device_width: u32,
    pub device_height: u32,
    pub platform: DevicePlatform,
}

impl ScreenState {
    pub fn new(
        view_hierarchy: ViewHierarchyTreeNode,
        device_width: u32,
        device_height: u32,
        platform: DevicePlatform,
    ) -> Self {
        Self {
            view_hierarchy,
            screenshot_bytes: None,
            device_width,
            device_height,
            platform,
        }
    }

    pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot_bytes = Some(bytes);
        self
    }

    /// Screenshot bytes, only when a non-empty capture is present.
    pub fn screenshot(&self) -> Option<&[u8]> {
        self.screenshot_bytes
            .as_deref()
            .filter(|bytes| !bytes.is_empty())
    }
}

/// Regex based selector shared by direct tool execution and the scroll search.
///
/// `index` picks one of several matches (0-based). An index of 0 is stored as
/// `None` so that single-match selectors stay minimal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl ElementSelector {
    pub fn text(text_regex: impl Into<String>) -> Self {
        Self {
            text_regex: Some(text_regex.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id_regex: impl Into<String>) -> Self {
        self.id_regex = Some(id_regex.into());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = if index == 0 { None } else { Some(index) };
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text_regex.is_none() && self.id_regex.is_none()
    }

    /// Short description used in error messages.
    pub fn description(&self) -> String {
        let mut parts = Vec::new();
        if let Some(text) = &self.text_regex {
            parts.push(format!("Text matching regex: {}", text));
        }
        if let Some(id) = &self.id_regex {
            parts.push(format!("Id matching regex: {}", id));
        }
        if let Some(index) = self.index {
            parts.push(format!("Index: {}", index));
        }
        if parts.is_empty() {
            "<empty selector>".to_string()
        } else {
            parts.join(", ")
        }
    }
}
