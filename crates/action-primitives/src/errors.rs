//! Error types for action primitives

use thiserror::Error;
use trailblaze_core_types::ViewHierarchyTreeNode;

/// Error types for device action operations
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// A scroll search ran out of time without the element meeting the success condition.
    ///
    /// Carries the last view hierarchy so the failure can be diagnosed offline.
    #[error("{message}\n{debug_message}")]
    ElementNotFound {
        message: String,
        debug_message: String,
        hierarchy_root: Box<ViewHierarchyTreeNode>,
    },

    /// Selector could not be compiled
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Screen state could not be captured
    #[error("Screen state unavailable: {0}")]
    ScreenState(String),

    /// Device communication error
    #[error("Device I/O error: {0}")]
    DeviceIo(String),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActionError::DeviceIo(_) | ActionError::ScreenState(_))
    }

    /// Debug text attached to the error, if any
    pub fn debug_message(&self) -> Option<&str> {
        match self {
            ActionError::ElementNotFound { debug_message, .. } => Some(debug_message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_not_found_display_includes_debug_text() {
        let err = ActionError::ElementNotFound {
            message: "No visible element found: Text matching regex: .*Pay.*".to_string(),
            debug_message: "- `timeout`: current = 100ms".to_string(),
            hierarchy_root: Box::default(),
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("No visible element found"));
        assert!(rendered.contains("`timeout`"));
        assert_eq!(err.debug_message(), Some("- `timeout`: current = 100ms"));
        assert!(!err.is_retryable());
    }
}
