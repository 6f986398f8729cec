//! Device-facing seams
//!
//! The device driver and the screen capture live outside this crate. The
//! controllers here only see them through two traits:
//! - [`DeviceCommandExecutor`] runs a batch of [`DeviceCommand`]s
//! - [`ScreenStateProvider`] captures the current [`ScreenState`]

mod scroll;

pub use scroll::*;

use std::future::Future;

use async_trait::async_trait;
use trailblaze_core_types::{ScreenState, ToolResult, TraceId};

use crate::{errors::ActionError, types::DeviceCommand};

/// Executes device commands.
///
/// A rejected command is reported as a non-success [`ToolResult`]; `Err` is
/// reserved for transport failures talking to the device.
#[async_trait]
pub trait DeviceCommandExecutor: Send + Sync {
    async fn execute(
        &self,
        commands: &[DeviceCommand],
        trace_id: Option<&TraceId>,
    ) -> Result<ToolResult, ActionError>;
}

/// Captures the current screen state.
#[async_trait]
pub trait ScreenStateProvider: Send + Sync {
    async fn screen_state(&self) -> Result<ScreenState, ActionError>;
}

/// Adapts an async closure into a [`ScreenStateProvider`].
pub struct ScreenStateFn<F>(pub F);

#[async_trait]
impl<F, Fut> ScreenStateProvider for ScreenStateFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<ScreenState, ActionError>> + Send,
{
    async fn screen_state(&self) -> Result<ScreenState, ActionError> {
        (self.0)().await
    }
}
