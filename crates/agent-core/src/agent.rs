//! Agent seam executing resolved tools against a device.

use std::sync::Arc;

use action_primitives::{
    DeviceCommand, DeviceCommandExecutor, DriverType, Point, ScreenStateProvider, ScrollConfig,
    ScrollUntilVisibleController, ScrollUntilVisibleRequest, SwipeCommand, SwipeOrigin,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};
use trailblaze_core_types::{ElementSelector, ScreenState, ToolError, ToolResult, TraceId};

use crate::errors::AgentError;
use crate::memory::AgentMemory;
use crate::tools::*;

/// Executes resolved tools. Objective status tools are handled by the
/// executor and never reach the agent.
#[async_trait]
pub trait TrailblazeAgent: Send + Sync {
    async fn run_tool(
        &self,
        tool: &TrailblazeTool,
        screen_state: &ScreenState,
        trace_id: &TraceId,
    ) -> Result<ToolResult, AgentError>;
}

/// Swipe gesture duration used by the `swipe` tool.
const SWIPE_DURATION_MS: u64 = 400;

/// Agent that maps tools onto device commands and the scroll controller.
pub struct DeviceTrailblazeAgent {
    executor: Arc<dyn DeviceCommandExecutor>,
    scroll: ScrollUntilVisibleController,
    driver: DriverType,
    memory: Mutex<AgentMemory>,
}

impl DeviceTrailblazeAgent {
    pub fn new(
        executor: Arc<dyn DeviceCommandExecutor>,
        screen_state_provider: Arc<dyn ScreenStateProvider>,
        driver: DriverType,
    ) -> Self {
        let scroll = ScrollUntilVisibleController::new(executor.clone(), screen_state_provider);
        Self {
            executor,
            scroll,
            driver,
            memory: Mutex::new(AgentMemory::new()),
        }
    }

    pub fn with_scroll_config(mut self, config: ScrollConfig) -> Self {
        self.scroll = self.scroll.with_config(config);
        self
    }

    /// Snapshot of the remembered values.
    pub fn memory(&self) -> AgentMemory {
        self.memory.lock().clone()
    }

    fn interpolate(&self, text: &str) -> String {
        self.memory.lock().interpolate(text)
    }

    fn text_selector(&self, text: &str, id: Option<&String>, index: usize) -> ElementSelector {
        let mut selector = ElementSelector::text(regex::escape(&self.interpolate(text)));
        if let Some(id) = id {
            selector = selector.with_id(id.clone());
        }
        selector.with_index(index)
    }

    fn commands_for(
        &self,
        tool: &TrailblazeTool,
        screen_state: &ScreenState,
    ) -> Option<Vec<DeviceCommand>> {
        let commands = match tool {
            TrailblazeTool::TapOnPoint(tap) => vec![DeviceCommand::TapOnPoint {
                x: tap.x,
                y: tap.y,
                long_press: tap.long_press,
            }],
            TrailblazeTool::TapOnElementWithText(tap) => vec![DeviceCommand::TapOnElement {
                selector: self.text_selector(&tap.text, tap.id.as_ref(), tap.index),
            }],
            TrailblazeTool::AssertVisibleWithText(assert) => vec![DeviceCommand::AssertVisible {
                selector: self.text_selector(&assert.text, assert.id.as_ref(), assert.index),
            }],
            TrailblazeTool::InputText(input) => vec![DeviceCommand::InputText {
                text: self.interpolate(&input.text),
            }],
            TrailblazeTool::EraseText(erase) => vec![DeviceCommand::EraseText {
                characters: erase.characters,
            }],
            TrailblazeTool::HideKeyboard(_) => vec![DeviceCommand::HideKeyboard],
            TrailblazeTool::PressBack(_) => vec![DeviceCommand::Back],
            TrailblazeTool::OpenUrl(open) => vec![DeviceCommand::OpenLink {
                link: self.interpolate(&open.url),
            }],
            TrailblazeTool::LaunchApp(launch) => vec![DeviceCommand::LaunchApp {
                app_id: launch.app_id.clone(),
                stop_app: launch.stop_app,
            }],
            TrailblazeTool::Swipe(swipe) => vec![DeviceCommand::Swipe(SwipeCommand {
                direction: swipe.direction,
                origin: SwipeOrigin::Point {
                    start: Point::new(
                        screen_state.device_width as i32 / 2,
                        screen_state.device_height as i32 / 2,
                    ),
                },
                duration_ms: SWIPE_DURATION_MS,
                wait_to_settle_timeout_ms: None,
            })],
            TrailblazeTool::Wait(wait) => vec![DeviceCommand::WaitForMillis {
                millis: wait.seconds.saturating_mul(1_000),
            }],
            _ => return None,
        };
        Some(commands)
    }

    async fn scroll_until_text_is_visible(
        &self,
        tool: &ScrollUntilTextIsVisibleTool,
        screen_state: &ScreenState,
        trace_id: &TraceId,
    ) -> Result<ToolResult, AgentError> {
        let config = self.scroll.config();
        let mut selector = ElementSelector::text(format!(
            ".*{}.*",
            regex::escape(&self.interpolate(&tool.text))
        ));
        if let Some(id) = &tool.id {
            selector = selector.with_id(id.clone());
        }

        let request = ScrollUntilVisibleRequest::new(selector.with_index(tool.index), config)
            .direction(tool.direction)
            .visibility_percentage(tool.visibility_percentage)
            .center_element(tool.center_element)
            .start_position(tool.scroll_start_position)
            .scroll_duration_ms(config.scroll_duration_for(self.driver));

        Ok(self
            .scroll
            .scroll_until_visible(&request, screen_state.clone(), Some(trace_id))
            .await?)
    }
}

#[async_trait]
impl TrailblazeAgent for DeviceTrailblazeAgent {
    async fn run_tool(
        &self,
        tool: &TrailblazeTool,
        screen_state: &ScreenState,
        trace_id: &TraceId,
    ) -> Result<ToolResult, AgentError> {
        debug!(trace_id = %trace_id, tool = tool.name(), "Running tool");

        match tool {
            TrailblazeTool::ScrollUntilTextIsVisible(scroll) => {
                self.scroll_until_text_is_visible(scroll, screen_state, trace_id)
                    .await
            }
            TrailblazeTool::RememberText(remember) => {
                let value = self.interpolate(&remember.text);
                self.memory.lock().remember(remember.variable.clone(), value);
                Ok(ToolResult::Success)
            }
            TrailblazeTool::DumpMemory(_) => {
                let memory = self.memory();
                info!(count = memory.variables().len(), "Dumping agent memory");
                for (name, value) in memory.variables() {
                    info!("{} : {}", name, value);
                }
                Ok(ToolResult::Success)
            }
            TrailblazeTool::ObjectiveStatus(_) => Ok(ToolResult::Error(
                ToolError::UnknownTrailblazeTool {
                    tool: tool.to_json(),
                },
            )),
            other => match self.commands_for(other, screen_state) {
                Some(commands) => Ok(self.executor.execute(&commands, Some(trace_id)).await?),
                None => Ok(ToolResult::Error(ToolError::UnknownTrailblazeTool {
                    tool: other.to_json(),
                })),
            },
        }
    }
}
