//! Scroll-until-visible - Swipe until an element is visible (and optionally centered)

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use trailblaze_core_types::{Bounds, ScreenState, ToolResult, TraceId};

use crate::{
    errors::ActionError,
    locator::{CompiledSelector, ElementMatcher, RegexElementMatcher},
    primitives::{DeviceCommandExecutor, ScreenStateProvider},
    types::{
        DeviceCommand, Point, RelativePoint, ScrollConfig, ScrollStartPosition,
        ScrollUntilVisibleRequest, SwipeCommand, SwipeDirection, SwipeOrigin,
    },
};

/// Drives the scroll search for one element.
pub struct ScrollUntilVisibleController {
    executor: Arc<dyn DeviceCommandExecutor>,
    screen_state_provider: Arc<dyn ScreenStateProvider>,
    matcher: Arc<dyn ElementMatcher>,
    config: ScrollConfig,
}

impl ScrollUntilVisibleController {
    pub fn new(
        executor: Arc<dyn DeviceCommandExecutor>,
        screen_state_provider: Arc<dyn ScreenStateProvider>,
    ) -> Self {
        Self {
            executor,
            screen_state_provider,
            matcher: Arc::new(RegexElementMatcher),
            config: ScrollConfig::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn ElementMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_config(mut self, config: ScrollConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Swipe until the selector resolves to a sufficiently visible element.
    ///
    /// Steps per iteration:
    /// 1. Refresh the screen state
    /// 2. Resolve the selector; a miss goes straight to another swipe
    /// 3. Evaluate centering (bounded by `max_center_retries`) or visibility
    /// 4. Swipe once; a rejected swipe is returned as-is
    ///
    /// At least one evaluation always runs. Returns `ElementNotFound` once
    /// `request.timeout` has elapsed.
    pub async fn scroll_until_visible(
        &self,
        request: &ScrollUntilVisibleRequest,
        initial: ScreenState,
        trace_id: Option<&TraceId>,
    ) -> Result<ToolResult, ActionError> {
        CompiledSelector::compile(&request.selector)?;

        let started = Instant::now();
        let deadline = started + request.timeout;
        let swipe_direction = request.direction.to_swipe_direction();
        let threshold = request.visibility_threshold();
        let mut state = initial;
        let mut center_retries = 0u32;
        let mut swipes = 0u32;

        info!(
            selector = %request.selector.description(),
            direction = ?request.direction,
            timeout_ms = request.timeout.as_millis() as u64,
            center = request.center_element,
            "Starting scroll-until-visible search"
        );

        loop {
            match self.screen_state_provider.screen_state().await {
                Ok(fresh) => state = fresh,
                Err(err) => warn!("screen state refresh failed, reusing last snapshot: {}", err),
            }

            match self
                .matcher
                .find_matches(&state.view_hierarchy, &request.selector)
            {
                Ok(matches) => {
                    if let Some(bounds) = matches.first().and_then(|node| node.bounds) {
                        let visible = bounds.visible_fraction(state.device_width, state.device_height);
                        debug!(visible, matches = matches.len(), "Element matched");

                        if request.center_element
                            && visible > self.config.center_visibility_threshold
                            && center_retries <= self.config.max_center_retries
                        {
                            if self.is_near_center(&bounds, &state, swipe_direction) {
                                info!(swipes, "Element centered");
                                return Ok(ToolResult::Success);
                            }
                            center_retries += 1;
                            debug!(center_retries, "Element visible but not centered");
                        } else if visible >= threshold {
                            info!(swipes, visible, "Element visible");
                            return Ok(ToolResult::Success);
                        }
                    }
                }
                Err(err) => debug!("matcher failed, scrolling again: {}", err),
            }

            let swipe = self.build_swipe(request, swipe_direction, &state);
            let result = self
                .executor
                .execute(&[DeviceCommand::Swipe(swipe)], trace_id)
                .await?;
            swipes += 1;
            if !result.is_success() {
                warn!(swipes, "Swipe rejected by device: {}", result.describe());
                return Ok(result);
            }

            if let Some(settle) = request.wait_to_settle_timeout_ms {
                tokio::time::sleep(Duration::from_millis(settle)).await;
            }

            if Instant::now() >= deadline {
                break;
            }
        }

        warn!(
            swipes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scroll search timed out"
        );

        Err(ActionError::ElementNotFound {
            message: format!(
                "No visible element found: {}",
                request.selector.description()
            ),
            debug_message: timeout_diagnostics(request),
            hierarchy_root: Box::new(state.view_hierarchy),
        })
    }

    fn is_near_center(&self, bounds: &Bounds, state: &ScreenState, direction: SwipeDirection) -> bool {
        let (center_x, center_y) = bounds.center();
        let (offset, extent) = if direction.is_vertical() {
            (center_y - state.device_height as i32 / 2, state.device_height)
        } else {
            (center_x - state.device_width as i32 / 2, state.device_width)
        };
        f64::from(offset.abs()) <= f64::from(extent) * self.config.center_buffer_ratio
    }

    fn build_swipe(
        &self,
        request: &ScrollUntilVisibleRequest,
        direction: SwipeDirection,
        state: &ScreenState,
    ) -> SwipeCommand {
        let origin = match request.scroll_start_position {
            ScrollStartPosition::Center => SwipeOrigin::Point {
                start: Point::new(
                    state.device_width as i32 / 2,
                    state.device_height as i32 / 2,
                ),
            },
            position => {
                let (start, end) = relative_swipe(direction, position);
                SwipeOrigin::Relative { start, end }
            }
        };

        SwipeCommand {
            direction,
            origin,
            duration_ms: request.scroll_duration_ms,
            wait_to_settle_timeout_ms: request.wait_to_settle_timeout_ms,
        }
    }
}

/// Start/end percentages for a swipe.
///
/// Starting from the top biases the gesture towards the upper part of the
/// screen and starting from the bottom towards the lower part.
pub fn relative_swipe(
    direction: SwipeDirection,
    position: ScrollStartPosition,
) -> (RelativePoint, RelativePoint) {
    let (start_x, end_x) = match direction {
        SwipeDirection::Left => (85, 15),
        SwipeDirection::Right => (15, 85),
        SwipeDirection::Up | SwipeDirection::Down => (50, 50),
    };

    let (start_y, end_y) = match (direction, position) {
        (SwipeDirection::Up, ScrollStartPosition::Top) => (40, 15),
        (SwipeDirection::Up, ScrollStartPosition::Bottom) => (85, 60),
        (SwipeDirection::Up, ScrollStartPosition::Center) => (85, 15),
        (SwipeDirection::Down, ScrollStartPosition::Top) => (15, 40),
        (SwipeDirection::Down, ScrollStartPosition::Bottom) => (60, 85),
        (SwipeDirection::Down, ScrollStartPosition::Center) => (15, 85),
        (_, ScrollStartPosition::Top) => (25, 25),
        (_, ScrollStartPosition::Bottom) => (75, 75),
        (_, ScrollStartPosition::Center) => (50, 50),
    };

    (
        RelativePoint::new(start_x, start_y),
        RelativePoint::new(end_x, end_y),
    )
}

fn timeout_diagnostics(request: &ScrollUntilVisibleRequest) -> String {
    let speed = match request.speed {
        Some(speed) if speed > 50 => format!(
            "current = {} (0-100 scale) → Reduce for slower, more precise scrolling to avoid overshooting elements",
            speed
        ),
        Some(speed) => format!(
            "current = {} (0-100 scale) → Increase for faster scrolling if element is far away",
            speed
        ),
        None => "current = Not defined → Set this value (0-100) to control scrolling speed".to_string(),
    };

    let settle = match request.wait_to_settle_timeout_ms {
        Some(ms) => format!(
            "current = {}ms → Increase if your UI needs more time to update between scrolls",
            ms
        ),
        None => "current = Not defined → Set this value (e.g., 500ms) if your UI updates frequently between scrolls".to_string(),
    };

    let center = if request.center_element {
        "Disable if you don't need the element to be centered after finding it"
    } else {
        "Enable if you want the element to be centered after finding it"
    };

    format!(
        "Could not find a visible element matching selector: {selector}\n\
         Tip: Try adjusting the following settings to improve detection:\n\
         - `timeout`: current = {timeout}ms → Increase if you need more time to find the element\n\
         - `speed`: {speed}\n\
         - `waitToSettleTimeoutMs`: {settle}\n\
         - `visibilityPercentage`: current = {visibility}% → Lower this value if you want to detect partially visible elements\n\
         - `centerElement`: current = {center_value} → {center}",
        selector = request.selector.description(),
        timeout = request.timeout.as_millis(),
        speed = speed,
        settle = settle,
        visibility = request.visibility_percentage,
        center_value = request.center_element,
        center = center,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{primitives::ScreenStateFn, ScrollDirection};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use trailblaze_core_types::{
        DevicePlatform, ElementSelector, ToolError, ViewHierarchyTreeNode,
    };

    const WIDTH: u32 = 1080;
    const HEIGHT: u32 = 1920;

    #[derive(Default)]
    struct RecordingExecutor {
        commands: Mutex<Vec<DeviceCommand>>,
        reject: bool,
    }

    impl RecordingExecutor {
        fn swipes(&self) -> Vec<SwipeCommand> {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .filter_map(|command| match command {
                    DeviceCommand::Swipe(swipe) => Some(*swipe),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl DeviceCommandExecutor for RecordingExecutor {
        async fn execute(
            &self,
            commands: &[DeviceCommand],
            _trace_id: Option<&TraceId>,
        ) -> Result<ToolResult, ActionError> {
            self.commands.lock().unwrap().extend_from_slice(commands);
            if self.reject {
                return Ok(ToolResult::Error(ToolError::CommandValidationError {
                    error_message: "swipe out of bounds".to_string(),
                    command: serde_json::Value::Null,
                }));
            }
            for command in commands {
                if let DeviceCommand::Swipe(swipe) = command {
                    tokio::time::sleep(Duration::from_millis(swipe.duration_ms)).await;
                }
            }
            Ok(ToolResult::Success)
        }
    }

    fn screen(target: Option<Bounds>) -> ScreenState {
        let children = target
            .map(|bounds| {
                vec![ViewHierarchyTreeNode {
                    node_id: 7,
                    text: Some("Checkout".to_string()),
                    bounds: Some(bounds),
                    ..Default::default()
                }]
            })
            .unwrap_or_default();
        let root = ViewHierarchyTreeNode {
            node_id: 0,
            bounds: Some(Bounds::new(0, 0, WIDTH as i32, HEIGHT as i32)),
            children,
            ..Default::default()
        };
        ScreenState::new(root, WIDTH, HEIGHT, DevicePlatform::Android)
    }

    fn controller(
        executor: Arc<RecordingExecutor>,
        states: Vec<ScreenState>,
    ) -> ScrollUntilVisibleController {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScreenStateFn(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let state = states[n.min(states.len() - 1)].clone();
            async move { Ok::<_, ActionError>(state) }
        });
        ScrollUntilVisibleController::new(executor, Arc::new(provider))
    }

    fn request() -> ScrollUntilVisibleRequest {
        ScrollUntilVisibleRequest::new(ElementSelector::text(".*Checkout.*"), &ScrollConfig::default())
            .timeout(Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_and_centered_element_needs_no_swipe() {
        let executor = Arc::new(RecordingExecutor::default());
        let centered = screen(Some(Bounds::new(100, 900, 980, 1020)));
        let controller = controller(executor.clone(), vec![centered.clone()]);

        let result = controller
            .scroll_until_visible(&request().center_element(true), centered, None)
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(executor.commands.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_names_every_tunable() {
        let executor = Arc::new(RecordingExecutor::default());
        let empty = screen(None);
        let controller = controller(executor.clone(), vec![empty.clone()]);

        let err = controller
            .scroll_until_visible(&request().timeout(Duration::from_secs(1)), empty, None)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("No visible element found: Text matching regex: .*Checkout.*"));
        for tunable in [
            "`timeout`",
            "`speed`",
            "`waitToSettleTimeoutMs`",
            "`visibilityPercentage`",
            "`centerElement`",
        ] {
            assert!(message.contains(tunable), "missing {tunable} in {message}");
        }
        assert!(message.contains("current = 1000ms"));
        assert!(matches!(err, ActionError::ElementNotFound { .. }));

        let swipes = executor.swipes();
        assert!(!swipes.is_empty());
        assert!(swipes.iter().all(|s| s.direction == SwipeDirection::Up));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_swipe_is_returned_immediately() {
        let executor = Arc::new(RecordingExecutor {
            reject: true,
            ..Default::default()
        });
        let empty = screen(None);
        let controller = controller(executor.clone(), vec![empty.clone()]);

        let result = controller
            .scroll_until_visible(&request(), empty, None)
            .await
            .unwrap();

        assert!(matches!(
            result,
            ToolResult::Error(ToolError::CommandValidationError { .. })
        ));
        assert_eq!(executor.swipes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_element_found_after_scrolling() {
        let executor = Arc::new(RecordingExecutor::default());
        let empty = screen(None);
        let found = screen(Some(Bounds::new(0, 1500, 1080, 1600)));
        let controller = controller(executor.clone(), vec![empty.clone(), empty.clone(), found]);

        let result = controller
            .scroll_until_visible(
                &request().direction(ScrollDirection::Up).start_position(ScrollStartPosition::Top),
                empty,
                None,
            )
            .await
            .unwrap();

        assert!(result.is_success());
        let swipes = executor.swipes();
        assert_eq!(swipes.len(), 2);
        assert_eq!(swipes[0].direction, SwipeDirection::Down);
        assert_eq!(
            swipes[0].origin,
            SwipeOrigin::Relative {
                start: RelativePoint::new(50, 15),
                end: RelativePoint::new(50, 40),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_center_retries_are_bounded() {
        let executor = Arc::new(RecordingExecutor::default());
        let near_top = screen(Some(Bounds::new(0, 100, 1080, 200)));
        let controller = controller(executor.clone(), vec![near_top.clone()]);

        let result = controller
            .scroll_until_visible(&request().center_element(true), near_top, None)
            .await
            .unwrap();

        assert!(result.is_success());
        // first centering swipe plus four retries
        assert_eq!(executor.swipes().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_center_start_swipes_from_screen_center() {
        let executor = Arc::new(RecordingExecutor::default());
        let empty = screen(None);
        let controller = controller(executor.clone(), vec![empty.clone()]);

        let _ = controller
            .scroll_until_visible(&request().timeout(Duration::from_millis(30)), empty, None)
            .await;

        let swipes = executor.swipes();
        assert_eq!(
            swipes[0].origin,
            SwipeOrigin::Point {
                start: Point::new(540, 960)
            }
        );
        assert_eq!(swipes[0].duration_ms, 40);
    }

    #[test]
    fn test_relative_swipe_table() {
        assert_eq!(
            relative_swipe(SwipeDirection::Up, ScrollStartPosition::Bottom),
            (RelativePoint::new(50, 85), RelativePoint::new(50, 60))
        );
        assert_eq!(
            relative_swipe(SwipeDirection::Left, ScrollStartPosition::Top),
            (RelativePoint::new(85, 25), RelativePoint::new(15, 25))
        );
        assert_eq!(
            relative_swipe(SwipeDirection::Right, ScrollStartPosition::Center),
            (RelativePoint::new(15, 50), RelativePoint::new(85, 50))
        );
    }

    #[tokio::test]
    async fn test_invalid_selector_fails_before_swiping() {
        let executor = Arc::new(RecordingExecutor::default());
        let empty = screen(None);
        let controller = controller(executor.clone(), vec![empty.clone()]);
        let bad = ScrollUntilVisibleRequest::new(ElementSelector::text("[oops"), &ScrollConfig::default());

        let err = controller
            .scroll_until_visible(&bad, empty, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidSelector(_)));
        assert!(executor.swipes().is_empty());
    }
}
