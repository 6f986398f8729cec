//! Trailblaze library
//!
//! Host-facing layer over the agent crates: configuration, tracing setup and
//! sessions that run prompt steps in order.

pub mod config;
pub mod session;
pub mod telemetry;

pub use action_primitives;
pub use agent_core;
pub use trailblaze_core_types as core_types;

pub use config::{load_config, LlmSettings, LoadedConfig, LoggingConfig, TrailblazeConfig};
pub use session::{SessionSummary, StepReport, TrailblazeSession};
pub use telemetry::init_tracing;
