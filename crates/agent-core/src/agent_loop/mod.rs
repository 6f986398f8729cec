//! Objective execution loop.
//!
//! ```text
//! loop:
//!     screen = capture()                  // fresh screen state
//!     request = build(step, directive)    // system, objective, reminder, history, screen
//!     responses = gateway.call(request)   // bounded retry
//!     directive = strategy.process(...)   // execute tool calls, update status
//!     if finished or steps >= max: stop
//! ```

pub mod config;
pub mod prompt;
pub mod runner;
pub mod strategy;

pub use config::AgentRunnerConfig;
pub use prompt::{reminder_message, render_template, ChatRequestBuilder};
pub use runner::TrailblazeRunner;
pub use strategy::{
    strategy_for, MultipleToolStrategy, SingleToolStrategy, StepToolStrategy, StrategyContext,
    TurnDirective,
};
