//! Device action primitives for the Trailblaze agent
//!
//! This crate provides the building blocks the agent's tools are made of:
//! - Element matcher resolving regex selectors against a view hierarchy
//! - Device command model and the executor / screen-state seams
//! - Scroll-until-visible search with bounded centering retries and a timeout

pub mod errors;
mod locator;
mod primitives;
pub mod types;

pub use errors::*;
pub use locator::*;
pub use primitives::*;
pub use types::*;
