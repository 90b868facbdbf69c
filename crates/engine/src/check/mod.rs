//! The check pipeline engine.
//!
//! A check (action, random event, or unrest incident) is declared once as a
//! [`pipeline::CheckPipeline`], registered in the [`registry::PipelineRegistry`],
//! and driven through its nine-step lifecycle by the
//! [`coordinator::CheckCoordinator`]. Per-invocation state lives in
//! [`context::CheckContext`], never on the shared definition.

pub mod commands;
pub mod context;
pub mod coordinator;
pub mod pipeline;
pub mod registry;
pub mod resolution;
