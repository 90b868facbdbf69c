//! Regent Engine library.
//!
//! The check pipeline execution engine for the kingdom-management rules
//! layer. The host virtual-tabletop runtime owns rendering, dice primitives
//! and document persistence; this crate supplies the protocol every check
//! walks through and the resource/structure bookkeeping it triggers.
//!
//! ## Structure
//!
//! - `ports` - Host runtime boundaries (the only abstractions in the crate)
//! - `check/` - Pipeline definitions, registry, resolution builder, game
//!   command resolver, and the nine-step coordinator state machine
//! - `phases/` - Thin controllers deciding which check runs when
//! - `content/` - Built-in declarative pipeline definitions

pub mod check;
pub mod content;
pub mod phases;
pub mod ports;

/// Shared fakes and fixtures for engine tests.
#[cfg(test)]
pub mod test_support;


pub use check::coordinator::{CheckCoordinator, CheckError, ExecuteOptions};
pub use check::registry::{PipelineRegistry, PipelineSource};
pub use phases::{ActionPhaseController, EventPhaseController, UnrestPhaseController};
