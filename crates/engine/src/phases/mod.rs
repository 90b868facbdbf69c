//! Turn-phase controllers.
//!
//! Each controller owns one slice of the kingdom turn: events (random event
//! trigger with a decaying flat DC), unrest (incident selection by unrest
//! tier), and actions (player-chosen activities). Controllers select WHICH
//! check to run and then hand the instance to the coordinator; they never
//! drive check steps themselves.

pub mod actions;
pub mod events;
pub mod unrest;

pub use actions::ActionPhaseController;
pub use events::{EventPhaseController, EventPhaseOutcome};
pub use unrest::{UnrestPhaseController, UnrestPhaseOutcome};
