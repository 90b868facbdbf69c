//! Regent Domain - core types for the kingdom-management rules layer.
//!
//! Pure data and invariants only: no I/O, no async, no RNG (dice rolling
//! takes an injected closure). Everything here is consumed by the engine
//! crate, which owns the check pipeline state machine and the host ports.

pub mod commands;
pub mod dice;
pub mod error;
pub mod ids;
pub mod kingdom;
pub mod modifier;
pub mod outcome;
pub mod resources;
pub mod turn_state;

pub use commands::{FactionAttitudeStep, GameCommand, StructureTarget};
pub use dice::{DiceFormula, DiceParseError, DiceRollResult};
pub use error::DomainError;
pub use ids::{
    FactionId, InstanceId, KingdomId, SettlementId, StructureId, UserId, WorksiteId,
};
pub use kingdom::{
    Faction, FactionAttitude, Kingdom, Settlement, Structure, StructureCategory, Worksite,
    WorksiteKind,
};
pub use modifier::{ChoicePresentation, Modifier, ModifierDuration};
pub use outcome::{CheckOutcomes, DegreeOfSuccess, Outcome, OutcomeBadge};
pub use resources::{merge_delta, Resource, ResourceDelta};
pub use turn_state::{PhaseCheckState, PlayerActions, TurnState, UnrestTier};
