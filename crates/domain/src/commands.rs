//! Structured high-level effects an outcome may declare.
//!
//! These are intents, not mutations: the engine's game command resolver
//! turns them into concrete document changes via its prepare/commit split.

use serde::{Deserialize, Serialize};

use crate::ids::{FactionId, SettlementId, StructureId, UserId, WorksiteId};
use crate::kingdom::StructureCategory;

/// How a command picks the structure (and settlement) it affects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StructureTarget {
    /// An explicitly named structure.
    Specific {
        settlement_id: SettlementId,
        structure_id: StructureId,
    },
    /// The functional structure of the given category in the settlement with
    /// the most available capacity. Ties resolve by stable settlement order.
    HighestCapacity { category: StructureCategory },
}

/// Direction of a faction attitude adjustment, in steps on the attitude ladder.
pub type FactionAttitudeStep = i8;

/// A structured effect routed to the game command resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameCommand {
    /// Mark a structure non-functional until repaired.
    DamageStructure { target: StructureTarget },
    /// Remove a tier-1 structure outright, or downgrade a higher-tier
    /// structure to its predecessor (marked damaged).
    DestroyStructure { target: StructureTarget },
    /// Remove a worksite from the map.
    DestroyWorksite {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        worksite_id: Option<WorksiteId>,
    },
    /// Move a faction along the attitude ladder.
    AdjustFactionAttitude {
        faction_id: FactionId,
        steps: FactionAttitudeStep,
    },
    /// Consume one of a player's actions for the turn.
    SpendPlayerAction { user_id: UserId },
}
