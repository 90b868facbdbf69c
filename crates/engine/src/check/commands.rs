//! The game command resolver.
//!
//! Translates structured intents declared on outcomes into concrete document
//! mutations with a prepare/commit split: `prepare` performs deterministic
//! target selection against a snapshot and returns a badge plus a resolved
//! mutation; nothing changes until `commit` runs inside the atomic kingdom
//! update. `prepare` returning `None` means "no eligible target" - the caller
//! degrades to an informational badge, never an error.

use serde::{Deserialize, Serialize};

use regent_domain::{
    FactionId, GameCommand, Kingdom, OutcomeBadge, Settlement, SettlementId, Structure,
    StructureCategory, StructureId, StructureTarget, UserId, WorksiteId,
};

/// A fully resolved mutation, ready to commit exactly once.
///
/// A value rather than a closure so previews can be persisted and commands
/// re-prepared deterministically after a UI reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandMutation {
    DamageStructure {
        settlement_id: SettlementId,
        structure_id: StructureId,
    },
    RemoveStructure {
        settlement_id: SettlementId,
        structure_id: StructureId,
    },
    DowngradeStructure {
        settlement_id: SettlementId,
        structure_id: StructureId,
    },
    DestroyWorksite {
        worksite_id: WorksiteId,
    },
    AdjustFactionAttitude {
        faction_id: FactionId,
        steps: i8,
    },
    SpendPlayerAction {
        user_id: UserId,
    },
}

/// Output of `prepare`: what will happen, and how to make it happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedCommand {
    /// Human-readable description shown in the outcome preview.
    pub badge: OutcomeBadge,
    pub mutation: CommandMutation,
}

/// Stateless prepare/commit translator for game commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameCommandResolver;

impl GameCommandResolver {
    /// Resolve a command against a kingdom snapshot.
    ///
    /// Target selection is deterministic: highest available capacity wins,
    /// equal capacities resolve by stable input order. Returns `None` when no
    /// eligible target exists.
    pub fn prepare(&self, command: &GameCommand, kingdom: &Kingdom) -> Option<PreparedCommand> {
        match command {
            GameCommand::DamageStructure { target } => {
                let (settlement, structure) = resolve_structure_target(target, kingdom)?;
                Some(PreparedCommand {
                    badge: OutcomeBadge::info(format!(
                        "{} damaged in {}",
                        structure.name, settlement.name
                    )),
                    mutation: CommandMutation::DamageStructure {
                        settlement_id: settlement.id,
                        structure_id: structure.id,
                    },
                })
            }
            GameCommand::DestroyStructure { target } => {
                let (settlement, structure) = resolve_structure_target(target, kingdom)?;
                if structure.tier <= 1 {
                    Some(PreparedCommand {
                        badge: OutcomeBadge::info(format!(
                            "{} destroyed in {}",
                            structure.name, settlement.name
                        )),
                        mutation: CommandMutation::RemoveStructure {
                            settlement_id: settlement.id,
                            structure_id: structure.id,
                        },
                    })
                } else {
                    Some(PreparedCommand {
                        badge: OutcomeBadge::info(format!(
                            "{} in {} reduced to its predecessor (damaged)",
                            structure.name, settlement.name
                        )),
                        mutation: CommandMutation::DowngradeStructure {
                            settlement_id: settlement.id,
                            structure_id: structure.id,
                        },
                    })
                }
            }
            GameCommand::DestroyWorksite { worksite_id } => {
                let worksite = match worksite_id {
                    Some(id) => kingdom.worksite(*id)?,
                    // Stable input order: the first worksite is the target.
                    None => kingdom.worksites.first()?,
                };
                Some(PreparedCommand {
                    badge: OutcomeBadge::info(format!(
                        "Worksite at hex {} destroyed",
                        worksite.hex
                    )),
                    mutation: CommandMutation::DestroyWorksite {
                        worksite_id: worksite.id,
                    },
                })
            }
            GameCommand::AdjustFactionAttitude { faction_id, steps } => {
                let faction = kingdom.factions.iter().find(|f| f.id == *faction_id)?;
                let direction = if *steps >= 0 { "improves" } else { "worsens" };
                Some(PreparedCommand {
                    badge: OutcomeBadge::info(format!("{} attitude {}", faction.name, direction)),
                    mutation: CommandMutation::AdjustFactionAttitude {
                        faction_id: *faction_id,
                        steps: *steps,
                    },
                })
            }
            GameCommand::SpendPlayerAction { user_id } => {
                let has_remaining = kingdom
                    .turn_state
                    .player_actions
                    .iter()
                    .any(|p| p.user_id == *user_id && p.remaining() > 0);
                if !has_remaining {
                    return None;
                }
                Some(PreparedCommand {
                    badge: OutcomeBadge::info("One kingdom action spent"),
                    mutation: CommandMutation::SpendPlayerAction { user_id: *user_id },
                })
            }
        }
    }

    /// Apply a resolved mutation. The coordinator guarantees single
    /// invocation; a target that vanished since prepare is warned and skipped
    /// rather than failing the whole check.
    pub fn commit(&self, mutation: &CommandMutation, kingdom: &mut Kingdom) {
        match mutation {
            CommandMutation::DamageStructure {
                settlement_id,
                structure_id,
            } => {
                match kingdom
                    .settlement_mut(*settlement_id)
                    .and_then(|s| s.structure_mut(*structure_id))
                {
                    Some(structure) => structure.functional = false,
                    None => warn_missing_target("damageStructure"),
                }
            }
            CommandMutation::RemoveStructure {
                settlement_id,
                structure_id,
            } => match kingdom.settlement_mut(*settlement_id) {
                Some(settlement) => {
                    settlement.structures.retain(|s| s.id != *structure_id);
                }
                None => warn_missing_target("destroyStructure"),
            },
            CommandMutation::DowngradeStructure {
                settlement_id,
                structure_id,
            } => {
                match kingdom
                    .settlement_mut(*settlement_id)
                    .and_then(|s| s.structure_mut(*structure_id))
                {
                    Some(structure) => {
                        structure.tier = structure.tier.saturating_sub(1).max(1);
                        structure.functional = false;
                    }
                    None => warn_missing_target("destroyStructure"),
                }
            }
            CommandMutation::DestroyWorksite { worksite_id } => {
                if kingdom.remove_worksite(*worksite_id).is_none() {
                    warn_missing_target("destroyWorksite");
                }
            }
            CommandMutation::AdjustFactionAttitude { faction_id, steps } => {
                match kingdom.faction_mut(*faction_id) {
                    Some(faction) => faction.attitude = faction.attitude.shifted(*steps),
                    None => warn_missing_target("adjustFactionAttitude"),
                }
            }
            CommandMutation::SpendPlayerAction { user_id } => {
                if !kingdom.turn_state.spend_player_action(*user_id) {
                    warn_missing_target("spendPlayerAction");
                }
            }
        }
    }
}

fn warn_missing_target(command: &str) {
    tracing::warn!(command, "commit target no longer exists; skipping mutation");
}

/// Pick the settlement/structure a capacity-targeted command affects.
///
/// Settlements with zero available capacity are excluded; the richest wins;
/// ties resolve by stable input order. Within the settlement, the
/// highest-capacity functional structure of the category is chosen.
fn resolve_structure_target<'k>(
    target: &StructureTarget,
    kingdom: &'k Kingdom,
) -> Option<(&'k Settlement, &'k Structure)> {
    match target {
        StructureTarget::Specific {
            settlement_id,
            structure_id,
        } => {
            let settlement = kingdom.settlement(*settlement_id)?;
            let structure = settlement.structure(*structure_id)?;
            Some((settlement, structure))
        }
        StructureTarget::HighestCapacity { category } => {
            let settlement = kingdom
                .settlements
                .iter()
                .filter(|s| s.available_capacity(*category) > 0)
                // max_by_key returns the LAST maximum; fold keeps the first.
                .fold(None::<&Settlement>, |best, candidate| match best {
                    Some(current)
                        if current.available_capacity(*category)
                            >= candidate.available_capacity(*category) =>
                    {
                        Some(current)
                    }
                    _ => Some(candidate),
                })?;
            let structure = pick_structure(settlement, *category)?;
            Some((settlement, structure))
        }
    }
}

fn pick_structure(settlement: &Settlement, category: StructureCategory) -> Option<&Structure> {
    settlement
        .structures
        .iter()
        .filter(|s| s.functional && s.category == category)
        .fold(None::<&Structure>, |best, candidate| match best {
            Some(current) if current.capacity >= candidate.capacity => Some(current),
            _ => Some(candidate),
        })
}
