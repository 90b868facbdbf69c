//! The kingdom record - the persisted document the host stores.
//!
//! Everything the engine mutates lives here: the resource ledger,
//! settlements with their structures, worksites, factions, and the turn
//! state carrying ongoing-check records. Mutation happens only through the
//! host's atomic `update` port; this module supplies the invariant-preserving
//! helpers those mutators call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{FactionId, KingdomId, SettlementId, StructureId, WorksiteId};
use crate::resources::{Resource, ResourceDelta};
use crate::turn_state::TurnState;

/// Functional category of a settlement structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StructureCategory {
    /// Courts, jails, prisons - carry imprisoned-unrest capacity.
    Justice,
    Commerce,
    Culture,
    Defense,
    Faith,
}

/// A built structure inside a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub id: StructureId,
    pub name: String,
    pub category: StructureCategory,
    /// Tier 1 is the base form; higher tiers have a predecessor to downgrade to.
    pub tier: u8,
    /// Capacity contributed while functional (e.g. prison slots for Justice).
    pub capacity: i32,
    /// Damaged structures are non-functional until repaired.
    pub functional: bool,
}

impl Structure {
    pub fn new(name: impl Into<String>, category: StructureCategory, tier: u8) -> Self {
        Self {
            id: StructureId::new(),
            name: name.into(),
            category,
            tier,
            capacity: 0,
            functional: true,
        }
    }

    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = capacity;
        self
    }
}

/// A settlement with its built structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub id: SettlementId,
    pub name: String,
    pub level: u8,
    pub structures: Vec<Structure>,
    /// Imprisoned unrest currently held in this settlement's Justice structures.
    pub imprisoned: i32,
}

impl Settlement {
    pub fn new(name: impl Into<String>, level: u8) -> Self {
        Self {
            id: SettlementId::new(),
            name: name.into(),
            level,
            structures: Vec::new(),
            imprisoned: 0,
        }
    }

    pub fn with_structure(mut self, structure: Structure) -> Self {
        self.structures.push(structure);
        self
    }

    /// Total capacity of functional structures in a category.
    pub fn capacity(&self, category: StructureCategory) -> i32 {
        self.structures
            .iter()
            .filter(|s| s.functional && s.category == category)
            .map(|s| s.capacity)
            .sum()
    }

    /// Capacity in a category still available for use.
    ///
    /// For Justice this is prison slots not already holding imprisoned unrest.
    pub fn available_capacity(&self, category: StructureCategory) -> i32 {
        let used = match category {
            StructureCategory::Justice => self.imprisoned,
            _ => 0,
        };
        (self.capacity(category) - used).max(0)
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == id)
    }

    pub fn structure_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.iter_mut().find(|s| s.id == id)
    }
}

/// Kind of resource-producing worksite on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorksiteKind {
    Farm,
    LumberCamp,
    Quarry,
    Mine,
}

/// A worksite claimed on a hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worksite {
    pub id: WorksiteId,
    pub kind: WorksiteKind,
    /// Hex coordinate in the host's map notation.
    pub hex: String,
}

impl Worksite {
    pub fn new(kind: WorksiteKind, hex: impl Into<String>) -> Self {
        Self {
            id: WorksiteId::new(),
            kind,
            hex: hex.into(),
        }
    }
}

/// A faction's attitude toward the kingdom, on the standard five-step ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FactionAttitude {
    Hostile,
    Unfriendly,
    Indifferent,
    Friendly,
    Helpful,
}

impl FactionAttitude {
    const LADDER: [FactionAttitude; 5] = [
        FactionAttitude::Hostile,
        FactionAttitude::Unfriendly,
        FactionAttitude::Indifferent,
        FactionAttitude::Friendly,
        FactionAttitude::Helpful,
    ];

    /// Shift along the ladder, clamped at both ends.
    pub fn shifted(self, steps: i8) -> Self {
        let current = Self::LADDER
            .iter()
            .position(|a| *a == self)
            .unwrap_or(2) as i64;
        let index = (current + i64::from(steps)).clamp(0, 4) as usize;
        Self::LADDER[index]
    }
}

/// A named faction the kingdom has relations with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub attitude: FactionAttitude,
}

impl Faction {
    pub fn new(name: impl Into<String>, attitude: FactionAttitude) -> Self {
        Self {
            id: FactionId::new(),
            name: name.into(),
            attitude,
        }
    }
}

/// The full kingdom document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kingdom {
    pub id: KingdomId,
    pub name: String,
    pub level: u8,
    pub resources: BTreeMap<Resource, i32>,
    pub settlements: Vec<Settlement>,
    pub worksites: Vec<Worksite>,
    pub factions: Vec<Faction>,
    pub turn_state: TurnState,
}

impl Kingdom {
    pub fn new(name: impl Into<String>, level: u8) -> Self {
        Self {
            id: KingdomId::new(),
            name: name.into(),
            level,
            resources: BTreeMap::new(),
            settlements: Vec::new(),
            worksites: Vec::new(),
            factions: Vec::new(),
            turn_state: TurnState::default(),
        }
    }

    /// Current stock of a resource (absent entries read as zero).
    pub fn resource(&self, resource: Resource) -> i32 {
        self.resources.get(&resource).copied().unwrap_or(0)
    }

    pub fn set_resource(&mut self, resource: Resource, value: i32) {
        self.resources.insert(resource, value);
    }

    /// Apply one numeric delta to the ledger.
    ///
    /// Stocks floor at zero - any shortfall penalty was already added by the
    /// resolution builder, so flooring here never hides a cost. Fame is
    /// capped at 3 per the kingdom rules.
    pub fn apply_delta(&mut self, delta: ResourceDelta) {
        let current = self.resource(delta.resource);
        let mut next = (current + delta.value).max(0);
        if delta.resource == Resource::Fame {
            next = next.min(3);
        }
        self.resources.insert(delta.resource, next);
    }

    pub fn settlement(&self, id: SettlementId) -> Option<&Settlement> {
        self.settlements.iter().find(|s| s.id == id)
    }

    pub fn settlement_mut(&mut self, id: SettlementId) -> Option<&mut Settlement> {
        self.settlements.iter_mut().find(|s| s.id == id)
    }

    pub fn faction_mut(&mut self, id: FactionId) -> Option<&mut Faction> {
        self.factions.iter_mut().find(|f| f.id == id)
    }

    pub fn worksite(&self, id: WorksiteId) -> Option<&Worksite> {
        self.worksites.iter().find(|w| w.id == id)
    }

    pub fn remove_worksite(&mut self, id: WorksiteId) -> Option<Worksite> {
        let index = self.worksites.iter().position(|w| w.id == id)?;
        Some(self.worksites.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_delta_floors_stocks_at_zero() {
        let mut kingdom = Kingdom::new("Test", 1);
        kingdom.set_resource(Resource::Gold, 2);
        kingdom.apply_delta(ResourceDelta::new(Resource::Gold, -5));
        assert_eq!(kingdom.resource(Resource::Gold), 0);
    }

    #[test]
    fn apply_delta_caps_fame() {
        let mut kingdom = Kingdom::new("Test", 1);
        kingdom.set_resource(Resource::Fame, 3);
        kingdom.apply_delta(ResourceDelta::new(Resource::Fame, 1));
        assert_eq!(kingdom.resource(Resource::Fame), 3);
    }

    #[test]
    fn damaged_structures_do_not_count_toward_capacity() {
        let mut settlement = Settlement::new("Stagfall", 2).with_structure(
            Structure::new("Jail", StructureCategory::Justice, 1).with_capacity(4),
        );
        assert_eq!(settlement.capacity(StructureCategory::Justice), 4);

        let id = settlement.structures[0].id;
        settlement
            .structure_mut(id)
            .map(|s| s.functional = false)
            .expect("structure exists");
        assert_eq!(settlement.capacity(StructureCategory::Justice), 0);
    }

    #[test]
    fn available_capacity_subtracts_imprisoned() {
        let mut settlement = Settlement::new("Stagfall", 2).with_structure(
            Structure::new("Prison", StructureCategory::Justice, 2).with_capacity(8),
        );
        settlement.imprisoned = 5;
        assert_eq!(settlement.available_capacity(StructureCategory::Justice), 3);
    }

    #[test]
    fn attitude_shift_clamps_at_ladder_ends() {
        assert_eq!(
            FactionAttitude::Friendly.shifted(2),
            FactionAttitude::Helpful
        );
        assert_eq!(
            FactionAttitude::Hostile.shifted(-1),
            FactionAttitude::Hostile
        );
        assert_eq!(
            FactionAttitude::Indifferent.shifted(-2),
            FactionAttitude::Hostile
        );
    }
}
