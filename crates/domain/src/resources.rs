//! Kingdom resource ledger vocabulary.
//!
//! `Resource` is the closed set of ledger entries a modifier may touch.
//! `ResourceDelta` is a signed change to one of them - the unit everything
//! downstream of the resolution builder speaks in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One entry in the kingdom's resource ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Gold,
    Food,
    Lumber,
    Stone,
    Ore,
    Unrest,
    Fame,
    ImprisonedUnrest,
}

impl Resource {
    /// All ledger entries, in stable display order.
    pub const ALL: [Resource; 8] = [
        Resource::Gold,
        Resource::Food,
        Resource::Lumber,
        Resource::Stone,
        Resource::Ore,
        Resource::Unrest,
        Resource::Fame,
        Resource::ImprisonedUnrest,
    ];

    /// Display name used in outcome text placeholders like `{gold}`.
    pub fn display_name(&self) -> &'static str {
        match self {
            Resource::Gold => "Gold",
            Resource::Food => "Food",
            Resource::Lumber => "Lumber",
            Resource::Stone => "Stone",
            Resource::Ore => "Ore",
            Resource::Unrest => "Unrest",
            Resource::Fame => "Fame",
            Resource::ImprisonedUnrest => "Imprisoned Unrest",
        }
    }

    /// Placeholder key used in outcome description templates.
    pub fn placeholder_key(&self) -> &'static str {
        match self {
            Resource::Gold => "gold",
            Resource::Food => "food",
            Resource::Lumber => "lumber",
            Resource::Stone => "stone",
            Resource::Ore => "ore",
            Resource::Unrest => "unrest",
            Resource::Fame => "fame",
            Resource::ImprisonedUnrest => "imprisonedUnrest",
        }
    }

    /// Whether the shortfall rule applies to this resource.
    ///
    /// Unrest, fame and imprisoned unrest are bookkeeping meters, not stocks
    /// that can be "unpaid" - a negative delta on them never converts into an
    /// unrest penalty.
    pub fn is_shortfall_eligible(&self) -> bool {
        !matches!(
            self,
            Resource::Unrest | Resource::Fame | Resource::ImprisonedUnrest
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A signed change to one ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDelta {
    pub resource: Resource,
    pub value: i32,
}

impl ResourceDelta {
    pub fn new(resource: Resource, value: i32) -> Self {
        Self { resource, value }
    }
}

impl fmt::Display for ResourceDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value >= 0 {
            write!(f, "+{} {}", self.value, self.resource)
        } else {
            write!(f, "{} {}", self.value, self.resource)
        }
    }
}

/// Merge a delta into an accumulating list, folding into an existing entry
/// for the same resource instead of appending a duplicate.
pub fn merge_delta(deltas: &mut Vec<ResourceDelta>, delta: ResourceDelta) {
    if let Some(existing) = deltas.iter_mut().find(|d| d.resource == delta.resource) {
        existing.value += delta.value;
    } else {
        deltas.push(delta);
    }
}
