//! Declared resource effects.
//!
//! A `Modifier` is a closed tagged union - the resource and sign are always
//! explicit fields, never inferred from display text. After resolution the
//! engine's invariant is that every applied modifier has exactly one concrete
//! numeric value: dice have been rolled, choices have been made.

use serde::{Deserialize, Serialize};

use crate::dice::DiceFormula;
use crate::resources::Resource;

/// How long a modifier persists.
///
/// Events and incidents may only declare `Immediate`; `Ongoing` is reserved
/// for persistent modifiers sourced from structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifierDuration {
    #[default]
    Immediate,
    Ongoing,
}

/// UI presentation hint for a choice modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChoicePresentation {
    #[default]
    Buttons,
    Dropdown,
}

/// A declared effect on one kingdom resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Modifier {
    /// Fixed signed amount.
    Static {
        resource: Resource,
        value: i32,
        #[serde(default)]
        duration: ModifierDuration,
    },
    /// Amount determined by a dice roll, resolved at most once per instance.
    Dice {
        resource: Resource,
        formula: DiceFormula,
        /// Roll result is applied as a loss rather than a gain.
        #[serde(default)]
        negative: bool,
        #[serde(default)]
        duration: ModifierDuration,
    },
    /// One amount applied to a user-selected resource among candidates.
    Choice {
        resources: Vec<Resource>,
        value: i32,
        #[serde(default)]
        presentation: ChoicePresentation,
        #[serde(default)]
        duration: ModifierDuration,
    },
}

impl Modifier {
    pub fn static_amount(resource: Resource, value: i32) -> Self {
        Self::Static {
            resource,
            value,
            duration: ModifierDuration::Immediate,
        }
    }

    pub fn dice(resource: Resource, formula: DiceFormula, negative: bool) -> Self {
        Self::Dice {
            resource,
            formula,
            negative,
            duration: ModifierDuration::Immediate,
        }
    }

    pub fn choice(resources: Vec<Resource>, value: i32) -> Self {
        Self::Choice {
            resources,
            value,
            presentation: ChoicePresentation::Buttons,
            duration: ModifierDuration::Immediate,
        }
    }

    pub fn duration(&self) -> ModifierDuration {
        match self {
            Self::Static { duration, .. }
            | Self::Dice { duration, .. }
            | Self::Choice { duration, .. } => *duration,
        }
    }

    /// Whether this modifier needs user interaction before it can be applied.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Dice { .. } | Self::Choice { .. })
    }

    /// The resource(s) this modifier may touch.
    pub fn candidate_resources(&self) -> Vec<Resource> {
        match self {
            Self::Static { resource, .. } | Self::Dice { resource, .. } => vec![*resource],
            Self::Choice { resources, .. } => resources.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_is_not_interactive() {
        let modifier = Modifier::static_amount(Resource::Gold, -2);
        assert!(!modifier.is_interactive());
        assert_eq!(modifier.candidate_resources(), vec![Resource::Gold]);
    }

    #[test]
    fn dice_and_choice_are_interactive() {
        let formula = DiceFormula::parse("1d4").expect("valid formula");
        assert!(Modifier::dice(Resource::Unrest, formula, false).is_interactive());
        assert!(Modifier::choice(vec![Resource::Gold, Resource::Fame], 3).is_interactive());
    }

    #[test]
    fn serde_tag_is_explicit() {
        let modifier = Modifier::static_amount(Resource::Lumber, 2);
        let json = serde_json::to_value(&modifier).expect("serializes");
        assert_eq!(json["type"], "static");
        assert_eq!(json["resource"], "lumber");
        assert_eq!(json["value"], 2);
    }

    #[test]
    fn default_duration_is_immediate() {
        let modifier = Modifier::choice(vec![Resource::Food], 1);
        assert_eq!(modifier.duration(), ModifierDuration::Immediate);
    }
}
