//! Check outcomes and degrees of success.

use serde::{Deserialize, Serialize};

use crate::commands::GameCommand;
use crate::modifier::Modifier;
use crate::resources::Resource;

/// One of the four degrees a skill check can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DegreeOfSuccess {
    CriticalSuccess,
    Success,
    Failure,
    CriticalFailure,
}

impl DegreeOfSuccess {
    /// Stable wire/turn-state key for this degree.
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::CriticalSuccess => "criticalSuccess",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::CriticalFailure => "criticalFailure",
        }
    }
}

/// A pre-rendered UI affordance attached to an outcome preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeBadge {
    pub label: String,
    /// Resource the badge concerns, when it represents a resource change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

impl OutcomeBadge {
    pub fn info(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            resource: None,
        }
    }

    pub fn for_resource(label: impl Into<String>, resource: Resource) -> Self {
        Self {
            label: label.into(),
            resource: Some(resource),
        }
    }
}

/// One outcome bundle: what happens at a given degree of success.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Narrative text; supports `{resource}` placeholders.
    pub description: String,
    /// Ordered declared modifiers.
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Events/incidents only: whether this outcome ends the check or lets it
    /// persist into the next turn. `None` on actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_event: Option<bool>,
    /// Free-text instructions the engine cannot automate.
    #[serde(default)]
    pub manual_effects: Vec<String>,
    /// Pre-rendered UI affordances.
    #[serde(default)]
    pub outcome_badges: Vec<OutcomeBadge>,
    /// Structured high-level effects routed to the game command resolver.
    #[serde(default)]
    pub game_commands: Vec<GameCommand>,
}

impl Outcome {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_ends_event(mut self, ends_event: bool) -> Self {
        self.ends_event = Some(ends_event);
        self
    }

    pub fn with_manual_effect(mut self, effect: impl Into<String>) -> Self {
        self.manual_effects.push(effect.into());
        self
    }

    pub fn with_game_command(mut self, command: GameCommand) -> Self {
        self.game_commands.push(command);
        self
    }

    /// Substitute `{resource}` placeholders with display names.
    pub fn rendered_description(&self) -> String {
        let mut text = self.description.clone();
        for resource in Resource::ALL {
            let placeholder = format!("{{{}}}", resource.placeholder_key());
            if text.contains(&placeholder) {
                text = text.replace(&placeholder, resource.display_name());
            }
        }
        text
    }
}

/// The outcome map keyed by the four degrees of success.
///
/// Critical entries are optional; lookup falls back to the plain entry when
/// a critical one is absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcomes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_success: Option<Outcome>,
    pub success: Outcome,
    pub failure: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_failure: Option<Outcome>,
}

impl CheckOutcomes {
    /// Look up the outcome for a degree, falling back from critical variants
    /// to their plain counterparts when undeclared.
    pub fn for_degree(&self, degree: DegreeOfSuccess) -> &Outcome {
        match degree {
            DegreeOfSuccess::CriticalSuccess => {
                self.critical_success.as_ref().unwrap_or(&self.success)
            }
            DegreeOfSuccess::Success => &self.success,
            DegreeOfSuccess::Failure => &self.failure,
            DegreeOfSuccess::CriticalFailure => {
                self.critical_failure.as_ref().unwrap_or(&self.failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes() -> CheckOutcomes {
        CheckOutcomes {
            critical_success: None,
            success: Outcome::new("won"),
            failure: Outcome::new("lost"),
            critical_failure: Some(Outcome::new("disaster")),
        }
    }

    #[test]
    fn critical_success_falls_back_to_success() {
        let outcomes = outcomes();
        assert_eq!(
            outcomes.for_degree(DegreeOfSuccess::CriticalSuccess).description,
            "won"
        );
    }

    #[test]
    fn declared_critical_failure_is_used() {
        let outcomes = outcomes();
        assert_eq!(
            outcomes.for_degree(DegreeOfSuccess::CriticalFailure).description,
            "disaster"
        );
    }

    #[test]
    fn placeholders_render_display_names() {
        let outcome = Outcome::new("Lose 1 {gold} and gain 1 {imprisonedUnrest}");
        assert_eq!(
            outcome.rendered_description(),
            "Lose 1 Gold and gain 1 Imprisoned Unrest"
        );
    }

    #[test]
    fn degree_keys_are_stable() {
        assert_eq!(DegreeOfSuccess::CriticalSuccess.as_key(), "criticalSuccess");
        assert_eq!(DegreeOfSuccess::CriticalFailure.as_key(), "criticalFailure");
    }
}
