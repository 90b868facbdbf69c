//! The resolution data builder.
//!
//! A pure fold from interaction state plus the declared modifier list into a
//! flat array of numeric resource deltas. Dice contribute their cached roll
//! (never re-rolled here), choices contribute only the picked resource, and
//! badge-resolved values are the single source for interactive modifiers so
//! nothing is double-counted from the raw list. After folding, the shortfall
//! rule converts would-be negative stocks into unrest instead of clamping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use regent_domain::{
    merge_delta, DegreeOfSuccess, DomainError, Modifier, Outcome, Resource, ResourceDelta,
};

use crate::check::context::InteractionResolution;

/// Flat result of folding one outcome's interaction state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionData {
    /// One entry per touched resource; ready for the ledger.
    pub numeric_modifiers: Vec<ResourceDelta>,
    /// Free-text instructions the engine cannot automate.
    pub manual_effects: Vec<String>,
    /// Custom-component payloads keyed by interaction id.
    pub custom_component_data: serde_json::Value,
}

/// Everything the builder folds over.
#[derive(Debug)]
pub struct ResolutionInput<'a> {
    /// Pipeline id, for log context only.
    pub check_id: &'a str,
    pub outcome: &'a Outcome,
    pub degree: DegreeOfSuccess,
    /// Dice badge results keyed by modifier index.
    pub resolved_dice: &'a BTreeMap<usize, i32>,
    /// Choice badge picks keyed by modifier index.
    pub chosen_resources: &'a BTreeMap<usize, Resource>,
    /// Completed custom-component resolutions keyed by interaction id.
    pub interaction_resolutions: &'a BTreeMap<String, InteractionResolution>,
    /// Unconditional cost (positive = amount paid).
    pub cost: &'a [ResourceDelta],
    /// Current ledger stocks, for the shortfall rule.
    pub current_stocks: &'a BTreeMap<Resource, i32>,
}

/// Fold interaction state and declared modifiers into resolution data.
///
/// Errors only on broken invariants: a dice modifier with no cached roll or
/// a choice modifier with no (or an invalid) pick. The coordinator resolves
/// all of those in step 5 before this runs.
pub fn build_resolution(input: &ResolutionInput<'_>) -> Result<ResolutionData, DomainError> {
    let mut deltas: Vec<ResourceDelta> = Vec::new();

    // Unconditional cost, paid regardless of degree.
    for cost in input.cost {
        merge_delta(&mut deltas, ResourceDelta::new(cost.resource, -cost.value));
    }

    for (index, modifier) in input.outcome.modifiers.iter().enumerate() {
        match modifier {
            Modifier::Static {
                resource, value, ..
            } => {
                merge_delta(&mut deltas, ResourceDelta::new(*resource, *value));
            }
            Modifier::Dice {
                resource, negative, ..
            } => {
                // The badge path is the single source for dice values.
                let rolled = input.resolved_dice.get(&index).copied().ok_or_else(|| {
                    DomainError::constraint(format!(
                        "check '{}': dice modifier {} has not been rolled",
                        input.check_id, index
                    ))
                })?;
                let value = if *negative { -rolled } else { rolled };
                merge_delta(&mut deltas, ResourceDelta::new(*resource, value));
            }
            Modifier::Choice {
                resources, value, ..
            } => {
                let picked = input.chosen_resources.get(&index).copied().ok_or_else(|| {
                    DomainError::constraint(format!(
                        "check '{}': choice modifier {} has not been made",
                        input.check_id, index
                    ))
                })?;
                if !resources.contains(&picked) {
                    return Err(DomainError::constraint(format!(
                        "check '{}': chosen resource {} is not a candidate of modifier {}",
                        input.check_id, picked, index
                    )));
                }
                // Non-selected candidates contribute nothing.
                merge_delta(&mut deltas, ResourceDelta::new(picked, *value));
            }
        }
    }

    // Custom-component contributions.
    let mut component_data = serde_json::Map::new();
    for (id, resolution) in input.interaction_resolutions {
        if !resolution.is_resolved {
            return Err(DomainError::constraint(format!(
                "check '{}': interaction '{}' is still pending",
                input.check_id, id
            )));
        }
        for delta in &resolution.modifiers {
            merge_delta(&mut deltas, *delta);
        }
        if !resolution.metadata.is_null() {
            component_data.insert(id.clone(), resolution.metadata.clone());
        }
    }

    apply_critical_fame(input, &mut deltas);
    apply_shortfall_rule(input.current_stocks, &mut deltas);

    Ok(ResolutionData {
        numeric_modifiers: deltas,
        manual_effects: input.outcome.manual_effects.clone(),
        custom_component_data: serde_json::Value::Object(component_data),
    })
}

/// Engine rule: every critical success grants +1 fame.
///
/// A pipeline that declares its own fame bonus on the critical outcome would
/// double it; those are flagged and the implicit grant is skipped.
fn apply_critical_fame(input: &ResolutionInput<'_>, deltas: &mut Vec<ResourceDelta>) {
    if input.degree != DegreeOfSuccess::CriticalSuccess {
        return;
    }
    let declares_fame = input.outcome.modifiers.iter().any(|m| {
        matches!(
            m,
            Modifier::Static {
                resource: Resource::Fame,
                value,
                ..
            } if *value > 0
        )
    });
    if declares_fame {
        tracing::warn!(
            check_id = input.check_id,
            "pipeline declares its own fame bonus on criticalSuccess; \
             skipping the implicit +1 fame to avoid double-applying"
        );
        return;
    }
    merge_delta(deltas, ResourceDelta::new(Resource::Fame, 1));
}

/// Shortfall rule: a change that would drive a stock negative is not clamped;
/// it adds one unrest per shortfalling resource, merged into any existing
/// unrest delta.
fn apply_shortfall_rule(
    current_stocks: &BTreeMap<Resource, i32>,
    deltas: &mut Vec<ResourceDelta>,
) {
    let shortfalls: Vec<Resource> = deltas
        .iter()
        .filter(|d| d.resource.is_shortfall_eligible())
        .filter(|d| {
            let current = current_stocks.get(&d.resource).copied().unwrap_or(0);
            current + d.value < 0
        })
        .map(|d| d.resource)
        .collect();

    for resource in shortfalls {
        tracing::debug!(resource = %resource, "resource shortfall converts to unrest");
        merge_delta(deltas, ResourceDelta::new(Resource::Unrest, 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regent_domain::DiceFormula;

    fn stocks(entries: &[(Resource, i32)]) -> BTreeMap<Resource, i32> {
        entries.iter().copied().collect()
    }

    fn input_for<'a>(
        outcome: &'a Outcome,
        degree: DegreeOfSuccess,
        resolved_dice: &'a BTreeMap<usize, i32>,
        chosen_resources: &'a BTreeMap<usize, Resource>,
        interactions: &'a BTreeMap<String, InteractionResolution>,
        current_stocks: &'a BTreeMap<Resource, i32>,
    ) -> ResolutionInput<'a> {
        ResolutionInput {
            check_id: "test-check",
            outcome,
            degree,
            resolved_dice,
            chosen_resources,
            interaction_resolutions: interactions,
            cost: &[],
            current_stocks,
        }
    }

    #[test]
    fn static_modifiers_pass_through() {
        let outcome = Outcome::new("x").with_modifier(Modifier::static_amount(Resource::Gold, 2));
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[]);

        let data = build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::Success,
            &empty_dice,
            &empty_choices,
            &empty_interactions,
            &current,
        ))
        .expect("builds");
        assert_eq!(
            data.numeric_modifiers,
            vec![ResourceDelta::new(Resource::Gold, 2)]
        );
    }

    #[test]
    fn shortfall_converts_to_unrest_not_clamped() {
        let outcome = Outcome::new("x").with_modifier(Modifier::static_amount(Resource::Gold, -5));
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[(Resource::Gold, 2)]);

        let data = build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::Failure,
            &empty_dice,
            &empty_choices,
            &empty_interactions,
            &current,
        ))
        .expect("builds");

        assert!(data
            .numeric_modifiers
            .contains(&ResourceDelta::new(Resource::Gold, -5)));
        assert!(data
            .numeric_modifiers
            .contains(&ResourceDelta::new(Resource::Unrest, 1)));
    }

    #[test]
    fn shortfall_merges_into_existing_unrest() {
        let outcome = Outcome::new("x")
            .with_modifier(Modifier::static_amount(Resource::Gold, -5))
            .with_modifier(Modifier::static_amount(Resource::Unrest, 2));
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[(Resource::Gold, 0)]);

        let data = build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::Failure,
            &empty_dice,
            &empty_choices,
            &empty_interactions,
            &current,
        ))
        .expect("builds");

        let unrest: Vec<_> = data
            .numeric_modifiers
            .iter()
            .filter(|d| d.resource == Resource::Unrest)
            .collect();
        assert_eq!(unrest.len(), 1);
        assert_eq!(unrest[0].value, 3);
    }

    #[test]
    fn unrest_fame_imprisoned_never_shortfall() {
        let outcome = Outcome::new("x")
            .with_modifier(Modifier::static_amount(Resource::Fame, -2))
            .with_modifier(Modifier::static_amount(Resource::ImprisonedUnrest, -4));
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[]);

        let data = build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::Failure,
            &empty_dice,
            &empty_choices,
            &empty_interactions,
            &current,
        ))
        .expect("builds");
        assert!(!data
            .numeric_modifiers
            .iter()
            .any(|d| d.resource == Resource::Unrest));
    }

    #[test]
    fn choice_contributes_only_selected_resource() {
        let outcome = Outcome::new("x")
            .with_modifier(Modifier::choice(vec![Resource::Gold, Resource::Fame], 3));
        let empty_dice = BTreeMap::new();
        let chosen: BTreeMap<usize, Resource> = [(0, Resource::Fame)].into_iter().collect();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[]);

        let data = build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::Success,
            &empty_dice,
            &chosen,
            &empty_interactions,
            &current,
        ))
        .expect("builds");

        assert!(data
            .numeric_modifiers
            .contains(&ResourceDelta::new(Resource::Fame, 3)));
        assert!(!data
            .numeric_modifiers
            .iter()
            .any(|d| d.resource == Resource::Gold));
    }

    #[test]
    fn unmade_choice_is_an_error() {
        let outcome =
            Outcome::new("x").with_modifier(Modifier::choice(vec![Resource::Gold], 3));
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[]);

        assert!(build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::Success,
            &empty_dice,
            &empty_choices,
            &empty_interactions,
            &current,
        ))
        .is_err());
    }

    #[test]
    fn dice_use_cached_roll_and_never_reroll() {
        let outcome = Outcome::new("x").with_modifier(Modifier::dice(
            Resource::Lumber,
            DiceFormula::parse("2d6").expect("valid formula"),
            true,
        ));
        let rolled: BTreeMap<usize, i32> = [(0, 7)].into_iter().collect();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[(Resource::Lumber, 10)]);

        // Same context, same contribution, across repeated builds.
        for _ in 0..3 {
            let data = build_resolution(&input_for(
                &outcome,
                DegreeOfSuccess::Failure,
                &rolled,
                &empty_choices,
                &empty_interactions,
                &current,
            ))
            .expect("builds");
            assert_eq!(
                data.numeric_modifiers,
                vec![ResourceDelta::new(Resource::Lumber, -7)]
            );
        }
    }

    #[test]
    fn unrolled_dice_are_an_error() {
        let outcome = Outcome::new("x").with_modifier(Modifier::dice(
            Resource::Lumber,
            DiceFormula::parse("1d4").expect("valid formula"),
            false,
        ));
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[]);

        assert!(build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::Success,
            &empty_dice,
            &empty_choices,
            &empty_interactions,
            &current,
        ))
        .is_err());
    }

    #[test]
    fn badge_resolved_dice_produce_single_entry() {
        // The rolled value is the single source; the raw formula must not
        // contribute a second entry for the same resource.
        let outcome = Outcome::new("x").with_modifier(Modifier::dice(
            Resource::Gold,
            DiceFormula::parse("1d4").expect("valid formula"),
            false,
        ));
        let rolled: BTreeMap<usize, i32> = [(0, 3)].into_iter().collect();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[]);

        let data = build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::Success,
            &rolled,
            &empty_choices,
            &empty_interactions,
            &current,
        ))
        .expect("builds");

        let gold: Vec<_> = data
            .numeric_modifiers
            .iter()
            .filter(|d| d.resource == Resource::Gold)
            .collect();
        assert_eq!(gold.len(), 1);
        assert_eq!(gold[0].value, 3);
    }

    #[test]
    fn critical_success_grants_implicit_fame() {
        let outcome = Outcome::new("x").with_modifier(Modifier::static_amount(Resource::Gold, 2));
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[]);

        let data = build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::CriticalSuccess,
            &empty_dice,
            &empty_choices,
            &empty_interactions,
            &current,
        ))
        .expect("builds");
        assert!(data
            .numeric_modifiers
            .contains(&ResourceDelta::new(Resource::Fame, 1)));
    }

    #[test]
    fn declared_fame_bonus_suppresses_implicit_grant() {
        let outcome = Outcome::new("x").with_modifier(Modifier::static_amount(Resource::Fame, 1));
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[]);

        let data = build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::CriticalSuccess,
            &empty_dice,
            &empty_choices,
            &empty_interactions,
            &current,
        ))
        .expect("builds");

        let fame: Vec<_> = data
            .numeric_modifiers
            .iter()
            .filter(|d| d.resource == Resource::Fame)
            .collect();
        assert_eq!(fame.len(), 1);
        assert_eq!(fame[0].value, 1);
    }

    #[test]
    fn cost_is_deducted_and_can_shortfall() {
        let outcome = Outcome::new("x");
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let empty_interactions = BTreeMap::new();
        let current = stocks(&[(Resource::Lumber, 1)]);

        let input = ResolutionInput {
            check_id: "test-check",
            outcome: &outcome,
            degree: DegreeOfSuccess::Success,
            resolved_dice: &empty_dice,
            chosen_resources: &empty_choices,
            interaction_resolutions: &empty_interactions,
            cost: &[ResourceDelta::new(Resource::Lumber, 2)],
            current_stocks: &current,
        };
        let data = build_resolution(&input).expect("builds");
        assert!(data
            .numeric_modifiers
            .contains(&ResourceDelta::new(Resource::Lumber, -2)));
        assert!(data
            .numeric_modifiers
            .contains(&ResourceDelta::new(Resource::Unrest, 1)));
    }

    #[test]
    fn interaction_modifiers_and_metadata_are_collected() {
        let outcome = Outcome::new("x");
        let empty_dice = BTreeMap::new();
        let empty_choices = BTreeMap::new();
        let interactions: BTreeMap<String, InteractionResolution> = [(
            "pick-army".to_string(),
            InteractionResolution::resolved()
                .with_metadata(serde_json::json!({"armyName": "First Levy"}))
                .with_modifier(ResourceDelta::new(Resource::Gold, -1)),
        )]
        .into_iter()
        .collect();
        let current = stocks(&[(Resource::Gold, 5)]);

        let data = build_resolution(&input_for(
            &outcome,
            DegreeOfSuccess::Success,
            &empty_dice,
            &empty_choices,
            &interactions,
            &current,
        ))
        .expect("builds");

        assert!(data
            .numeric_modifiers
            .contains(&ResourceDelta::new(Resource::Gold, -1)));
        assert_eq!(
            data.custom_component_data["pick-army"]["armyName"],
            "First Levy"
        );
    }
}
