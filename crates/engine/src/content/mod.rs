//! Built-in check content.
//!
//! Each entry is a fallible builder so one malformed definition cannot take
//! the rest down at registration time. Content stays declarative: resource
//! changes are modifiers, structural changes are game commands, and only
//! genuinely custom behavior (worksite creation) uses an execute hook.

use regent_domain::{
    CheckOutcomes, DegreeOfSuccess, DiceFormula, DomainError, GameCommand, Modifier, Outcome,
    Resource, ResourceDelta, StructureCategory, StructureTarget, Worksite, WorksiteKind,
};

use crate::check::pipeline::{
    CheckPipeline, CheckType, InteractionSpec, SkillOption, StrategicChoice,
};
use crate::check::registry::PipelineSource;

/// The full built-in catalog, in registration order.
pub fn pipeline_sources() -> Vec<PipelineSource> {
    vec![
        PipelineSource { id: "collect-taxes", build: collect_taxes },
        PipelineSource { id: "harvest-crops", build: harvest_crops },
        PipelineSource { id: "build-roads", build: build_roads },
        PipelineSource { id: "deal-with-unrest", build: deal_with_unrest },
        PipelineSource { id: "establish-worksite", build: establish_worksite },
        PipelineSource { id: "bandit-activity", build: bandit_activity },
        PipelineSource { id: "bumper-harvest", build: bumper_harvest },
        PipelineSource { id: "petty-crime", build: petty_crime },
        PipelineSource { id: "public-protest", build: public_protest },
        PipelineSource { id: "riot", build: riot },
    ]
}

// =============================================================================
// Actions
// =============================================================================

fn collect_taxes() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "collect-taxes",
        "Collect Taxes",
        CheckType::Action,
        CheckOutcomes {
            critical_success: Some(
                Outcome::new("The coffers overflow; gain {gold}.")
                    .with_modifier(Modifier::dice(
                        Resource::Gold,
                        DiceFormula::parse("1d4+2")?,
                        false,
                    )),
            ),
            success: Outcome::new("Taxes come in as expected; gain {gold}.")
                .with_modifier(Modifier::static_amount(Resource::Gold, 2)),
            failure: Outcome::new("Collection stalls and tempers flare; gain {unrest}.")
                .with_modifier(Modifier::static_amount(Resource::Unrest, 1)),
            critical_failure: Some(
                Outcome::new("Tax collectors are driven out of town; gain {unrest}.")
                    .with_modifier(Modifier::static_amount(Resource::Unrest, 2)),
            ),
        },
    )
    .with_description("Levy taxes from your settlements.")
    .with_skill(SkillOption::new("Politics", "Decree and enforce the levy"))
    .with_skill(SkillOption::new("Intrigue", "Squeeze the merchant guilds")))
}

fn harvest_crops() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "harvest-crops",
        "Harvest Crops",
        CheckType::Action,
        CheckOutcomes {
            critical_success: None,
            success: Outcome::new("A good harvest; gain {food}.").with_modifier(Modifier::dice(
                Resource::Food,
                DiceFormula::parse("1d4")?,
                false,
            )),
            failure: Outcome::new("The yield disappoints; nothing is gained."),
            critical_failure: Some(
                Outcome::new("Blight ruins the stores; lose {food}.").with_modifier(
                    Modifier::dice(Resource::Food, DiceFormula::parse("1d4")?, true),
                ),
            ),
        },
    )
    .with_description("Bring in the season's crops.")
    .with_skill(SkillOption::new("Agriculture", "Organize the harvest")))
}

fn build_roads() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "build-roads",
        "Build Roads",
        CheckType::Action,
        CheckOutcomes {
            critical_success: None,
            success: Outcome::new("The road is laid.")
                .with_manual_effect("Mark the new road hexes on the map."),
            failure: Outcome::new("Work bogs down; the materials are spent for nothing."),
            critical_failure: Some(
                Outcome::new("A work crew walks off the job; gain {unrest}.")
                    .with_modifier(Modifier::static_amount(Resource::Unrest, 1)),
            ),
        },
    )
    .with_description("Connect your settlements with roads.")
    .with_cost(ResourceDelta::new(Resource::Lumber, 1))
    .with_cost(ResourceDelta::new(Resource::Stone, 1))
    .with_skill(SkillOption::new("Engineering", "Survey and build")))
}

fn deal_with_unrest() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "deal-with-unrest",
        "Deal with Unrest",
        CheckType::Action,
        CheckOutcomes {
            critical_success: Some(
                Outcome::new("Calm is restored across the realm.").with_modifier(
                    Modifier::choice(vec![Resource::Unrest, Resource::ImprisonedUnrest], -3),
                ),
            ),
            success: Outcome::new("Tensions ease; lose {unrest}.")
                .with_modifier(Modifier::static_amount(Resource::Unrest, -2)),
            failure: Outcome::new("The grievances remain."),
            critical_failure: Some(
                Outcome::new("The gesture backfires; gain {unrest}.")
                    .with_modifier(Modifier::static_amount(Resource::Unrest, 1)),
            ),
        },
    )
    .with_description("Address the population's grievances.")
    .with_skill(SkillOption::new("Politics", "Hold court and hear petitions"))
    .with_skill(SkillOption::new("Magic", "Soothe the crowds")))
}

fn establish_worksite() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "establish-worksite",
        "Establish Worksite",
        CheckType::Action,
        CheckOutcomes {
            critical_success: None,
            success: Outcome::new("The worksite is up and running."),
            failure: Outcome::new("The site proves unworkable; the lumber is wasted."),
            critical_failure: Some(
                Outcome::new("An accident sours the workers; gain {unrest}.")
                    .with_modifier(Modifier::static_amount(Resource::Unrest, 1)),
            ),
        },
    )
    .with_description("Found a farm, lumber camp, quarry, or mine in a claimed hex.")
    .with_tier(2)
    .with_cost(ResourceDelta::new(Resource::Lumber, 2))
    .with_skill(SkillOption::new("Agriculture", "Stake out a farm"))
    .with_skill(SkillOption::new("Engineering", "Site a camp, quarry, or mine"))
    .with_pre_roll_interaction(InteractionSpec::new(
        "worksite-site",
        "Choose the worksite and hex",
        "worksiteSitePicker",
    ))
    .with_execute(
        |context: &crate::check::context::CheckContext,
         kingdom: &mut regent_domain::Kingdom|
         -> Result<(), DomainError> {
            if !matches!(
                context.degree,
                Some(DegreeOfSuccess::CriticalSuccess | DegreeOfSuccess::Success)
            ) {
                return Ok(());
            }
            let kind = match context.metadata_str("worksiteKind") {
                Some("farm") => WorksiteKind::Farm,
                Some("lumberCamp") => WorksiteKind::LumberCamp,
                Some("quarry") => WorksiteKind::Quarry,
                Some("mine") => WorksiteKind::Mine,
                other => {
                    return Err(DomainError::validation(format!(
                        "unknown worksite kind: {other:?}"
                    )))
                }
            };
            let hex = context
                .metadata_str("hex")
                .ok_or_else(|| DomainError::validation("no hex selected for worksite"))?;
            kingdom.worksites.push(Worksite::new(kind, hex));
            Ok(())
        },
    ))
}

// =============================================================================
// Events
// =============================================================================

fn bandit_activity() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "bandit-activity",
        "Bandit Activity",
        CheckType::Event,
        CheckOutcomes {
            critical_success: Some(
                Outcome::new("The bandits are routed and their loot recovered; gain {gold}.")
                    .with_modifier(Modifier::dice(
                        Resource::Gold,
                        DiceFormula::parse("1d4")?,
                        false,
                    ))
                    .with_ends_event(true),
            ),
            success: Outcome::new("The bandits are driven off.").with_ends_event(true),
            failure: Outcome::new("Raids continue along the roads; lose {gold}.")
                .with_modifier(Modifier::dice(
                    Resource::Gold,
                    DiceFormula::parse("1d4")?,
                    true,
                ))
                .with_ends_event(false),
            critical_failure: Some(
                Outcome::new("A worksite is overrun and burned; lose {gold}.")
                    .with_modifier(Modifier::dice(
                        Resource::Gold,
                        DiceFormula::parse("2d4")?,
                        true,
                    ))
                    .with_game_command(GameCommand::DestroyWorksite { worksite_id: None })
                    .with_ends_event(false),
            ),
        },
    )
    .with_description("Bandits prey on travelers and outlying worksites.")
    .with_skill(SkillOption::new("Warfare", "Hunt the bandits down"))
    .with_skill(SkillOption::new("Intrigue", "Infiltrate their camp"))
    .with_strategic_choice(StrategicChoice {
        id: "force".into(),
        label: "Meet them with force".into(),
        skills: vec!["Warfare".into()],
    })
    .with_strategic_choice(StrategicChoice {
        id: "infiltrate".into(),
        label: "Work from the inside".into(),
        skills: vec!["Intrigue".into()],
    }))
}

fn bumper_harvest() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "bumper-harvest",
        "Bumper Harvest",
        CheckType::Event,
        CheckOutcomes {
            critical_success: Some(
                Outcome::new("The granaries overflow; gain {food}.")
                    .with_modifier(Modifier::static_amount(Resource::Food, 3)),
            ),
            success: Outcome::new("An unexpected surplus; gain {food}.").with_modifier(
                Modifier::dice(Resource::Food, DiceFormula::parse("1d4")?, false),
            ),
            failure: Outcome::new("The surplus spoils before it can be stored."),
            critical_failure: None,
        },
    )
    .with_description("A season of uncommon plenty.")
    .with_skill(SkillOption::new("Agriculture", "Bring the surplus in")))
}

// =============================================================================
// Incidents
// =============================================================================

fn petty_crime() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "petty-crime",
        "Petty Crime",
        CheckType::Incident,
        CheckOutcomes {
            critical_success: None,
            success: Outcome::new("The culprits are caught quickly."),
            failure: Outcome::new("Pickpockets work the markets; lose {gold}.")
                .with_modifier(Modifier::static_amount(Resource::Gold, -1)),
            critical_failure: Some(
                Outcome::new("A burglary ring empties a vault; lose {gold} and gain {unrest}.")
                    .with_modifier(Modifier::dice(
                        Resource::Gold,
                        DiceFormula::parse("1d4")?,
                        true,
                    ))
                    .with_modifier(Modifier::static_amount(Resource::Unrest, 1)),
            ),
        },
    )
    .with_description("Theft and vandalism in the settlements.")
    .with_category("minor")
    .with_skill(SkillOption::new("Intrigue", "Root out the thieves"))
    .with_skill(SkillOption::new("Politics", "Lean on the watch")))
}

fn public_protest() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "public-protest",
        "Public Protest",
        CheckType::Incident,
        CheckOutcomes {
            critical_success: None,
            success: Outcome::new("The crowd disperses peacefully."),
            failure: Outcome::new("The protest shuts down commerce; lose {gold}.")
                .with_modifier(Modifier::dice(
                    Resource::Gold,
                    DiceFormula::parse("1d4")?,
                    true,
                ))
                .with_modifier(Modifier::static_amount(Resource::Unrest, 1)),
            critical_failure: Some(
                Outcome::new("The protest turns destructive; lose {gold}.")
                    .with_modifier(Modifier::dice(
                        Resource::Gold,
                        DiceFormula::parse("1d4")?,
                        true,
                    ))
                    .with_modifier(Modifier::static_amount(Resource::Unrest, 1))
                    .with_game_command(GameCommand::DamageStructure {
                        target: StructureTarget::HighestCapacity {
                            category: StructureCategory::Commerce,
                        },
                    }),
            ),
        },
    )
    .with_description("Crowds gather to air their grievances.")
    .with_category("moderate")
    .with_skill(SkillOption::new("Politics", "Address the crowd"))
    .with_skill(SkillOption::new("Warfare", "Disperse them")))
}

fn riot() -> Result<CheckPipeline, DomainError> {
    Ok(CheckPipeline::new(
        "riot",
        "Riot",
        CheckType::Incident,
        CheckOutcomes {
            critical_success: None,
            success: Outcome::new("Order is restored before the mob forms."),
            failure: Outcome::new("The mob torches a building; lose {gold}.")
                .with_modifier(Modifier::dice(
                    Resource::Gold,
                    DiceFormula::parse("2d4")?,
                    true,
                ))
                .with_game_command(GameCommand::DamageStructure {
                    target: StructureTarget::HighestCapacity {
                        category: StructureCategory::Commerce,
                    },
                }),
            critical_failure: Some(
                Outcome::new("The riot levels a district; lose {gold} and gain {unrest}.")
                    .with_modifier(Modifier::dice(
                        Resource::Gold,
                        DiceFormula::parse("2d4")?,
                        true,
                    ))
                    .with_modifier(Modifier::static_amount(Resource::Unrest, 2))
                    .with_game_command(GameCommand::DestroyStructure {
                        target: StructureTarget::HighestCapacity {
                            category: StructureCategory::Commerce,
                        },
                    }),
            ),
        },
    )
    .with_description("Unrest boils over into open violence.")
    .with_category("major")
    .with_skill(SkillOption::new("Warfare", "Put the riot down"))
    .with_skill(SkillOption::new("Politics", "Negotiate with the ringleaders")))
}
