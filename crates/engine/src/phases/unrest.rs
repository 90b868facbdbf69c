//! The unrest phase: incident selection by unrest severity tier.

use std::sync::Arc;

use regent_domain::{KingdomId, Resource, UnrestTier};

use crate::check::context::CheckContext;
use crate::check::coordinator::{CheckCoordinator, CheckError, ExecuteOptions};
use crate::check::pipeline::CheckType;
use crate::check::registry::PipelineRegistry;
use crate::ports::{KingdomRepo, NotificationPort, RandomPort};

/// What the unrest phase did this turn.
#[derive(Debug)]
pub enum UnrestPhaseOutcome {
    /// An ongoing incident from a previous turn was re-run.
    Resumed(CheckContext),
    /// A new incident was selected and ran.
    Incident(CheckContext),
    /// Unrest is low enough that no incident triggers.
    Calm,
    /// An incident was due but could not run (no content, cancelled).
    Skipped(String),
}

/// The incident category an unrest tier selects from.
pub fn incident_category(tier: UnrestTier) -> Option<&'static str> {
    match tier {
        UnrestTier::None => None,
        UnrestTier::Minor => Some("minor"),
        UnrestTier::Moderate => Some("moderate"),
        UnrestTier::Major => Some("major"),
    }
}

pub struct UnrestPhaseController {
    registry: Arc<PipelineRegistry>,
    kingdoms: Arc<dyn KingdomRepo>,
    coordinator: Arc<CheckCoordinator>,
    random: Arc<dyn RandomPort>,
    notifications: Arc<dyn NotificationPort>,
    kingdom_id: KingdomId,
}

impl UnrestPhaseController {
    pub fn new(
        registry: Arc<PipelineRegistry>,
        kingdoms: Arc<dyn KingdomRepo>,
        coordinator: Arc<CheckCoordinator>,
        random: Arc<dyn RandomPort>,
        notifications: Arc<dyn NotificationPort>,
        kingdom_id: KingdomId,
    ) -> Self {
        Self {
            registry,
            kingdoms,
            coordinator,
            random,
            notifications,
            kingdom_id,
        }
    }

    /// Run the unrest phase for the current turn.
    pub async fn run_phase(&self) -> Result<UnrestPhaseOutcome, CheckError> {
        let kingdom = self.kingdoms.get(self.kingdom_id).await?;

        let ongoing = kingdom.turn_state.unrest_phase.clone();
        if ongoing.check_triggered {
            if let Some(check_id) = ongoing.check_id {
                return self.resume_ongoing(&check_id, ongoing.metadata).await;
            }
        }

        let unrest = kingdom.resource(Resource::Unrest);
        let tier = UnrestTier::for_unrest(unrest);
        let Some(category) = incident_category(tier) else {
            tracing::debug!(unrest, "unrest below incident threshold");
            return Ok(UnrestPhaseOutcome::Calm);
        };

        let candidates: Vec<_> = self
            .registry
            .pipelines_by_category(category)
            .into_iter()
            .filter(|p| p.check_type == CheckType::Incident)
            .collect();
        if candidates.is_empty() {
            tracing::warn!(category, "no incident pipelines registered for category");
            return Ok(UnrestPhaseOutcome::Skipped(format!(
                "no {category} incident content"
            )));
        }
        let index = self.random.gen_range(0, (candidates.len() - 1) as i32);
        let pipeline = &candidates[index as usize];
        tracing::info!(unrest, category, incident = %pipeline.id, "unrest incident triggered");

        match self
            .coordinator
            .execute_pipeline(&pipeline.id, ExecuteOptions::new(CheckType::Incident))
            .await
        {
            Ok(context) => Ok(UnrestPhaseOutcome::Incident(context)),
            Err(CheckError::Cancelled) => {
                Ok(UnrestPhaseOutcome::Skipped(format!("{} cancelled", pipeline.id)))
            }
            Err(CheckError::RequirementsNotMet(id)) => {
                Ok(UnrestPhaseOutcome::Skipped(format!("{id} gated by requirements")))
            }
            Err(error) => Err(error),
        }
    }

    async fn resume_ongoing(
        &self,
        check_id: &str,
        metadata: serde_json::Value,
    ) -> Result<UnrestPhaseOutcome, CheckError> {
        if self.registry.get_pipeline(check_id).is_none() {
            self.notifications.warn(&format!(
                "Ongoing incident '{check_id}' no longer exists and was discarded."
            ));
            self.kingdoms
                .update(
                    self.kingdom_id,
                    Box::new(|k| k.turn_state.unrest_phase.clear()),
                )
                .await?;
            return Ok(UnrestPhaseOutcome::Skipped(format!("{check_id} missing")));
        }

        tracing::info!(check_id, "resuming ongoing incident");
        let options = ExecuteOptions::new(CheckType::Incident).with_metadata(metadata);
        match self.coordinator.execute_pipeline(check_id, options).await {
            Ok(context) => Ok(UnrestPhaseOutcome::Resumed(context)),
            Err(CheckError::Cancelled) => {
                Ok(UnrestPhaseOutcome::Skipped(format!("{check_id} cancelled")))
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regent_domain::DegreeOfSuccess;

    use crate::test_support::{
        sample_kingdom, scripted_coordinator, MemoryKingdomRepo, RecordingNotifications,
        ScriptedDice, ScriptedInteractions, ScriptedRandom, ScriptedSkillRolls,
    };

    fn controller(
        kingdoms: Arc<MemoryKingdomRepo>,
        degrees: Vec<DegreeOfSuccess>,
    ) -> UnrestPhaseController {
        let kingdom_id = kingdoms.kingdom().id;
        let registry = Arc::new(PipelineRegistry::with_builtin_content());
        let coordinator = scripted_coordinator(
            registry.clone(),
            kingdoms.clone(),
            Arc::new(ScriptedSkillRolls::new(degrees)),
            Arc::new(ScriptedDice::new(vec![2, 2, 2, 2])),
            Arc::new(ScriptedInteractions::default()),
        );
        UnrestPhaseController::new(
            registry,
            kingdoms,
            coordinator,
            Arc::new(ScriptedRandom::new(vec![0])),
            Arc::new(RecordingNotifications::default()),
            kingdom_id,
        )
    }

    #[test]
    fn tiers_map_to_categories() {
        assert_eq!(incident_category(UnrestTier::None), None);
        assert_eq!(incident_category(UnrestTier::Minor), Some("minor"));
        assert_eq!(incident_category(UnrestTier::Moderate), Some("moderate"));
        assert_eq!(incident_category(UnrestTier::Major), Some("major"));
    }

    #[tokio::test]
    async fn low_unrest_triggers_nothing() {
        let mut kingdom = sample_kingdom();
        kingdom.set_resource(Resource::Unrest, 2);
        let kingdoms = Arc::new(MemoryKingdomRepo::new(kingdom));
        let controller = controller(kingdoms, vec![]);

        let outcome = controller.run_phase().await.expect("phase runs");
        assert!(matches!(outcome, UnrestPhaseOutcome::Calm));
    }

    #[tokio::test]
    async fn minor_unrest_selects_a_minor_incident() {
        let mut kingdom = sample_kingdom();
        kingdom.set_resource(Resource::Unrest, 4);
        let kingdoms = Arc::new(MemoryKingdomRepo::new(kingdom));
        let controller = controller(kingdoms, vec![DegreeOfSuccess::Success]);

        let outcome = controller.run_phase().await.expect("phase runs");
        match outcome {
            UnrestPhaseOutcome::Incident(context) => {
                assert_eq!(context.check_type, CheckType::Incident);
            }
            other => panic!("expected incident, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ongoing_incident_resumes_even_when_unrest_dropped() {
        let mut kingdom = sample_kingdom();
        kingdom.set_resource(Resource::Unrest, 0);
        kingdom
            .turn_state
            .unrest_phase
            .set_ongoing("petty-crime", serde_json::Value::Null);
        let kingdoms = Arc::new(MemoryKingdomRepo::new(kingdom));
        let controller = controller(kingdoms, vec![DegreeOfSuccess::Success]);

        let outcome = controller.run_phase().await.expect("phase runs");
        match outcome {
            UnrestPhaseOutcome::Resumed(context) => {
                assert_eq!(context.check_id, "petty-crime");
            }
            other => panic!("expected resumed, got {other:?}"),
        }
    }
}
