//! The events phase: ongoing-event resume and the decaying event trigger DC.

use std::sync::Arc;

use regent_domain::KingdomId;

use crate::check::context::CheckContext;
use crate::check::coordinator::{CheckCoordinator, CheckError, ExecuteOptions};
use crate::check::pipeline::CheckType;
use crate::check::registry::PipelineRegistry;
use crate::ports::{KingdomRepo, NotificationPort, RandomPort};

/// Starting flat DC for the event trigger roll.
pub const DEFAULT_EVENT_DC: i32 = 16;
/// The DC drops by this much each uneventful turn.
pub const EVENT_DC_STEP: i32 = 5;
/// The DC never decays below this floor.
pub const MIN_EVENT_DC: i32 = 6;

/// What the events phase did this turn.
#[derive(Debug)]
pub enum EventPhaseOutcome {
    /// An ongoing event from a previous turn was re-run.
    Resumed(CheckContext),
    /// The trigger roll met the DC and a new event ran.
    Triggered(CheckContext),
    /// No event; the trigger DC decayed for next turn.
    Uneventful { next_dc: i32 },
    /// An event was due but could not run (no content, cancelled, gated).
    Skipped(String),
}

pub struct EventPhaseController {
    registry: Arc<PipelineRegistry>,
    kingdoms: Arc<dyn KingdomRepo>,
    coordinator: Arc<CheckCoordinator>,
    random: Arc<dyn RandomPort>,
    notifications: Arc<dyn NotificationPort>,
    kingdom_id: KingdomId,
}

impl EventPhaseController {
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

    /// Run the events phase for the current turn.
    pub async fn run_phase(&self) -> Result<EventPhaseOutcome, CheckError> {
        let kingdom = self.kingdoms.get(self.kingdom_id).await?;

        // An unresolved event from a previous turn takes precedence over a
        // fresh trigger roll.
        let ongoing = kingdom.turn_state.event_phase.clone();
        if ongoing.check_triggered {
            if let Some(check_id) = ongoing.check_id {
                return self.resume_ongoing(&check_id, ongoing.metadata).await;
            }
        }

        let dc = kingdom.turn_state.event_dc.unwrap_or(DEFAULT_EVENT_DC);
        let roll = self.random.gen_range(1, 20);
        if roll < dc {
            let next_dc = (dc - EVENT_DC_STEP).max(MIN_EVENT_DC);
            self.kingdoms
                .update(
                    self.kingdom_id,
                    Box::new(move |k| k.turn_state.event_dc = Some(next_dc)),
                )
                .await?;
            tracing::info!(roll, dc, next_dc, "no kingdom event this turn");
            return Ok(EventPhaseOutcome::Uneventful { next_dc });
        }

        // Triggered: the DC resets even if the event is later abandoned.
        tracing::info!(roll, dc, "kingdom event triggered");
        self.kingdoms
            .update(
                self.kingdom_id,
                Box::new(|k| k.turn_state.event_dc = Some(DEFAULT_EVENT_DC)),
            )
            .await?;

        let candidates = self.registry.pipelines_by_type(CheckType::Event);
        if candidates.is_empty() {
            tracing::warn!("event triggered but no event pipelines are registered");
            return Ok(EventPhaseOutcome::Skipped("no event content".into()));
        }
        let index = self.random.gen_range(0, (candidates.len() - 1) as i32);
        let pipeline = &candidates[index as usize];

        match self
            .coordinator
            .execute_pipeline(&pipeline.id, ExecuteOptions::new(CheckType::Event))
            .await
        {
            Ok(context) => Ok(EventPhaseOutcome::Triggered(context)),
            Err(CheckError::Cancelled) => {
                Ok(EventPhaseOutcome::Skipped(format!("{} cancelled", pipeline.id)))
            }
            Err(CheckError::RequirementsNotMet(id)) => {
                Ok(EventPhaseOutcome::Skipped(format!("{id} gated by requirements")))
            }
            Err(error) => Err(error),
        }
    }

    async fn resume_ongoing(
        &self,
        check_id: &str,
        metadata: serde_json::Value,
    ) -> Result<EventPhaseOutcome, CheckError> {
        if self.registry.get_pipeline(check_id).is_none() {
            // Content removed since the record was written; drop the record
            // rather than wedging the phase forever.
            self.notifications.warn(&format!(
                "Ongoing event '{check_id}' no longer exists and was discarded."
            ));
            self.kingdoms
                .update(
                    self.kingdom_id,
                    Box::new(|k| k.turn_state.event_phase.clear()),
                )
                .await?;
            return Ok(EventPhaseOutcome::Skipped(format!("{check_id} missing")));
        }

        tracing::info!(check_id, "resuming ongoing event");
        let options = ExecuteOptions::new(CheckType::Event).with_metadata(metadata);
        match self.coordinator.execute_pipeline(check_id, options).await {
            Ok(context) => Ok(EventPhaseOutcome::Resumed(context)),
            // Abandoned this turn; the ongoing record stays for the next one.
            Err(CheckError::Cancelled) => {
                Ok(EventPhaseOutcome::Skipped(format!("{check_id} cancelled")))
            }
            Err(error) => Err(error),
        }
    }
}
