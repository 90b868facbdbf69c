//! The actions phase: player-chosen kingdom activities.
//!
//! Unlike events and incidents, nothing here is random: the controller lists
//! the actions whose requirements the kingdom currently meets, and each
//! performed action spends one of the acting player's kingdom actions.

use std::sync::Arc;

use regent_domain::{KingdomId, UserId};

use crate::check::context::CheckContext;
use crate::check::coordinator::{CheckCoordinator, CheckError, ExecuteOptions};
use crate::check::pipeline::{CheckPipeline, CheckType};
use crate::check::registry::PipelineRegistry;
use crate::ports::{KingdomRepo, NotificationPort};

pub struct ActionPhaseController {
    registry: Arc<PipelineRegistry>,
    kingdoms: Arc<dyn KingdomRepo>,
    coordinator: Arc<CheckCoordinator>,
    notifications: Arc<dyn NotificationPort>,
    kingdom_id: KingdomId,
}

impl ActionPhaseController {
    pub fn new(
        registry: Arc<PipelineRegistry>,
        kingdoms: Arc<dyn KingdomRepo>,
        coordinator: Arc<CheckCoordinator>,
        notifications: Arc<dyn NotificationPort>,
        kingdom_id: KingdomId,
    ) -> Self {
        Self {
            registry,
            kingdoms,
            coordinator,
            notifications,
            kingdom_id,
        }
    }

    /// Actions the kingdom currently qualifies for, in stable id order.
    pub async fn available_actions(&self) -> Result<Vec<Arc<CheckPipeline>>, CheckError> {
        let kingdom = self.kingdoms.get(self.kingdom_id).await?;
        Ok(self
            .registry
            .pipelines_by_type(CheckType::Action)
            .into_iter()
            .filter(|p| p.requirements_met(&kingdom))
            .collect())
    }

    /// Perform one kingdom action for a player, spending one of their
    /// actions on completion. A cancelled check spends nothing.
    pub async fn perform_action(
        &self,
        check_id: &str,
        user_id: UserId,
    ) -> Result<CheckContext, CheckError> {
        let kingdom = self.kingdoms.get(self.kingdom_id).await?;
        let tracked = kingdom
            .turn_state
            .player_actions
            .iter()
            .find(|a| a.user_id == user_id);
        if let Some(actions) = tracked {
            if actions.remaining() == 0 {
                self.notifications
                    .warn("No kingdom actions remaining this turn.");
                return Err(CheckError::NoActionsRemaining);
            }
        }

        let options = ExecuteOptions::new(CheckType::Action).with_user(user_id);
        let context = self.coordinator.execute_pipeline(check_id, options).await?;

        // The action completed and applied; spend only now so a cancel or a
        // failed requirement costs nothing.
        self.kingdoms
            .update(
                self.kingdom_id,
                Box::new(move |k| {
                    if !k.turn_state.spend_player_action(user_id) {
                        tracing::debug!(%user_id, "player actions not tracked; nothing spent");
                    }
                }),
            )
            .await?;
        Ok(context)
    }
}
