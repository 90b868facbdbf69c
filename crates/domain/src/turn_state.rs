//! Per-turn state persisted on the kingdom document.
//!
//! Each check category that supports ongoing checks (events, incidents) gets
//! one `PhaseCheckState` record; the owning phase controller reads it at the
//! start of its phase to decide whether to resume an ongoing check or select
//! a new one.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Persisted ongoing-check record for one check category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseCheckState {
    /// Whether a check was triggered and is still unresolved.
    pub check_triggered: bool,
    /// The pipeline id to resume, when triggered.
    pub check_id: Option<String>,
    /// Free-form carry-over (chosen approach, hook scratch data).
    pub metadata: serde_json::Value,
}

impl Default for PhaseCheckState {
    fn default() -> Self {
        Self {
            check_triggered: false,
            check_id: None,
            metadata: serde_json::Value::Null,
        }
    }
}

impl PhaseCheckState {
    /// Record an ongoing check to resume next turn.
    pub fn set_ongoing(&mut self, check_id: impl Into<String>, metadata: serde_json::Value) {
        self.check_triggered = true;
        self.check_id = Some(check_id.into());
        self.metadata = metadata;
    }

    /// Clear the record once the check has ended.
    pub fn clear(&mut self) {
        self.check_triggered = false;
        self.check_id = None;
        self.metadata = serde_json::Value::Null;
    }
}

/// Remaining kingdom actions for one player this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerActions {
    pub user_id: UserId,
    pub spent: u8,
    pub total: u8,
}

impl PlayerActions {
    pub fn remaining(&self) -> u8 {
        self.total.saturating_sub(self.spent)
    }
}

/// Unrest severity tier, driving incident selection in the unrest phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnrestTier {
    None,
    Minor,
    Moderate,
    Major,
}

impl UnrestTier {
    /// Classify a current unrest stock.
    pub fn for_unrest(unrest: i32) -> Self {
        match unrest {
            i32::MIN..=2 => Self::None,
            3..=5 => Self::Minor,
            6..=8 => Self::Moderate,
            _ => Self::Major,
        }
    }
}

/// The whole per-turn slice of the kingdom document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnState {
    pub event_phase: PhaseCheckState,
    pub unrest_phase: PhaseCheckState,
    /// Flat event-trigger DC; drops each uneventful turn and resets on trigger.
    #[serde(default)]
    pub event_dc: Option<i32>,
    #[serde(default)]
    pub player_actions: Vec<PlayerActions>,
}

impl TurnState {
    /// Spend one action for a player. Returns false when none remain.
    pub fn spend_player_action(&mut self, user_id: UserId) -> bool {
        match self.player_actions.iter_mut().find(|p| p.user_id == user_id) {
            Some(actions) if actions.remaining() > 0 => {
                actions.spent += 1;
                true
            }
            _ => false,
        }
    }
}
