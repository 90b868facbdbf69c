//! Port traits for the host runtime boundary.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete
//! types. Ports exist for:
//! - Kingdom document persistence (the host owns the actor/document store)
//! - Skill-check and dice primitives (the host owns the roll dialogs)
//! - UI interactions (badges, choices, custom components, Apply confirmation)
//! - Random/notifications (for testing and user-facing warnings)

use async_trait::async_trait;

use regent_domain::{DegreeOfSuccess, DiceFormula, InstanceId, Kingdom, KingdomId, UserId};

use crate::check::context::{CheckContext, InteractionResolution, OutcomePreview};
use crate::check::pipeline::InteractionSpec;

// =============================================================================
// Error Types
// =============================================================================

/// Failure from a host runtime call.
///
/// These are the genuinely unexpected failures (I/O, closed dialog channels);
/// expected negative results (requirements unmet, no eligible target) are
/// modeled as data, never as errors.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Kingdom document not found: {0}")]
    KingdomNotFound(KingdomId),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Roll primitive failed: {0}")]
    Roll(String),
    #[error("Interaction channel closed: {0}")]
    Interaction(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// Persistence Port
// =============================================================================

/// Mutator applied to a kingdom snapshot inside an atomic update.
pub type KingdomMutator = Box<dyn FnOnce(&mut Kingdom) + Send>;

/// Access to the host's kingdom document, with atomic update semantics.
///
/// `update` applies the mutator to a snapshot and persists the result as one
/// write; the single-threaded host event loop makes this race-free without
/// optimistic locking. Outcome previews are persisted alongside the document
/// so a mid-check UI reload can resume without re-rolling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KingdomRepo: Send + Sync {
    async fn get(&self, id: KingdomId) -> Result<Kingdom, HostError>;
    async fn update(&self, id: KingdomId, mutator: KingdomMutator) -> Result<Kingdom, HostError>;

    async fn save_preview(&self, preview: &OutcomePreview) -> Result<(), HostError>;
    async fn load_preview(
        &self,
        instance_id: InstanceId,
    ) -> Result<Option<OutcomePreview>, HostError>;
    async fn clear_preview(&self, instance_id: InstanceId) -> Result<(), HostError>;
}

// =============================================================================
// Roll Ports
// =============================================================================

/// Result of the host's skill-check primitive.
#[derive(Debug, Clone)]
pub struct SkillCheckOutcome {
    pub degree: DegreeOfSuccess,
    pub skill: String,
    pub actor_name: String,
    pub roll_total: i32,
    pub dc: i32,
}

/// The host's skill-check dialog: given a skill and DC, returns a degree of
/// success. Resolves asynchronously - the player may interact with a dialog.
/// This is the single point where true randomness enters a check; the result
/// is irreversible once returned.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillRollPort: Send + Sync {
    async fn roll_check(
        &self,
        skill: &str,
        dc: i32,
        user_id: Option<UserId>,
    ) -> Result<SkillCheckOutcome, HostError>;
}

/// The host's dice primitive: given a formula, returns an integer result,
/// exactly once per request. For dice badges the adapter resolves when the
/// player clicks the badge.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiceRollerPort: Send + Sync {
    async fn roll(&self, formula: &DiceFormula) -> Result<i32, HostError>;
}

// =============================================================================
// UI Interaction Port
// =============================================================================

/// The UI boundary for everything that needs a human decision.
///
/// Adapters resolve each future when the corresponding UI event fires; the
/// coordinator suspends on these awaits rather than polling. A custom
/// component emits `InteractionResolution` with `is_resolved: false` for
/// intermediate updates; the coordinator keeps waiting until `true`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionPort: Send + Sync {
    /// Run one declared interaction (pre-roll, post-roll, or post-apply)
    /// to completion.
    async fn run_interaction(
        &self,
        spec: &InteractionSpec,
        context: &CheckContext,
    ) -> Result<InteractionResolution, HostError>;

    /// Present a choice modifier's candidates and return the picked resource.
    async fn choose_resource(
        &self,
        candidates: &[regent_domain::Resource],
        value: i32,
        presentation: regent_domain::ChoicePresentation,
    ) -> Result<regent_domain::Resource, HostError>;

    /// Block until the player confirms or dismisses the Apply button.
    /// Returns `false` when the dialog was closed without applying.
    async fn confirm_apply(&self, preview: &OutcomePreview) -> Result<bool, HostError>;
}

// =============================================================================
// Testability / Notification Ports
// =============================================================================

/// User-facing notifications surfaced through the host's toast/chat UI.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationPort: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Randomness for the phase controllers (event trigger rolls, random check
/// selection). Checks themselves roll only through the host roll ports.
#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    /// Uniform integer in `[min, max]` inclusive.
    fn gen_range(&self, min: i32, max: i32) -> i32;
}

/// `RandomPort` backed by the process RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomPort for ThreadRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        use rand::Rng;
        rand::thread_rng().gen_range(min..=max)
    }
}
