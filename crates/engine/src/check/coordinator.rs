//! The check coordinator state machine.
//!
//! Drives exactly one check instance through nine ordered steps:
//!
//! 1. Requirements - gate; failing is terminal, no context is created
//! 2. Pre-roll interactions - forced selections before any roll
//! 3. Execute roll - the host skill-check primitive; irreversible
//! 4. Display outcome / preview - compute badges, prepare (not commit)
//!    game commands, persist the preview so state survives a UI reload
//! 5. Outcome interactions - dice badges (rolled once, cached), choice
//!    badges, custom components
//! 6. Wait for apply - nothing in steps 7-9 runs before this confirmation
//! 7. Post-apply interactions - display-only, need the confirmed outcome
//! 8. Execute action - resolution deltas, prepared commands, execute hook,
//!    ends-event branch, all inside one atomic kingdom update
//! 9. Cleanup - mark the preview applied and release the instance
//!
//! Steps 4-8 are re-entrant after a UI reload via the persisted preview
//! (`resume`); dice already rolled are not re-rolled, effects already
//! committed are not re-applied, and a second Apply on an applied instance
//! is a warned no-op.

use std::sync::Arc;

use regent_domain::{
    DomainError, InstanceId, Kingdom, KingdomId, Modifier, Outcome, OutcomeBadge, ResourceDelta,
    UserId,
};

use crate::check::commands::{CommandMutation, GameCommandResolver};
use crate::check::context::{CheckContext, InteractionResolution, OutcomePreview};
use crate::check::pipeline::{CheckPipeline, CheckType, InteractionSpec};
use crate::check::registry::PipelineRegistry;
use crate::check::resolution::{build_resolution, ResolutionInput};
use crate::ports::{
    DiceRollerPort, HostError, InteractionPort, KingdomRepo, NotificationPort, SkillRollPort,
};

/// Failure modes of one coordinator invocation.
///
/// `RequirementsNotMet` and `Cancelled` are expected negative results the
/// phase controllers match on; only `Host` wraps genuinely unexpected I/O
/// failures that bubble to a user-visible notification.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("check '{0}' is not registered")]
    UnknownCheck(String),
    #[error("requirements not met for check '{0}'")]
    RequirementsNotMet(String),
    #[error("check '{0}' offers no skill to roll")]
    NoSkillAvailable(String),
    #[error("check instance was cancelled before apply")]
    Cancelled,
    #[error("no kingdom actions remaining for this player")]
    NoActionsRemaining,
    #[error("no persisted preview for instance {0}")]
    PreviewNotFound(InstanceId),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Caller-provided parameters for one check invocation.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub check_type: CheckType,
    pub user_id: Option<UserId>,
    /// Pre-selected strategic approach (e.g. carried over from an ongoing
    /// event record).
    pub approach: Option<String>,
    /// Skill override; defaults to the first offered skill option.
    pub skill: Option<String>,
    /// Carry-over metadata, e.g. from the persisted ongoing-check record.
    pub metadata: serde_json::Value,
}

impl ExecuteOptions {
    pub fn new(check_type: CheckType) -> Self {
        Self {
            check_type,
            user_id: None,
            approach: None,
            skill: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_approach(mut self, approach: impl Into<String>) -> Self {
        self.approach = Some(approach.into());
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Level-based DC for kingdom checks (standard level DC ladder).
pub fn level_based_dc(level: u8) -> i32 {
    const BY_LEVEL: [i32; 21] = [
        14, 15, 16, 18, 19, 20, 22, 23, 24, 26, 27, 28, 30, 31, 32, 34, 35, 36, 38, 39, 40,
    ];
    BY_LEVEL[usize::from(level).min(BY_LEVEL.len() - 1)]
}

/// Drives check instances through their lifecycle.
pub struct CheckCoordinator {
    registry: Arc<PipelineRegistry>,
    kingdoms: Arc<dyn KingdomRepo>,
    skill_rolls: Arc<dyn SkillRollPort>,
    dice: Arc<dyn DiceRollerPort>,
    interactions: Arc<dyn InteractionPort>,
    notifications: Arc<dyn NotificationPort>,
    resolver: GameCommandResolver,
    kingdom_id: KingdomId,
}

impl CheckCoordinator {
    pub fn new(
        registry: Arc<PipelineRegistry>,
        kingdoms: Arc<dyn KingdomRepo>,
        skill_rolls: Arc<dyn SkillRollPort>,
        dice: Arc<dyn DiceRollerPort>,
        interactions: Arc<dyn InteractionPort>,
        notifications: Arc<dyn NotificationPort>,
        kingdom_id: KingdomId,
    ) -> Self {
        Self {
            registry,
            kingdoms,
            skill_rolls,
            dice,
            interactions,
            notifications,
            resolver: GameCommandResolver,
            kingdom_id,
        }
    }

    /// The single entry point: run steps 1-9 for one check instance.
    ///
    /// Resolves when cleanup completes; returns `RequirementsNotMet` without
    /// creating a context when step 1 fails.
    pub async fn execute_pipeline(
        &self,
        check_id: &str,
        options: ExecuteOptions,
    ) -> Result<CheckContext, CheckError> {
        let pipeline = self
            .registry
            .get_pipeline(check_id)
            .ok_or_else(|| CheckError::UnknownCheck(check_id.to_string()))?;
        let kingdom = self.kingdoms.get(self.kingdom_id).await?;

        // Step 1: requirements. Terminal for the attempt; no context yet.
        if !pipeline.requirements_met(&kingdom) {
            tracing::debug!(check_id, "requirements not met; check cannot start");
            return Err(CheckError::RequirementsNotMet(check_id.to_string()));
        }

        let mut context = CheckContext::new(check_id, options.check_type);
        context.user_id = options.user_id;
        context.approach = options.approach.clone();
        context.merge_metadata(options.metadata.clone());

        // Step 2: pre-roll interactions must complete before any roll.
        for spec in &pipeline.pre_roll_interactions {
            let resolution = self.await_resolution(spec, &context).await?;
            context.merge_metadata(resolution.metadata.clone());
            context
                .interaction_resolutions
                .insert(spec.id.clone(), resolution);
        }

        // Step 3: the roll. The single entry point of true randomness.
        let skill = self.select_skill(&pipeline, &options)?;
        let dc = level_based_dc(kingdom.level);
        let rolled = self
            .skill_rolls
            .roll_check(&skill, dc, options.user_id)
            .await?;
        tracing::info!(
            check_id,
            skill = %rolled.skill,
            dc,
            degree = rolled.degree.as_key(),
            "check rolled"
        );
        context.skill = Some(rolled.skill);
        context.degree = Some(rolled.degree);

        // Step 4: preview. Persisted so a UI reload can resume mid-check.
        let mut preview = OutcomePreview::new(context, rolled.degree);
        self.populate_preview(&pipeline, &mut preview, &kingdom)?;
        self.kingdoms.save_preview(&preview).await?;

        // Steps 5-9.
        self.resolve_and_apply(&pipeline, preview).await
    }

    /// Re-enter steps 5-9 for a persisted preview after a UI reload.
    pub async fn resume(&self, instance_id: InstanceId) -> Result<CheckContext, CheckError> {
        let preview = self
            .kingdoms
            .load_preview(instance_id)
            .await?
            .ok_or(CheckError::PreviewNotFound(instance_id))?;

        if preview.applied {
            self.notifications
                .warn("This check outcome has already been applied.");
            tracing::warn!(instance = %instance_id, "ignoring apply on an applied instance");
            return Ok(preview.context);
        }

        let pipeline = self
            .registry
            .get_pipeline(&preview.context.check_id)
            .ok_or_else(|| CheckError::UnknownCheck(preview.context.check_id.clone()))?;

        self.resolve_and_apply(&pipeline, preview).await
    }

    // === Step 3 helpers ===

    fn select_skill(
        &self,
        pipeline: &CheckPipeline,
        options: &ExecuteOptions,
    ) -> Result<String, CheckError> {
        let offered = pipeline.skills_for_approach(options.approach.as_deref());
        if let Some(requested) = &options.skill {
            if offered.iter().any(|s| &s.skill == requested) {
                return Ok(requested.clone());
            }
        }
        offered
            .first()
            .map(|s| s.skill.clone())
            .ok_or_else(|| CheckError::NoSkillAvailable(pipeline.id.clone()))
    }

    // === Step 4 ===

    /// Compute preview badges: declared modifiers, pipeline badges, preview
    /// hook output, and prepared game commands (prepare only - nothing is
    /// committed here).
    fn populate_preview(
        &self,
        pipeline: &CheckPipeline,
        preview: &mut OutcomePreview,
        kingdom: &Kingdom,
    ) -> Result<(), CheckError> {
        let outcome = pipeline.outcomes.for_degree(preview.degree);
        preview.description = outcome.rendered_description();
        let mut badges = Vec::new();

        for modifier in &outcome.modifiers {
            badges.push(modifier_badge(modifier));
        }
        badges.extend(outcome.outcome_badges.iter().cloned());

        if let Some(hook) = &pipeline.preview {
            badges.extend(hook.calculate(&mut preview.context, kingdom)?);
        }

        for command in &outcome.game_commands {
            match self.resolver.prepare(command, kingdom) {
                Some(prepared) => badges.push(prepared.badge),
                // Mandatory effect with no target: degrade, never throw.
                None => badges.push(OutcomeBadge::info("No eligible target available")),
            }
        }

        preview.badges = badges;
        preview.manual_effects = outcome.manual_effects.clone();
        Ok(())
    }

    // === Steps 5-9 ===

    async fn resolve_and_apply(
        &self,
        pipeline: &CheckPipeline,
        mut preview: OutcomePreview,
    ) -> Result<CheckContext, CheckError> {
        let outcome = pipeline.outcomes.for_degree(preview.degree).clone();

        // Step 5a: dice badges. Rolled exactly once; cached values survive
        // UI reloads via the persisted preview.
        for (index, modifier) in outcome.modifiers.iter().enumerate() {
            if let Modifier::Dice { formula, .. } = modifier {
                if !preview.context.resolved_dice.contains_key(&index) {
                    let value = self.dice.roll(formula).await?;
                    preview.context.resolved_dice.insert(index, value);
                    self.kingdoms.save_preview(&preview).await?;
                }
            }
        }

        // Step 5b: choice badges.
        for (index, modifier) in outcome.modifiers.iter().enumerate() {
            if let Modifier::Choice {
                resources,
                value,
                presentation,
                ..
            } = modifier
            {
                if !preview.context.chosen_resources.contains_key(&index) {
                    let picked = self
                        .interactions
                        .choose_resource(resources, *value, *presentation)
                        .await?;
                    preview.context.chosen_resources.insert(index, picked);
                    self.kingdoms.save_preview(&preview).await?;
                }
            }
        }

        // Step 5c: custom components.
        for spec in &pipeline.post_roll_interactions {
            if preview.context.interaction_resolutions.contains_key(&spec.id) {
                continue;
            }
            let resolution = self.await_resolution(spec, &preview.context).await?;
            preview.context.merge_metadata(resolution.metadata.clone());
            preview
                .context
                .interaction_resolutions
                .insert(spec.id.clone(), resolution);
            self.kingdoms.save_preview(&preview).await?;
        }

        // Step 6: nothing below runs before this explicit confirmation.
        if !self.interactions.confirm_apply(&preview).await? {
            // Abandoned before apply: no mutation has happened yet.
            self.kingdoms.clear_preview(preview.instance_id).await?;
            return Err(CheckError::Cancelled);
        }
        if preview.applied {
            self.notifications
                .warn("This check outcome has already been applied.");
            return Ok(preview.context);
        }

        // Step 7: post-apply interactions are display-only.
        for spec in &pipeline.post_apply_interactions {
            let resolution = self.await_resolution(spec, &preview.context).await?;
            if !resolution.modifiers.is_empty() {
                tracing::warn!(
                    interaction = %spec.id,
                    "post-apply interaction emitted modifiers; ignored after confirmation"
                );
            }
            preview.context.merge_metadata(resolution.metadata);
        }

        // Step 8: one atomic kingdom update applies everything.
        self.apply_effects(pipeline, &outcome, &mut preview).await?;

        // Step 9: cleanup. The applied preview stays persisted so a stale
        // Apply click is detected as a no-op.
        preview.applied = true;
        preview.context.applied = true;
        self.kingdoms.save_preview(&preview).await?;
        tracing::info!(
            check_id = %preview.context.check_id,
            degree = preview.degree.as_key(),
            "check applied"
        );
        Ok(preview.context)
    }

    async fn apply_effects(
        &self,
        pipeline: &CheckPipeline,
        outcome: &Outcome,
        preview: &mut OutcomePreview,
    ) -> Result<(), CheckError> {
        // Fresh snapshot: current stocks for the shortfall rule and
        // deterministic re-preparation of game commands.
        let kingdom = self.kingdoms.get(self.kingdom_id).await?;

        let resolution = build_resolution(&ResolutionInput {
            check_id: &preview.context.check_id,
            outcome,
            degree: preview.degree,
            resolved_dice: &preview.context.resolved_dice,
            chosen_resources: &preview.context.chosen_resources,
            interaction_resolutions: &preview.context.interaction_resolutions,
            cost: &pipeline.cost,
            current_stocks: &kingdom.resources,
        })?;
        preview.context.resolution = Some(resolution.clone());

        let mutations: Vec<CommandMutation> = outcome
            .game_commands
            .iter()
            .filter_map(|command| self.resolver.prepare(command, &kingdom))
            .map(|prepared| prepared.mutation)
            .collect();

        let deltas: Vec<ResourceDelta> = resolution.numeric_modifiers.clone();
        let resolver = self.resolver;
        let execute_hook = pipeline.execute.clone();
        let context_snapshot = preview.context.clone();
        let check_type = preview.context.check_type;
        let check_id = preview.context.check_id.clone();
        let ends_event = outcome.ends_event;
        let ongoing_metadata = preview.context.metadata.clone();

        // A rejected host update leaves the preview un-applied, so Apply can
        // be retried without re-rolling dice or re-making choices.
        self.kingdoms
            .update(
                self.kingdom_id,
                Box::new(move |kingdom| {
                    // Standard resource changes first; the execute hook only
                    // adds behavior beyond them.
                    for delta in &deltas {
                        kingdom.apply_delta(*delta);
                    }
                    for mutation in &mutations {
                        resolver.commit(mutation, kingdom);
                    }
                    if let Some(hook) = &execute_hook {
                        if let Err(error) = hook.run(&context_snapshot, kingdom) {
                            tracing::warn!(
                                check_id = %context_snapshot.check_id,
                                error = %error,
                                "execute hook failed; standard effects already applied"
                            );
                        }
                    }

                    // Ongoing-check bookkeeping for events and incidents.
                    if check_type.supports_ongoing() {
                        let phase = match check_type {
                            CheckType::Event => &mut kingdom.turn_state.event_phase,
                            _ => &mut kingdom.turn_state.unrest_phase,
                        };
                        if ends_event == Some(false) {
                            phase.set_ongoing(check_id.clone(), ongoing_metadata.clone());
                        } else {
                            phase.clear();
                        }
                    }
                }),
            )
            .await?;
        Ok(())
    }

    /// Await one interaction until its component reports resolved.
    ///
    /// `is_resolved: false` is "still pending": the adapter is re-awaited and
    /// the coordinator never advances past it.
    async fn await_resolution(
        &self,
        spec: &InteractionSpec,
        context: &CheckContext,
    ) -> Result<InteractionResolution, HostError> {
        loop {
            let resolution = self.interactions.run_interaction(spec, context).await?;
            if resolution.is_resolved {
                return Ok(resolution);
            }
            tracing::debug!(interaction = %spec.id, "interaction still pending");
        }
    }
}

fn modifier_badge(modifier: &Modifier) -> OutcomeBadge {
    match modifier {
        Modifier::Static { resource, value, .. } => OutcomeBadge::for_resource(
            ResourceDelta::new(*resource, *value).to_string(),
            *resource,
        ),
        Modifier::Dice {
            resource,
            formula,
            negative,
            ..
        } => {
            let sign = if *negative { "-" } else { "+" };
            OutcomeBadge::for_resource(format!("{}{} {}", sign, formula, resource), *resource)
        }
        Modifier::Choice {
            resources, value, ..
        } => {
            let names: Vec<&str> = resources.iter().map(|r| r.display_name()).collect();
            OutcomeBadge::info(format!("Choose {:+} to {}", value, names.join(" or ")))
        }
    }
}
