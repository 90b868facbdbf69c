//! Declarative check definitions.
//!
//! A `CheckPipeline` is a value, not a subclass: the ~150 content entries all
//! conform to this one shape. Definitions are constructed once at startup,
//! are immutable afterwards, and are held only by the registry - per-instance
//! state lives in `CheckContext` so concurrent instances of the same pipeline
//! never share scratch data.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use regent_domain::{CheckOutcomes, DomainError, Kingdom, ModifierDuration, ResourceDelta};

use crate::check::context::CheckContext;

/// The three check categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckType {
    /// Player-chosen kingdom action; no per-turn exclusivity.
    Action,
    /// Random event rolled in the events phase.
    Event,
    /// Unrest incident triggered in the unrest phase.
    Incident,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Event => "event",
            Self::Incident => "incident",
        }
    }

    /// Events and incidents can persist across turns via `ends_event`.
    pub fn supports_ongoing(&self) -> bool {
        matches!(self, Self::Event | Self::Incident)
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One skill the check can be attempted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillOption {
    pub skill: String,
    /// Flavor text shown next to the skill in the roll dialog.
    pub description: String,
}

impl SkillOption {
    pub fn new(skill: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            description: description.into(),
        }
    }
}

/// A named approach gating which skills are offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicChoice {
    pub id: String,
    pub label: String,
    /// Skills offered when this approach is selected.
    pub skills: Vec<String>,
}

/// A declared custom interactive component, run by the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSpec {
    /// Stable id, unique within the pipeline; used to de-duplicate on resume.
    pub id: String,
    pub title: String,
    /// Host component key the UI adapter dispatches on.
    pub component: String,
}

impl InteractionSpec {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            component: component.into(),
        }
    }
}

// =============================================================================
// Lifecycle hooks
// =============================================================================
//
// Hooks are synchronous and deterministic: they read kingdom snapshots and
// context, and all randomness or I/O flows through the coordinator's ports.
// That keeps them plain `Send + Sync` values on the shared definition and
// makes preview computation safely re-runnable after a UI reload.

/// Gate evaluated before a check may start (step 1).
pub trait RequirementHook: Send + Sync {
    fn evaluate(&self, pipeline: &CheckPipeline, kingdom: &Kingdom) -> bool;
}

impl<F> RequirementHook for F
where
    F: Fn(&CheckPipeline, &Kingdom) -> bool + Send + Sync,
{
    fn evaluate(&self, pipeline: &CheckPipeline, kingdom: &Kingdom) -> bool {
        self(pipeline, kingdom)
    }
}

/// Preview computation (step 4): may stash target selections in the context
/// metadata and return extra badges, but must not mutate the kingdom.
pub trait PreviewHook: Send + Sync {
    fn calculate(
        &self,
        context: &mut CheckContext,
        kingdom: &Kingdom,
    ) -> Result<Vec<regent_domain::OutcomeBadge>, DomainError>;
}

impl<F> PreviewHook for F
where
    F: Fn(&mut CheckContext, &Kingdom) -> Result<Vec<regent_domain::OutcomeBadge>, DomainError>
        + Send
        + Sync,
{
    fn calculate(
        &self,
        context: &mut CheckContext,
        kingdom: &Kingdom,
    ) -> Result<Vec<regent_domain::OutcomeBadge>, DomainError> {
        self(context, kingdom)
    }
}

/// Custom effect hook (step 8), run inside the atomic kingdom update AFTER
/// the standard resource deltas have been applied - it adds behavior beyond
/// standard resource changes, never re-derives them.
pub trait ExecuteHook: Send + Sync {
    fn run(&self, context: &CheckContext, kingdom: &mut Kingdom) -> Result<(), DomainError>;
}

impl<F> ExecuteHook for F
where
    F: Fn(&CheckContext, &mut Kingdom) -> Result<(), DomainError> + Send + Sync,
{
    fn run(&self, context: &CheckContext, kingdom: &mut Kingdom) -> Result<(), DomainError> {
        self(context, kingdom)
    }
}

// =============================================================================
// The pipeline definition
// =============================================================================

/// The declarative unit: one check definition.
#[derive(Clone)]
pub struct CheckPipeline {
    pub id: String,
    pub name: String,
    pub description: String,
    pub check_type: CheckType,
    /// Tier classifier; the default requirement is `tier <= kingdom level`.
    pub tier: u8,
    /// Free-form grouping (e.g. incident severity: "minor" / "moderate" / "major").
    pub category: Option<String>,
    pub skills: Vec<SkillOption>,
    pub strategic_choices: Vec<StrategicChoice>,
    pub outcomes: CheckOutcomes,
    /// Resources deducted unconditionally on execution (positive = amount paid).
    pub cost: Vec<ResourceDelta>,
    pub requirements: Option<Arc<dyn RequirementHook>>,
    pub preview: Option<Arc<dyn PreviewHook>>,
    pub execute: Option<Arc<dyn ExecuteHook>>,
    pub pre_roll_interactions: Vec<InteractionSpec>,
    pub post_roll_interactions: Vec<InteractionSpec>,
    pub post_apply_interactions: Vec<InteractionSpec>,
}

impl fmt::Debug for CheckPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckPipeline")
            .field("id", &self.id)
            .field("check_type", &self.check_type)
            .field("tier", &self.tier)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl CheckPipeline {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        check_type: CheckType,
        outcomes: CheckOutcomes,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            check_type,
            tier: 1,
            category: None,
            skills: Vec::new(),
            strategic_choices: Vec::new(),
            outcomes,
            cost: Vec::new(),
            requirements: None,
            preview: None,
            execute: None,
            pre_roll_interactions: Vec::new(),
            post_roll_interactions: Vec::new(),
            post_apply_interactions: Vec::new(),
        }
    }

    // === Builder Methods ===

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_skill(mut self, option: SkillOption) -> Self {
        self.skills.push(option);
        self
    }

    pub fn with_strategic_choice(mut self, choice: StrategicChoice) -> Self {
        self.strategic_choices.push(choice);
        self
    }

    pub fn with_cost(mut self, cost: ResourceDelta) -> Self {
        self.cost.push(cost);
        self
    }

    pub fn with_requirements(mut self, hook: impl RequirementHook + 'static) -> Self {
        self.requirements = Some(Arc::new(hook));
        self
    }

    pub fn with_preview(mut self, hook: impl PreviewHook + 'static) -> Self {
        self.preview = Some(Arc::new(hook));
        self
    }

    pub fn with_execute(mut self, hook: impl ExecuteHook + 'static) -> Self {
        self.execute = Some(Arc::new(hook));
        self
    }

    pub fn with_pre_roll_interaction(mut self, spec: InteractionSpec) -> Self {
        self.pre_roll_interactions.push(spec);
        self
    }

    pub fn with_post_roll_interaction(mut self, spec: InteractionSpec) -> Self {
        self.post_roll_interactions.push(spec);
        self
    }

    pub fn with_post_apply_interaction(mut self, spec: InteractionSpec) -> Self {
        self.post_apply_interactions.push(spec);
        self
    }

    // === Queries ===

    /// Skills offered, honoring a selected strategic approach.
    pub fn skills_for_approach(&self, approach: Option<&str>) -> Vec<&SkillOption> {
        match approach.and_then(|a| self.strategic_choices.iter().find(|c| c.id == a)) {
            Some(choice) => self
                .skills
                .iter()
                .filter(|s| choice.skills.contains(&s.skill))
                .collect(),
            None => self.skills.iter().collect(),
        }
    }

    /// Step-1 gate: the requirements hook, or the default tier-vs-level rule.
    pub fn requirements_met(&self, kingdom: &Kingdom) -> bool {
        match &self.requirements {
            Some(hook) => hook.evaluate(self, kingdom),
            None => u32::from(self.tier) <= u32::from(kingdom.level),
        }
    }

    /// Structural validation run at registration time.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::validation("pipeline id must not be empty"));
        }
        if self.skills.is_empty() {
            return Err(DomainError::validation(format!(
                "pipeline '{}' declares no skill options",
                self.id
            )));
        }
        // Events and incidents only declare immediate modifiers; ongoing
        // modifiers are sourced from structures elsewhere.
        if self.check_type.supports_ongoing() {
            for degree in [
                regent_domain::DegreeOfSuccess::CriticalSuccess,
                regent_domain::DegreeOfSuccess::Success,
                regent_domain::DegreeOfSuccess::Failure,
                regent_domain::DegreeOfSuccess::CriticalFailure,
            ] {
                let outcome = self.outcomes.for_degree(degree);
                if outcome
                    .modifiers
                    .iter()
                    .any(|m| m.duration() == ModifierDuration::Ongoing)
                {
                    return Err(DomainError::validation(format!(
                        "pipeline '{}' declares an ongoing modifier on {}; \
                         events and incidents may only declare immediate modifiers",
                        self.id,
                        degree.as_key()
                    )));
                }
            }
        }
        Ok(())
    }
}
