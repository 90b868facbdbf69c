//! Per-invocation check state.
//!
//! `CheckContext` is created when a check is triggered and discarded once
//! execution completes; `OutcomePreview` is its persisted form between the
//! roll and the Apply confirmation, so a UI reload resumes mid-check instead
//! of re-rolling dice or re-asking choices. Nothing here is process-global.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use regent_domain::{
    DegreeOfSuccess, InstanceId, OutcomeBadge, Resource, ResourceDelta, UserId,
};

use crate::check::pipeline::CheckType;
use crate::check::resolution::ResolutionData;

/// Completion signal emitted by any interactive component.
///
/// Fixed shape across all interactions: `is_resolved: false` means "still
/// pending" and the coordinator will not advance past the interaction steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResolution {
    pub is_resolved: bool,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub modifiers: Vec<ResourceDelta>,
}

impl InteractionResolution {
    pub fn resolved() -> Self {
        Self {
            is_resolved: true,
            metadata: serde_json::Value::Null,
            modifiers: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_modifier(mut self, delta: ResourceDelta) -> Self {
        self.modifiers.push(delta);
        self
    }
}

/// Mutable state of one check instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckContext {
    pub instance_id: InstanceId,
    pub check_id: String,
    pub check_type: CheckType,
    pub user_id: Option<UserId>,
    /// Selected strategic approach, when the pipeline declares any.
    pub approach: Option<String>,
    /// Skill actually rolled.
    pub skill: Option<String>,
    pub degree: Option<DegreeOfSuccess>,
    /// Free-form carry-over between hooks (preview target selection etc.).
    pub metadata: serde_json::Value,
    /// Dice badge results keyed by modifier index; rolled exactly once.
    pub resolved_dice: BTreeMap<usize, i32>,
    /// Choice badge picks keyed by modifier index.
    pub chosen_resources: BTreeMap<usize, Resource>,
    /// Completed custom-component resolutions keyed by interaction id.
    pub interaction_resolutions: BTreeMap<String, InteractionResolution>,
    /// Output of the resolution data builder, set during execution.
    pub resolution: Option<ResolutionData>,
    /// Set once step 8 has committed; guards against double application.
    pub applied: bool,
}

impl CheckContext {
    pub fn new(check_id: impl Into<String>, check_type: CheckType) -> Self {
        Self {
            instance_id: InstanceId::new(),
            check_id: check_id.into(),
            check_type,
            user_id: None,
            approach: None,
            skill: None,
            degree: None,
            metadata: serde_json::Value::Null,
            resolved_dice: BTreeMap::new(),
            chosen_resources: BTreeMap::new(),
            interaction_resolutions: BTreeMap::new(),
            resolution: None,
            applied: false,
        }
    }

    /// Merge a metadata object into the context metadata.
    ///
    /// Non-object values replace the current metadata wholesale.
    pub fn merge_metadata(&mut self, incoming: serde_json::Value) {
        match (&mut self.metadata, incoming) {
            (_, serde_json::Value::Null) => {}
            (serde_json::Value::Object(current), serde_json::Value::Object(new)) => {
                current.extend(new);
            }
            (slot, value) => *slot = value,
        }
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// The persisted record between the roll and Apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomePreview {
    pub instance_id: InstanceId,
    pub degree: DegreeOfSuccess,
    /// Outcome narrative with `{resource}` placeholders rendered.
    pub description: String,
    /// Rendered resource badges plus prepared-command badges.
    pub badges: Vec<OutcomeBadge>,
    /// Manual-effect notes shown alongside the badges.
    pub manual_effects: Vec<String>,
    pub context: CheckContext,
    /// Set once effects have been committed; re-applying is a warned no-op.
    pub applied: bool,
    pub created_at: DateTime<Utc>,
}

impl OutcomePreview {
    pub fn new(context: CheckContext, degree: DegreeOfSuccess) -> Self {
        Self {
            instance_id: context.instance_id,
            degree,
            description: String::new(),
            badges: Vec::new(),
            manual_effects: Vec::new(),
            context,
            applied: false,
            created_at: Utc::now(),
        }
    }
}
