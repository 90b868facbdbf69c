//! Shared fakes and fixtures for engine tests.
//!
//! Everything here is scripted rather than mocked: deterministic queues of
//! values stand in for the host's dialogs and RNG so whole-check flows can
//! be asserted end to end.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use regent_domain::{
    DegreeOfSuccess, DiceFormula, FactionAttitude, Faction, InstanceId, Kingdom, KingdomId,
    Resource, Settlement, Structure, StructureCategory, UserId, Worksite, WorksiteKind,
};

use crate::check::context::{CheckContext, InteractionResolution, OutcomePreview};
use crate::check::coordinator::CheckCoordinator;
use crate::check::pipeline::InteractionSpec;
use crate::check::registry::PipelineRegistry;
use crate::ports::{
    DiceRollerPort, HostError, InteractionPort, KingdomRepo, NotificationPort, RandomPort,
    SkillCheckOutcome, SkillRollPort,
};

/// Route `tracing` output through the test harness.
///
/// `try_init` keeps repeat calls from different tests in one process benign.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("regent_engine=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// In-memory kingdom store with the same atomic-update semantics as the host.
pub struct MemoryKingdomRepo {
    state: Mutex<Kingdom>,
    previews: Mutex<HashMap<InstanceId, OutcomePreview>>,
    update_failures: AtomicUsize,
}

impl MemoryKingdomRepo {
    pub fn new(kingdom: Kingdom) -> Self {
        Self {
            state: Mutex::new(kingdom),
            previews: Mutex::new(HashMap::new()),
            update_failures: AtomicUsize::new(0),
        }
    }

    /// Reject the next `n` update calls with a persistence error.
    pub fn fail_next_updates(&self, n: usize) {
        self.update_failures.store(n, Ordering::SeqCst);
    }

    /// Current document snapshot.
    pub fn kingdom(&self) -> Kingdom {
        self.state.lock().unwrap().clone()
    }

    pub fn preview_count(&self) -> usize {
        self.previews.lock().unwrap().len()
    }

    pub fn preview(&self, instance_id: InstanceId) -> Option<OutcomePreview> {
        self.previews.lock().unwrap().get(&instance_id).cloned()
    }

    pub fn previews(&self) -> Vec<OutcomePreview> {
        self.previews.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl KingdomRepo for MemoryKingdomRepo {
    async fn get(&self, id: KingdomId) -> Result<Kingdom, HostError> {
        let kingdom = self.state.lock().unwrap().clone();
        if kingdom.id != id {
            return Err(HostError::KingdomNotFound(id));
        }
        Ok(kingdom)
    }

    async fn update(
        &self,
        id: KingdomId,
        mutator: crate::ports::KingdomMutator,
    ) -> Result<Kingdom, HostError> {
        if self.update_failures.load(Ordering::SeqCst) > 0 {
            self.update_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(HostError::Persistence("document write rejected".into()));
        }
        let mut kingdom = self.state.lock().unwrap();
        if kingdom.id != id {
            return Err(HostError::KingdomNotFound(id));
        }
        mutator(&mut kingdom);
        Ok(kingdom.clone())
    }

    async fn save_preview(&self, preview: &OutcomePreview) -> Result<(), HostError> {
        self.previews
            .lock()
            .unwrap()
            .insert(preview.instance_id, preview.clone());
        Ok(())
    }

    async fn load_preview(
        &self,
        instance_id: InstanceId,
    ) -> Result<Option<OutcomePreview>, HostError> {
        Ok(self.previews.lock().unwrap().get(&instance_id).cloned())
    }

    async fn clear_preview(&self, instance_id: InstanceId) -> Result<(), HostError> {
        self.previews.lock().unwrap().remove(&instance_id);
        Ok(())
    }
}

/// Skill-roll port returning a queue of scripted degrees (then `Success`).
pub struct ScriptedSkillRolls {
    degrees: Mutex<VecDeque<DegreeOfSuccess>>,
}

impl ScriptedSkillRolls {
    pub fn new(degrees: Vec<DegreeOfSuccess>) -> Self {
        Self {
            degrees: Mutex::new(degrees.into()),
        }
    }
}

#[async_trait]
impl SkillRollPort for ScriptedSkillRolls {
    async fn roll_check(
        &self,
        skill: &str,
        dc: i32,
        _user_id: Option<UserId>,
    ) -> Result<SkillCheckOutcome, HostError> {
        let degree = self
            .degrees
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DegreeOfSuccess::Success);
        Ok(SkillCheckOutcome {
            degree,
            skill: skill.to_string(),
            actor_name: "Test Ruler".into(),
            roll_total: dc,
            dc,
        })
    }
}

/// Dice port returning scripted values and counting every roll.
pub struct ScriptedDice {
    values: Mutex<VecDeque<i32>>,
    rolls: AtomicUsize,
}

impl ScriptedDice {
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            values: Mutex::new(values.into()),
            rolls: AtomicUsize::new(0),
        }
    }

    pub fn roll_count(&self) -> usize {
        self.rolls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiceRollerPort for ScriptedDice {
    async fn roll(&self, formula: &DiceFormula) -> Result<i32, HostError> {
        self.rolls.fetch_add(1, Ordering::SeqCst);
        self.values
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| HostError::Roll(format!("no scripted value left for {formula}")))
    }
}

/// Interaction port driven by scripted queues.
///
/// Defaults: interactions resolve immediately with no payload, choices pick
/// the first candidate, and Apply is confirmed.
#[derive(Default)]
pub struct ScriptedInteractions {
    resolutions: Mutex<HashMap<String, VecDeque<InteractionResolution>>>,
    picks: Mutex<VecDeque<Resource>>,
    confirmations: Mutex<VecDeque<bool>>,
    confirm_calls: AtomicUsize,
}

impl ScriptedInteractions {
    pub fn with_resolution(self, id: &str, resolution: InteractionResolution) -> Self {
        self.resolutions
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(resolution);
        self
    }

    pub fn with_pick(self, resource: Resource) -> Self {
        self.picks.lock().unwrap().push_back(resource);
        self
    }

    pub fn with_confirmation(self, confirmed: bool) -> Self {
        self.confirmations.lock().unwrap().push_back(confirmed);
        self
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractionPort for ScriptedInteractions {
    async fn run_interaction(
        &self,
        spec: &InteractionSpec,
        _context: &CheckContext,
    ) -> Result<InteractionResolution, HostError> {
        let scripted = self
            .resolutions
            .lock()
            .unwrap()
            .get_mut(&spec.id)
            .and_then(|queue| queue.pop_front());
        Ok(scripted.unwrap_or_else(InteractionResolution::resolved))
    }

    async fn choose_resource(
        &self,
        candidates: &[Resource],
        _value: i32,
        _presentation: regent_domain::ChoicePresentation,
    ) -> Result<Resource, HostError> {
        let scripted = self.picks.lock().unwrap().pop_front();
        scripted
            .or_else(|| candidates.first().copied())
            .ok_or_else(|| HostError::Interaction("no choice candidates".into()))
    }

    async fn confirm_apply(&self, _preview: &OutcomePreview) -> Result<bool, HostError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.confirmations.lock().unwrap().pop_front().unwrap_or(true))
    }
}

/// Deterministic `RandomPort`; panics when the script runs dry so a test
/// fails loudly on an unexpected roll.
pub struct ScriptedRandom {
    values: Mutex<VecDeque<i32>>,
}

impl ScriptedRandom {
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            values: Mutex::new(values.into()),
        }
    }
}

impl RandomPort for ScriptedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        self.values
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected random roll in [{min}, {max}]"))
            .clamp(min, max)
    }
}

/// Notification port recording every message.
#[derive(Default)]
pub struct RecordingNotifications {
    infos: Mutex<Vec<String>>,
    warns: Mutex<Vec<String>>,
}

impl RecordingNotifications {
    pub fn warnings(&self) -> Vec<String> {
        self.warns.lock().unwrap().clone()
    }
}

impl NotificationPort for RecordingNotifications {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warns.lock().unwrap().push(message.to_string());
    }
}

/// A level-2 kingdom with settlements, a worksite, and a faction.
pub fn sample_kingdom() -> Kingdom {
    let mut kingdom = Kingdom::new("Aldermark", 2);
    kingdom.set_resource(Resource::Gold, 10);
    kingdom.set_resource(Resource::Food, 5);
    kingdom.set_resource(Resource::Lumber, 4);
    kingdom.set_resource(Resource::Stone, 3);
    kingdom.set_resource(Resource::Ore, 1);
    kingdom.set_resource(Resource::Fame, 1);

    let mut stagfell = Settlement::new("Stagfell", 2);
    stagfell
        .structures
        .push(Structure::new("Courthouse", StructureCategory::Justice, 1).with_capacity(2));
    stagfell
        .structures
        .push(Structure::new("Market", StructureCategory::Commerce, 2).with_capacity(4));
    kingdom.settlements.push(stagfell);

    kingdom.worksites.push(Worksite::new(WorksiteKind::Farm, "E7"));
    kingdom
        .factions
        .push(Faction::new("River Traders", FactionAttitude::Indifferent));
    kingdom
}

/// Coordinator wired to scripted ports, targeting the repo's kingdom.
pub fn scripted_coordinator(
    registry: Arc<PipelineRegistry>,
    kingdoms: Arc<MemoryKingdomRepo>,
    skill_rolls: Arc<ScriptedSkillRolls>,
    dice: Arc<ScriptedDice>,
    interactions: Arc<ScriptedInteractions>,
) -> Arc<CheckCoordinator> {
    init_test_logging();
    let kingdom_id = kingdoms.kingdom().id;
    Arc::new(CheckCoordinator::new(
        registry,
        kingdoms,
        skill_rolls,
        dice,
        interactions,
        Arc::new(RecordingNotifications::default()),
        kingdom_id,
    ))
}
