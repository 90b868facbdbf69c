//! The pipeline registry.
//!
//! A flat, append-only directory from check id to definition, built once at
//! startup from fallible pipeline sources. One malformed content entry must
//! not prevent the rest from registering: failures are logged and skipped.
//! `initialize` is idempotent and `get_pipeline` auto-initializes to protect
//! against ordering hazards between module loading and first use.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use regent_domain::DomainError;

use crate::check::pipeline::{CheckPipeline, CheckType};

/// One registerable content entry: an id for log context plus a constructor
/// that may fail on malformed data.
pub struct PipelineSource {
    pub id: &'static str,
    pub build: fn() -> Result<CheckPipeline, DomainError>,
}

/// Directory of all registered check pipelines.
pub struct PipelineRegistry {
    sources: Vec<PipelineSource>,
    pipelines: RwLock<Option<HashMap<String, Arc<CheckPipeline>>>>,
}

impl PipelineRegistry {
    pub fn new(sources: Vec<PipelineSource>) -> Self {
        Self {
            sources,
            pipelines: RwLock::new(None),
        }
    }

    /// Registry seeded with the built-in content catalog.
    pub fn with_builtin_content() -> Self {
        Self::new(crate::content::pipeline_sources())
    }

    /// Build the directory from the sources. Idempotent: a second call is a
    /// harmless no-op with a warning.
    pub fn initialize(&self) {
        let mut slot = match self.pipelines.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_some() {
            tracing::warn!("pipeline registry already initialized; ignoring re-initialization");
            return;
        }

        let mut pipelines: HashMap<String, Arc<CheckPipeline>> = HashMap::new();
        for source in &self.sources {
            let pipeline = match (source.build)().and_then(|p| p.validate().map(|()| p)) {
                Ok(pipeline) => pipeline,
                Err(error) => {
                    tracing::warn!(
                        pipeline = source.id,
                        error = %error,
                        "skipping pipeline that failed to register"
                    );
                    continue;
                }
            };
            if pipelines.contains_key(&pipeline.id) {
                tracing::warn!(
                    pipeline = %pipeline.id,
                    "duplicate pipeline id; keeping the first registration"
                );
                continue;
            }
            pipelines.insert(pipeline.id.clone(), Arc::new(pipeline));
        }

        tracing::info!(count = pipelines.len(), "pipeline registry initialized");
        *slot = Some(pipelines);
    }

    fn ensure_initialized(&self) {
        let initialized = match self.pipelines.read() {
            Ok(slot) => slot.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        };
        if !initialized {
            self.initialize();
        }
    }

    /// Look up one pipeline, initializing the registry on first access.
    pub fn get_pipeline(&self, id: &str) -> Option<Arc<CheckPipeline>> {
        self.ensure_initialized();
        match self.pipelines.read() {
            Ok(slot) => slot.as_ref().and_then(|map| map.get(id).cloned()),
            Err(poisoned) => poisoned
                .into_inner()
                .as_ref()
                .and_then(|map| map.get(id).cloned()),
        }
    }

    pub fn all_pipelines(&self) -> Vec<Arc<CheckPipeline>> {
        self.ensure_initialized();
        match self.pipelines.read() {
            Ok(slot) => slot.as_ref().map(|m| m.values().cloned().collect()),
            Err(poisoned) => poisoned
                .into_inner()
                .as_ref()
                .map(|m| m.values().cloned().collect()),
        }
        .unwrap_or_default()
    }

    pub fn pipelines_by_type(&self, check_type: CheckType) -> Vec<Arc<CheckPipeline>> {
        let mut pipelines: Vec<_> = self
            .all_pipelines()
            .into_iter()
            .filter(|p| p.check_type == check_type)
            .collect();
        // Stable order for deterministic random selection in tests.
        pipelines.sort_by(|a, b| a.id.cmp(&b.id));
        pipelines
    }

    pub fn pipelines_by_category(&self, category: &str) -> Vec<Arc<CheckPipeline>> {
        let mut pipelines: Vec<_> = self
            .all_pipelines()
            .into_iter()
            .filter(|p| p.category.as_deref() == Some(category))
            .collect();
        pipelines.sort_by(|a, b| a.id.cmp(&b.id));
        pipelines
    }
}
