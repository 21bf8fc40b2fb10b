//! The handle threaded into every step factory: lets a step reach the
//! pipeline engine, named pipelines, and the narrow external collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::external::{PersistenceStore, ServiceRegistry};
use crate::pipeline::{Pipeline, PipelineEngine};

/// Same-process pipelines, addressable by name. Backs the `workflow_call`
/// step type.
#[derive(Default)]
pub struct PipelineRegistry {
    pipelines: RwLock<HashMap<String, Arc<Pipeline>>>,
}

impl PipelineRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, pipeline: Pipeline) {
        let mut pipelines = self.pipelines.write().await;
        pipelines.insert(pipeline.name().to_string(), Arc::new(pipeline));
    }

    pub async fn get(&self, name: &str) -> Option<Arc<Pipeline>> {
        self.pipelines.read().await.get(name).cloned()
    }
}

/// Pipelines addressable by a `plugin:workflow` key. Backs the
/// `sub_workflow` step type. Kept distinct from `PipelineRegistry` because
/// the spec's two coordinator step types resolve against two different
/// namespaces (same-process pipeline name vs. plugin key).
#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<HashMap<String, Arc<Pipeline>>>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, key: impl Into<String>, pipeline: Pipeline) {
        let mut plugins = self.plugins.write().await;
        plugins.insert(key.into(), Arc::new(pipeline));
    }

    pub async fn get(&self, key: &str) -> Option<Arc<Pipeline>> {
        self.plugins.read().await.get(key).cloned()
    }
}

/// Dependencies every step factory and every step instance may need.
/// Cloning is cheap: every field is an `Arc`.
#[derive(Clone)]
pub struct AppHandle {
    pub engine: Arc<PipelineEngine>,
    pub pipelines: Arc<PipelineRegistry>,
    pub plugins: Arc<PluginRegistry>,
    pub services: Arc<ServiceRegistry>,
    pub persistence: Option<Arc<dyn PersistenceStore>>,
}

impl AppHandle {
    #[must_use]
    pub fn new(services: Arc<ServiceRegistry>) -> Self {
        Self {
            engine: Arc::new(PipelineEngine::new()),
            pipelines: Arc::new(PipelineRegistry::new()),
            plugins: Arc::new(PluginRegistry::new()),
            services,
            persistence: None,
        }
    }

    #[must_use]
    pub fn with_persistence(mut self, store: Arc<dyn PersistenceStore>) -> Self {
        self.persistence = Some(store);
        self
    }
}
