//! Binds REST resource lifecycle events onto state-machine transitions.
//!
//! Grounded on `wovra_engine::machine::StateMachineEngine`; this collaborator
//! owns none of the state machine logic itself, only the create-then-async-
//! trigger and settle-loop choreography a REST handler needs around it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use wovra_domain::workflow::WorkflowInstance;
use wovra_engine::app::PipelineRegistry;
use wovra_engine::external::PersistenceStore;
use wovra_engine::machine::{StateMachineError, StateMachineEngine};

#[derive(Debug, Error)]
pub enum WorkflowBindingError {
    #[error(transparent)]
    StateMachine(#[from] StateMachineError),
    #[error("no transition configured for action {0:?}")]
    UnknownAction(String),
}

type ResourceMirror = Arc<RwLock<HashMap<String, WorkflowInstance>>>;

/// Maps a resource-type prefix and a sub-action -> transition-name table
/// onto `StateMachineEngine` calls. Keeps its own in-memory resource mirror
/// (resource id -> last-known instance snapshot) so route handlers can list
/// and fetch resources without round-tripping through the engine or a store.
pub struct WorkflowBinding {
    engine: Arc<StateMachineEngine>,
    pipelines: Arc<PipelineRegistry>,
    persistence: Option<Arc<dyn PersistenceStore>>,
    instance_prefix: String,
    collection: String,
    action_transitions: HashMap<String, String>,
    resources: ResourceMirror,
}

impl WorkflowBinding {
    #[must_use]
    pub fn new(
        engine: Arc<StateMachineEngine>,
        pipelines: Arc<PipelineRegistry>,
        instance_prefix: impl Into<String>,
        action_transitions: HashMap<String, String>,
    ) -> Self {
        let instance_prefix = instance_prefix.into();
        let collection = instance_prefix.trim_end_matches(':').to_string();
        Self {
            engine,
            pipelines,
            persistence: None,
            instance_prefix,
            collection,
            action_transitions,
            resources: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn with_persistence(mut self, store: Arc<dyn PersistenceStore>) -> Self {
        self.persistence = Some(store);
        self
    }

    fn instance_id(&self, resource_id: &str) -> String {
        format!("{}{}", self.instance_prefix, resource_id)
    }

    /// Resources known to the in-memory mirror, most-recently-touched order
    /// not guaranteed.
    pub async fn list_resources(&self) -> Vec<WorkflowInstance> {
        self.resources.read().await.values().cloned().collect()
    }

    pub async fn get_resource(&self, resource_id: &str) -> Option<WorkflowInstance> {
        self.resources.read().await.get(resource_id).cloned()
    }

    /// Create the workflow instance for a newly created resource, then fire
    /// `initial_transition` on a detached task. The HTTP response does not
    /// wait for the transition chain to settle: a plain request-scoped task
    /// would be cancelled the moment the handler returns, so this spawns a
    /// fresh, independent `CancellationToken`.
    pub async fn on_resource_created(
        &self,
        definition_id: &str,
        resource_id: &str,
        initial_transition: &str,
        data: Value,
    ) -> Result<WorkflowInstance, WorkflowBindingError> {
        let instance_id = self.instance_id(resource_id);
        let instance = self
            .engine
            .create_workflow(definition_id, &instance_id, data.clone())
            .await?;
        insert_mirror(&self.resources, resource_id, instance.clone()).await;

        let engine = Arc::clone(&self.engine);
        let pipelines = Arc::clone(&self.pipelines);
        let persistence = self.persistence.clone();
        let resources = Arc::clone(&self.resources);
        let collection = self.collection.clone();
        let transition = initial_transition.to_string();
        let resource_id = resource_id.to_string();

        tokio::spawn(async move {
            let cancel = CancellationToken::new();
            if let Err(err) = engine
                .trigger_transition(&cancel, &instance_id, &transition, data, &pipelines)
                .await
            {
                tracing::warn!(instance = %instance_id, error = %err, "initial transition failed");
                return;
            }
            settle_and_mirror(&engine, &resources, persistence.as_ref(), &collection, &resource_id, &instance_id)
                .await;
        });

        Ok(instance)
    }

    /// Fire an explicit transition synchronously, settle, mirror, and
    /// write through to persistence before returning the resulting snapshot.
    pub async fn trigger(
        &self,
        resource_id: &str,
        transition_name: &str,
        data: Value,
    ) -> Result<WorkflowInstance, WorkflowBindingError> {
        let instance_id = self.instance_id(resource_id);
        let cancel = CancellationToken::new();
        self.engine
            .trigger_transition(&cancel, &instance_id, transition_name, data, &self.pipelines)
            .await?;

        Ok(settle_and_mirror(
            &self.engine,
            &self.resources,
            self.persistence.as_ref(),
            &self.collection,
            resource_id,
            &instance_id,
        )
        .await?)
    }

    /// Resolve `sub_action` via the configured table and fire it, merging
    /// `body` into the transition's call data. Ensures the instance exists
    /// first, creating it from an empty payload if this is the first action
    /// seen for the resource.
    pub async fn trigger_action(
        &self,
        resource_id: &str,
        sub_action: &str,
        body: Value,
    ) -> Result<WorkflowInstance, WorkflowBindingError> {
        let transition_name = self
            .action_transitions
            .get(sub_action)
            .ok_or_else(|| WorkflowBindingError::UnknownAction(sub_action.to_string()))?
            .clone();
        self.trigger(resource_id, &transition_name, body).await
    }

    /// Poll `get_instance` at 300 ms intervals until the state is unchanged
    /// for two consecutive polls, `completed` is true, or 5 s elapse.
    pub async fn settle(&self, resource_id: &str) -> Result<WorkflowInstance, WorkflowBindingError> {
        let instance_id = self.instance_id(resource_id);
        let instance = settle_loop(&self.engine, &instance_id).await?;
        insert_mirror(&self.resources, resource_id, instance.clone()).await;
        Ok(instance)
    }
}

async fn insert_mirror(resources: &ResourceMirror, resource_id: &str, instance: WorkflowInstance) {
    resources.write().await.insert(resource_id.to_string(), instance);
}

async fn settle_loop(
    engine: &StateMachineEngine,
    instance_id: &str,
) -> Result<WorkflowInstance, StateMachineError> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut last_state: Option<String> = None;

    loop {
        let instance = engine.get_instance(instance_id).await?;
        if instance.completed {
            return Ok(instance);
        }
        if last_state.as_deref() == Some(instance.current_state.as_str()) {
            return Ok(instance);
        }
        last_state = Some(instance.current_state.clone());

        if Instant::now() >= deadline {
            return Ok(instance);
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}

async fn settle_and_mirror(
    engine: &StateMachineEngine,
    resources: &ResourceMirror,
    persistence: Option<&Arc<dyn PersistenceStore>>,
    collection: &str,
    resource_id: &str,
    instance_id: &str,
) -> Result<WorkflowInstance, StateMachineError> {
    let instance = settle_loop(engine, instance_id).await?;
    insert_mirror(resources, resource_id, instance.clone()).await;

    if let Some(store) = persistence {
        let snapshot = serde_json::to_value(&instance).unwrap_or(Value::Null);
        if let Err(err) = store.save_resource(collection, instance_id, snapshot).await {
            tracing::warn!(instance = %instance_id, error = %err, "write-through persistence failed");
        }
    }

    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wovra_domain::workflow::{TransitionDefinition, WorkflowDefinition};

    fn order_definition() -> WorkflowDefinition {
        WorkflowDefinition {
            id: "order".to_string(),
            initial_state: "pending".to_string(),
            states: vec!["pending".to_string(), "approved".to_string()],
            transitions: vec![TransitionDefinition {
                name: "approve".to_string(),
                sources: vec!["pending".to_string()],
                target: "approved".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            }],
        }
    }

    #[tokio::test]
    async fn on_resource_created_spawns_initial_transition() {
        let engine = Arc::new(StateMachineEngine::new(Default::default()));
        engine.register_definition(order_definition()).await.unwrap();
        let pipelines = Arc::new(PipelineRegistry::new());

        let mut actions = HashMap::new();
        actions.insert("approve".to_string(), "approve".to_string());
        let binding = WorkflowBinding::new(Arc::clone(&engine), pipelines, "order:", actions);

        let created = binding
            .on_resource_created("order", "ord_1", "approve", json!({}))
            .await
            .unwrap();
        assert_eq!(created.current_state, "pending");

        let settled = binding.settle("ord_1").await.unwrap();
        assert_eq!(settled.current_state, "approved");
        assert_eq!(binding.get_resource("ord_1").await.unwrap().current_state, "approved");
    }

    #[tokio::test]
    async fn trigger_action_maps_sub_action_to_transition() {
        let engine = Arc::new(StateMachineEngine::new(Default::default()));
        engine.register_definition(order_definition()).await.unwrap();
        engine.create_workflow("order", "ord_1", json!({})).await.unwrap();
        let pipelines = Arc::new(PipelineRegistry::new());

        let mut actions = HashMap::new();
        actions.insert("approve".to_string(), "approve".to_string());
        let binding = WorkflowBinding::new(engine, pipelines, "order:", actions);

        let instance = binding
            .trigger_action("ord_1", "approve", json!({}))
            .await
            .unwrap();
        assert_eq!(instance.current_state, "approved");
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let engine = Arc::new(StateMachineEngine::new(Default::default()));
        let pipelines = Arc::new(PipelineRegistry::new());
        let binding = WorkflowBinding::new(engine, pipelines, "order:", HashMap::new());

        let result = binding.trigger_action("ord_1", "nonexistent", json!({})).await;
        assert!(matches!(result, Err(WorkflowBindingError::UnknownAction(_))));
    }

    #[tokio::test]
    async fn list_resources_reflects_mirror() {
        let engine = Arc::new(StateMachineEngine::new(Default::default()));
        engine.register_definition(order_definition()).await.unwrap();
        let pipelines = Arc::new(PipelineRegistry::new());
        let binding = WorkflowBinding::new(engine, pipelines, "order:", HashMap::new());

        binding
            .on_resource_created("order", "ord_1", "approve", json!({}))
            .await
            .unwrap();

        let listed = binding.list_resources().await;
        assert_eq!(listed.len(), 1);
    }
}
