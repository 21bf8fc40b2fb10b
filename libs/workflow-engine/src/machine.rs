//! State machine engine (C5): owns named-state workflow instances and moves
//! them between states via guarded, optionally-piped transitions.
//!
//! Grounded on the teacher's `state::workflow_state::WorkflowStateManager`
//! for the locking/snapshot shape, generalized from step-id tracking to
//! named-state transitions over `wovra_domain::workflow::{WorkflowDefinition,
//! WorkflowInstance, TransitionDefinition}`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use wovra_domain::workflow::{TransitionDefinition, WorkflowDefinition, WorkflowInstance};

use crate::app::PipelineRegistry;
use crate::context::PipelineContext;
use crate::external::PersistenceStore;
use crate::pipeline::{PipelineEngine, PipelineError};

#[derive(Debug, Error)]
pub enum StateMachineError {
    #[error("instance {0:?} not found")]
    InstanceNotFound(String),
    #[error("instance {0:?} already exists")]
    DuplicateInstance(String),
    #[error("no definition registered under {0:?}")]
    UnknownDefinition(String),
    #[error("definition {id:?} is invalid: {reason}")]
    InvalidDefinition { id: String, reason: String },
    #[error("no transition {transition:?} from state {state:?} on instance {instance:?}")]
    InvalidTransition {
        instance: String,
        state: String,
        transition: String,
    },
    #[error("guard rejected transition {transition:?} on instance {instance:?}")]
    GuardRejected { instance: String, transition: String },
    #[error("auto-transition chain on instance {instance:?} exceeded depth {depth}")]
    AutoChainTooDeep { instance: String, depth: u32 },
    #[error("ambiguous auto-transitions from state {state:?} on instance {instance:?}: {candidates:?}")]
    AmbiguousAuto {
        instance: String,
        state: String,
        candidates: Vec<String>,
    },
    #[error("transition pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Process-level tunables for the state machine engine.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowEngineConfig {
    pub max_auto_chain_depth: u32,
}

impl Default for WorkflowEngineConfig {
    fn default() -> Self {
        Self {
            max_auto_chain_depth: 32,
        }
    }
}

/// Evaluates a transition's `guard` expression against the merged
/// instance/call data. `guard` is a template string; after placeholder
/// resolution, a single comparison operator (if present) is evaluated
/// numerically when both sides parse as numbers, string-wise otherwise.
/// With no operator, the resolved string is checked for truthiness.
/// Grounded on `transition/conditions.rs`'s `try_parse_comparison`, adapted
/// to work over an already-template-resolved string rather than a separate
/// `ConditionContext`.
fn guard_passes(guard: &Option<String>, merged: &Value) -> Result<bool, crate::template::TemplateError> {
    let Some(expr) = guard else {
        return Ok(true);
    };
    let pc = PipelineContext::new(merged.clone(), Value::Null);
    let resolved = crate::template::resolve(expr, &pc)?;
    Ok(evaluate_resolved_guard(&resolved))
}

const COMPARISON_OPERATORS: [&str; 6] = [">=", "<=", "==", "!=", ">", "<"];

fn evaluate_resolved_guard(resolved: &str) -> bool {
    for op in COMPARISON_OPERATORS {
        if let Some(idx) = resolved.find(op) {
            let left = resolved[..idx].trim();
            let right = resolved[idx + op.len()..].trim();
            return compare_operands(left, op, right);
        }
    }
    !matches!(resolved, "" | "false" | "0" | "null")
}

fn compare_operands(left: &str, op: &str, right: &str) -> bool {
    if let (Ok(l), Ok(r)) = (left.parse::<f64>(), right.parse::<f64>()) {
        return match op {
            ">=" => l >= r,
            "<=" => l <= r,
            "==" => (l - r).abs() < f64::EPSILON,
            "!=" => (l - r).abs() >= f64::EPSILON,
            ">" => l > r,
            "<" => l < r,
            _ => false,
        };
    }
    match op {
        "==" => left == right,
        "!=" => left != right,
        _ => false,
    }
}

fn merged_data(instance_data: &HashMap<String, Value>, call_data: &Value) -> Value {
    let mut merged = serde_json::Map::new();
    for (k, v) in instance_data {
        merged.insert(k.clone(), v.clone());
    }
    if let Some(call_obj) = call_data.as_object() {
        for (k, v) in call_obj {
            merged.insert(k.clone(), v.clone());
        }
    }
    Value::Object(merged)
}

fn data_to_map(value: Value) -> HashMap<String, Value> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}

/// Owns `WorkflowDefinition` and `WorkflowInstance` collections and runs
/// `trigger_transition`'s guarded-transition-plus-pipeline algorithm.
pub struct StateMachineEngine {
    config: WorkflowEngineConfig,
    definitions: RwLock<HashMap<String, WorkflowDefinition>>,
    instances: RwLock<HashMap<String, Arc<Mutex<WorkflowInstance>>>>,
    pipeline_engine: PipelineEngine,
    persistence: Option<Arc<dyn PersistenceStore>>,
}

impl StateMachineEngine {
    #[must_use]
    pub fn new(config: WorkflowEngineConfig) -> Self {
        Self {
            config,
            definitions: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            pipeline_engine: PipelineEngine::new(),
            persistence: None,
        }
    }

    #[must_use]
    pub fn with_persistence(mut self, store: Arc<dyn PersistenceStore>) -> Self {
        self.persistence = Some(store);
        self
    }

    /// Add or replace a definition. Idempotent; rejects a definition whose
    /// `initial_state` or any transition endpoint references an unknown
    /// state.
    pub async fn register_definition(&self, def: WorkflowDefinition) -> Result<(), StateMachineError> {
        validate_definition(&def)?;
        let mut definitions = self.definitions.write().await;
        definitions.insert(def.id.clone(), def);
        Ok(())
    }

    pub async fn create_workflow(
        &self,
        definition_id: &str,
        instance_id: &str,
        initial_data: Value,
    ) -> Result<WorkflowInstance, StateMachineError> {
        let definitions = self.definitions.read().await;
        let def = definitions
            .get(definition_id)
            .ok_or_else(|| StateMachineError::UnknownDefinition(definition_id.to_string()))?;

        let mut instances = self.instances.write().await;
        if instances.contains_key(instance_id) {
            return Err(StateMachineError::DuplicateInstance(instance_id.to_string()));
        }

        let instance = WorkflowInstance::new(
            instance_id.to_string(),
            definition_id.to_string(),
            def.initial_state.clone(),
            data_to_map(initial_data),
        );
        instances.insert(instance_id.to_string(), Arc::new(Mutex::new(instance.clone())));
        Ok(instance)
    }

    /// Deep-copy snapshot; the caller cannot mutate engine state through the
    /// returned value.
    pub async fn get_instance(&self, instance_id: &str) -> Result<WorkflowInstance, StateMachineError> {
        let instances = self.instances.read().await;
        let handle = instances
            .get(instance_id)
            .ok_or_else(|| StateMachineError::InstanceNotFound(instance_id.to_string()))?;
        Ok(handle.lock().await.clone())
    }

    pub async fn delete_instance(&self, instance_id: &str) -> Result<(), StateMachineError> {
        let mut instances = self.instances.write().await;
        instances
            .remove(instance_id)
            .map(|_| ())
            .ok_or_else(|| StateMachineError::InstanceNotFound(instance_id.to_string()))
    }

    /// Fire `transition_name` on `instance_id`, running any referenced
    /// pipeline and chasing auto-transitions up to the configured depth cap.
    pub async fn trigger_transition(
        &self,
        cancel: &CancellationToken,
        instance_id: &str,
        transition_name: &str,
        data: Value,
        pipelines: &PipelineRegistry,
    ) -> Result<(), StateMachineError> {
        let handle = {
            let instances = self.instances.read().await;
            instances
                .get(instance_id)
                .cloned()
                .ok_or_else(|| StateMachineError::InstanceNotFound(instance_id.to_string()))?
        };

        let mut instance = handle.lock().await;
        self.fire_locked(cancel, &mut instance, transition_name, data, pipelines, 0)
            .await
    }

    /// Boxed because this recurses across auto-transition chains; a plain
    /// `async fn` cannot represent a recursive future.
    #[allow(clippy::too_many_lines)]
    fn fire_locked<'a>(
        &'a self,
        cancel: &'a CancellationToken,
        instance: &'a mut WorkflowInstance,
        transition_name: &'a str,
        data: Value,
        pipelines: &'a PipelineRegistry,
        depth: u32,
    ) -> Pin<Box<dyn Future<Output = Result<(), StateMachineError>> + Send + 'a>> {
        Box::pin(self.fire_locked_inner(cancel, instance, transition_name, data, pipelines, depth))
    }

    /// Entry point for a call (`depth == 0`) keeps a snapshot taken before
    /// this frame does anything, so the whole attempted chain — the
    /// triggering transition plus whatever auto hops it sets off — can be
    /// undone as a unit. A failure deep in the chain (`AmbiguousAuto`,
    /// `AutoChainTooDeep`, ...) must not leave the triggering transition's
    /// own state change committed. The one exception is `Pipeline`: that
    /// error already carries its own narrower, spec-mandated revert (restore
    /// `current_state` only, keep the finalized failure history entry), done
    /// in place below, so it is excluded from this blanket restore.
    #[allow(clippy::too_many_lines)]
    async fn fire_locked_inner(
        &self,
        cancel: &CancellationToken,
        instance: &mut WorkflowInstance,
        transition_name: &str,
        data: Value,
        pipelines: &PipelineRegistry,
        depth: u32,
    ) -> Result<(), StateMachineError> {
        if depth > self.config.max_auto_chain_depth {
            return Err(StateMachineError::AutoChainTooDeep {
                instance: instance.id.clone(),
                depth,
            });
        }

        let pre_call_snapshot = (depth == 0).then(|| instance.clone());

        let result = self
            .fire_transition_once(cancel, instance, transition_name, data, pipelines, depth)
            .await;

        if let Err(err) = &result {
            if !matches!(err, StateMachineError::Pipeline(_)) {
                if let Some(snapshot) = pre_call_snapshot {
                    *instance = snapshot;
                }
            }
        }

        result
    }

    #[allow(clippy::too_many_lines)]
    async fn fire_transition_once(
        &self,
        cancel: &CancellationToken,
        instance: &mut WorkflowInstance,
        transition_name: &str,
        data: Value,
        pipelines: &PipelineRegistry,
        depth: u32,
    ) -> Result<(), StateMachineError> {
        let definitions = self.definitions.read().await;
        let def = definitions
            .get(&instance.definition_id)
            .ok_or_else(|| StateMachineError::UnknownDefinition(instance.definition_id.clone()))?;

        let transition = def
            .transitions_named(transition_name)
            .find(|t| t.matches_source(&instance.current_state))
            .cloned()
            .ok_or_else(|| StateMachineError::InvalidTransition {
                instance: instance.id.clone(),
                state: instance.current_state.clone(),
                transition: transition_name.to_string(),
            })?;

        let merged = merged_data(&instance.data, &data);
        if !guard_passes(&transition.guard, &merged).unwrap_or(false) {
            return Err(StateMachineError::GuardRejected {
                instance: instance.id.clone(),
                transition: transition_name.to_string(),
            });
        }

        for (key, value) in data_to_map(data) {
            instance.data.insert(key, value);
        }

        let previous_state = instance.current_state.clone();
        instance.current_state = transition.target.clone();
        let history_index = instance.history.len();
        instance.history.push(wovra_domain::workflow::HistoryEntry {
            timestamp: chrono::Utc::now(),
            from_state: previous_state.clone(),
            to_state: transition.target.clone(),
            transition_name: transition_name.to_string(),
            error: None,
        });

        if let Some(pipeline_name) = &transition.pipeline {
            let pipeline = pipelines.get(pipeline_name).await;
            let trigger_data = Value::Object(instance.data.clone().into_iter().collect());

            let run = match pipeline {
                Some(pipeline) => {
                    self.pipeline_engine
                        .execute(cancel, &pipeline, trigger_data, Value::Null)
                        .await
                }
                None => Err(PipelineError::Step {
                    step: pipeline_name.clone(),
                    source: crate::step::StepError::Message(format!(
                        "no pipeline registered under {pipeline_name:?}"
                    )),
                }),
            };

            match run {
                Ok(pc) => {
                    instance.data = data_to_map(pc.current().clone());
                }
                Err(err) => {
                    instance.current_state = previous_state;
                    instance.history[history_index].error = Some(err.to_string());
                    return Err(StateMachineError::Pipeline(err));
                }
            }
        }

        instance.last_updated = chrono::Utc::now();
        instance.completed = def.is_terminal(&instance.current_state);

        if let Some(store) = self.persistence.clone() {
            let snapshot = serde_json::to_value(&*instance).unwrap_or(Value::Null);
            let id = instance.id.clone();
            tokio::spawn(async move {
                if let Err(err) = store.save_resource("workflow_instances", &id, snapshot).await {
                    tracing::warn!(instance = %id, error = %err, "write-through persistence failed");
                }
            });
        }

        let candidates: Vec<&TransitionDefinition> = def
            .auto_transitions_from(&instance.current_state)
            .filter(|t| {
                let merged = merged_data(&instance.data, &Value::Null);
                guard_passes(&t.guard, &merged).unwrap_or(false)
            })
            .collect();

        match candidates.len() {
            0 => Ok(()),
            1 => {
                let next_name = candidates[0].name.clone();
                drop(definitions);

                // Reverting a failure here, if any, is the entry-point
                // wrapper's job (`fire_locked_inner`) — it holds the one
                // snapshot that predates the whole chain, not just this hop.
                self.fire_locked(cancel, instance, &next_name, Value::Null, pipelines, depth + 1)
                    .await
            }
            _ => Err(StateMachineError::AmbiguousAuto {
                instance: instance.id.clone(),
                state: instance.current_state.clone(),
                candidates: candidates.iter().map(|t| t.name.clone()).collect(),
            }),
        }
    }
}

fn validate_definition(def: &WorkflowDefinition) -> Result<(), StateMachineError> {
    if !def.states.contains(&def.initial_state) {
        return Err(StateMachineError::InvalidDefinition {
            id: def.id.clone(),
            reason: format!("initial_state {:?} is not in states", def.initial_state),
        });
    }
    for t in &def.transitions {
        if !def.states.contains(&t.target) {
            return Err(StateMachineError::InvalidDefinition {
                id: def.id.clone(),
                reason: format!("transition {:?} targets unknown state {:?}", t.name, t.target),
            });
        }
        for source in &t.sources {
            if source != wovra_domain::workflow::ANY_STATE && !def.states.contains(source) {
                return Err(StateMachineError::InvalidDefinition {
                    id: def.id.clone(),
                    reason: format!("transition {:?} sources unknown state {:?}", t.name, source),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wovra_domain::workflow::ANY_STATE;

    fn order_definition() -> WorkflowDefinition {
        WorkflowDefinition {
            id: "order".to_string(),
            initial_state: "pending".to_string(),
            states: vec!["pending".to_string(), "approved".to_string(), "cancelled".to_string()],
            transitions: vec![
                TransitionDefinition {
                    name: "approve".to_string(),
                    sources: vec!["pending".to_string()],
                    target: "approved".to_string(),
                    pipeline: None,
                    guard: None,
                    auto: false,
                },
                TransitionDefinition {
                    name: "cancel".to_string(),
                    sources: vec![ANY_STATE.to_string()],
                    target: "cancelled".to_string(),
                    pipeline: None,
                    guard: None,
                    auto: false,
                },
            ],
        }
    }

    #[tokio::test]
    async fn create_then_trigger_moves_state() {
        let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
        engine.register_definition(order_definition()).await.unwrap();
        engine.create_workflow("order", "ord_1", json!({})).await.unwrap();

        let cancel = CancellationToken::new();
        let pipelines = PipelineRegistry::new();
        engine
            .trigger_transition(&cancel, "ord_1", "approve", json!({}), &pipelines)
            .await
            .unwrap();

        let instance = engine.get_instance("ord_1").await.unwrap();
        assert_eq!(instance.current_state, "approved");
        assert_eq!(instance.history.len(), 1);
    }

    #[tokio::test]
    async fn unknown_transition_name_fails() {
        let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
        engine.register_definition(order_definition()).await.unwrap();
        engine.create_workflow("order", "ord_1", json!({})).await.unwrap();

        let cancel = CancellationToken::new();
        let pipelines = PipelineRegistry::new();
        let result = engine
            .trigger_transition(&cancel, "ord_1", "nonexistent", json!({}), &pipelines)
            .await;
        assert!(matches!(result, Err(StateMachineError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn wildcard_source_transition_fires_from_any_state() {
        let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
        engine.register_definition(order_definition()).await.unwrap();
        engine.create_workflow("order", "ord_1", json!({})).await.unwrap();

        let cancel = CancellationToken::new();
        let pipelines = PipelineRegistry::new();
        engine
            .trigger_transition(&cancel, "ord_1", "approve", json!({}), &pipelines)
            .await
            .unwrap();
        engine
            .trigger_transition(&cancel, "ord_1", "cancel", json!({}), &pipelines)
            .await
            .unwrap();

        let instance = engine.get_instance("ord_1").await.unwrap();
        assert_eq!(instance.current_state, "cancelled");
        assert!(instance.completed);
    }

    #[tokio::test]
    async fn guard_false_rejects_transition() {
        let mut def = order_definition();
        def.transitions[0].guard = Some("{{ .allowed }}".to_string());
        let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
        engine.register_definition(def).await.unwrap();
        engine.create_workflow("order", "ord_1", json!({})).await.unwrap();

        let cancel = CancellationToken::new();
        let pipelines = PipelineRegistry::new();
        let result = engine
            .trigger_transition(&cancel, "ord_1", "approve", json!({"allowed": false}), &pipelines)
            .await;
        assert!(matches!(result, Err(StateMachineError::GuardRejected { .. })));
    }

    #[tokio::test]
    async fn get_instance_returns_a_detached_snapshot() {
        let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
        engine.register_definition(order_definition()).await.unwrap();
        engine.create_workflow("order", "ord_1", json!({})).await.unwrap();

        let mut snapshot = engine.get_instance("ord_1").await.unwrap();
        snapshot.current_state = "mutated".to_string();

        let fresh = engine.get_instance("ord_1").await.unwrap();
        assert_eq!(fresh.current_state, "pending");
    }

    #[tokio::test]
    async fn invalid_definition_rejected_at_registration() {
        let mut def = order_definition();
        def.initial_state = "nonexistent".to_string();
        let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
        let result = engine.register_definition(def).await;
        assert!(matches!(result, Err(StateMachineError::InvalidDefinition { .. })));
    }

    #[tokio::test]
    async fn numeric_guard_rejects_zero_and_accepts_positive() {
        let mut def = order_definition();
        def.transitions[0].name = "pay".to_string();
        def.transitions[0].guard = Some("{{ .amount }} > 0".to_string());
        let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
        engine.register_definition(def).await.unwrap();

        engine.create_workflow("order", "ord_zero", json!({})).await.unwrap();
        let cancel = CancellationToken::new();
        let pipelines = PipelineRegistry::new();
        let rejected = engine
            .trigger_transition(&cancel, "ord_zero", "pay", json!({"amount": 0}), &pipelines)
            .await;
        assert!(matches!(rejected, Err(StateMachineError::GuardRejected { .. })));

        engine.create_workflow("order", "ord_ten", json!({})).await.unwrap();
        engine
            .trigger_transition(&cancel, "ord_ten", "pay", json!({"amount": 10}), &pipelines)
            .await
            .unwrap();
        let instance = engine.get_instance("ord_ten").await.unwrap();
        assert_eq!(instance.current_state, "approved");
    }

    #[tokio::test]
    async fn pipeline_failure_reverts_state_and_records_history_error() {
        let mut def = order_definition();
        def.transitions[0].pipeline = Some("missing_pipeline".to_string());
        let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
        engine.register_definition(def).await.unwrap();
        engine.create_workflow("order", "ord_1", json!({})).await.unwrap();

        let cancel = CancellationToken::new();
        let pipelines = PipelineRegistry::new();
        let result = engine
            .trigger_transition(&cancel, "ord_1", "approve", json!({}), &pipelines)
            .await;
        assert!(matches!(result, Err(StateMachineError::Pipeline(_))));

        let instance = engine.get_instance("ord_1").await.unwrap();
        assert_eq!(instance.current_state, "pending");
        assert_eq!(instance.history.len(), 1);
        assert!(instance.history[0].error.is_some());
    }

    fn chain_definition(max_depth: u32) -> (WorkflowDefinition, WorkflowEngineConfig) {
        let def = WorkflowDefinition {
            id: "chain".to_string(),
            initial_state: "trigger".to_string(),
            states: vec![
                "trigger".to_string(),
                "a0".to_string(),
                "a1".to_string(),
                "a2".to_string(),
            ],
            transitions: vec![
                TransitionDefinition {
                    name: "start".to_string(),
                    sources: vec!["trigger".to_string()],
                    target: "a0".to_string(),
                    pipeline: None,
                    guard: None,
                    auto: false,
                },
                TransitionDefinition {
                    name: "auto_a0_a1".to_string(),
                    sources: vec!["a0".to_string()],
                    target: "a1".to_string(),
                    pipeline: None,
                    guard: None,
                    auto: true,
                },
                TransitionDefinition {
                    name: "auto_a1_a2".to_string(),
                    sources: vec!["a1".to_string()],
                    target: "a2".to_string(),
                    pipeline: None,
                    guard: None,
                    auto: true,
                },
            ],
        };
        (def, WorkflowEngineConfig { max_auto_chain_depth: max_depth })
    }

    #[tokio::test]
    async fn auto_chain_exceeding_depth_cap_reverts_the_whole_chain() {
        let (def, config) = chain_definition(1);
        let engine = StateMachineEngine::new(config);
        engine.register_definition(def).await.unwrap();
        engine.create_workflow("chain", "c_1", json!({})).await.unwrap();

        let cancel = CancellationToken::new();
        let pipelines = PipelineRegistry::new();
        let result = engine
            .trigger_transition(&cancel, "c_1", "start", json!({}), &pipelines)
            .await;
        assert!(matches!(result, Err(StateMachineError::AutoChainTooDeep { .. })));

        // Reverted to the state from before the call altogether: the
        // triggering "start" transition is undone along with the auto-chain
        // it kicked off, not just the last hop.
        let instance = engine.get_instance("c_1").await.unwrap();
        assert_eq!(instance.current_state, "trigger");
        assert_eq!(instance.history.len(), 0);
    }

    #[tokio::test]
    async fn ambiguous_auto_transitions_fail_before_taking_any_hop() {
        let def = WorkflowDefinition {
            id: "ship".to_string(),
            initial_state: "paid".to_string(),
            states: vec!["paid".to_string(), "shipped".to_string(), "archived".to_string()],
            transitions: vec![
                TransitionDefinition {
                    name: "ship".to_string(),
                    sources: vec!["paid".to_string()],
                    target: "shipped".to_string(),
                    pipeline: None,
                    guard: None,
                    auto: false,
                },
                TransitionDefinition {
                    name: "auto_archive_a".to_string(),
                    sources: vec!["shipped".to_string()],
                    target: "archived".to_string(),
                    pipeline: None,
                    guard: None,
                    auto: true,
                },
                TransitionDefinition {
                    name: "auto_archive_b".to_string(),
                    sources: vec!["shipped".to_string()],
                    target: "archived".to_string(),
                    pipeline: None,
                    guard: None,
                    auto: true,
                },
            ],
        };
        let engine = StateMachineEngine::new(WorkflowEngineConfig::default());
        engine.register_definition(def).await.unwrap();
        engine.create_workflow("ship", "s_1", json!({})).await.unwrap();

        let cancel = CancellationToken::new();
        let pipelines = PipelineRegistry::new();
        let result = engine
            .trigger_transition(&cancel, "s_1", "ship", json!({}), &pipelines)
            .await;
        assert!(matches!(result, Err(StateMachineError::AmbiguousAuto { .. })));

        // The triggering "ship" transition is reverted along with it: the
        // instance never ends up stuck in the ambiguous state.
        let instance = engine.get_instance("s_1").await.unwrap();
        assert_eq!(instance.current_state, "paid");
        assert_eq!(instance.history.len(), 0);
    }
}
