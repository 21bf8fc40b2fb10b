//! Step registry & factories (C3): step-type string -> constructor,
//! validated once at pipeline-construction time.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::app::AppHandle;
use crate::step::PipelineStep;
use crate::steps;

#[derive(Debug, Error)]
pub enum StepFactoryError {
    #[error("step {step:?}: missing required config key {key:?}")]
    MissingKey { step: String, key: &'static str },
    #[error("step {step:?}: invalid value for {key:?}: {reason}")]
    InvalidValue {
        step: String,
        key: &'static str,
        reason: String,
    },
    #[error("no factory registered for step type {0:?}")]
    UnknownType(String),
}

/// `(step_name, config, app) -> step`. Registered once per step type at
/// engine construction; the registry itself is immutable during execution.
pub type StepFactory =
    Arc<dyn Fn(&str, &Value, &AppHandle) -> Result<Box<dyn PipelineStep>, StepFactoryError> + Send + Sync>;

/// Maps step-type strings (`step.set`, `step.workflow_call`, ...) to
/// factories. Grounded on the teacher's `HandlerRegistry`
/// (`HashMap<String, Arc<dyn Handler>>`) shape.
#[derive(Default)]
pub struct StepRegistry {
    factories: HashMap<String, StepFactory>,
}

impl StepRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry carrying the engine's built-in step types: `step.set`,
    /// `step.log`, `step.workflow_call`, `step.sub_workflow`,
    /// `step.http_request`, `step.delay`, `step.branch`. Platform-specific
    /// step types (`step.ai_complete`, `step.argo_submit`,
    /// `step.s3_upload`, `step.marketplace_*`, ...) are reachable through
    /// the same `register` contract but ship no implementation here — an
    /// integrating application registers its own factory for them, the way
    /// `apps/api` would register deployment-specific handlers against the
    /// teacher's `HandlerRegistry`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("step.set", Arc::new(steps::set::factory));
        registry.register("step.log", Arc::new(steps::log::factory));
        registry.register("step.workflow_call", Arc::new(steps::workflow_call::factory));
        registry.register("step.sub_workflow", Arc::new(steps::sub_workflow::factory));
        registry.register("step.http_request", Arc::new(steps::http_request::factory));
        registry.register("step.delay", Arc::new(steps::delay::factory));
        registry.register("step.branch", Arc::new(steps::branch::factory));
        registry
    }

    pub fn register(&mut self, step_type: impl Into<String>, factory: StepFactory) {
        self.factories.insert(step_type.into(), factory);
    }

    #[must_use]
    pub fn get(&self, step_type: &str) -> Option<&StepFactory> {
        self.factories.get(step_type)
    }

    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build a step instance. Factory errors surface here, at construction
    /// time, never at `execute` time.
    pub fn build(
        &self,
        step_type: &str,
        step_name: &str,
        config: &Value,
        app: &AppHandle,
    ) -> Result<Box<dyn PipelineStep>, StepFactoryError> {
        let factory = self
            .get(step_type)
            .ok_or_else(|| StepFactoryError::UnknownType(step_type.to_string()))?;
        factory(step_name, config, app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_builtins_registers_all_expected_types() {
        let registry = StepRegistry::with_builtins();
        for expected in [
            "step.set",
            "step.log",
            "step.workflow_call",
            "step.sub_workflow",
            "step.http_request",
            "step.delay",
            "step.branch",
        ] {
            assert!(registry.get(expected).is_some(), "missing {expected}");
        }
    }

    #[test]
    fn build_unknown_type_fails_at_construction() {
        let registry = StepRegistry::with_builtins();
        let app = AppHandle::new(Arc::new(crate::external::ServiceRegistry::new()));
        let result = registry.build("step.nonexistent", "s", &Value::Null, &app);
        assert!(matches!(result, Err(StepFactoryError::UnknownType(_))));
    }
}
