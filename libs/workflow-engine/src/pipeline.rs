//! Pipeline execution engine (C4): runs an immutable, named sequence of
//! steps over a fresh [`PipelineContext`].

use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, Span};

use crate::context::PipelineContext;
use crate::step::{PipelineStep, StepError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("step {step:?} failed: {source}")]
    Step {
        step: String,
        #[source]
        source: StepError,
    },
    #[error("pipeline canceled")]
    Canceled,
}

/// A named, ordered, immutable sequence of steps. Has no per-execution
/// state of its own; all state lives in the `PipelineContext` passed to
/// `PipelineEngine::execute`.
pub struct Pipeline {
    name: String,
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<Box<dyn PipelineStep>>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn steps(&self) -> &[Box<dyn PipelineStep>] {
        &self.steps
    }
}

/// Stateless executor for `Pipeline` values. Holds no global lock and no
/// per-execution state of its own — every field needed to run a pipeline is
/// passed into `execute`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineEngine;

impl PipelineEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run `pipeline` to completion or failure. `trigger_data` seeds both
    /// `TriggerData` and the initial `Current`; `metadata` is carried
    /// alongside without being promoted into `Current`.
    #[instrument(skip(self, pipeline, cancel), fields(pipeline = pipeline.name()))]
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        pipeline: &Pipeline,
        trigger_data: Value,
        metadata: Value,
    ) -> Result<PipelineContext, PipelineError> {
        let mut pc = PipelineContext::new(trigger_data, metadata);
        let steps = pipeline.steps();
        let mut index = 0usize;

        while index < steps.len() {
            if cancel.is_cancelled() {
                return Err(PipelineError::Canceled);
            }

            let step = &steps[index];
            let span = Span::current();
            let _entered = span.enter();

            let result = step
                .execute(cancel, &pc)
                .await
                .map_err(|source| PipelineError::Step {
                    step: step.name().to_string(),
                    source,
                })?;

            pc.merge_step_output(step.name(), result.output);

            if result.stop {
                return Ok(pc);
            }

            if let Some(target) = result.next_step {
                match steps[index + 1..].iter().position(|s| s.name() == target) {
                    Some(rel) => {
                        index += 1 + rel;
                        continue;
                    }
                    None => return Ok(pc),
                }
            }

            index += 1;
        }

        Ok(pc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepResult;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedStep {
        name: String,
        result: StepResult,
    }

    #[async_trait]
    impl PipelineStep for FixedStep {
        fn name(&self) -> &str {
            &self.name
        }

        async fn execute(
            &self,
            _cancel: &CancellationToken,
            _pc: &PipelineContext,
        ) -> Result<StepResult, StepError> {
            Ok(self.result.clone())
        }
    }

    fn step(name: &str, output_key: &str, output_val: Value) -> Box<dyn PipelineStep> {
        let mut output = serde_json::Map::new();
        output.insert(output_key.to_string(), output_val);
        Box::new(FixedStep {
            name: name.to_string(),
            result: StepResult::with_output(output),
        })
    }

    #[tokio::test]
    async fn next_step_skips_intervening_steps() {
        let mut a_output = serde_json::Map::new();
        a_output.insert("ran".to_string(), json!("a"));
        let a = Box::new(FixedStep {
            name: "a".to_string(),
            result: StepResult::with_output(a_output).jump_to("c"),
        });
        let b = step("b", "ran", json!("b"));
        let c = step("c", "ran", json!("c"));

        let pipeline = Pipeline::new("p", vec![a, b, c]);
        let engine = PipelineEngine::new();
        let cancel = CancellationToken::new();

        let pc = engine
            .execute(&cancel, &pipeline, json!({}), json!({}))
            .await
            .unwrap();

        assert!(pc.step_outputs().contains_key("a"));
        assert!(!pc.step_outputs().contains_key("b"));
        assert!(pc.step_outputs().contains_key("c"));
    }

    #[tokio::test]
    async fn stop_terminates_successfully() {
        let a = Box::new(FixedStep {
            name: "a".to_string(),
            result: StepResult::empty().stop(),
        });
        let b = step("b", "ran", json!("b"));

        let pipeline = Pipeline::new("p", vec![a, b]);
        let engine = PipelineEngine::new();
        let cancel = CancellationToken::new();

        let pc = engine
            .execute(&cancel, &pipeline, json!({}), json!({}))
            .await
            .unwrap();

        assert!(!pc.step_outputs().contains_key("b"));
    }

    #[tokio::test]
    async fn canceled_before_first_step_fails() {
        let a = step("a", "ran", json!("a"));
        let pipeline = Pipeline::new("p", vec![a]);
        let engine = PipelineEngine::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine.execute(&cancel, &pipeline, json!({}), json!({})).await;
        assert!(matches!(result, Err(PipelineError::Canceled)));
    }
}
