//! The `PipelineStep` capability and its result/error types.

use async_trait::async_trait;
use serde_json::Map;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::PipelineContext;
use crate::steps::coordinator::SubWorkflowError;
use crate::template::TemplateError;

/// What a step hands back to the pipeline engine after running.
#[derive(Debug, Clone, Default)]
pub struct StepResult {
    /// Merged into the context after success.
    pub output: Map<String, serde_json::Value>,
    /// When true, the pipeline terminates successfully after this step.
    pub stop: bool,
    /// When set, execution jumps to the named step (forward-only).
    pub next_step: Option<String>,
}

impl StepResult {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_output(output: Map<String, serde_json::Value>) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn stop(mut self) -> Self {
        self.stop = true;
        self
    }

    #[must_use]
    pub fn jump_to(mut self, step_name: impl Into<String>) -> Self {
        self.next_step = Some(step_name.into());
        self
    }
}

/// Errors a step's `execute` may return. Construction-time validation
/// failures belong to `StepFactoryError`; this is for runtime failures only.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    SubWorkflow(#[from] SubWorkflowError),
    #[error("http request failed: {0}")]
    Http(String),
}

/// A single unit of pipeline work, constructed by a factory keyed by step
/// type string and executed repeatedly (once per pipeline run it appears
/// in).
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// The step's name within its pipeline (used for `NextStep` jumps and
    /// as the `step_outputs` key).
    fn name(&self) -> &str;

    /// Run the step against a read-only view of the context. The engine,
    /// not the step, is responsible for merging `StepResult.output` back
    /// into the context.
    async fn execute(
        &self,
        cancel: &CancellationToken,
        pc: &PipelineContext,
    ) -> Result<StepResult, StepError>;
}
