//! `step.workflow_call`: invokes another pipeline registered by name
//! against the same engine's [`PipelineRegistry`].

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::app::AppHandle;
use crate::context::PipelineContext;
use crate::registry::StepFactoryError;
use crate::step::{PipelineStep, StepError, StepResult};

use super::coordinator::{self, CoordinatorConfig, SubWorkflowError};

pub struct WorkflowCallStep {
    name: String,
    cfg: CoordinatorConfig,
    app: AppHandle,
}

#[async_trait]
impl PipelineStep for WorkflowCallStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        pc: &PipelineContext,
    ) -> Result<StepResult, StepError> {
        let pipeline = self
            .app
            .pipelines
            .get(&self.cfg.workflow)
            .await
            .ok_or_else(|| StepError::SubWorkflow(SubWorkflowError::Unresolved(self.cfg.workflow.clone())))?;

        coordinator::invoke(&self.app, &self.cfg, pipeline, pc, cancel).await
    }
}

pub fn factory(
    name: &str,
    config: &Value,
    app: &AppHandle,
) -> Result<Box<dyn PipelineStep>, StepFactoryError> {
    let cfg = coordinator::parse_config(name, config)?;
    Ok(Box::new(WorkflowCallStep {
        name: name.to_string(),
        cfg,
        app: app.clone(),
    }))
}
