//! `step.sub_workflow`: invokes a pipeline registered under the plugin
//! namespace (a `plugin:` prefix on `workflow` is stripped before lookup,
//! matching the teacher's plugin-key convention).

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::app::AppHandle;
use crate::context::PipelineContext;
use crate::registry::StepFactoryError;
use crate::step::{PipelineStep, StepError, StepResult};

use super::coordinator::{self, CoordinatorConfig, SubWorkflowError};

pub struct SubWorkflowStep {
    name: String,
    cfg: CoordinatorConfig,
    plugin_key: String,
    app: AppHandle,
}

#[async_trait]
impl PipelineStep for SubWorkflowStep {
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
            .plugins
            .get(&self.plugin_key)
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
    let plugin_key = cfg
        .workflow
        .strip_prefix("plugin:")
        .unwrap_or(&cfg.workflow)
        .to_string();
    Ok(Box::new(SubWorkflowStep {
        name: name.to_string(),
        cfg,
        plugin_key,
        app: app.clone(),
    }))
}
