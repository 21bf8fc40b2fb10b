//! `step.set`: resolves a map of output keys to template expressions
//! against the pipeline context and publishes the result.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::app::AppHandle;
use crate::context::PipelineContext;
use crate::registry::StepFactoryError;
use crate::step::{PipelineStep, StepError, StepResult};
use crate::template;

pub struct SetStep {
    name: String,
    values: Map<String, Value>,
}

#[async_trait]
impl PipelineStep for SetStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
        pc: &PipelineContext,
    ) -> Result<StepResult, StepError> {
        let mut output = Map::with_capacity(self.values.len());
        for (key, expr) in &self.values {
            let resolved = template::resolve_value(expr, pc)?;
            output.insert(key.clone(), resolved);
        }
        Ok(StepResult::with_output(output))
    }
}

pub fn factory(
    name: &str,
    config: &Value,
    _app: &AppHandle,
) -> Result<Box<dyn PipelineStep>, StepFactoryError> {
    let values = config
        .get("values")
        .and_then(Value::as_object)
        .ok_or_else(|| StepFactoryError::MissingKey {
            step: name.to_string(),
            key: "values",
        })?
        .clone();

    Ok(Box::new(SetStep {
        name: name.to_string(),
        values,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_resolves_templates_into_output() {
        let app = AppHandle::new(std::sync::Arc::new(crate::external::ServiceRegistry::new()));
        let step = factory(
            "set_total",
            &json!({"values": {"total": "{{ .amount }}", "label": "flat"}}),
            &app,
        )
        .unwrap();

        let pc = PipelineContext::new(json!({"amount": 42}), json!({}));
        let cancel = CancellationToken::new();
        let result = step.execute(&cancel, &pc).await.unwrap();

        assert_eq!(result.output["total"], json!("42"));
        assert_eq!(result.output["label"], json!("flat"));
    }
}
