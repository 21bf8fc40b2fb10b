//! `step.branch`: evaluates a templated condition and jumps to one of two
//! configured step names based on its truthiness.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::app::AppHandle;
use crate::context::PipelineContext;
use crate::registry::StepFactoryError;
use crate::step::{PipelineStep, StepError, StepResult};
use crate::template;

pub struct BranchStep {
    name: String,
    condition: String,
    when_true: String,
    when_false: Option<String>,
}

fn is_truthy(raw: &str) -> bool {
    !matches!(raw, "" | "false" | "0" | "null")
}

#[async_trait]
impl PipelineStep for BranchStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
        pc: &PipelineContext,
    ) -> Result<StepResult, StepError> {
        let resolved = template::resolve(&self.condition, pc)?;
        let result = StepResult::with_output(Map::new());
        if is_truthy(&resolved) {
            Ok(result.jump_to(self.when_true.clone()))
        } else {
            match &self.when_false {
                Some(target) => Ok(result.jump_to(target.clone())),
                None => Ok(result),
            }
        }
    }
}

pub fn factory(
    name: &str,
    config: &Value,
    _app: &AppHandle,
) -> Result<Box<dyn PipelineStep>, StepFactoryError> {
    let condition = config
        .get("condition")
        .and_then(Value::as_str)
        .ok_or_else(|| StepFactoryError::MissingKey {
            step: name.to_string(),
            key: "condition",
        })?
        .to_string();

    let when_true = config
        .get("when_true")
        .and_then(Value::as_str)
        .ok_or_else(|| StepFactoryError::MissingKey {
            step: name.to_string(),
            key: "when_true",
        })?
        .to_string();

    let when_false = config
        .get("when_false")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Box::new(BranchStep {
        name: name.to_string(),
        condition,
        when_true,
        when_false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn branch_jumps_true_on_truthy_condition() {
        let app = AppHandle::new(std::sync::Arc::new(crate::external::ServiceRegistry::new()));
        let step = factory(
            "check",
            &json!({"condition": "{{ .flag }}", "when_true": "approve", "when_false": "reject"}),
            &app,
        )
        .unwrap();

        let pc = PipelineContext::new(json!({"flag": true}), json!({}));
        let cancel = CancellationToken::new();
        let result = step.execute(&cancel, &pc).await.unwrap();
        assert_eq!(result.next_step.as_deref(), Some("approve"));
    }

    #[tokio::test]
    async fn branch_falls_through_without_when_false() {
        let app = AppHandle::new(std::sync::Arc::new(crate::external::ServiceRegistry::new()));
        let step = factory(
            "check",
            &json!({"condition": "{{ .flag }}", "when_true": "approve"}),
            &app,
        )
        .unwrap();

        let pc = PipelineContext::new(json!({"flag": false}), json!({}));
        let cancel = CancellationToken::new();
        let result = step.execute(&cancel, &pc).await.unwrap();
        assert_eq!(result.next_step, None);
    }
}
