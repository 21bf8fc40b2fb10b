//! `step.delay`: sleeps for a configured duration, honoring cancellation.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app::AppHandle;
use crate::context::PipelineContext;
use crate::registry::StepFactoryError;
use crate::step::{PipelineStep, StepError, StepResult};

pub struct DelayStep {
    name: String,
    duration: Duration,
}

#[async_trait]
impl PipelineStep for DelayStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _pc: &PipelineContext,
    ) -> Result<StepResult, StepError> {
        tokio::select! {
            () = tokio::time::sleep(self.duration) => {}
            () = cancel.cancelled() => {}
        }
        Ok(StepResult::with_output(Map::new()))
    }
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    let (digits, unit) = raw.split_at(
        raw.find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("missing unit in duration {raw:?}"))?,
    );
    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration {raw:?}"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        other => Err(format!("unknown duration unit {other:?} in {raw:?}")),
    }
}

pub fn factory(
    name: &str,
    config: &Value,
    _app: &AppHandle,
) -> Result<Box<dyn PipelineStep>, StepFactoryError> {
    let raw = config
        .get("duration")
        .and_then(Value::as_str)
        .ok_or_else(|| StepFactoryError::MissingKey {
            step: name.to_string(),
            key: "duration",
        })?;
    let duration = parse_duration(raw).map_err(|reason| StepFactoryError::InvalidValue {
        step: name.to_string(),
        key: "duration",
        reason,
    })?;

    Ok(Box::new(DelayStep {
        name: name.to_string(),
        duration,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn delay_completes_after_duration() {
        let app = AppHandle::new(std::sync::Arc::new(crate::external::ServiceRegistry::new()));
        let step = factory("wait", &json!({"duration": "5ms"}), &app).unwrap();
        let pc = PipelineContext::new(json!({}), json!({}));
        let cancel = CancellationToken::new();
        step.execute(&cancel, &pc).await.unwrap();
    }

    #[tokio::test]
    async fn delay_honors_cancellation() {
        let app = AppHandle::new(std::sync::Arc::new(crate::external::ServiceRegistry::new()));
        let step = factory("wait", &json!({"duration": "2m"}), &app).unwrap();
        let pc = PipelineContext::new(json!({}), json!({}));
        let cancel = CancellationToken::new();
        cancel.cancel();
        step.execute(&cancel, &pc).await.unwrap();
    }
}
