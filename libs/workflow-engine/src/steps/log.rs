//! `step.log`: resolves a templated message and emits it through `tracing`
//! at a configurable level. Produces no output.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::app::AppHandle;
use crate::context::PipelineContext;
use crate::registry::StepFactoryError;
use crate::step::{PipelineStep, StepError, StepResult};
use crate::template;

#[derive(Debug, Clone, Copy)]
enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level {other:?}")),
        }
    }
}

pub struct LogStep {
    name: String,
    message: String,
    level: Level,
}

#[async_trait]
impl PipelineStep for LogStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
        pc: &PipelineContext,
    ) -> Result<StepResult, StepError> {
        let message = template::resolve(&self.message, pc)?;
        match self.level {
            Level::Trace => tracing::trace!(step = %self.name, "{message}"),
            Level::Debug => tracing::debug!(step = %self.name, "{message}"),
            Level::Info => tracing::info!(step = %self.name, "{message}"),
            Level::Warn => tracing::warn!(step = %self.name, "{message}"),
            Level::Error => tracing::error!(step = %self.name, "{message}"),
        }
        Ok(StepResult::with_output(Map::new()))
    }
}

pub fn factory(
    name: &str,
    config: &Value,
    _app: &AppHandle,
) -> Result<Box<dyn PipelineStep>, StepFactoryError> {
    let message = config
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| StepFactoryError::MissingKey {
            step: name.to_string(),
            key: "message",
        })?
        .to_string();

    let level = match config.get("level").and_then(Value::as_str) {
        None => Level::Info,
        Some(raw) => Level::parse(raw).map_err(|reason| StepFactoryError::InvalidValue {
            step: name.to_string(),
            key: "level",
            reason,
        })?,
    };

    Ok(Box::new(LogStep {
        name: name.to_string(),
        message,
        level,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn log_resolves_message_and_produces_no_output() {
        let app = AppHandle::new(std::sync::Arc::new(crate::external::ServiceRegistry::new()));
        let step = factory(
            "announce",
            &json!({"message": "order {{ .trigger.order_id }} received", "level": "info"}),
            &app,
        )
        .unwrap();

        let pc = PipelineContext::new(json!({"order_id": "ord_1"}), json!({}));
        let cancel = CancellationToken::new();
        let result = step.execute(&cancel, &pc).await.unwrap();
        assert!(result.output.is_empty());
    }

    #[test]
    fn invalid_level_rejected_at_construction() {
        let app = AppHandle::new(std::sync::Arc::new(crate::external::ServiceRegistry::new()));
        let result = factory("bad", &json!({"message": "hi", "level": "verbose"}), &app);
        assert!(matches!(result, Err(StepFactoryError::InvalidValue { .. })));
    }
}
