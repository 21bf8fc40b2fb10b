//! Shared machinery behind the `workflow_call` and `sub_workflow` step
//! types (C6): config parsing, input/output mapping, and sync/async
//! invocation against an already-resolved child [`Pipeline`].
//!
//! The teacher's `executor::sub_workflow::SubWorkflowStepExecutor::execute`
//! was a stub that polled a `_sub_workflow_state` context flag rather than
//! invoking anything; `invoke` below genuinely runs the child pipeline
//! through `PipelineEngine::execute`. The dotted-path mapping helpers keep
//! the teacher's `get_nested_value`/`set_nested_value` shape.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::app::AppHandle;
use crate::pipeline::Pipeline;
use crate::registry::StepFactoryError;
use crate::step::{StepError, StepResult};
use crate::template;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubWorkflowError {
    #[error("sub-workflow timed out")]
    Timeout,
    #[error("unresolved workflow {0:?}")]
    Unresolved(String),
    #[error("child pipeline failed: {0}")]
    Child(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sync,
    Async,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub workflow: String,
    pub mode: Mode,
    pub input_mapping: HashMap<String, String>,
    pub output_mapping: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

/// Parse the shared `workflow` / `mode` / `input_mapping` / `output_mapping`
/// / `timeout` configuration shape.
pub fn parse_config(step: &str, config: &Value) -> Result<CoordinatorConfig, StepFactoryError> {
    let workflow = config
        .get("workflow")
        .and_then(Value::as_str)
        .ok_or_else(|| StepFactoryError::MissingKey {
            step: step.to_string(),
            key: "workflow",
        })?
        .to_string();

    let mode = match config.get("mode").and_then(Value::as_str) {
        None | Some("sync") => Mode::Sync,
        Some("async") => Mode::Async,
        Some(other) => {
            return Err(StepFactoryError::InvalidValue {
                step: step.to_string(),
                key: "mode",
                reason: format!("expected \"sync\" or \"async\", got {other:?}"),
            })
        }
    };

    let input_mapping = parse_string_map(config.get("input_mapping"));
    let output_mapping = parse_string_map(config.get("output_mapping"));

    let timeout = match config.get("timeout").and_then(Value::as_str) {
        None => None,
        Some(raw) => Some(parse_duration(raw).map_err(|reason| StepFactoryError::InvalidValue {
            step: step.to_string(),
            key: "timeout",
            reason,
        })?),
    };

    Ok(CoordinatorConfig {
        workflow,
        mode,
        input_mapping,
        output_mapping,
        timeout,
    })
}

fn parse_string_map(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Minimal duration-string parser: `"500ms"`, `"5s"`, `"2m"`.
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

/// Build `trigger_data` for the child pipeline: `input_mapping` resolved as
/// templates over the caller's context, or the caller's `current` passed
/// through unchanged when no mapping is configured.
pub fn build_input(cfg: &CoordinatorConfig, pc: &crate::context::PipelineContext) -> Result<Value, StepError> {
    if cfg.input_mapping.is_empty() {
        return Ok(pc.current().clone());
    }
    let mut mapped = Map::with_capacity(cfg.input_mapping.len());
    for (target_key, expr) in &cfg.input_mapping {
        let resolved = template::resolve(expr, pc)?;
        mapped.insert(target_key.clone(), Value::String(resolved));
    }
    Ok(Value::Object(mapped))
}

/// Build the step's output from `output_mapping` resolved against the
/// child's final `current`, or the entire child `current` under `result`
/// when no mapping is configured.
pub fn build_output(cfg: &CoordinatorConfig, child_current: &Value) -> Map<String, Value> {
    if cfg.output_mapping.is_empty() {
        let mut out = Map::with_capacity(1);
        out.insert("result".to_string(), child_current.clone());
        return out;
    }
    let mut out = Map::with_capacity(cfg.output_mapping.len());
    for (caller_key, child_path) in &cfg.output_mapping {
        if let Some(value) = get_dotted(child_current, child_path) {
            out.insert(caller_key.clone(), value.clone());
        }
    }
    out
}

fn get_dotted<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = value;
    for segment in path.split('.') {
        node = node.get(segment)?;
    }
    Some(node)
}

/// Invoke `pipeline` (already resolved by the caller from whichever
/// namespace applies — pipeline registry for `workflow_call`, plugin
/// registry for `sub_workflow`) per `cfg.mode`.
pub async fn invoke(
    app: &AppHandle,
    cfg: &CoordinatorConfig,
    pipeline: Arc<Pipeline>,
    pc: &crate::context::PipelineContext,
    cancel: &CancellationToken,
) -> Result<StepResult, StepError> {
    let trigger_data = build_input(cfg, pc)?;

    match cfg.mode {
        Mode::Sync => {
            let child_cancel = cancel.child_token();
            let exec = app
                .engine
                .execute(&child_cancel, &pipeline, trigger_data, Value::Null);

            let child_pc = match cfg.timeout {
                Some(timeout) => tokio::time::timeout(timeout, exec)
                    .await
                    .map_err(|_| StepError::SubWorkflow(SubWorkflowError::Timeout))?
                    .map_err(|e| StepError::SubWorkflow(SubWorkflowError::Child(e.to_string())))?,
                None => exec
                    .await
                    .map_err(|e| StepError::SubWorkflow(SubWorkflowError::Child(e.to_string())))?,
            };

            Ok(StepResult::with_output(build_output(cfg, child_pc.current())))
        }
        Mode::Async => {
            let engine = Arc::clone(&app.engine);
            let workflow_name = cfg.workflow.clone();
            let detached = CancellationToken::new();

            tokio::spawn(async move {
                if let Err(err) = engine.execute(&detached, &pipeline, trigger_data, Value::Null).await {
                    tracing::warn!(workflow = %workflow_name, error = %err, "async sub-workflow dispatch failed");
                }
            });

            let mut out = Map::with_capacity(3);
            out.insert("dispatched".to_string(), Value::Bool(true));
            out.insert("mode".to_string(), Value::String("async".to_string()));
            out.insert("workflow".to_string(), Value::String(cfg.workflow.clone()));
            Ok(StepResult::with_output(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("5x").is_err());
    }

    #[test]
    fn build_output_defaults_to_result_key() {
        let cfg = CoordinatorConfig {
            workflow: "child".to_string(),
            mode: Mode::Sync,
            input_mapping: HashMap::new(),
            output_mapping: HashMap::new(),
            timeout: None,
        };
        let out = build_output(&cfg, &json!({"a": 1}));
        assert_eq!(out["result"], json!({"a": 1}));
    }

    #[test]
    fn build_output_applies_mapping() {
        let mut output_mapping = HashMap::new();
        output_mapping.insert("payment_id".to_string(), "payment.id".to_string());
        let cfg = CoordinatorConfig {
            workflow: "child".to_string(),
            mode: Mode::Sync,
            input_mapping: HashMap::new(),
            output_mapping,
            timeout: None,
        };
        let out = build_output(&cfg, &json!({"payment": {"id": "pay_123"}}));
        assert_eq!(out["payment_id"], json!("pay_123"));
    }
}
