//! Pipeline context: the shared, progressively-merged state a pipeline
//! execution carries between steps.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("trigger data must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// State threaded through a single pipeline execution.
///
/// Owned by exactly one execution; not `Sync`-safe to share across
/// concurrent tasks. A step that launches background work must clone out
/// whatever it needs rather than hand out a reference into this struct.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    trigger_data: Value,
    current: Value,
    step_outputs: HashMap<String, Map<String, Value>>,
    metadata: Value,
}

impl PipelineContext {
    /// `current` is initialized to a shallow copy of `trigger_data`;
    /// `step_outputs` starts empty.
    #[must_use]
    pub fn new(trigger_data: Value, metadata: Value) -> Self {
        Self {
            current: trigger_data.clone(),
            trigger_data,
            step_outputs: HashMap::new(),
            metadata,
        }
    }

    #[must_use]
    pub fn trigger_data(&self) -> &Value {
        &self.trigger_data
    }

    #[must_use]
    pub fn current(&self) -> &Value {
        &self.current
    }

    #[must_use]
    pub fn step_outputs(&self) -> &HashMap<String, Map<String, Value>> {
        &self.step_outputs
    }

    #[must_use]
    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// Record `output` under `step_name` (write-once per step name within a
    /// single execution is the caller's responsibility to uphold) and
    /// overlay it onto `current`. The overlay is a shallow overwrite: if a
    /// key's prior value was itself an object, it is fully replaced, not
    /// deep-merged.
    pub fn merge_step_output(&mut self, step_name: impl Into<String>, output: Map<String, Value>) {
        let current_obj = self
            .current
            .as_object_mut()
            .expect("current is always constructed from an object-shaped trigger_data");
        for (key, value) in &output {
            current_obj.insert(key.clone(), value.clone());
        }
        self.step_outputs.insert(step_name.into(), output);
    }

    /// Resolve a dotted path (no leading `.`) against `current`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut node = &self.current;
        for segment in path.split('.') {
            node = node.get(segment)?;
        }
        Some(node)
    }

    /// Alias for [`Self::get`]; kept distinct because the spec names both
    /// `Get` and `Lookup` as the template resolver's entry points.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        self.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_context_current_equals_trigger_data() {
        let ctx = PipelineContext::new(json!({"a": 1}), json!({}));
        assert_eq!(ctx.current(), ctx.trigger_data());
    }

    #[test]
    fn merge_step_output_overlays_current() {
        let mut ctx = PipelineContext::new(json!({"a": 1}), json!({}));
        let mut out = Map::new();
        out.insert("b".to_string(), json!(2));
        ctx.merge_step_output("step1", out);
        assert_eq!(ctx.current()["a"], json!(1));
        assert_eq!(ctx.current()["b"], json!(2));
        assert_eq!(ctx.step_outputs()["step1"]["b"], json!(2));
    }

    #[test]
    fn merge_is_shallow_not_deep() {
        let mut ctx = PipelineContext::new(json!({"nested": {"x": 1, "y": 2}}), json!({}));
        let mut out = Map::new();
        out.insert("nested".to_string(), json!({"x": 99}));
        ctx.merge_step_output("step1", out);
        // shallow overwrite: the whole "nested" object is replaced, "y" is gone
        assert_eq!(ctx.current()["nested"], json!({"x": 99}));
    }

    #[test]
    fn trigger_data_never_mutates() {
        let mut ctx = PipelineContext::new(json!({"a": 1}), json!({}));
        let mut out = Map::new();
        out.insert("a".to_string(), json!(2));
        ctx.merge_step_output("step1", out);
        assert_eq!(ctx.trigger_data()["a"], json!(1));
        assert_eq!(ctx.current()["a"], json!(2));
    }

    #[test]
    fn get_resolves_dotted_path() {
        let ctx = PipelineContext::new(json!({"order": {"total": 9}}), json!({}));
        assert_eq!(ctx.get("order.total"), Some(&json!(9)));
        assert_eq!(ctx.get("order.missing"), None);
    }
}
