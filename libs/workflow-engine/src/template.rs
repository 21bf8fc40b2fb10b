//! Template resolution over pipeline context
//!
//! Resolves `{{ expr }}` placeholders in a string (or recursively in a
//! `serde_json::Value`) against a [`PipelineContext`]. Deliberately minimal:
//! variable interpolation only, no arithmetic, no conditionals, no loops.

use serde_json::Value;
use thiserror::Error;

use crate::context::PipelineContext;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unbalanced template braces in {0:?}")]
    UnbalancedBraces(String),
}

/// Resolve every `{{ expr }}` placeholder in `input` against `ctx`.
///
/// Missing keys resolve to the empty string rather than erroring; only
/// unbalanced braces are a hard failure.
pub fn resolve(input: &str, ctx: &PipelineContext) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    loop {
        let Some(start) = rest.find("{{") else {
            if rest.contains("}}") {
                return Err(TemplateError::UnbalancedBraces(input.to_string()));
            }
            out.push_str(rest);
            break;
        };

        let Some(end_rel) = rest[start + 2..].find("}}") else {
            return Err(TemplateError::UnbalancedBraces(input.to_string()));
        };
        let end = start + 2 + end_rel;

        out.push_str(&rest[..start]);
        let expr = rest[start + 2..end].trim();
        out.push_str(&resolve_expr(expr, ctx));

        rest = &rest[end + 2..];
    }

    Ok(out)
}

/// Recursively resolve every string value of `value` as a template, leaving
/// numbers, booleans, and null untouched and walking into arrays/objects.
pub fn resolve_value(value: &Value, ctx: &PipelineContext) -> Result<Value, TemplateError> {
    match value {
        Value::String(s) => Ok(Value::String(resolve(s, ctx)?)),
        Value::Array(items) => {
            let resolved = items
                .iter()
                .map(|v| resolve_value(v, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(resolved))
        }
        Value::Object(map) => {
            let mut resolved = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                resolved.insert(k.clone(), resolve_value(v, ctx)?);
            }
            Ok(Value::Object(resolved))
        }
        other => Ok(other.clone()),
    }
}

/// Resolve a single `.key` / `.steps.<name>.<field>` / `.trigger.<field>` expression.
fn resolve_expr(expr: &str, ctx: &PipelineContext) -> String {
    let Some(path) = expr.strip_prefix('.') else {
        return String::new();
    };

    let mut segments = path.split('.');
    let Some(head) = segments.next() else {
        return String::new();
    };

    let value = match head {
        "steps" => {
            let step_name = match segments.next() {
                Some(s) => s,
                None => return String::new(),
            };
            ctx.step_outputs()
                .get(step_name)
                .and_then(|output| walk(output, segments))
        }
        "trigger" => walk(ctx.trigger_data(), segments),
        key => walk(ctx.current(), std::iter::once(key).chain(segments)),
    };

    value.map(value_to_string).unwrap_or_default()
}

fn walk<'a>(root: &'a Value, segments: impl Iterator<Item = &'a str>) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_placeholders_returns_input_unchanged() {
        let ctx = PipelineContext::new(json!({}), json!({}));
        assert_eq!(resolve("plain text", &ctx).unwrap(), "plain text");
    }

    #[test]
    fn resolves_current_key() {
        let ctx = PipelineContext::new(json!({"name": "Ada"}), json!({}));
        assert_eq!(resolve("Hello {{ .name }}!", &ctx).unwrap(), "Hello Ada!");
    }

    #[test]
    fn missing_key_resolves_to_empty_string() {
        let ctx = PipelineContext::new(json!({}), json!({}));
        assert_eq!(resolve("[{{ .missing }}]", &ctx).unwrap(), "[]");
    }

    #[test]
    fn unbalanced_braces_is_an_error() {
        let ctx = PipelineContext::new(json!({}), json!({}));
        assert!(matches!(
            resolve("{{ .foo", &ctx),
            Err(TemplateError::UnbalancedBraces(_))
        ));
        assert!(matches!(
            resolve("foo }}", &ctx),
            Err(TemplateError::UnbalancedBraces(_))
        ));
    }

    #[test]
    fn resolves_step_output_path() {
        let mut ctx = PipelineContext::new(json!({}), json!({}));
        let mut out = serde_json::Map::new();
        out.insert("id".to_string(), json!("pay_123"));
        ctx.merge_step_output("charge", out);
        assert_eq!(resolve("{{ .steps.charge.id }}", &ctx).unwrap(), "pay_123");
    }

    #[test]
    fn resolves_trigger_path() {
        let ctx = PipelineContext::new(json!({"order": {"total": "99.99"}}), json!({}));
        assert_eq!(resolve("{{ .trigger.order.total }}", &ctx).unwrap(), "99.99");
    }

    #[test]
    fn resolve_value_walks_nested_objects() {
        let ctx = PipelineContext::new(json!({"name": "Ada"}), json!({}));
        let template = json!({"greeting": "Hi {{ .name }}", "nested": {"again": "{{ .name }}!"}});
        let resolved = resolve_value(&template, &ctx).unwrap();
        assert_eq!(resolved["greeting"], json!("Hi Ada"));
        assert_eq!(resolved["nested"]["again"], json!("Ada!"));
    }
}
