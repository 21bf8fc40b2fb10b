//! `step.http_request`: issues an outbound HTTP call with a templated
//! URL/body and publishes status code and parsed JSON body as output.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app::AppHandle;
use crate::context::PipelineContext;
use crate::registry::StepFactoryError;
use crate::step::{PipelineStep, StepError, StepResult};
use crate::template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unsupported http method {other:?}")),
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

pub struct HttpRequestStep {
    name: String,
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    body: Option<Value>,
    timeout: Duration,
    client: reqwest::Client,
}

#[async_trait]
impl PipelineStep for HttpRequestStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        pc: &PipelineContext,
    ) -> Result<StepResult, StepError> {
        let url = template::resolve(&self.url, pc)?;

        let mut request = self
            .client
            .request(self.method.to_reqwest(), &url)
            .timeout(self.timeout);

        for (key, value_template) in &self.headers {
            let value = template::resolve(value_template, pc)?;
            request = request.header(key.as_str(), value);
        }

        if let Some(body) = &self.body {
            let resolved = template::resolve_value(body, pc)?;
            request = request.json(&resolved);
        }

        let send = request.send();
        let response = tokio::select! {
            result = send => result.map_err(|e| StepError::Http(e.to_string()))?,
            () = cancel.cancelled() => return Err(StepError::Http("canceled".to_string())),
        };

        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .unwrap_or(Value::Null);

        let mut output = Map::with_capacity(2);
        output.insert("status".to_string(), Value::from(status));
        output.insert("body".to_string(), body);
        Ok(StepResult::with_output(output))
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
    let url = config
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| StepFactoryError::MissingKey {
            step: name.to_string(),
            key: "url",
        })?
        .to_string();

    let method = match config.get("method").and_then(Value::as_str) {
        None => Method::Get,
        Some(raw) => Method::parse(raw).map_err(|reason| StepFactoryError::InvalidValue {
            step: name.to_string(),
            key: "method",
            reason,
        })?,
    };

    let headers = config
        .get("headers")
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let body = config.get("body").cloned();

    let timeout = match config.get("timeout").and_then(Value::as_str) {
        None => Duration::from_secs(30),
        Some(raw) => parse_duration(raw).map_err(|reason| StepFactoryError::InvalidValue {
            step: name.to_string(),
            key: "timeout",
            reason,
        })?,
    };

    Ok(Box::new(HttpRequestStep {
        name: name.to_string(),
        method,
        url,
        headers,
        body,
        timeout,
        client: reqwest::Client::new(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unsupported_method_rejected_at_construction() {
        let app = AppHandle::new(std::sync::Arc::new(crate::external::ServiceRegistry::new()));
        let result = factory(
            "call",
            &json!({"url": "https://example.com", "method": "TRACE"}),
            &app,
        );
        assert!(matches!(result, Err(StepFactoryError::InvalidValue { .. })));
    }

    #[test]
    fn missing_url_rejected_at_construction() {
        let app = AppHandle::new(std::sync::Arc::new(crate::external::ServiceRegistry::new()));
        let result = factory("call", &json!({}), &app);
        assert!(matches!(result, Err(StepFactoryError::MissingKey { .. })));
    }
}
