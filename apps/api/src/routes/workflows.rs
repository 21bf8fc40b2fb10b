//! Workflow resource endpoints
//!
//! REST-to-state-machine binding: creating a resource spins up a workflow
//! instance and fires its initial transition asynchronously; transition and
//! sub-action endpoints drive the instance forward synchronously. See
//! `crate::services::workflow_binding::WorkflowBinding`.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use wovra_domain::workflow::WorkflowInstance;

use crate::error::ApiError;
use crate::services::{WorkflowBinding, WorkflowBindingError};

/// Identifier of the `WorkflowDefinition` resources created through this
/// router are bound against.
const DEFINITION_ID: &str = "document";
const INITIAL_TRANSITION: &str = "submit";

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub id: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub transition: String,
    #[serde(default)]
    pub data: Value,
    pub workflow_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct WorkflowInstanceResponse {
    pub id: String,
    pub definition_id: String,
    pub current_state: String,
    pub completed: bool,
    pub data: Value,
}

impl From<WorkflowInstance> for WorkflowInstanceResponse {
    fn from(instance: WorkflowInstance) -> Self {
        Self {
            id: instance.id,
            definition_id: instance.definition_id,
            completed: instance.completed,
            current_state: instance.current_state,
            data: Value::Object(instance.data.into_iter().collect()),
        }
    }
}

fn map_binding_error(err: WorkflowBindingError) -> ApiError {
    use wovra_engine::machine::StateMachineError as SmErr;
    match err {
        WorkflowBindingError::UnknownAction(action) => {
            ApiError::BadRequest(format!("no transition configured for action {action:?}"))
        }
        WorkflowBindingError::StateMachine(sm) => {
            let message = sm.to_string();
            match &sm {
                SmErr::InstanceNotFound(_) => ApiError::NotFound(message),
                SmErr::DuplicateInstance(_) => ApiError::Conflict(message),
                SmErr::UnknownDefinition(_)
                | SmErr::InvalidDefinition { .. }
                | SmErr::InvalidTransition { .. }
                | SmErr::GuardRejected { .. } => ApiError::BadRequest(message),
                SmErr::AutoChainTooDeep { .. } | SmErr::AmbiguousAuto { .. } | SmErr::Pipeline(_) => {
                    ApiError::Internal(message)
                }
            }
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_resources(
    Extension(binding): Extension<Arc<WorkflowBinding>>,
) -> Json<Vec<WorkflowInstanceResponse>> {
    let resources = binding.list_resources().await;
    Json(resources.into_iter().map(Into::into).collect())
}

async fn create_resource(
    Extension(binding): Extension<Arc<WorkflowBinding>>,
    Json(request): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<WorkflowInstanceResponse>), ApiError> {
    let instance = binding
        .on_resource_created(DEFINITION_ID, &request.id, INITIAL_TRANSITION, request.data)
        .await
        .map_err(map_binding_error)?;
    Ok((StatusCode::CREATED, Json(instance.into())))
}

async fn get_resource(
    Extension(binding): Extension<Arc<WorkflowBinding>>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowInstanceResponse>, ApiError> {
    binding
        .get_resource(&id)
        .await
        .map(|instance| Json(instance.into()))
        .ok_or_else(|| ApiError::NotFound(format!("resource {id:?} not found")))
}

async fn transition_resource(
    Extension(binding): Extension<Arc<WorkflowBinding>>,
    Path(id): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<WorkflowInstanceResponse>, ApiError> {
    let _ = request.workflow_type;
    let instance = binding
        .trigger(&id, &request.transition, request.data)
        .await
        .map_err(map_binding_error)?;
    Ok(Json(instance.into()))
}

async fn run_action(
    Extension(binding): Extension<Arc<WorkflowBinding>>,
    Path((id, sub_action)): Path<(String, String)>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<WorkflowInstanceResponse>, ApiError> {
    let instance = binding
        .trigger_action(&id, &sub_action, request.data)
        .await
        .map_err(map_binding_error)?;
    Ok(Json(instance.into()))
}

// =============================================================================
// Router
// =============================================================================

pub fn routes() -> Router {
    Router::new()
        .route("/", get(list_resources).post(create_resource))
        .route("/{id}", get(get_resource))
        .route("/{id}/transition", post(transition_resource))
        .route("/{id}/{sub_action}", post(run_action))
}
