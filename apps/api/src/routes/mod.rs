//! API route definitions

mod annotations;
mod health;
mod projects;
mod tasks;
mod users;
mod workflows;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{Extension, Router};
use wovra_domain::workflow::{TransitionDefinition, WorkflowDefinition, ANY_STATE};
use wovra_engine::app::PipelineRegistry;
use wovra_engine::external::InMemoryPersistenceStore;
use wovra_engine::machine::{StateMachineEngine, WorkflowEngineConfig};

use crate::services::WorkflowBinding;

/// Build the API router with all routes
pub async fn api_routes() -> Router {
    Router::new()
        .merge(health::routes())
        .nest("/api/v1", api_v1_routes().await)
}

/// API v1 routes
async fn api_v1_routes() -> Router {
    Router::new()
        .nest("/users", users::routes())
        .nest("/tasks", tasks::routes())
        .nest("/annotations", annotations::routes())
        .nest("/projects", projects::routes())
        .nest("/workflows", workflows::routes())
        .layer(Extension(workflow_binding().await))
}

/// Definition and action table backing `workflows::routes()`. A document
/// moves draft -> in_review -> approved/rejected; `tag` is a same-state
/// transition so it updates instance data without moving the workflow.
async fn workflow_binding() -> Arc<WorkflowBinding> {
    let definition = WorkflowDefinition {
        id: "document".to_string(),
        initial_state: "draft".to_string(),
        states: vec![
            "draft".to_string(),
            "in_review".to_string(),
            "approved".to_string(),
            "rejected".to_string(),
        ],
        transitions: vec![
            TransitionDefinition {
                name: "submit".to_string(),
                sources: vec!["draft".to_string()],
                target: "in_review".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            },
            TransitionDefinition {
                name: "approve".to_string(),
                sources: vec!["in_review".to_string()],
                target: "approved".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            },
            TransitionDefinition {
                name: "reject".to_string(),
                sources: vec!["in_review".to_string()],
                target: "rejected".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            },
            TransitionDefinition {
                name: "cancel".to_string(),
                sources: vec![ANY_STATE.to_string()],
                target: "rejected".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            },
            // "tag" is data-only: one same-state transition per state so it
            // never moves the workflow, only merges call data into it.
            TransitionDefinition {
                name: "tag".to_string(),
                sources: vec!["draft".to_string()],
                target: "draft".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            },
            TransitionDefinition {
                name: "tag".to_string(),
                sources: vec!["in_review".to_string()],
                target: "in_review".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            },
            TransitionDefinition {
                name: "tag".to_string(),
                sources: vec!["approved".to_string()],
                target: "approved".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            },
            TransitionDefinition {
                name: "tag".to_string(),
                sources: vec!["rejected".to_string()],
                target: "rejected".to_string(),
                pipeline: None,
                guard: None,
                auto: false,
            },
        ],
    };

    let engine = Arc::new(StateMachineEngine::new(WorkflowEngineConfig::default()));
    let pipelines = Arc::new(PipelineRegistry::new());
    let persistence = Arc::new(InMemoryPersistenceStore::new());

    engine
        .register_definition(definition)
        .await
        .expect("the built-in document workflow definition is valid");

    let mut actions = HashMap::new();
    actions.insert("approve".to_string(), "approve".to_string());
    actions.insert("reject".to_string(), "reject".to_string());
    actions.insert("cancel".to_string(), "cancel".to_string());
    actions.insert("tag".to_string(), "tag".to_string());

    Arc::new(
        WorkflowBinding::new(engine, pipelines, "document:", actions).with_persistence(persistence),
    )
}

/// Get all route paths for OpenAPI documentation
pub fn openapi_paths() -> utoipa::openapi::Paths {
    use utoipa::OpenApi;

    // Collect paths from all route modules
    #[derive(OpenApi)]
    #[openapi(paths(users::list_users, users::get_user, users::create_user,))]
    struct UserPaths;

    UserPaths::openapi().paths
}
