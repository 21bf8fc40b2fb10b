//! Business logic services

pub mod permission_service;
pub mod schema_service;
pub mod workflow_binding;

pub use permission_service::PermissionService;
pub use schema_service::{SchemaError, SchemaValidationService};
pub use workflow_binding::{WorkflowBinding, WorkflowBindingError};
