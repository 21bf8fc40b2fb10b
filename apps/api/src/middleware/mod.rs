//! API middleware

pub mod audit;
pub mod auth;
pub mod tracing;

pub use audit::{audit_context, AuditContext};
pub use auth::*;
pub use tracing::*;
