//! Wovra Domain - Core domain models and types
//!
//! This crate contains all domain models, enums, and core business types
//! used throughout the Wovra data annotation platform.

pub mod annotation;
pub mod data_source;
pub mod draft;
pub mod enums;
pub mod goal;
pub mod ids;
pub mod layout;
pub mod project;
pub mod project_type;
pub mod quality;
pub mod review;
pub mod schema;
pub mod skip_reason;
pub mod task;
pub mod team;
pub mod user;
pub mod workflow;

pub use annotation::*;
pub use data_source::*;
pub use draft::*;
pub use enums::*;
pub use goal::*;
pub use ids::*;
pub use layout::*;
pub use project::*;
pub use project_type::*;
pub use quality::*;
pub use review::*;
pub use schema::*;
pub use skip_reason::*;
pub use task::*;
pub use team::*;
pub use user::*;
pub use workflow::*;
