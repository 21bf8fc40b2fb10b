//! Wovra API - HTTP handlers and routing
//!
//! This crate provides the Axum-based HTTP API for Wovra:
//! - RESTful endpoints for all resources
//! - WebSocket support for real-time updates
//! - Authentication and authorization middleware

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;

pub use error::ApiError;
pub use openapi::ApiDoc;
