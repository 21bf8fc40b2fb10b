//! Database layer for Wovra
//!
//! Provides PostgreSQL connection pooling and repository implementations.

pub mod cache;
pub mod pool;

// Re-export pool functions
pub use pool::*;
