//! Shared module - Common types and utilities
//!
//! Tree model and printing helpers used by every feature. No feature module
//! is imported from here.

pub mod models;
pub mod utils;

// Re-exports for convenience
pub use models::*;
