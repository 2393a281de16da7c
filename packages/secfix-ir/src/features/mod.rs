//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains:
//! - domain/     - Pure logic over tree values
//! - ports/      - Interface definitions (traits)
//! - application/ - Use cases
//! - infrastructure/ - Default implementations of the ports

pub mod matching;
pub mod patch_synthesis;
pub mod taint_analysis;
pub mod traversal;

// Vulnerability catalog and visitors, built on the four above
pub mod remediation;
