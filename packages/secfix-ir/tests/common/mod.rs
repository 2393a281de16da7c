//! Common test utilities for secfix-ir
//!
//! Tree fixtures for the vulnerability scenarios and assertions over printed
//! method bodies.

#![allow(dead_code)]

mod assertions;
mod fixtures;

pub use assertions::*;
pub use fixtures::*;
