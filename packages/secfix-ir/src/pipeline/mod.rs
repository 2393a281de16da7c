//! Analysis driver
//!
//! Runs the remediation catalog over compilation units until a fixed point.

pub mod analyzer;
pub mod outcome;

pub use analyzer::{analyze, Analyzer};
pub use outcome::{AnalysisOutcome, FixFailure};
