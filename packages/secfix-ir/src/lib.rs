/*
 * Secfix IR - taint-guided patch synthesis over typed Java trees
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Tree model, builders, printer, naming
 * - features/    : traversal → matching → taint_analysis → patch_synthesis → remediation
 * - pipeline/    : Fixed-point driver over the catalog
 * - config/      : Presets, overrides and YAML
 *
 * Trees are immutable: every fix produces a new tree value and leaves the
 * input untouched, so independent units are analyzed in parallel with rayon.
 */

#![allow(clippy::too_many_arguments)] // Builder helpers mirror constructor arity
#![allow(clippy::type_complexity)] // Flow predicates are boxed closures
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::should_implement_trait)] // from_str naming intentional

pub mod config;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod shared;

pub use config::{EngineConfig, Preset, ValidatedConfig};
pub use errors::{Result, SecfixError};
pub use features::remediation::{Catalog, CatalogEntry, Finding, Remediation};
pub use pipeline::{analyze, AnalysisOutcome, Analyzer, FixFailure};
pub use shared::models::CompilationUnit;
