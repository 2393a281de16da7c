//! Guard/patch synthesis
//!
//! - domain: pending fixes, source templates, guard variants
//! - ports: `TemplateSplicer` and `ImportRegistrar`
//! - infrastructure: block splicer, import set, exception scope, substitution
//! - application: draining a block's pending fixes

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{drain_and_apply, record_fix, PatchSynthesizer};
pub use domain::{
    guard_template, Extraction, FixKind, FixKindTag, Fragment, GuardFix, GuardVariant, PendingFix,
    PendingFixes, Replacement, SourceTemplate, TemplateError, ThrownException, BAD_ZIP_ENTRY,
};
pub use infrastructure::{register_import, take_imports, BlockSplicer, ExceptionScope, ImportSet};
pub use ports::{Coordinate, ImportRegistrar, TemplateSplicer};
