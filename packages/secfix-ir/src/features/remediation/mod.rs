//! Vulnerability remediations
//!
//! - domain: the tagged-variant catalog and per-entry settings
//! - ports: `PassServices`, the collaborators every visitor gets
//! - infrastructure: one visitor per catalog variant
//! - application: instantiating an entry and running it as a pass

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{instantiate, run_pass, run_pass_reporting, PassOutput};
pub use domain::{Catalog, CatalogEntry, Finding, PathTraversalSettings, Remediation};
pub use ports::{PassServices, RemediationVisitor};
