pub mod catalog;
pub mod finding;
pub mod settings;

pub use catalog::{Catalog, CatalogEntry, Remediation};
pub use finding::Finding;
pub use settings::PathTraversalSettings;
