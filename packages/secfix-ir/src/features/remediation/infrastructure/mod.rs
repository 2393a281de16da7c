//! Vulnerability visitors
//!
//! One `TreeVisitor` per catalog variant. Visitors only record pending fixes
//! and commit them through `PassServices::commit` when a block visit ends;
//! report-only visitors record findings instead.

pub mod cookie_secure;
pub mod document_builder_factory;
pub mod findings;
pub mod path_traversal;
pub mod privileged_code;
pub mod random_string_utils;
pub mod scan;
pub mod secure_random;
pub mod secure_random_seed;
pub mod secure_temp_file;
pub mod temp_directory;
pub mod transformer_factory;
pub mod xml_input_factory;

#[cfg(test)]
pub mod testing;

pub use cookie_secure::CookieSecureVisitor;
pub use document_builder_factory::{DocumentBuilderFactoryVisitor, DISALLOW_DOCTYPE_DECL};
pub use findings::{report_finding, take_findings, FINDINGS_KEY};
pub use path_traversal::PathTraversalVisitor;
pub use privileged_code::PrivilegedCodeVisitor;
pub use random_string_utils::RandomStringUtilsVisitor;
pub use secure_random::SecureRandomVisitor;
pub use secure_random_seed::SecureRandomSeedVisitor;
pub use secure_temp_file::{secure_temp_file_replacement, SecureTempFileVisitor};
pub use temp_directory::{find_temp_directory_sites, temp_directory_replacement, TempDirectorySite, TempDirectoryVisitor};
pub use transformer_factory::TransformerFactoryVisitor;
pub use xml_input_factory::XmlInputFactoryVisitor;
