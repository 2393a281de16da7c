/*
 * Remediation Application Layer
 *
 * Turns a catalog entry into a visitor and runs it as one pass:
 *
 *   CatalogEntry + RemediationConfig  --instantiate-->  RemediationVisitor
 *   RemediationVisitor + tree         --run_pass---->   tree' (imports applied)
 *                                                        + findings
 *
 * A pass that finds nothing returns the input tree itself.
 */

use std::sync::Arc;

use super::domain::{CatalogEntry, Finding, PathTraversalSettings, Remediation};
use super::infrastructure::{
    take_findings, CookieSecureVisitor, DocumentBuilderFactoryVisitor, PathTraversalVisitor, PrivilegedCodeVisitor,
    RandomStringUtilsVisitor, SecureRandomSeedVisitor, SecureRandomVisitor, SecureTempFileVisitor,
    TempDirectoryVisitor, TransformerFactoryVisitor, XmlInputFactoryVisitor,
};
use super::ports::{PassServices, RemediationVisitor};
use crate::config::RemediationConfig;
use crate::errors::Result;
use crate::features::patch_synthesis::take_imports;
use crate::features::traversal::visit_tree;
use crate::shared::models::CompilationUnit;

/// Visitor for `entry` with the effective `settings`
pub fn instantiate(
    entry: &CatalogEntry,
    settings: &RemediationConfig,
    services: PassServices,
) -> Result<RemediationVisitor> {
    let visitor: RemediationVisitor = match &entry.remediation {
        Remediation::PathTraversal {
            user_input,
            new_variable_prefix,
            fix_partial_path,
            guard_message,
        } => {
            let settings = PathTraversalSettings::merge(
                user_input,
                new_variable_prefix,
                *fix_partial_path,
                guard_message,
                settings,
            )?;
            Box::new(PathTraversalVisitor::new(services, settings))
        }
        Remediation::CookieSecure => Box::new(CookieSecureVisitor::new(services)),
        Remediation::SecureRandom => Box::new(SecureRandomVisitor::new(services)),
        Remediation::SecureRandomSeed => Box::new(SecureRandomSeedVisitor::new(services)),
        Remediation::XmlInputFactory => Box::new(
            XmlInputFactoryVisitor::new(services).with_external_dtds(settings.external_dtds.clone()),
        ),
        Remediation::DocumentBuilderFactory => Box::new(
            DocumentBuilderFactoryVisitor::new(services).with_external_dtds(settings.external_dtds.clone()),
        ),
        Remediation::TransformerFactory => Box::new(TransformerFactoryVisitor::new(services)),
        Remediation::SecureTempFile => Box::new(SecureTempFileVisitor::new(services)),
        Remediation::TempDirectory => Box::new(TempDirectoryVisitor::new(services)),
        Remediation::RandomStringUtils => Box::new(RandomStringUtilsVisitor::new(services)),
        Remediation::PrivilegedCode => Box::new(PrivilegedCodeVisitor::new(services, entry.id.clone())),
    };
    Ok(visitor)
}

/// Tree and findings of one pass
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub tree: Arc<CompilationUnit>,
    pub findings: Vec<Finding>,
}

/// Run one visitor over `cu`, add the imports its fixes asked for and
/// collect what it reported
pub fn run_pass_reporting(visitor: &mut RemediationVisitor, cu: &Arc<CompilationUnit>) -> Result<PassOutput> {
    let (out, mut cursor) = visit_tree(visitor.as_mut(), cu)?;
    let findings = take_findings(&mut cursor);
    let tree = if Arc::ptr_eq(&out, cu) {
        out
    } else {
        take_imports(&mut cursor).apply(&out)
    };
    Ok(PassOutput { tree, findings })
}

/// Run one visitor over `cu` and add the imports its fixes asked for
pub fn run_pass(visitor: &mut RemediationVisitor, cu: &Arc<CompilationUnit>) -> Result<Arc<CompilationUnit>> {
    run_pass_reporting(visitor, cu).map(|output| output.tree)
}
