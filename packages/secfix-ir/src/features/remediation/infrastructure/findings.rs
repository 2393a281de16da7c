//! Findings reported during a pass
//!
//! Report-only visitors leave the tree alone and put a [`Finding`] on the
//! root cursor frame instead; the pass collects them after the visit.

use crate::features::remediation::domain::Finding;
use crate::features::traversal::{Cursor, TreePath};
use crate::shared::models::{Statement, TreeRef};

/// Message key of the findings stored on the root frame
pub const FINDINGS_KEY: &str = "secfix.findings";

/// Record `finding` on the root frame of `cursor`; duplicates are dropped
pub fn report_finding(cursor: &mut Cursor, finding: Finding) {
    if let Some(findings) = cursor.compute_message_if_absent_at(0, FINDINGS_KEY, Vec::<Finding>::new) {
        if !findings.contains(&finding) {
            findings.push(finding);
        }
    }
}

/// Take the findings reported during a pass, in report order
pub fn take_findings(cursor: &mut Cursor) -> Vec<Finding> {
    cursor.poll_message_at(0, FINDINGS_KEY).unwrap_or_default()
}

/// Names of the classes and method enclosing the end of `path`, itself included
pub fn location_of(path: &TreePath) -> String {
    path.nodes()
        .iter()
        .filter_map(|node| match node {
            TreeRef::Class(class) => Some(class.name.as_str()),
            TreeRef::Statement(s) => match s.as_ref() {
                Statement::ClassDecl(class) => Some(class.name.as_str()),
                Statement::MethodDecl(method) => Some(method.name.as_str()),
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}
