//! Analysis outcome types

use std::fmt;
use std::sync::Arc;

use crate::features::remediation::Finding;
use crate::shared::models::CompilationUnit;

/// A remediation pass that failed and was isolated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixFailure {
    /// Catalog id of the failing entry
    pub remediation_id: String,

    /// Cycle (1-based) in which the pass failed
    pub cycle: usize,

    pub message: String,
}

impl fmt::Display for FixFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (cycle {}): {}", self.remediation_id, self.cycle, self.message)
    }
}

/// Result of analyzing one compilation unit
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Fixed tree, the input itself when nothing changed
    pub tree: Arc<CompilationUnit>,

    /// At least one pass produced a structurally different tree
    pub changed: bool,

    /// Cycles run, including the final one that changed nothing
    pub cycles: usize,

    /// Number of passes whose result was kept
    pub applied_passes: usize,

    pub failures: Vec<FixFailure>,

    /// Sites flagged by report-only remediations, each once
    pub findings: Vec<Finding>,
}

impl AnalysisOutcome {
    /// Outcome that leaves `tree` as it is
    pub fn unchanged(tree: Arc<CompilationUnit>) -> Self {
        Self {
            tree,
            changed: false,
            cycles: 0,
            applied_passes: 0,
            failures: Vec::new(),
            findings: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Add findings not seen yet, keeping first-report order
    pub fn record_findings(&mut self, findings: Vec<Finding>) {
        for finding in findings {
            if !self.findings.contains(&finding) {
                self.findings.push(finding);
            }
        }
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "changed={}, cycles={}, passes={}, failures={}, findings={}",
            self.changed,
            self.cycles,
            self.applied_passes,
            self.failures.len(),
            self.findings.len()
        )
    }
}
