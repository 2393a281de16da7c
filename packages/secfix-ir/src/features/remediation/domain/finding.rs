//! Search results of remediations that report instead of rewriting

use std::fmt;

use serde::Serialize;

/// One flagged location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Finding {
    /// Catalog id of the reporting entry
    pub remediation_id: String,

    /// Enclosing classes and method, dot separated (`Test.MyAction`, `Test.test`)
    pub location: String,

    /// First line of the flagged node as printed
    pub snippet: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.remediation_id, self.location, self.snippet)
    }
}
