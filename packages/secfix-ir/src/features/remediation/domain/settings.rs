//! Effective settings of a path traversal pass
//!
//! Catalog values merged with the per-remediation configuration overrides.

use crate::config::{ConfigResult, RemediationConfig};
use crate::features::matching::domain::MethodSignature;

#[derive(Debug, Clone)]
pub struct PathTraversalSettings {
    pub user_input: Vec<MethodSignature>,
    pub new_variable_prefix: String,
    pub fix_partial_path: bool,
    pub guard_message: String,
}

impl PathTraversalSettings {
    /// Overrides win for the prefix, extend the sources and can only enable
    /// the partial-path fix
    pub fn merge(
        user_input: &[String],
        new_variable_prefix: &str,
        fix_partial_path: bool,
        guard_message: &str,
        overrides: &RemediationConfig,
    ) -> ConfigResult<Self> {
        let user_input = user_input
            .iter()
            .chain(&overrides.user_input_signatures)
            .map(|d| MethodSignature::parse(d))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            user_input,
            new_variable_prefix: overrides
                .new_variable_prefix
                .clone()
                .unwrap_or_else(|| new_variable_prefix.to_string()),
            fix_partial_path: fix_partial_path || overrides.fix_partial_path,
            guard_message: guard_message.to_string(),
        })
    }
}
