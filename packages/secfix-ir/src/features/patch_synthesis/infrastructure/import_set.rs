//! Imports requested by synthesized fragments
//!
//! Fragments refer to types by simple name. Every type they need is
//! registered on the root cursor frame while a pass runs; the pass applies
//! the collected set to the compilation unit once the tree has changed.

use std::sync::Arc;

use super::super::ports::ImportRegistrar;
use crate::features::traversal::Cursor;
use crate::shared::models::{CompilationUnit, Import};

/// Message key of the [`ImportSet`] stored on the root frame
pub const IMPORTS_KEY: &str = "secfix.imports";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    requested: Vec<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Add the imports `cu` lacks, in request order.
    ///
    /// `java.lang` types, types of the unit's own package and types already
    /// covered by a single-type or on-demand import are skipped. Returns `cu`
    /// itself when nothing is added.
    pub fn apply(&self, cu: &Arc<CompilationUnit>) -> Arc<CompilationUnit> {
        let missing: Vec<Import> = self
            .requested
            .iter()
            .filter(|fqn| !cu.imports_type(fqn))
            .map(|fqn| Import::new(fqn.as_str()))
            .collect();
        if missing.is_empty() {
            return cu.clone();
        }

        tracing::debug!(imports = ?missing.iter().map(|i| &i.qualified_name).collect::<Vec<_>>(), "adding imports");
        let mut imports = cu.imports.clone();
        imports.extend(missing);
        Arc::new(CompilationUnit {
            package: cu.package.clone(),
            imports,
            classes: cu.classes.clone(),
        })
    }
}

impl ImportRegistrar for ImportSet {
    fn maybe_add_import(&mut self, fqn: &str) {
        if !self.requested.iter().any(|r| r == fqn) {
            self.requested.push(fqn.to_string());
        }
    }
}

/// Register `fqn` on the root frame of `cursor`
pub fn register_import(cursor: &mut Cursor, fqn: &str) {
    if let Some(set) = cursor.compute_message_if_absent_at(0, IMPORTS_KEY, ImportSet::new) {
        set.maybe_add_import(fqn);
    }
}

/// Take the imports collected during a pass
pub fn take_imports(cursor: &mut Cursor) -> ImportSet {
    cursor.poll_message_at(0, IMPORTS_KEY).unwrap_or_default()
}
