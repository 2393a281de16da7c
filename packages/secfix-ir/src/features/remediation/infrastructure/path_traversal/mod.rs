//! Path traversal remediation (zip slip and friends)
//!
//! Runs once per method or initializer body, after nested bodies are done:
//!
//! 1. optional partial-path fix (`startsWith(dir.getCanonicalPath())`)
//! 2. user input located with value flows from the configured sources
//! 3. concatenated paths split into `new File(parent, child)`
//! 4. guards or extractions recorded for children that reach a create-file
//!    sink unchecked
//!
//! The rewrites of step 3 are only kept when step 4 found something to fix.

mod guards;
mod normalize;
mod partial_path;

pub use guards::GuardRecorder;
pub use normalize::{split_file_path, FileConstructorNormalizer};
pub use partial_path::PartialPathFixer;

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::scan::{path_on, expression_paths, is_outer_executable, transfer_imports};
use crate::errors::Result;
use crate::features::remediation::domain::PathTraversalSettings;
use crate::features::remediation::ports::PassServices;
use crate::features::taint_analysis::FnFlowSpec;
use crate::features::traversal::infrastructure::walk_block;
use crate::features::traversal::{Cursor, TreePath, TreeVisitor};
use crate::shared::models::{node_id, Block, TreeRef};

pub struct PathTraversalVisitor {
    services: PassServices,
    settings: PathTraversalSettings,
}

impl PathTraversalVisitor {
    pub fn new(services: PassServices, settings: PathTraversalSettings) -> Self {
        Self { services, settings }
    }

    /// Ids of the expressions holding a source value, sources included
    fn user_input(&self, body: &TreePath) -> FxHashSet<usize> {
        let mut found = FxHashSet::default();
        for path in expression_paths(body) {
            let Some(source) = path.value().and_then(TreeRef::as_expression).cloned() else {
                continue;
            };
            if !self.services.matcher.matches_any(&source, &self.settings.user_input) {
                continue;
            }
            let spec = FnFlowSpec::value(|n| n.is(&source), |_| true);
            found.extend(
                self.services
                    .flow_from(path)
                    .find_sinks(&spec)
                    .sink_expressions()
                    .map(node_id),
            );
        }
        found
    }

    /// Child operands of path constructions that hold a source value
    fn tainted_children(&self, body: &TreePath) -> FxHashSet<usize> {
        let mut children = FxHashSet::default();
        for path in expression_paths(body) {
            let Some(source) = path.value().and_then(TreeRef::as_expression).cloned() else {
                continue;
            };
            if !self.services.matcher.matches_any(&source, &self.settings.user_input) {
                continue;
            }
            let matcher = self.services.matcher.clone();
            let spec = FnFlowSpec::value(
                |n| n.is(&source),
                move |n| {
                    matcher.is_argument_of(&n.path, &guards::FILE_WITH_CHILD, 1)
                        || matcher.is_argument_of(&n.path, &guards::PATH_RESOLVE, 0)
                },
            );
            children.extend(
                self.services
                    .flow_from(path)
                    .find_sinks(&spec)
                    .sink_expressions()
                    .map(node_id),
            );
        }
        children
    }

    fn fix_partial_paths(&self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let mut scratch = Cursor::from_path(&cursor.path());
        let fixed = PartialPathFixer::new(&self.services).visit_block(block, &mut scratch)?;
        if !Arc::ptr_eq(&fixed, block) {
            transfer_imports(&mut scratch, cursor);
        }
        Ok(fixed)
    }

    fn guard_body(&self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let path = cursor.path();
        let user_input = self.user_input(&path);
        if user_input.is_empty() {
            return Ok(block.clone());
        }

        let mut normalizing = Cursor::from_path(&path);
        let normalized =
            FileConstructorNormalizer::new(&self.services, &user_input).visit_block(block, &mut normalizing)?;

        let normalized_path = path_on(&path, &normalized);
        let children = self.tainted_children(&normalized_path);
        if children.is_empty() {
            return Ok(block.clone());
        }

        let mut guarding = Cursor::from_path(&normalized_path);
        let mut recorder = GuardRecorder::new(&self.services, &self.settings, &children);
        let guarded = recorder.visit_block(&normalized, &mut guarding)?;
        if recorder.recorded() == 0 || Arc::ptr_eq(&guarded, &normalized) {
            return Ok(block.clone());
        }

        tracing::debug!(fixes = recorder.recorded(), "path traversal fixes recorded");
        transfer_imports(&mut normalizing, cursor);
        transfer_imports(&mut guarding, cursor);
        Ok(guarded)
    }
}

impl TreeVisitor for PathTraversalVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        if !is_outer_executable(&cursor.path()) {
            return walk_block(self, block, cursor);
        }
        if self.settings.fix_partial_path {
            let fixed = self.fix_partial_paths(block, cursor)?;
            if !Arc::ptr_eq(&fixed, block) {
                return Ok(fixed);
            }
        }
        let walked = walk_block(self, block, cursor)?;
        if !Arc::ptr_eq(&walked, block) {
            return Ok(walked);
        }
        self.guard_body(block, cursor)
    }
}
