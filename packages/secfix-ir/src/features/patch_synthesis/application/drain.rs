//! Block-level commit of pending fixes
//!
//! Visitors record fixes while the walk is below a block. When the block visit
//! finishes, the fixes recorded on its frame are drained here and applied to
//! the rebuilt block: extractions first, then guards, replacements, inserted
//! statements and removals. A fix whose anchor is no longer a statement of the
//! block is dropped.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::errors::Result;
use crate::features::patch_synthesis::domain::{
    guard_template, FixKind, Fragment, PendingFix, PendingFixes, PENDING_FIXES_KEY,
};
use crate::features::patch_synthesis::infrastructure::{
    register_import, replace_all_in, replace_in, BlockSplicer, ExceptionScope,
};
use crate::features::patch_synthesis::ports::{Coordinate, TemplateSplicer};
use crate::features::traversal::{Cursor, TreePath};
use crate::shared::models::{build, node_id, Block, Expression, Statement, TreeKind, TreeRef};
use crate::shared::utils::{lowest_free_name, names_in_scope};

/// Record `fix` on the frame of the innermost block holding its anchor.
///
/// Falls back to the nearest block frame when no frame holds the anchor
/// itself (the anchor was rebuilt earlier in the same visit). Returns `false`
/// when the cursor is not inside any block.
pub fn record_fix(cursor: &mut Cursor, fix: PendingFix) -> bool {
    let holder = (0..cursor.depth()).rev().find(|&i| {
        cursor
            .node_at(i)
            .and_then(TreeRef::as_block)
            .map(|b| b.position_of(&fix.anchor).is_some())
            .unwrap_or(false)
    });
    let Some(index) = holder.or_else(|| cursor.first_enclosing_index(TreeKind::Block)) else {
        return false;
    };
    tracing::debug!(kind = %fix.kind.tag(), frame = index, "recording fix");
    match cursor.compute_message_if_absent_at(index, PENDING_FIXES_KEY, PendingFixes::default) {
        Some(fixes) => {
            fixes.record(fix);
            true
        }
        None => false,
    }
}

pub struct PatchSynthesizer {
    splicer: Box<dyn TemplateSplicer>,
    scope: ExceptionScope,
}

impl Default for PatchSynthesizer {
    fn default() -> Self {
        Self::new(Box::new(BlockSplicer::new()))
    }
}

impl PatchSynthesizer {
    pub fn new(splicer: Box<dyn TemplateSplicer>) -> Self {
        Self {
            splicer,
            scope: ExceptionScope::new(),
        }
    }

    /// Apply the fixes recorded on the current frame.
    ///
    /// The cursor must be positioned on the block; `original` is the block as
    /// it was when the visit started and `current` the block after its
    /// children were visited. Returns `current` itself when nothing applies.
    pub fn drain_and_apply(&self, cursor: &mut Cursor, original: &Arc<Block>, current: Arc<Block>) -> Result<Arc<Block>> {
        let Some(fixes) = cursor.poll_message::<PendingFixes>(PENDING_FIXES_KEY) else {
            return Ok(current);
        };
        if fixes.is_empty() {
            return Ok(current);
        }

        let mut commit = Commit::new(cursor.path(), original, current);
        for fix in fixes.into_ordered() {
            let tag = fix.kind.tag();
            let Some(anchor) = commit.resolve(&fix.anchor) else {
                tracing::debug!(kind = %tag, "anchor left the block, fix dropped");
                continue;
            };
            let applied = match &fix.kind {
                FixKind::ExtractToVariableBefore(extraction) => {
                    commit.extract(cursor, &anchor, &fix.tainted, &extraction.base_name, &*self.splicer)?
                }
                FixKind::InsertGuardAfter(guard) => {
                    let Some(parent) = &fix.parent_context else {
                        tracing::debug!(kind = %tag, "guard without parent context, fix dropped");
                        continue;
                    };
                    let exception = self
                        .scope
                        .choose(&commit.path().child(TreeRef::Statement(anchor.clone())));
                    let template = guard_template(guard.variant, exception, &guard.message)?;
                    let fragment = template.render(&[fix.tainted.clone(), parent.clone()])?;
                    for fqn in template.required_imports() {
                        register_import(cursor, fqn);
                    }
                    commit.splice(&*self.splicer, fragment, Coordinate::After(anchor))?;
                    true
                }
                FixKind::ReplaceInPlace(replacement) => {
                    match replace_in(
                        &TreeRef::Statement(anchor.clone()),
                        &fix.tainted,
                        replacement.replacement.clone(),
                    )
                    .and_then(|r| r.as_statement().cloned())
                    {
                        Some(rewritten) => {
                            for fqn in &replacement.imports {
                                register_import(cursor, fqn);
                            }
                            commit.swap(&*self.splicer, &anchor, vec![rewritten.clone()], rewritten)?;
                            true
                        }
                        None => false,
                    }
                }
                FixKind::InsertStatementsAfter(statements) => {
                    commit.splice(&*self.splicer, Fragment::Statements(statements.clone()), Coordinate::After(anchor))?;
                    true
                }
                FixKind::InsertStatementsBefore(statements) => {
                    commit.splice(&*self.splicer, Fragment::Statements(statements.clone()), Coordinate::Before(anchor))?;
                    true
                }
                FixKind::RemoveStatement => {
                    commit.splice(&*self.splicer, Fragment::Statements(Vec::new()), Coordinate::Replace(anchor))?;
                    true
                }
            };
            if applied {
                tracing::debug!(kind = %tag, "fix applied");
            } else {
                tracing::debug!(kind = %tag, "target left the anchor, fix dropped");
            }
        }
        Ok(commit.block)
    }
}

/// Apply the fixes recorded on the current frame with the default splicer
pub fn drain_and_apply(cursor: &mut Cursor, original: &Arc<Block>, current: Arc<Block>) -> Result<Arc<Block>> {
    PatchSynthesizer::default().drain_and_apply(cursor, original, current)
}

/// Working state of one drain
struct Commit {
    /// Cursor path to the block frame
    path: TreePath,
    block: Arc<Block>,
    /// Statements that were rebuilt, old to new
    renamed: Vec<(Arc<Statement>, Arc<Statement>)>,
    /// Names taken by earlier extractions of this drain
    extracted: FxHashSet<String>,
}

impl Commit {
    fn new(path: TreePath, original: &Arc<Block>, current: Arc<Block>) -> Self {
        // Visiting children rebuilds statements in place, one for one
        let renamed = if original.statements.len() == current.statements.len() {
            original
                .statements
                .iter()
                .zip(&current.statements)
                .filter(|(old, new)| !Arc::ptr_eq(old, new))
                .map(|(old, new)| (old.clone(), new.clone()))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            path,
            block: current,
            renamed,
            extracted: FxHashSet::default(),
        }
    }

    /// Path to the block in its current state
    fn path(&self) -> TreePath {
        self.path
            .replacing(self.path.len().saturating_sub(1), TreeRef::Block(self.block.clone()))
    }

    /// Statement of the working block that `anchor` stands for
    fn resolve(&self, anchor: &Arc<Statement>) -> Option<Arc<Statement>> {
        let mut current = anchor.clone();
        for _ in 0..=self.renamed.len() {
            if self.block.position_of(&current).is_some() {
                return Some(current);
            }
            current = self
                .renamed
                .iter()
                .find(|(old, _)| Arc::ptr_eq(old, &current))
                .map(|(_, new)| new.clone())?;
        }
        None
    }

    fn splice(&mut self, splicer: &dyn TemplateSplicer, fragment: Fragment, at: Coordinate) -> Result<()> {
        self.block = splicer.splice(&self.block, fragment, &at)?;
        Ok(())
    }

    /// Replace `anchor` by `statements`, `successor` taking over its role
    fn swap(
        &mut self,
        splicer: &dyn TemplateSplicer,
        anchor: &Arc<Statement>,
        statements: Vec<Arc<Statement>>,
        successor: Arc<Statement>,
    ) -> Result<()> {
        self.splice(splicer, Fragment::Statements(statements), Coordinate::Replace(anchor.clone()))?;
        self.renamed.push((anchor.clone(), successor));
        Ok(())
    }

    /// `final T name = <tainted>;` before the anchor, every use of `<tainted>`
    /// in the anchor reading `name`
    fn extract(
        &mut self,
        cursor: &mut Cursor,
        anchor: &Arc<Statement>,
        tainted: &Arc<Expression>,
        base_name: &str,
        splicer: &dyn TemplateSplicer,
    ) -> Result<bool> {
        let mut taken = names_in_scope(&self.path());
        taken.extend(self.extracted.iter().cloned());
        let name = lowest_free_name(base_name, &taken);

        let read = build::ident(&name, tainted.ty.clone());
        let Some(rewritten) = replace_all_in(&TreeRef::Statement(anchor.clone()), tainted, &read)
            .and_then(|r| r.as_statement().cloned())
        else {
            return Ok(false);
        };

        tracing::debug!(variable = %name, tainted = node_id(tainted), "extracting to variable");
        let declaration = build::final_var_decl(tainted.ty.clone(), &name, tainted.clone());
        if let Some(fqn) = tainted.ty.fqn() {
            register_import(cursor, fqn);
        }
        self.extracted.insert(name);
        self.swap(splicer, anchor, vec![declaration, rewritten.clone()], rewritten)?;
        Ok(true)
    }
}
