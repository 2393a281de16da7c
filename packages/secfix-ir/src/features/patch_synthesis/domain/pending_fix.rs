//! Pending fix records
//!
//! Visitors never edit the tree. They record a [`PendingFix`] on the frame of
//! the block that will commit it; the synthesizer drains the block's
//! [`PendingFixes`] when the block visit finishes.

use std::sync::Arc;

use super::guard::GuardVariant;
use crate::shared::models::{node_id, Expression, Statement};

/// Message key of the [`PendingFixes`] stored on a block frame
pub const PENDING_FIXES_KEY: &str = "secfix.pending_fixes";

#[derive(Debug, Clone)]
pub struct PendingFix {
    /// Statement of the committing block the fix is positioned against
    pub anchor: Arc<Statement>,

    /// Expression the fix is about; must be inside `anchor` for in-place kinds
    pub tainted: Arc<Expression>,

    /// Counterpart operand of a guard (the base directory)
    pub parent_context: Option<Arc<Expression>>,

    pub kind: FixKind,
}

#[derive(Debug, Clone)]
pub enum FixKind {
    /// `if (!<check>) { throw ...; }` right after the anchor
    InsertGuardAfter(GuardFix),
    /// Hoist `tainted` into a fresh `final` local declared before the anchor
    ExtractToVariableBefore(Extraction),
    /// Substitute `tainted` inside the anchor
    ReplaceInPlace(Replacement),
    /// Statements right after the anchor
    InsertStatementsAfter(Vec<Arc<Statement>>),
    /// Statements right before the anchor
    InsertStatementsBefore(Vec<Arc<Statement>>),
    /// Drop the anchor
    RemoveStatement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardFix {
    pub variant: GuardVariant,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Name generation starts from this base
    pub base_name: String,
}

#[derive(Debug, Clone)]
pub struct Replacement {
    pub replacement: Arc<Expression>,

    /// Types the replacement refers to by simple name
    pub imports: Vec<String>,
}

/// Discriminant of [`FixKind`], also the application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FixKindTag {
    ExtractToVariableBefore,
    InsertGuardAfter,
    ReplaceInPlace,
    InsertStatementsAfter,
    InsertStatementsBefore,
    RemoveStatement,
}

impl FixKindTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractToVariableBefore => "extract-to-variable-before",
            Self::InsertGuardAfter => "insert-guard-after",
            Self::ReplaceInPlace => "replace-in-place",
            Self::InsertStatementsAfter => "insert-statements-after",
            Self::InsertStatementsBefore => "insert-statements-before",
            Self::RemoveStatement => "remove-statement",
        }
    }
}

impl std::fmt::Display for FixKindTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FixKind {
    pub fn tag(&self) -> FixKindTag {
        match self {
            Self::InsertGuardAfter(_) => FixKindTag::InsertGuardAfter,
            Self::ExtractToVariableBefore(_) => FixKindTag::ExtractToVariableBefore,
            Self::ReplaceInPlace(_) => FixKindTag::ReplaceInPlace,
            Self::InsertStatementsAfter(_) => FixKindTag::InsertStatementsAfter,
            Self::InsertStatementsBefore(_) => FixKindTag::InsertStatementsBefore,
            Self::RemoveStatement => FixKindTag::RemoveStatement,
        }
    }
}

impl PendingFix {
    pub fn new(anchor: Arc<Statement>, tainted: Arc<Expression>, kind: FixKind) -> Self {
        Self {
            anchor,
            tainted,
            parent_context: None,
            kind,
        }
    }

    pub fn with_parent_context(mut self, parent: Arc<Expression>) -> Self {
        self.parent_context = Some(parent);
        self
    }

    /// Fixes with equal keys replace each other
    ///
    /// One fix per anchor and kind; replacements are additionally keyed by
    /// their target so that one statement can have several expressions rewritten.
    fn key(&self) -> (usize, FixKindTag, usize) {
        let target = match self.kind {
            FixKind::ReplaceInPlace(_) => node_id(&self.tainted),
            _ => 0,
        };
        (node_id(&self.anchor), self.kind.tag(), target)
    }
}

/// Fixes recorded on one block frame, last message wins per key
#[derive(Debug, Clone, Default)]
pub struct PendingFixes {
    fixes: Vec<PendingFix>,
}

impl PendingFixes {
    pub fn record(&mut self, fix: PendingFix) {
        let key = fix.key();
        self.fixes.retain(|f| f.key() != key);
        self.fixes.push(fix);
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingFix> {
        self.fixes.iter()
    }

    /// Fixes in application order; recording order within one kind
    pub fn into_ordered(self) -> Vec<PendingFix> {
        let mut fixes = self.fixes;
        fixes.sort_by_key(|f| f.kind.tag());
        fixes
    }
}
