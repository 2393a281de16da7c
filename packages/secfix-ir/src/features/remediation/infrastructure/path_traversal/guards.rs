/*
 * Containment Guard Recording
 *
 * A `new File(parent, child)` or `root.resolve(child)` whose child carries
 * user input is followed forward with a taint flow. When the result reaches a
 * create-file sink without passing a containment check, a fix is recorded:
 *
 *   File f = new File(dir, entry.getName());       InsertGuardAfter on `f`
 *   new FileOutputStream(new File(dir, name));     ExtractToVariableBefore
 *
 * A check is `Path.startsWith(..)` taken on its true branch, or
 * `String.startsWith(..)` against a directory ending in a separator.
 */

use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use crate::errors::Result;
use crate::features::matching::domain::{ends_with_separator, is_file_separator};
use crate::features::matching::{MethodSignature, CREATE_FILE_SINKS};
use crate::features::patch_synthesis::{record_fix, Extraction, FixKind, GuardFix, GuardVariant, PendingFix};
use crate::features::remediation::domain::PathTraversalSettings;
use crate::features::remediation::infrastructure::scan::{anchor_of, initialized_variable};
use crate::features::remediation::ports::PassServices;
use crate::features::taint_analysis::{FnFlowSpec, Guard};
use crate::features::traversal::infrastructure::{walk_block, walk_expression};
use crate::features::traversal::{Cursor, TreePath, TreeVisitor};
use crate::shared::models::{build, node_id, unwrap_parens, BinaryOp, Block, ExprKind, Expression};

pub(super) static FILE_WITH_CHILD: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("java.io.File <constructor>(.., java.lang.String)").expect("File descriptor")
});

pub(super) static PATH_RESOLVE: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("java.nio.file.Path resolve(..)").expect("resolve descriptor"));

static PATH_STARTS_WITH: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("java.nio.file.Path startsWith(..)").expect("startsWith descriptor"));

static STRING_STARTS_WITH: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("java.lang.String startsWith(..)").expect("startsWith descriptor"));

/// Directory operand that cannot match a sibling with a common prefix
fn is_separated(directory: &Arc<Expression>) -> bool {
    let directory = unwrap_parens(directory);
    match &directory.kind {
        ExprKind::Binary(b) if b.operator == BinaryOp::Add => is_file_separator(&b.right),
        _ => ends_with_separator(directory),
    }
}

pub struct GuardRecorder<'a> {
    services: &'a PassServices,
    settings: &'a PathTraversalSettings,
    /// Child operands reached by user input
    tainted_children: &'a FxHashSet<usize>,
    recorded: usize,
}

impl<'a> GuardRecorder<'a> {
    pub fn new(
        services: &'a PassServices,
        settings: &'a PathTraversalSettings,
        tainted_children: &'a FxHashSet<usize>,
    ) -> Self {
        Self {
            services,
            settings,
            tainted_children,
            recorded: 0,
        }
    }

    /// Number of fixes recorded so far
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    fn is_containment_check(&self, guard: &Guard, branch: bool) -> bool {
        if !branch {
            return false;
        }
        let check = unwrap_parens(&guard.expression);
        let matcher = &self.services.matcher;
        if matcher.matches(check, &PATH_STARTS_WITH) {
            return true;
        }
        matcher.matches(check, &STRING_STARTS_WITH)
            && check.arguments().first().map(is_separated).unwrap_or(false)
    }

    /// Parent operand and tainted child operand of a path construction
    fn operands<'e>(&self, expr: &'e Expression) -> Option<(&'e Arc<Expression>, &'e Arc<Expression>)> {
        let matcher = &self.services.matcher;
        if matcher.matches(expr, &FILE_WITH_CHILD) {
            let args = expr.arguments();
            return Some((args.first()?, args.get(1)?));
        }
        if matcher.matches(expr, &PATH_RESOLVE) {
            let parent = expr.as_method_invocation()?.select.as_ref()?;
            return Some((parent, expr.arguments().first()?));
        }
        None
    }

    /// The construction at the end of `path` reaches a create-file sink unchecked
    fn reaches_sink(&self, path: &TreePath, construction: &Arc<Expression>) -> bool {
        let matcher = self.services.matcher.clone();
        let spec = FnFlowSpec::taint(
            |n| n.is(construction),
            move |n| matcher.is_sink_of(&n.path, &CREATE_FILE_SINKS),
        )
        .sanitized_by(|guard, branch| self.is_containment_check(guard, branch));
        self.services.flow_from(path.clone()).any_local_flow(&spec)
    }

    fn record(&mut self, expr: &Arc<Expression>, parent: &Arc<Expression>, cursor: &mut Cursor) {
        let path = cursor.path();
        let Some(anchor) = anchor_of(&path) else {
            return;
        };
        let fix = match initialized_variable(&path) {
            Some(variable) => {
                let Some(variant) = GuardVariant::select(&variable.ty, &parent.ty) else {
                    tracing::debug!(variable = %variable.name, "operand types outside guard templates, skipped");
                    return;
                };
                PendingFix::new(
                    anchor,
                    build::ident(&variable.name, variable.ty.clone()),
                    FixKind::InsertGuardAfter(GuardFix {
                        variant,
                        message: self.settings.guard_message.clone(),
                    }),
                )
                .with_parent_context(parent.clone())
            }
            None => {
                let suffix = if expr.ty.is_file() {
                    "File"
                } else if expr.ty.is_path() {
                    "Path"
                } else {
                    return;
                };
                PendingFix::new(
                    anchor,
                    expr.clone(),
                    FixKind::ExtractToVariableBefore(Extraction {
                        base_name: format!("{}{}", self.settings.new_variable_prefix, suffix),
                    }),
                )
            }
        };
        if record_fix(cursor, fix) {
            self.recorded += 1;
        }
    }
}

impl TreeVisitor for GuardRecorder<'_> {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        self.services.commit(cursor, block, walked)
    }

    fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
        if let Some((parent, child)) = self.operands(expr) {
            if self.tainted_children.contains(&node_id(child)) && self.reaches_sink(&cursor.path(), expr) {
                let parent = parent.clone();
                self.record(expr, &parent, cursor);
            }
        }
        walk_expression(self, expr, cursor)
    }
}
