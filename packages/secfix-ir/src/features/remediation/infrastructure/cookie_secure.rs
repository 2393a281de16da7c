/*
 * Cookie Secure Flag
 *
 * For every `Cookie c = new Cookie(..)` the uses of `c` are followed with a
 * value flow:
 *
 * - no `setSecure` call reached: `c.setSecure(true);` is inserted after the
 *   declaration
 * - every `setSecure` call reached passes literal `false`: the arguments
 *   become `true`
 * - some call passes `true` or a computed value: the owner decided, nothing
 *   is changed
 */

use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use super::scan::{anchor_of, initialized_variable, parent_call};
use crate::errors::Result;
use crate::features::matching::MethodSignature;
use crate::features::patch_synthesis::{record_fix, FixKind, PendingFix, Replacement};
use crate::features::remediation::ports::PassServices;
use crate::features::taint_analysis::FnFlowSpec;
use crate::features::traversal::infrastructure::{walk_block, walk_expression};
use crate::features::traversal::{Cursor, TreePath, TreeVisitor};
use crate::shared::models::build::{self, jdk};
use crate::shared::models::{node_id, unwrap_parens, Block, ExprKind, Expression, Literal};

static NEW_COOKIE: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("javax.servlet.http.Cookie <constructor>(..)").expect("cookie descriptor"));

static SET_SECURE: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("javax.servlet.http.Cookie setSecure(boolean)").expect("setSecure descriptor")
});

pub struct CookieSecureVisitor {
    services: PassServices,
    /// `setSecure(false)` calls to flip when the walk reaches them
    insecure_calls: FxHashSet<usize>,
}

impl CookieSecureVisitor {
    pub fn new(services: PassServices) -> Self {
        Self {
            services,
            insecure_calls: FxHashSet::default(),
        }
    }

    /// `setSecure` calls reached by the cookie created at the end of `path`
    fn secure_calls(&self, path: &TreePath, cookie: &Arc<Expression>) -> Vec<Arc<Expression>> {
        let matcher = self.services.matcher.clone();
        let spec = FnFlowSpec::value(|n| n.is(cookie), move |n| matcher.is_receiver_of(&n.path, &SET_SECURE));
        self.services
            .flow_from(path.clone())
            .find_sinks(&spec)
            .sinks
            .iter()
            .filter_map(|sink| parent_call(&sink.path))
            .collect()
    }

    fn check_cookie(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) {
        let path = cursor.path();
        let Some(variable) = initialized_variable(&path).cloned() else {
            return;
        };
        let calls = self.secure_calls(&path, expr);

        if calls.is_empty() {
            let Some(declaration) = anchor_of(&path) else {
                return;
            };
            tracing::debug!(cookie = %variable.name, "adding setSecure(true)");
            let enable = build::expr_stmt(build::call(
                build::ident(&variable.name, variable.ty.clone()),
                jdk::cookie_set_secure(),
                vec![build::bool_lit(true)],
            ));
            record_fix(
                cursor,
                PendingFix::new(declaration, expr.clone(), FixKind::InsertStatementsAfter(vec![enable])),
            );
            return;
        }

        if calls.iter().all(|call| passes_false(call)) {
            self.insecure_calls.extend(calls.iter().map(node_id));
        }
    }

    fn flip(&self, call: &Arc<Expression>, cursor: &mut Cursor) {
        let (Some(anchor), Some(arg)) = (anchor_of(&cursor.path()), call.arguments().first()) else {
            return;
        };
        tracing::debug!("setSecure(false) becomes setSecure(true)");
        record_fix(
            cursor,
            PendingFix::new(
                anchor,
                arg.clone(),
                FixKind::ReplaceInPlace(Replacement {
                    replacement: build::bool_lit(true),
                    imports: vec![],
                }),
            ),
        );
    }
}

impl TreeVisitor for CookieSecureVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        self.services.commit(cursor, block, walked)
    }

    fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
        if self.insecure_calls.remove(&node_id(expr)) {
            self.flip(expr, cursor);
        } else if self.services.matcher.matches(expr, &NEW_COOKIE) {
            self.check_cookie(expr, cursor);
        }
        walk_expression(self, expr, cursor)
    }
}

fn passes_false(call: &Arc<Expression>) -> bool {
    call.arguments()
        .first()
        .map(|arg| matches!(unwrap_parens(arg).kind, ExprKind::Literal(Literal::Boolean(false))))
        .unwrap_or(false)
}
