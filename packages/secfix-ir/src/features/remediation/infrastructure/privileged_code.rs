/*
 * Privileged Code Search
 *
 * Code marked privileged runs with the permissions of its own protection
 * domain instead of its callers'. Two shapes are reported:
 *
 *   class MyAction implements PrivilegedAction<Integer> { ... }
 *   AccessController.doPrivileged(..)
 *
 * Nothing is rewritten; each site becomes a Finding of the pass.
 */

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::findings::{location_of, report_finding};
use crate::errors::Result;
use crate::features::matching::MethodSignature;
use crate::features::remediation::domain::Finding;
use crate::features::remediation::ports::PassServices;
use crate::features::traversal::infrastructure::{walk_class, walk_expression, walk_statement};
use crate::features::traversal::{Cursor, TreeVisitor};
use crate::shared::models::{fqn, ClassDecl, Expression, Statement};
use crate::shared::utils::print_expression;

static DO_PRIVILEGED: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("java.security.AccessController doPrivileged(..)").expect("doPrivileged descriptor")
});

pub struct PrivilegedCodeVisitor {
    services: PassServices,
    remediation_id: String,
}

impl PrivilegedCodeVisitor {
    pub fn new(services: PassServices, remediation_id: impl Into<String>) -> Self {
        Self {
            services,
            remediation_id: remediation_id.into(),
        }
    }

    fn report(&self, cursor: &mut Cursor, snippet: String) {
        let location = location_of(&cursor.path());
        tracing::debug!(%location, "privileged code found");
        report_finding(
            cursor,
            Finding {
                remediation_id: self.remediation_id.clone(),
                location,
                snippet,
            },
        );
    }

    fn check_class(&self, class: &ClassDecl, cursor: &mut Cursor) {
        if class.ty.is_assignable_to(fqn::PRIVILEGED_ACTION) {
            self.report(cursor, format!("class {}", class.name));
        }
    }
}

impl TreeVisitor for PrivilegedCodeVisitor {
    fn visit_class(&mut self, class: &Arc<ClassDecl>, cursor: &mut Cursor) -> Result<Arc<ClassDecl>> {
        self.check_class(class, cursor);
        walk_class(self, class, cursor)
    }

    fn visit_statement(&mut self, statement: &Arc<Statement>, cursor: &mut Cursor) -> Result<Arc<Statement>> {
        if let Statement::ClassDecl(class) = statement.as_ref() {
            self.check_class(class, cursor);
        }
        walk_statement(self, statement, cursor)
    }

    fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
        if self.services.matcher.matches(expr, &DO_PRIVILEGED) {
            self.report(cursor, print_expression(expr));
        }
        walk_expression(self, expr, cursor)
    }
}
