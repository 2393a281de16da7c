/*
 * Predictable RandomStringUtils Replacement
 *
 * `RandomStringUtils.random*(..)` of commons-lang draws from a shared
 * `java.util.Random`. A class calling it gets a SecureRandom-backed helper
 *
 *   private static final SecureRandom SECURE_RANDOM = new SecureRandom();
 *   private static final int DEF_COUNT = 20;
 *   static {
 *       SECURE_RANDOM.nextBytes(new byte[64]);
 *   }
 *   ...
 *   private static String generateRandomAlphanumericString() {
 *       return RandomStringUtils.random(DEF_COUNT, 0, 0, true, true, null, SECURE_RANDOM);
 *   }
 *
 * and every call is replaced with `generateRandomAlphanumericString()`. The
 * fields and initializer open the class body; an existing `DEF_COUNT` field
 * gives way to the new one. A class that already has `SECURE_RANDOM` is done.
 */

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::scan::{anchor_of, class_body_owner, expressions_in, member_bodies};
use crate::errors::Result;
use crate::features::matching::MethodSignature;
use crate::features::patch_synthesis::{record_fix, register_import, FixKind, PendingFix, Replacement};
use crate::features::remediation::ports::PassServices;
use crate::features::traversal::infrastructure::{walk_block, walk_expression};
use crate::features::traversal::{Cursor, TreePath, TreeVisitor};
use crate::shared::models::build::{self, jdk};
use crate::shared::models::{
    fqn, Block, ClassDecl, Expression, JavaType, MethodType, Modifier, Primitive, Statement, TreeKind, TreeRef,
};

const SECURE_RANDOM_FIELD: &str = "SECURE_RANDOM";
const COUNT_FIELD: &str = "DEF_COUNT";
const GENERATOR: &str = "generateRandomAlphanumericString";
const DEFAULT_COUNT: i64 = 20;
const WARM_UP_BYTES: i64 = 64;

static RANDOM_STRING: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("org.apache.commons.lang*.RandomStringUtils random*(..)").expect("random string descriptor")
});

pub struct RandomStringUtilsVisitor {
    services: PassServices,
}

impl RandomStringUtilsVisitor {
    pub fn new(services: PassServices) -> Self {
        Self { services }
    }

    fn is_random_string(&self, expr: &Expression) -> bool {
        self.services.matcher.matches(expr, &RANDOM_STRING)
    }

    /// Calls in the field initializers, methods and initializer blocks of the
    /// class body at the end of `path`
    fn calls_in(&self, path: &TreePath) -> Vec<Arc<Expression>> {
        let Some(body) = path.value().and_then(TreeRef::as_block) else {
            return Vec::new();
        };
        let fields = body
            .statements
            .iter()
            .filter(|member| member.as_var_decl().is_some())
            .map(|member| TreeRef::Statement(member.clone()));
        let executable = member_bodies(path).into_iter().filter_map(|p| p.value().cloned());
        fields
            .chain(executable)
            .flat_map(|node| expressions_in(&node))
            .filter(|expr| self.is_random_string(expr))
            .collect()
    }

    /// Record the helper members of the class body `block`
    fn add_generator(&self, block: &Arc<Block>, owner: &JavaType, cursor: &mut Cursor) {
        if field(block, SECURE_RANDOM_FIELD).is_some() {
            return;
        }
        let calls = self.calls_in(&cursor.path());
        if calls.is_empty() {
            return;
        }
        let (Some(first), Some(last)) = (block.statements.first(), block.statements.last()) else {
            return;
        };
        // commons-lang 2 only when nothing in the class uses lang3
        let utils = if calls.iter().all(|call| declared_by(call, fqn::LEGACY_RANDOM_STRING_UTILS)) {
            fqn::LEGACY_RANDOM_STRING_UTILS
        } else {
            fqn::RANDOM_STRING_UTILS
        };
        tracing::debug!(calls = calls.len(), utils, "adding SecureRandom string generator");

        let anchor_call = calls[0].clone();
        let head = vec![secure_random_field(), count_field(), warm_up(owner)];
        if !record_fix(cursor, PendingFix::new(first.clone(), anchor_call.clone(), FixKind::InsertStatementsBefore(head))) {
            return;
        }
        record_fix(
            cursor,
            PendingFix::new(last.clone(), anchor_call.clone(), FixKind::InsertStatementsAfter(vec![generator(owner, utils)])),
        );
        if let Some(existing) = field(block, COUNT_FIELD) {
            record_fix(cursor, PendingFix::new(existing, anchor_call, FixKind::RemoveStatement));
        }
        register_import(cursor, fqn::SECURE_RANDOM);
        register_import(cursor, utils);
    }
}

impl TreeVisitor for RandomStringUtilsVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        if let Some(owner) = class_body_owner(cursor) {
            self.add_generator(block, &owner, cursor);
        }
        self.services.commit(cursor, block, walked)
    }

    fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
        if !self.is_random_string(expr) {
            return walk_expression(self, expr, cursor);
        }
        let Some(class) = cursor.first_enclosing(TreeKind::Class).and_then(TreeRef::as_class).cloned() else {
            return Ok(expr.clone());
        };
        if field(&class.body, SECURE_RANDOM_FIELD).is_some() {
            return Ok(expr.clone());
        }
        let Some(anchor) = anchor_of(&cursor.path()) else {
            return Ok(expr.clone());
        };
        record_fix(
            cursor,
            PendingFix::new(
                anchor,
                expr.clone(),
                FixKind::ReplaceInPlace(Replacement {
                    replacement: build::local_call(generator_type(&class), vec![]),
                    imports: vec![],
                }),
            ),
        );
        Ok(expr.clone())
    }
}

/// Field declaration named `name` among the members of `body`
fn field(body: &Block, name: &str) -> Option<Arc<Statement>> {
    body.statements
        .iter()
        .find(|member| {
            member
                .as_var_decl()
                .map(|d| d.variables.len() == 1 && d.variables[0].name == name)
                .unwrap_or(false)
        })
        .cloned()
}

fn declared_by(call: &Expression, owner: &str) -> bool {
    call.as_method_invocation()
        .and_then(|m| m.method_type.as_ref())
        .map(|t| t.declaring_type.is_of_class(owner))
        .unwrap_or(false)
}

fn constant() -> Vec<Modifier> {
    vec![Modifier::Private, Modifier::Static, Modifier::Final]
}

fn int() -> JavaType {
    JavaType::Primitive(Primitive::Int)
}

fn generator_type(class: &ClassDecl) -> MethodType {
    MethodType::static_method(class.ty.clone(), GENERATOR, vec![], JavaType::string())
}

fn secure_random_field() -> Arc<Statement> {
    build::var_decl_with(
        constant(),
        JavaType::class(fqn::SECURE_RANDOM),
        SECURE_RANDOM_FIELD,
        Some(build::new_instance(jdk::secure_random(), vec![])),
    )
}

fn count_field() -> Arc<Statement> {
    build::var_decl_with(constant(), int(), COUNT_FIELD, Some(build::int_lit(DEFAULT_COUNT)))
}

fn secure_random_read(owner: &JavaType) -> Arc<Expression> {
    build::static_field_ident(SECURE_RANDOM_FIELD, owner.clone(), JavaType::class(fqn::SECURE_RANDOM))
}

/// `static { SECURE_RANDOM.nextBytes(new byte[64]); }`
fn warm_up(owner: &JavaType) -> Arc<Statement> {
    let bytes = build::new_array(JavaType::Primitive(Primitive::Byte), build::int_lit(WARM_UP_BYTES));
    let next_bytes = build::call(secure_random_read(owner), jdk::secure_random_next_bytes(), vec![bytes]);
    Arc::new(Statement::Block(build::static_block(vec![build::expr_stmt(next_bytes)])))
}

fn generator(owner: &JavaType, utils: &str) -> Arc<Statement> {
    let random = build::static_call(
        jdk::random_string_utils_random(utils),
        vec![
            build::static_field_ident(COUNT_FIELD, owner.clone(), int()),
            build::int_lit(0),
            build::int_lit(0),
            build::bool_lit(true),
            build::bool_lit(true),
            build::null_lit(),
            secure_random_read(owner),
        ],
    );
    build::method_returning(
        vec![Modifier::Private, Modifier::Static],
        Some("String"),
        GENERATOR,
        vec![],
        build::block(vec![build::return_stmt(Some(random))]),
    )
}
