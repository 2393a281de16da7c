/*
 * Predictable SecureRandom Seed Removal
 *
 * Drops `random.setSeed(<predictable>);` statements. A seed is predictable
 * when it is a literal, the clock (`System.currentTimeMillis()`,
 * `System.nanoTime()`, any `Date` accessor) or the bytes of a literal.
 *
 * Only statements directly inside a block are removed; a call used as a
 * branch body without braces is left for a human.
 */

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::errors::Result;
use crate::features::matching::MethodSignature;
use crate::features::patch_synthesis::{record_fix, FixKind, PendingFix};
use crate::features::remediation::ports::PassServices;
use crate::features::traversal::infrastructure::{walk_block, walk_statement};
use crate::features::traversal::{Cursor, TreeVisitor};
use crate::shared::models::{fqn, unwrap_parens, Block, ExprKind, Expression, Statement, TreeRef};

static SET_SEED: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("java.security.SecureRandom setSeed(..)").expect("setSeed descriptor"));

static CLOCK: Lazy<Vec<MethodSignature>> = Lazy::new(|| {
    ["java.lang.System currentTimeMillis()", "java.lang.System nanoTime()"]
        .iter()
        .map(|d| MethodSignature::parse(d).expect("clock descriptor"))
        .collect()
});

static LITERAL_BYTES: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("java.lang.String getBytes(..)").expect("getBytes descriptor"));

pub struct SecureRandomSeedVisitor {
    services: PassServices,
}

impl SecureRandomSeedVisitor {
    pub fn new(services: PassServices) -> Self {
        Self { services }
    }

    fn is_predictable(&self, seed: &Arc<Expression>) -> bool {
        let seed = unwrap_parens(seed);
        match &seed.kind {
            ExprKind::Literal(_) => true,
            ExprKind::TypeCast(cast) => self.is_predictable(&cast.expression),
            ExprKind::MethodInvocation(m) => {
                if self.services.matcher.matches_any(seed, &CLOCK) {
                    return true;
                }
                if self.services.matcher.matches(seed, &LITERAL_BYTES) {
                    return m
                        .select
                        .as_ref()
                        .map(|s| matches!(unwrap_parens(s).kind, ExprKind::Literal(_)))
                        .unwrap_or(false);
                }
                seed.method_type()
                    .map(|method| method.declaring_type.is_assignable_to(fqn::DATE))
                    .unwrap_or(false)
            }
            _ => false,
        }
    }

    fn predictable_seeding<'a>(&self, statement: &'a Statement) -> Option<&'a Arc<Expression>> {
        let call = statement.as_expression()?;
        if !self.services.matcher.matches(call, &SET_SEED) {
            return None;
        }
        let seed = call.arguments().first()?;
        self.is_predictable(seed).then_some(call)
    }
}

impl TreeVisitor for SecureRandomSeedVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        self.services.commit(cursor, block, walked)
    }

    fn visit_statement(&mut self, statement: &Arc<Statement>, cursor: &mut Cursor) -> Result<Arc<Statement>> {
        let in_block = matches!(cursor.parent(), Some(TreeRef::Block(_)));
        match self.predictable_seeding(statement) {
            Some(call) if in_block => {
                tracing::debug!("removing predictable setSeed");
                record_fix(cursor, PendingFix::new(statement.clone(), call.clone(), FixKind::RemoveStatement));
                Ok(statement.clone())
            }
            _ => walk_statement(self, statement, cursor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::remediation::infrastructure::testing::{printed_body, run, unit};
    use crate::shared::models::build::{self, jdk};
    use crate::shared::models::JavaType;
    use pretty_assertions::assert_eq;

    fn random() -> Arc<Expression> {
        build::ident("random", JavaType::class(fqn::SECURE_RANDOM))
    }

    fn seed(value: Arc<Expression>) -> Arc<Statement> {
        build::expr_stmt(build::call(random(), jdk::secure_random_set_seed(), vec![value]))
    }

    fn declare() -> Arc<Statement> {
        build::var_decl(
            JavaType::class(fqn::SECURE_RANDOM),
            "random",
            Some(build::new_instance(jdk::secure_random(), vec![])),
        )
    }

    #[test]
    fn test_constant_and_clock_seeds_removed() {
        let cu = unit(
            &[],
            vec![],
            vec![
                declare(),
                seed(build::long_lit(123)),
                seed(build::static_call(jdk::system_current_time_millis(), vec![])),
                seed(build::call(
                    build::ident("now", JavaType::class(fqn::DATE)),
                    jdk::date_get_time(),
                    vec![],
                )),
                seed(build::call(build::string_lit("seed"), jdk::string_get_bytes(), vec![])),
            ],
        );
        let mut visitor = SecureRandomSeedVisitor::new(PassServices::default());
        let out = run(&mut visitor, &cu);
        assert_eq!(printed_body(&out), "SecureRandom random = new SecureRandom();\n");
    }

    #[test]
    fn test_unpredictable_seed_kept() {
        let cu = unit(
            &[],
            vec![],
            vec![declare(), seed(build::ident("entropy", JavaType::Primitive(crate::shared::models::Primitive::Long)))],
        );
        let mut visitor = SecureRandomSeedVisitor::new(PassServices::default());
        let out = run(&mut visitor, &cu);
        assert!(Arc::ptr_eq(&out, &cu));
    }

    #[test]
    fn test_unbraced_branch_body_kept() {
        let cu = unit(
            &[],
            vec![],
            vec![
                declare(),
                build::if_stmt(build::ident("debug", JavaType::boolean()), seed(build::long_lit(1)), None),
            ],
        );
        let mut visitor = SecureRandomSeedVisitor::new(PassServices::default());
        let out = run(&mut visitor, &cu);
        assert!(Arc::ptr_eq(&out, &cu));
    }
}
