/*
 * Insecure Random Replacement
 *
 * Every `new Random(..)` becomes `new SecureRandom()`. The declared type of
 * the receiving variable is kept: SecureRandom extends Random.
 *
 * A seed argument is dropped along with the constructor. SecureRandom has no
 * `long` constructor and a seeded generator is predictable anyway.
 */

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::scan::anchor_of;
use crate::errors::Result;
use crate::features::matching::MethodSignature;
use crate::features::patch_synthesis::{record_fix, FixKind, PendingFix, Replacement};
use crate::features::remediation::ports::PassServices;
use crate::features::traversal::infrastructure::{walk_block, walk_expression};
use crate::features::traversal::{Cursor, TreeVisitor};
use crate::shared::models::build::{self, jdk};
use crate::shared::models::{fqn, Block, Expression};

static NEW_RANDOM: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("java.util.Random <constructor>(..)").expect("random descriptor"));

pub struct SecureRandomVisitor {
    services: PassServices,
}

impl SecureRandomVisitor {
    pub fn new(services: PassServices) -> Self {
        Self { services }
    }

    fn is_insecure_random(&self, expr: &Expression) -> bool {
        // Subclasses of Random, SecureRandom included, are out of scope
        expr.ty.is_of_class(fqn::RANDOM) && self.services.matcher.matches(expr, &NEW_RANDOM)
    }
}

impl TreeVisitor for SecureRandomVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        self.services.commit(cursor, block, walked)
    }

    fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
        if !self.is_insecure_random(expr) {
            return walk_expression(self, expr, cursor);
        }
        let Some(anchor) = anchor_of(&cursor.path()) else {
            return Ok(expr.clone());
        };
        tracing::debug!("replacing new Random()");
        record_fix(
            cursor,
            PendingFix::new(
                anchor,
                expr.clone(),
                FixKind::ReplaceInPlace(Replacement {
                    replacement: build::new_instance(jdk::secure_random(), vec![]),
                    imports: vec![fqn::SECURE_RANDOM.to_string()],
                }),
            ),
        );
        Ok(expr.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::remediation::infrastructure::testing::{printed_body, run, unit};
    use crate::shared::models::JavaType;
    use crate::shared::utils::print_compilation_unit;
    use pretty_assertions::assert_eq;

    fn visitor() -> SecureRandomVisitor {
        SecureRandomVisitor::new(PassServices::default())
    }

    #[test]
    fn test_unseeded_random_replaced_with_import() {
        let cu = unit(
            &["java.util.Random"],
            vec![],
            vec![build::var_decl(
                JavaType::class(fqn::RANDOM),
                "r",
                Some(build::new_instance(jdk::random(), vec![])),
            )],
        );
        let out = run(&mut visitor(), &cu);

        assert_eq!(printed_body(&out), "Random r = new SecureRandom();\n");
        assert!(print_compilation_unit(&out).contains("import java.security.SecureRandom;"));
    }

    #[test]
    fn test_nested_in_argument_list() {
        let use_random = build::static_call(
            crate::shared::models::MethodType::static_method(
                JavaType::class("com.example.Dice"),
                "roll",
                vec![JavaType::class(fqn::RANDOM)],
                JavaType::void(),
            ),
            vec![build::new_instance(jdk::random(), vec![])],
        );
        let cu = unit(&[], vec![], vec![build::expr_stmt(use_random)]);
        let out = run(&mut visitor(), &cu);
        assert_eq!(printed_body(&out), "Dice.roll(new SecureRandom());\n");
    }

    #[test]
    fn test_seeded_random_loses_seed() {
        let cu = unit(
            &[],
            vec![],
            vec![build::var_decl(
                JavaType::class(fqn::RANDOM),
                "seeded",
                Some(build::new_instance(jdk::random_seeded(), vec![build::long_lit(42)])),
            )],
        );
        let out = run(&mut visitor(), &cu);
        assert_eq!(printed_body(&out), "Random seeded = new SecureRandom();\n");
    }

    #[test]
    fn test_secure_random_untouched() {
        let cu = unit(
            &[],
            vec![],
            vec![build::var_decl(
                JavaType::class(fqn::SECURE_RANDOM),
                "secure",
                Some(build::new_instance(jdk::secure_random(), vec![])),
            )],
        );
        let out = run(&mut visitor(), &cu);
        assert!(Arc::ptr_eq(&out, &cu));
    }
}
