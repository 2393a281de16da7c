//! Partial path containment checks
//!
//! `path.startsWith(dir.getCanonicalPath())` also accepts the sibling
//! `/data/uploads-evil` of `/data/uploads`. The directory gets a trailing
//! separator: `path.startsWith(dir.getCanonicalPath() + File.separator)`.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::errors::Result;
use crate::features::matching::MethodSignature;
use crate::features::patch_synthesis::{record_fix, FixKind, PendingFix, Replacement};
use crate::features::remediation::infrastructure::scan::anchor_of;
use crate::features::remediation::ports::PassServices;
use crate::features::traversal::infrastructure::{walk_block, walk_expression};
use crate::features::traversal::{Cursor, TreeVisitor};
use crate::shared::models::build;
use crate::shared::models::{fqn, unwrap_parens, Block, Expression, JavaType};

static STRING_STARTS_WITH: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("java.lang.String startsWith(java.lang.String)").expect("startsWith descriptor")
});

static CANONICAL_PATH: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("java.io.File getCanonicalPath()").expect("getCanonicalPath descriptor")
});

pub struct PartialPathFixer<'a> {
    services: &'a PassServices,
}

impl<'a> PartialPathFixer<'a> {
    pub fn new(services: &'a PassServices) -> Self {
        Self { services }
    }

    /// Directory argument of a partial-path `startsWith` check
    fn partial_directory<'e>(&self, expr: &'e Expression) -> Option<&'e Arc<Expression>> {
        if !self.services.matcher.matches(expr, &STRING_STARTS_WITH) {
            return None;
        }
        let directory = expr.arguments().first()?;
        self.services
            .matcher
            .matches(unwrap_parens(directory), &CANONICAL_PATH)
            .then_some(directory)
    }
}

impl TreeVisitor for PartialPathFixer<'_> {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        self.services.commit(cursor, block, walked)
    }

    fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
        if let (Some(directory), Some(anchor)) = (self.partial_directory(expr), anchor_of(&cursor.path())) {
            tracing::debug!("appending separator to partial path check");
            let separator = build::static_field(JavaType::file(), "separator", JavaType::string());
            record_fix(
                cursor,
                PendingFix::new(
                    anchor,
                    directory.clone(),
                    FixKind::ReplaceInPlace(Replacement {
                        replacement: build::add(directory.clone(), separator),
                        imports: vec![fqn::FILE.to_string()],
                    }),
                ),
            );
        }
        walk_expression(self, expr, cursor)
    }
}
