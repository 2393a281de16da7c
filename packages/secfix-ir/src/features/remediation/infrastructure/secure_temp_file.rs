/*
 * Secure Temporary File Creation
 *
 * `File.createTempFile(..)` creates world-readable files on some platforms;
 * `Files.createTempFile(..)` applies owner-only permissions.
 *
 *   File.createTempFile(p, s)        ->  Files.createTempFile(p, s).toFile()
 *   File.createTempFile(p, s, dir)   ->  Files.createTempFile(dir.toPath(), p, s).toFile()
 *
 * A `null` directory means the default location and takes the two-argument
 * form. Calls that start the temp directory idiom are left to that fix.
 */

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::scan::anchor_of;
use super::temp_directory::{find_temp_directory_sites, CREATE_TEMP_FILE};
use crate::errors::Result;
use crate::features::patch_synthesis::{record_fix, FixKind, PendingFix, Replacement};
use crate::features::remediation::ports::PassServices;
use crate::features::traversal::infrastructure::{walk_block, walk_expression};
use crate::features::traversal::{Cursor, TreeVisitor};
use crate::shared::models::build::{self, jdk};
use crate::shared::models::{fqn, node_id, unwrap_parens, Block, ExprKind, Expression, Literal, TreeRef};

pub struct SecureTempFileVisitor {
    services: PassServices,
    /// Creations claimed by a temp directory sequence
    claimed: FxHashSet<usize>,
}

impl SecureTempFileVisitor {
    pub fn new(services: PassServices) -> Self {
        Self {
            services,
            claimed: FxHashSet::default(),
        }
    }
}

/// `Files.createTempFile(..)` equivalent of a `File.createTempFile(..)` call
pub fn secure_temp_file_replacement(create: &Expression) -> Option<Arc<Expression>> {
    let args = create.arguments();
    let (prefix, suffix) = (args.first()?, args.get(1)?);
    let created = match args.get(2) {
        Some(dir) if !matches!(unwrap_parens(dir).kind, ExprKind::Literal(Literal::Null)) => build::static_call(
            jdk::files_create_temp_file_in(),
            vec![
                build::call(dir.clone(), jdk::file_to_path(), vec![]),
                prefix.clone(),
                suffix.clone(),
            ],
        ),
        _ => build::static_call(jdk::files_create_temp_file(), vec![prefix.clone(), suffix.clone()]),
    };
    Some(build::call(created, jdk::path_to_file(), vec![]))
}

impl TreeVisitor for SecureTempFileVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        if !matches!(cursor.parent(), Some(TreeRef::Class(_))) {
            let sites = find_temp_directory_sites(block, self.services.matcher.as_ref());
            self.claimed.extend(sites.iter().map(|site| node_id(&site.create)));
        }
        let walked = walk_block(self, block, cursor)?;
        self.services.commit(cursor, block, walked)
    }

    fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
        if !self.services.matcher.matches(expr, &CREATE_TEMP_FILE) || self.claimed.contains(&node_id(expr)) {
            return walk_expression(self, expr, cursor);
        }
        let (Some(anchor), Some(replacement)) = (anchor_of(&cursor.path()), secure_temp_file_replacement(expr))
        else {
            return walk_expression(self, expr, cursor);
        };
        tracing::debug!(arguments = expr.arguments().len(), "replacing File.createTempFile");
        record_fix(
            cursor,
            PendingFix::new(
                anchor,
                expr.clone(),
                FixKind::ReplaceInPlace(Replacement {
                    replacement,
                    imports: vec![fqn::FILES.to_string()],
                }),
            ),
        );
        Ok(expr.clone())
    }
}
