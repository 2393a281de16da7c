/*
 * Temporary Directory Creation
 *
 * Recognizes the racy "temp file turned directory" idiom among the
 * statements of one block:
 *
 *   File tmp = File.createTempFile("app", ".d");     // CREATE
 *   tmp.delete();                                   // DELETE
 *   tmp.mkdir();                                    // MKDIR
 *
 * and rewrites it to `File tmp = Files.createTempDirectory("app" + ".d").toFile();`.
 * The delete and mkdir steps may also be written as `if (!tmp.delete()) ..`
 * without an else branch. Assigning the variable anything else before MKDIR
 * starts over.
 */

use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::features::matching::{MethodSignature, ShapeMatcher};
use crate::features::patch_synthesis::{record_fix, FixKind, PendingFix, Replacement};
use crate::features::remediation::ports::PassServices;
use crate::features::traversal::infrastructure::walk_block;
use crate::features::traversal::{Cursor, TreeVisitor};
use crate::shared::models::build::{self, jdk};
use crate::shared::models::{
    fqn, unwrap_parens, Block, ExprKind, Expression, Literal, Statement, TreeRef, UnaryOp,
};

pub(super) static CREATE_TEMP_FILE: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("java.io.File createTempFile(..)").expect("createTempFile descriptor"));

static DELETE: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("java.io.File delete()").expect("delete descriptor"));

static MKDIR: Lazy<Vec<MethodSignature>> = Lazy::new(|| {
    ["java.io.File mkdir()", "java.io.File mkdirs()"]
        .iter()
        .map(|d| MethodSignature::parse(d).expect("mkdir descriptor"))
        .collect()
});

/// Progress of the idiom for one variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Created,
    Deleted,
}

#[derive(Debug, Clone)]
struct Chain {
    stage: Stage,
    create: Arc<Expression>,
    create_statement: Arc<Statement>,
    delete_statement: Option<Arc<Statement>>,
}

/// A completed create, delete, mkdir sequence
#[derive(Debug, Clone)]
pub struct TempDirectorySite {
    /// The `File.createTempFile(..)` call
    pub create: Arc<Expression>,
    pub create_statement: Arc<Statement>,
    pub delete_statement: Arc<Statement>,
    pub mkdir_statement: Arc<Statement>,
}

/// Every completed sequence among the statements of `block`
pub fn find_temp_directory_sites(block: &Block, matcher: &dyn ShapeMatcher) -> Vec<TempDirectorySite> {
    let mut chains: FxHashMap<String, Chain> = FxHashMap::default();
    let mut sites = Vec::new();

    for statement in &block.statements {
        if let Some((name, create)) = temp_file_binding(statement, matcher) {
            chains.insert(
                name,
                Chain {
                    stage: Stage::Created,
                    create,
                    create_statement: statement.clone(),
                    delete_statement: None,
                },
            );
            continue;
        }
        if let Some(name) = reassigned(statement) {
            chains.remove(name);
            continue;
        }
        if let Some(name) = file_step(statement, |call| matcher.matches(call, &DELETE)) {
            if let Some(chain) = chains.get_mut(name).filter(|c| c.stage == Stage::Created) {
                chain.stage = Stage::Deleted;
                chain.delete_statement = Some(statement.clone());
            }
            continue;
        }
        if let Some(name) = file_step(statement, |call| matcher.matches_any(call, &MKDIR)) {
            let completed = chains.get(name).map(|c| c.stage == Stage::Deleted).unwrap_or(false);
            if !completed {
                continue;
            }
            if let Some(Chain {
                create,
                create_statement,
                delete_statement: Some(delete_statement),
                ..
            }) = chains.remove(name)
            {
                sites.push(TempDirectorySite {
                    create,
                    create_statement,
                    delete_statement,
                    mkdir_statement: statement.clone(),
                });
            }
        }
    }
    sites
}

/// `File f = File.createTempFile(..);` or `f = File.createTempFile(..);`
fn temp_file_binding(statement: &Statement, matcher: &dyn ShapeMatcher) -> Option<(String, Arc<Expression>)> {
    let is_create = |e: &Arc<Expression>| matcher.matches(unwrap_parens(e), &CREATE_TEMP_FILE);
    match statement {
        Statement::VarDecl(decls) if decls.variables.len() == 1 => {
            let variable = &decls.variables[0];
            let init = variable.initializer.as_ref().filter(|e| is_create(*e))?;
            variable
                .ty
                .is_file()
                .then(|| (variable.name.clone(), unwrap_parens(init).clone()))
        }
        Statement::Expr(e) => match &e.kind {
            ExprKind::Assignment(a) if a.operator.is_none() && is_create(&a.value) => {
                let name = a.target.local_name()?;
                a.target.ty.is_file().then(|| (name.to_string(), unwrap_parens(&a.value).clone()))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Local assigned by an expression statement
fn reassigned(statement: &Statement) -> Option<&str> {
    match &statement.as_expression()?.kind {
        ExprKind::Assignment(a) => a.target.local_name(),
        _ => None,
    }
}

/// `f.step();` or `if (!f.step()) ..` without else; returns `f`
fn file_step(statement: &Statement, is_step: impl Fn(&Expression) -> bool) -> Option<&str> {
    let call = match statement {
        Statement::Expr(e) => e,
        Statement::If(i) if i.else_branch.is_none() => match &unwrap_parens(&i.condition).kind {
            ExprKind::Unary(u) if u.operator == UnaryOp::Not => &u.operand,
            _ => return None,
        },
        _ => return None,
    };
    let call = unwrap_parens(call);
    if !is_step(&**call) {
        return None;
    }
    call.as_method_invocation()?
        .select
        .as_ref()
        .and_then(|s| unwrap_parens(s).local_name())
}

fn is_null(expr: &Arc<Expression>) -> bool {
    matches!(unwrap_parens(expr).kind, ExprKind::Literal(Literal::Null))
}

/// `Files.createTempDirectory([dir.toPath(), ]prefix + suffix).toFile()`
pub fn temp_directory_replacement(create: &Expression) -> Option<Arc<Expression>> {
    let args = create.arguments();
    let (prefix, suffix) = (args.first()?, args.get(1)?);
    let name = if is_null(suffix) {
        prefix.clone()
    } else {
        build::add(prefix.clone(), suffix.clone())
    };
    let directory = match args.get(2) {
        Some(dir) if !is_null(dir) => build::static_call(
            jdk::files_create_temp_directory_in(),
            vec![build::call(dir.clone(), jdk::file_to_path(), vec![]), name],
        ),
        _ => build::static_call(jdk::files_create_temp_directory(), vec![name]),
    };
    Some(build::call(directory, jdk::path_to_file(), vec![]))
}

pub struct TempDirectoryVisitor {
    services: PassServices,
}

impl TempDirectoryVisitor {
    pub fn new(services: PassServices) -> Self {
        Self { services }
    }

    fn record(&self, site: TempDirectorySite, cursor: &mut Cursor) {
        let Some(replacement) = temp_directory_replacement(&site.create) else {
            return;
        };
        tracing::debug!("replacing temp file directory idiom");
        record_fix(
            cursor,
            PendingFix::new(
                site.create_statement,
                site.create.clone(),
                FixKind::ReplaceInPlace(Replacement {
                    replacement,
                    imports: vec![fqn::FILES.to_string()],
                }),
            ),
        );
        for statement in [site.delete_statement, site.mkdir_statement] {
            record_fix(cursor, PendingFix::new(statement, site.create.clone(), FixKind::RemoveStatement));
        }
    }
}

impl TreeVisitor for TempDirectoryVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        if !matches!(cursor.parent(), Some(TreeRef::Class(_))) {
            for site in find_temp_directory_sites(block, self.services.matcher.as_ref()) {
                self.record(site, cursor);
            }
        }
        self.services.commit(cursor, block, walked)
    }
}
