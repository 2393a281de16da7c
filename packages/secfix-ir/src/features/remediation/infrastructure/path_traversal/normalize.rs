/*
 * File Constructor Normalization
 *
 * Paths glued together by string concatenation are split into the
 * two-argument `File` constructor, so that the child part becomes argument 1
 * where the guard flow looks for it:
 *
 *   new File(a + File.separator + b)   ->  new File(a, b)
 *   new File("out/" + b)               ->  new File("out/", b)
 *   new File(a + b)                    ->  new File(a, b)      (b user input)
 *   new File(a + "/" + b + ".bin")     ->  new File(a, b + ".bin")
 *
 * A String path handed to a create-file constructor is wrapped first:
 *
 *   new FileOutputStream(a + "/" + b)  ->  new FileOutputStream(new File(a, b))
 */

use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use crate::errors::Result;
use crate::features::matching::domain::{ends_with_separator, is_file_separator};
use crate::features::matching::MethodSignature;
use crate::features::patch_synthesis::{record_fix, FixKind, PendingFix, Replacement};
use crate::features::remediation::infrastructure::scan::{anchor_of, expressions_in};
use crate::features::remediation::ports::PassServices;
use crate::features::traversal::infrastructure::{walk_block, walk_expression};
use crate::features::traversal::{Cursor, TreeVisitor};
use crate::shared::models::build::{self, jdk};
use crate::shared::models::{
    fqn, node_id, unwrap_parens, BinaryOp, Block, ExprKind, Expression, JavaType, MethodType, TreeRef,
};

static FILE_OF_STRING: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("java.io.File <constructor>(java.lang.String)").expect("File descriptor"));

static STRING_PATH_SINKS: Lazy<Vec<MethodSignature>> = Lazy::new(|| {
    [
        "java.io.FileOutputStream <constructor>(java.lang.String, ..)",
        "java.io.FileWriter <constructor>(java.lang.String, ..)",
        "java.io.PrintWriter <constructor>(java.lang.String, ..)",
        "java.io.PrintStream <constructor>(java.lang.String, ..)",
        "java.io.RandomAccessFile <constructor>(java.lang.String, ..)",
    ]
    .iter()
    .map(|d| MethodSignature::parse(d).expect("create-file descriptor"))
    .collect()
});

/// Operands of a left-nested String concatenation, leftmost first
fn concatenated(expr: &Arc<Expression>) -> Vec<Arc<Expression>> {
    let mut operands = Vec::new();
    let mut current = unwrap_parens(expr).clone();
    loop {
        let next = match &current.kind {
            ExprKind::Binary(b) if b.operator == BinaryOp::Add && current.ty.is_string() => {
                operands.push(b.right.clone());
                b.left.clone()
            }
            _ => break,
        };
        current = next;
    }
    operands.push(current);
    operands.reverse();
    operands
}

fn concatenate(operands: &[Arc<Expression>]) -> Option<Arc<Expression>> {
    let (first, rest) = operands.split_first()?;
    Some(rest.iter().fold(first.clone(), |acc, e| build::add(acc, e.clone())))
}

/// Split point of a concatenated path: `(parent operands, child operands)`
fn split_point(operands: &[Arc<Expression>], user_input: &FxHashSet<usize>) -> Option<(usize, usize)> {
    let last = operands.len().checked_sub(1)?;
    if let Some(i) = (1..last).find(|&i| is_file_separator(&operands[i])) {
        return Some((i, i + 1));
    }
    if let Some(i) = (0..last).find(|&i| ends_with_separator(&operands[i])) {
        return Some((i + 1, i + 1));
    }
    (1..=last)
        .find(|&i| {
            expressions_in(&TreeRef::Expression(operands[i].clone()))
                .iter()
                .any(|e| user_input.contains(&node_id(e)))
        })
        .map(|i| (i, i))
}

/// `new File(parent, child)` for a concatenated String path, if it splits
pub fn split_file_path(path: &Arc<Expression>, user_input: &FxHashSet<usize>) -> Option<Arc<Expression>> {
    let operands = concatenated(path);
    if operands.len() < 2 {
        return None;
    }
    let (parent_end, child_start) = split_point(&operands, user_input)?;
    let parent = concatenate(&operands[..parent_end])?;
    let child = concatenate(&operands[child_start..])?;
    if !child.ty.is_string() {
        return None;
    }
    let constructor = if parent.ty.is_file() {
        jdk::file_of_parent_and_child()
    } else if parent.ty.is_string() {
        jdk::file_of_strings()
    } else {
        return None;
    };
    Some(build::new_instance(constructor, vec![parent, child]))
}

/// `new X(new File(path), ..)` for `new X(path, ..)`
fn with_file_argument(sink: &Expression, file: Arc<Expression>) -> Option<Arc<Expression>> {
    let ExprKind::NewClass(new_class) = &sink.kind else {
        return None;
    };
    let mut new_class = new_class.clone();
    *new_class.arguments.first_mut()? = file;
    new_class.constructor_type = new_class.constructor_type.map(|constructor| {
        let mut parameter_types = constructor.parameter_types.clone();
        if let Some(first) = parameter_types.first_mut() {
            *first = JavaType::file();
        }
        MethodType {
            parameter_types,
            ..constructor
        }
    });
    Some(build::expr(ExprKind::NewClass(new_class), sink.ty.clone()))
}

/// Sub-visitor rewriting concatenated paths inside one executable body
pub struct FileConstructorNormalizer<'a> {
    services: &'a PassServices,
    user_input: &'a FxHashSet<usize>,
}

impl<'a> FileConstructorNormalizer<'a> {
    pub fn new(services: &'a PassServices, user_input: &'a FxHashSet<usize>) -> Self {
        Self { services, user_input }
    }

    fn reads_user_input(&self, expr: &Arc<Expression>) -> bool {
        expressions_in(&TreeRef::Expression(expr.clone()))
            .iter()
            .any(|e| self.user_input.contains(&node_id(e)))
    }

    fn rewrite(&self, expr: &Arc<Expression>) -> Option<(Arc<Expression>, Vec<String>)> {
        let matcher = &self.services.matcher;
        if matcher.matches(expr, &FILE_OF_STRING) {
            let path = expr.arguments().first()?;
            return split_file_path(path, self.user_input).map(|file| (file, Vec::new()));
        }
        if matcher.matches_any(expr, &STRING_PATH_SINKS) {
            let path = expr.arguments().first()?;
            if !path.ty.is_string() || !self.reads_user_input(path) {
                return None;
            }
            let file = split_file_path(path, self.user_input)
                .unwrap_or_else(|| build::new_instance(jdk::file_of_string(), vec![path.clone()]));
            return with_file_argument(expr, file).map(|sink| (sink, vec![fqn::FILE.to_string()]));
        }
        None
    }
}

impl TreeVisitor for FileConstructorNormalizer<'_> {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        self.services.commit(cursor, block, walked)
    }

    fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
        let Some((replacement, imports)) = self.rewrite(expr) else {
            return walk_expression(self, expr, cursor);
        };
        let Some(anchor) = anchor_of(&cursor.path()) else {
            return walk_expression(self, expr, cursor);
        };
        tracing::debug!(id = node_id(expr), "splitting concatenated file path");
        record_fix(
            cursor,
            PendingFix::new(anchor, expr.clone(), FixKind::ReplaceInPlace(Replacement { replacement, imports })),
        );
        Ok(expr.clone())
    }
}
