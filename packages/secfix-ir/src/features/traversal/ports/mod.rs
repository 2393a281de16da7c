//! Visitor port
//!
//! A [`TreeVisitor`] rewrites a tree bottom-up. Each `visit_*` method is
//! called with the cursor positioned on the node being visited and returns the
//! node to put in its place: the same `Arc` when nothing changed, a new one
//! otherwise. Default implementations only descend.

use std::sync::Arc;

use super::domain::Cursor;
use super::infrastructure::walker;
use crate::errors::Result;
use crate::shared::models::{Block, ClassDecl, CompilationUnit, Expression, NamedVariable, Statement};

pub trait TreeVisitor {
    fn visit_compilation_unit(
        &mut self,
        cu: &Arc<CompilationUnit>,
        cursor: &mut Cursor,
    ) -> Result<Arc<CompilationUnit>> {
        walker::walk_compilation_unit(self, cu, cursor)
    }

    fn visit_class(&mut self, class: &Arc<ClassDecl>, cursor: &mut Cursor) -> Result<Arc<ClassDecl>> {
        walker::walk_class(self, class, cursor)
    }

    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        walker::walk_block(self, block, cursor)
    }

    fn visit_statement(
        &mut self,
        statement: &Arc<Statement>,
        cursor: &mut Cursor,
    ) -> Result<Arc<Statement>> {
        walker::walk_statement(self, statement, cursor)
    }

    fn visit_variable(
        &mut self,
        variable: &Arc<NamedVariable>,
        cursor: &mut Cursor,
    ) -> Result<Arc<NamedVariable>> {
        walker::walk_variable(self, variable, cursor)
    }

    fn visit_expression(
        &mut self,
        expr: &Arc<Expression>,
        cursor: &mut Cursor,
    ) -> Result<Arc<Expression>> {
        walker::walk_expression(self, expr, cursor)
    }
}
