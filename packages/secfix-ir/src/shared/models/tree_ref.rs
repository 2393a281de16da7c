//! Uniform handle over tree nodes
//!
//! [`TreeRef`] lets cursors, paths and the generic walker treat every node kind
//! the same way. Children are enumerated in source order and a node can be
//! rebuilt from a replacement child list, which is how rewrites propagate up a
//! path without touching siblings.

use std::sync::Arc;

use super::expression::Expression;
use super::tree::{
    Block, Catch, ClassDecl, CompilationUnit, For, ForEach, If, MethodDecl, NamedVariable,
    Statement, Try, VariableDecls, While,
};

/// Coarse node kind, used for "first enclosing" queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeKind {
    CompilationUnit,
    Class,
    Method,
    Block,
    Statement,
    Variable,
    Expression,
}

/// Shared handle to any node
#[derive(Debug, Clone)]
pub enum TreeRef {
    CompilationUnit(Arc<CompilationUnit>),
    Class(Arc<ClassDecl>),
    Block(Arc<Block>),
    Statement(Arc<Statement>),
    Variable(Arc<NamedVariable>),
    Expression(Arc<Expression>),
}

/// Address-based identity of a shared node, usable as a hash key
pub fn node_id<T>(node: &Arc<T>) -> usize {
    Arc::as_ptr(node) as *const () as usize
}

impl PartialEq for TreeRef {
    /// Identity, not structure
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TreeRef {}

impl TreeRef {
    /// Kind of the node; statement-wrapped declarations report `Method`/`Class`
    pub fn kind(&self) -> TreeKind {
        match self {
            Self::CompilationUnit(_) => TreeKind::CompilationUnit,
            Self::Class(_) => TreeKind::Class,
            Self::Block(_) => TreeKind::Block,
            Self::Statement(s) => match s.as_ref() {
                Statement::MethodDecl(_) => TreeKind::Method,
                Statement::ClassDecl(_) => TreeKind::Class,
                _ => TreeKind::Statement,
            },
            Self::Variable(_) => TreeKind::Variable,
            Self::Expression(_) => TreeKind::Expression,
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &TreeRef) -> bool {
        match (self, other) {
            (Self::CompilationUnit(a), Self::CompilationUnit(b)) => Arc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Arc::ptr_eq(a, b),
            (Self::Block(a), Self::Block(b)) => Arc::ptr_eq(a, b),
            (Self::Statement(a), Self::Statement(b)) => Arc::ptr_eq(a, b),
            (Self::Variable(a), Self::Variable(b)) => Arc::ptr_eq(a, b),
            (Self::Expression(a), Self::Expression(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_compilation_unit(&self) -> Option<&Arc<CompilationUnit>> {
        match self {
            Self::CompilationUnit(cu) => Some(cu),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Arc<Block>> {
        match self {
            Self::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_statement(&self) -> Option<&Arc<Statement>> {
        match self {
            Self::Statement(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Arc<NamedVariable>> {
        match self {
            Self::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Arc<Expression>> {
        match self {
            Self::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Arc<MethodDecl>> {
        match self {
            Self::Statement(s) => match s.as_ref() {
                Statement::MethodDecl(m) => Some(m),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Arc<ClassDecl>> {
        match self {
            Self::Class(c) => Some(c),
            Self::Statement(s) => match s.as_ref() {
                Statement::ClassDecl(c) => Some(c),
                _ => None,
            },
            _ => None,
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<TreeRef> {
        match self {
            Self::CompilationUnit(cu) => cu.classes.iter().cloned().map(TreeRef::Class).collect(),
            Self::Class(c) => vec![TreeRef::Block(c.body.clone())],
            Self::Block(b) => b.statements.iter().cloned().map(TreeRef::Statement).collect(),
            Self::Statement(s) => statement_children(s),
            Self::Variable(v) => v.initializer.iter().cloned().map(TreeRef::Expression).collect(),
            Self::Expression(e) => e
                .children()
                .into_iter()
                .cloned()
                .map(TreeRef::Expression)
                .collect(),
        }
    }

    /// Rebuild this node from a replacement child list in [`TreeRef::children`] order.
    ///
    /// A slot whose replacement is missing or of the wrong kind keeps the old child.
    pub fn with_children(&self, children: Vec<TreeRef>) -> TreeRef {
        let mut refill = Refill {
            it: children.into_iter(),
        };
        match self {
            Self::CompilationUnit(cu) => Self::CompilationUnit(Arc::new(CompilationUnit {
                package: cu.package.clone(),
                imports: cu.imports.clone(),
                classes: cu.classes.iter().map(|c| refill.class(c)).collect(),
            })),
            Self::Class(c) => Self::Class(Arc::new(rebuild_class(c, &mut refill))),
            Self::Block(b) => Self::Block(Arc::new(
                b.with_statements(b.statements.iter().map(|s| refill.statement(s)).collect()),
            )),
            Self::Statement(s) => Self::Statement(Arc::new(rebuild_statement(s, &mut refill))),
            Self::Variable(v) => Self::Variable(Arc::new(NamedVariable {
                name: v.name.clone(),
                ty: v.ty.clone(),
                initializer: v.initializer.as_ref().map(|i| refill.expression(i)),
            })),
            Self::Expression(e) => {
                let exprs = refill
                    .it
                    .filter_map(|c| match c {
                        TreeRef::Expression(x) => Some(x),
                        _ => None,
                    })
                    .collect();
                Self::Expression(Arc::new(e.with_children(exprs)))
            }
        }
    }

    /// Rebuild with the child identical to `old` replaced by `new`
    pub fn replace_child(&self, old: &TreeRef, new: TreeRef) -> TreeRef {
        let mut replacement = Some(new);
        let children = self
            .children()
            .into_iter()
            .map(|c| {
                if c.ptr_eq(old) {
                    replacement.take().unwrap_or(c)
                } else {
                    c
                }
            })
            .collect();
        self.with_children(children)
    }
}

fn statement_children(statement: &Statement) -> Vec<TreeRef> {
    let mut out = Vec::new();
    match statement {
        Statement::VarDecl(decls) => push_decl_children(decls, &mut out),
        Statement::Expr(e) | Statement::Throw(e) => out.push(TreeRef::Expression(e.clone())),
        Statement::Return(e) => out.extend(e.iter().cloned().map(TreeRef::Expression)),
        Statement::If(i) => {
            out.push(TreeRef::Expression(i.condition.clone()));
            out.push(TreeRef::Statement(i.then_branch.clone()));
            out.extend(i.else_branch.iter().cloned().map(TreeRef::Statement));
        }
        Statement::While(w) => {
            out.push(TreeRef::Expression(w.condition.clone()));
            out.push(TreeRef::Statement(w.body.clone()));
        }
        Statement::For(f) => {
            out.extend(f.init.iter().cloned().map(TreeRef::Statement));
            out.extend(f.condition.iter().cloned().map(TreeRef::Expression));
            out.extend(f.update.iter().cloned().map(TreeRef::Expression));
            out.push(TreeRef::Statement(f.body.clone()));
        }
        Statement::ForEach(f) => {
            out.push(TreeRef::Variable(f.variable.clone()));
            out.push(TreeRef::Expression(f.iterable.clone()));
            out.push(TreeRef::Statement(f.body.clone()));
        }
        Statement::Try(t) => {
            for resource in &t.resources {
                push_decl_children(resource, &mut out);
            }
            out.push(TreeRef::Block(t.body.clone()));
            for catch in &t.catches {
                out.push(TreeRef::Variable(catch.parameter.clone()));
                out.push(TreeRef::Block(catch.body.clone()));
            }
            out.extend(t.finally.iter().cloned().map(TreeRef::Block));
        }
        Statement::Block(b) => out.push(TreeRef::Block(b.clone())),
        Statement::MethodDecl(m) => out.extend(m.body.iter().cloned().map(TreeRef::Block)),
        Statement::ClassDecl(c) => out.push(TreeRef::Block(c.body.clone())),
        Statement::Break | Statement::Continue => {}
    }
    out
}

fn push_decl_children(decls: &VariableDecls, out: &mut Vec<TreeRef>) {
    out.extend(decls.variables.iter().cloned().map(TreeRef::Variable));
}

// ═══════════════════════════════════════════════════════════════════════════
// Rebuilding
// ═══════════════════════════════════════════════════════════════════════════

struct Refill<I> {
    it: I,
}

impl<I: Iterator<Item = TreeRef>> Refill<I> {
    fn class(&mut self, old: &Arc<ClassDecl>) -> Arc<ClassDecl> {
        match self.it.next() {
            Some(TreeRef::Class(c)) => c,
            _ => old.clone(),
        }
    }

    fn block(&mut self, old: &Arc<Block>) -> Arc<Block> {
        match self.it.next() {
            Some(TreeRef::Block(b)) => b,
            _ => old.clone(),
        }
    }

    fn statement(&mut self, old: &Arc<Statement>) -> Arc<Statement> {
        match self.it.next() {
            Some(TreeRef::Statement(s)) => s,
            _ => old.clone(),
        }
    }

    fn variable(&mut self, old: &Arc<NamedVariable>) -> Arc<NamedVariable> {
        match self.it.next() {
            Some(TreeRef::Variable(v)) => v,
            _ => old.clone(),
        }
    }

    fn expression(&mut self, old: &Arc<Expression>) -> Arc<Expression> {
        match self.it.next() {
            Some(TreeRef::Expression(e)) => e,
            _ => old.clone(),
        }
    }

    fn decls(&mut self, old: &VariableDecls) -> VariableDecls {
        VariableDecls {
            modifiers: old.modifiers.clone(),
            type_name: old.type_name.clone(),
            variables: old.variables.iter().map(|v| self.variable(v)).collect(),
        }
    }
}

fn rebuild_class<I: Iterator<Item = TreeRef>>(c: &ClassDecl, refill: &mut Refill<I>) -> ClassDecl {
    ClassDecl {
        modifiers: c.modifiers.clone(),
        name: c.name.clone(),
        ty: c.ty.clone(),
        body: refill.block(&c.body),
    }
}

fn rebuild_statement<I: Iterator<Item = TreeRef>>(
    statement: &Statement,
    refill: &mut Refill<I>,
) -> Statement {
    match statement {
        Statement::VarDecl(decls) => Statement::VarDecl(refill.decls(decls)),
        Statement::Expr(e) => Statement::Expr(refill.expression(e)),
        Statement::Throw(e) => Statement::Throw(refill.expression(e)),
        Statement::Return(e) => Statement::Return(e.as_ref().map(|e| refill.expression(e))),
        Statement::If(i) => {
            let condition = refill.expression(&i.condition);
            let then_branch = refill.statement(&i.then_branch);
            let else_branch = i.else_branch.as_ref().map(|e| refill.statement(e));
            Statement::If(If {
                condition,
                then_branch,
                else_branch,
            })
        }
        Statement::While(w) => {
            let condition = refill.expression(&w.condition);
            let body = refill.statement(&w.body);
            Statement::While(While { condition, body })
        }
        Statement::For(f) => {
            let init = f.init.iter().map(|s| refill.statement(s)).collect();
            let condition = f.condition.as_ref().map(|c| refill.expression(c));
            let update = f.update.iter().map(|u| refill.expression(u)).collect();
            let body = refill.statement(&f.body);
            Statement::For(For {
                init,
                condition,
                update,
                body,
            })
        }
        Statement::ForEach(f) => {
            let variable = refill.variable(&f.variable);
            let iterable = refill.expression(&f.iterable);
            let body = refill.statement(&f.body);
            Statement::ForEach(ForEach {
                type_name: f.type_name.clone(),
                variable,
                iterable,
                body,
            })
        }
        Statement::Try(t) => {
            let resources = t.resources.iter().map(|r| refill.decls(r)).collect();
            let body = refill.block(&t.body);
            let catches = t
                .catches
                .iter()
                .map(|c| {
                    let parameter = refill.variable(&c.parameter);
                    let body = refill.block(&c.body);
                    Catch {
                        type_names: c.type_names.clone(),
                        types: c.types.clone(),
                        parameter,
                        body,
                    }
                })
                .collect();
            let finally = t.finally.as_ref().map(|f| refill.block(f));
            Statement::Try(Try {
                resources,
                body,
                catches,
                finally,
            })
        }
        Statement::Block(b) => Statement::Block(refill.block(b)),
        Statement::MethodDecl(m) => Statement::MethodDecl(Arc::new(MethodDecl {
            modifiers: m.modifiers.clone(),
            return_type_name: m.return_type_name.clone(),
            name: m.name.clone(),
            parameters: m.parameters.clone(),
            throws: m.throws.clone(),
            body: m.body.as_ref().map(|b| refill.block(b)),
        })),
        Statement::ClassDecl(c) => Statement::ClassDecl(Arc::new(rebuild_class(c, refill))),
        Statement::Break => Statement::Break,
        Statement::Continue => Statement::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::build;
    use crate::shared::models::java_type::JavaType;

    #[test]
    fn test_statement_wrapped_kinds() {
        let method = build::method("run", vec![], build::block(vec![]));
        assert_eq!(TreeRef::Statement(method.clone()).kind(), TreeKind::Method);
        assert!(TreeRef::Statement(method).as_method().is_some());
    }

    #[test]
    fn test_replace_child_shares_siblings() {
        let first = build::expr_stmt(build::ident("a", JavaType::string()));
        let second = build::expr_stmt(build::ident("b", JavaType::string()));
        let block = build::block(vec![first.clone(), second.clone()]);
        let replacement = build::expr_stmt(build::ident("c", JavaType::string()));

        let rebuilt = TreeRef::Block(block.clone()).replace_child(
            &TreeRef::Statement(first.clone()),
            TreeRef::Statement(replacement.clone()),
        );
        let rebuilt = rebuilt.as_block().unwrap();
        assert!(Arc::ptr_eq(&rebuilt.statements[0], &replacement));
        assert!(Arc::ptr_eq(&rebuilt.statements[1], &second));
        assert_eq!(block.statements.len(), 2);
    }

    #[test]
    fn test_with_children_roundtrip_is_structurally_equal() {
        let stmt = build::if_stmt(
            build::ident("ok", JavaType::boolean()),
            build::block_stmt(vec![build::throw_runtime("bad")]),
            None,
        );
        let node = TreeRef::Statement(stmt.clone());
        let rebuilt = node.with_children(node.children());
        assert_eq!(rebuilt.as_statement().unwrap().as_ref(), stmt.as_ref());
    }
}
