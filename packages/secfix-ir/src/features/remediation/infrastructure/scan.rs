//! Path helpers shared by the vulnerability visitors

use std::sync::Arc;

use crate::features::patch_synthesis::{register_import, take_imports};
use crate::features::traversal::{Cursor, TreePath};
use crate::shared::models::{
    build, unwrap_parens, Block, ExprKind, Expression, JavaType, Modifier, NamedVariable, Statement, TreeKind,
    TreeRef,
};

/// Paths of the expressions below the end of `base`, in source order.
///
/// Nested method and class declarations are separate scopes and not entered.
pub fn expression_paths(base: &TreePath) -> Vec<TreePath> {
    fn descend(path: &TreePath, out: &mut Vec<TreePath>) {
        let Some(node) = path.value() else {
            return;
        };
        for child in node.children() {
            if matches!(child.kind(), TreeKind::Method | TreeKind::Class) {
                continue;
            }
            let child_path = path.child(child.clone());
            if child.as_expression().is_some() {
                out.push(child_path.clone());
            }
            descend(&child_path, out);
        }
    }

    let mut out = Vec::new();
    descend(base, &mut out);
    out
}

/// Every expression under `node`, outermost first, without entering nested
/// method or class declarations
pub fn expressions_in(node: &TreeRef) -> Vec<Arc<Expression>> {
    fn descend(node: &TreeRef, out: &mut Vec<Arc<Expression>>) {
        for child in node.children() {
            if matches!(child.kind(), TreeKind::Method | TreeKind::Class) {
                continue;
            }
            if let Some(expr) = child.as_expression() {
                out.push(expr.clone());
            }
            descend(&child, out);
        }
    }

    let mut out = Vec::new();
    if let Some(expr) = node.as_expression() {
        out.push(expr.clone());
    }
    descend(node, &mut out);
    out
}

/// Statement of the nearest enclosing block that contains the end of `path`
pub fn anchor_of(path: &TreePath) -> Option<Arc<Statement>> {
    let (index, _) = path.nearest_block()?;
    path.enclosing_statement_in(index).cloned()
}

/// The end of `path` is the body of a method or initializer
pub fn is_outer_executable(path: &TreePath) -> bool {
    path.find_outer_executable_block()
        .map(|(index, _)| index + 1 == path.len())
        .unwrap_or(false)
}

/// Variable whose initializer is the expression at the end of `path`,
/// parentheses aside
pub fn initialized_variable(path: &TreePath) -> Option<&Arc<NamedVariable>> {
    let expr = path.value()?.as_expression()?;
    let nodes = path.nodes();
    let mut index = nodes.len().checked_sub(1)?;
    loop {
        index = index.checked_sub(1)?;
        match &nodes[index] {
            TreeRef::Expression(e) if matches!(e.kind, ExprKind::Parens(_)) => continue,
            TreeRef::Variable(v) => {
                let init = v.initializer.as_ref()?;
                return Arc::ptr_eq(unwrap_parens(init), expr).then_some(v);
            }
            _ => return None,
        }
    }
}

/// `path` with its last node, a block, swapped for `block`
pub fn path_on(path: &TreePath, block: &Arc<Block>) -> TreePath {
    let last = path.len().saturating_sub(1);
    path.replacing(last, TreeRef::Block(block.clone()))
}

/// Move import requests collected on a scratch cursor to the real one
pub fn transfer_imports(from: &mut Cursor, to: &mut Cursor) {
    for fqn in take_imports(from).requested() {
        register_import(to, fqn);
    }
}

/// Call or instance creation that the end of `path` is an operand of,
/// parentheses aside
pub fn parent_call(path: &TreePath) -> Option<Arc<Expression>> {
    path.nodes()
        .iter()
        .rev()
        .skip(1)
        .map_while(TreeRef::as_expression)
        .find(|e| !matches!(e.kind, ExprKind::Parens(_)))
        .filter(|e| e.is_call())
        .cloned()
}

/// `receiver.name(..)` where `receiver` is a read of local `variable`
pub fn is_call_on(expr: &Expression, variable: &str) -> bool {
    match &expr.kind {
        ExprKind::MethodInvocation(m) => m
            .select
            .as_ref()
            .and_then(|s| unwrap_parens(s).local_name())
            .map(|name| name == variable)
            .unwrap_or(false),
        _ => false,
    }
}

/// Name of a variable read: a local, a field by simple name, or `this.field`
pub fn variable_name(expr: &Expression) -> Option<&str> {
    match &expr.kind {
        ExprKind::Identifier(id) => Some(&id.name),
        ExprKind::FieldAccess(fa) => match &fa.target.kind {
            ExprKind::Identifier(target) if target.name == "this" => Some(&fa.name),
            _ => None,
        },
        _ => None,
    }
}

/// Variable that configuration calls are made on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver<'a> {
    Local(&'a str),
    /// Field of the enclosing class, read by simple name or through `this`
    Field(&'a str),
}

impl<'a> Receiver<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Local(name) | Self::Field(name) => name,
        }
    }

    /// `expr` is `<receiver>.name(..)`
    pub fn is_receiver_of(&self, expr: &Expression) -> bool {
        match self {
            Self::Local(name) => is_call_on(expr, name),
            Self::Field(name) => expr
                .as_method_invocation()
                .and_then(|m| m.select.as_ref())
                .and_then(|s| variable_name(unwrap_parens(s)))
                .map(|read| read == *name)
                .unwrap_or(false),
        }
    }
}

/// Type of the class whose member block is the current cursor value
pub fn class_body_owner(cursor: &Cursor) -> Option<JavaType> {
    cursor.parent().and_then(TreeRef::as_class).map(|class| class.ty.clone())
}

/// Paths to the method bodies and initializer blocks of the class body at
/// the end of `path`
pub fn member_bodies(path: &TreePath) -> Vec<TreePath> {
    let Some(body) = path.value().and_then(TreeRef::as_block) else {
        return Vec::new();
    };
    body.statements
        .iter()
        .filter(|member| matches!(member.as_ref(), Statement::MethodDecl(_) | Statement::Block(_)))
        .flat_map(|member| {
            let member = TreeRef::Statement(member.clone());
            let member_path = path.child(member.clone());
            member
                .children()
                .into_iter()
                .map(move |block| member_path.child(block))
        })
        .collect()
}

/// Read of `variable`: a field of `owner`, or a local when there is none
pub fn variable_read(variable: &NamedVariable, owner: Option<&JavaType>) -> Arc<Expression> {
    match owner {
        Some(owner) => build::static_field_ident(&variable.name, owner.clone(), variable.ty.clone()),
        None => build::ident(&variable.name, variable.ty.clone()),
    }
}

/// Initializer block placed after the field `declaration`, static for a
/// static field
pub fn field_initializer(declaration: &Statement, statements: Vec<Arc<Statement>>) -> Arc<Statement> {
    let is_static = declaration
        .as_var_decl()
        .map(|d| d.modifiers.contains(&Modifier::Static))
        .unwrap_or(false);
    let block = if is_static {
        build::static_block(statements)
    } else {
        build::block(statements)
    };
    Arc::new(Statement::Block(block))
}
