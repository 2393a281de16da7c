//! Default descent for [`TreeVisitor`]
//!
//! Every `walk_*` function visits the children of a node in source order, one
//! cursor frame per child, and rebuilds the node only when some child came
//! back as a different `Arc`. An unchanged subtree is returned as the input
//! handle itself.

use std::sync::Arc;

use super::super::domain::Cursor;
use super::super::ports::TreeVisitor;
use crate::errors::Result;
use crate::shared::models::{
    Block, ClassDecl, CompilationUnit, Expression, NamedVariable, Statement, TreeRef,
};

/// Visit one node of any kind; the cursor must already be positioned on it
pub fn visit_ref<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    node: &TreeRef,
    cursor: &mut Cursor,
) -> Result<TreeRef> {
    Ok(match node {
        TreeRef::CompilationUnit(cu) => {
            TreeRef::CompilationUnit(visitor.visit_compilation_unit(cu, cursor)?)
        }
        TreeRef::Class(c) => TreeRef::Class(visitor.visit_class(c, cursor)?),
        TreeRef::Block(b) => TreeRef::Block(visitor.visit_block(b, cursor)?),
        TreeRef::Statement(s) => TreeRef::Statement(visitor.visit_statement(s, cursor)?),
        TreeRef::Variable(v) => TreeRef::Variable(visitor.visit_variable(v, cursor)?),
        TreeRef::Expression(e) => TreeRef::Expression(visitor.visit_expression(e, cursor)?),
    })
}

/// Run a visitor over a whole tree with a fresh cursor
pub fn visit_tree<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    cu: &Arc<CompilationUnit>,
) -> Result<(Arc<CompilationUnit>, Cursor)> {
    let mut cursor = Cursor::new(TreeRef::CompilationUnit(cu.clone()));
    let out = visitor.visit_compilation_unit(cu, &mut cursor)?;
    Ok((out, cursor))
}

/// Visit the children of `node` and rebuild it if any of them changed
fn walk_children<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    node: &TreeRef,
    cursor: &mut Cursor,
) -> Result<Option<TreeRef>> {
    let children = node.children();
    if children.is_empty() {
        return Ok(None);
    }

    let mut changed = false;
    let mut rebuilt = Vec::with_capacity(children.len());
    for child in &children {
        cursor.push(child.clone());
        let result = visit_ref(visitor, child, cursor);
        cursor.pop();
        let new_child = result?;
        changed |= !new_child.ptr_eq(child);
        rebuilt.push(new_child);
    }

    Ok(changed.then(|| node.with_children(rebuilt)))
}

pub fn walk_compilation_unit<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    cu: &Arc<CompilationUnit>,
    cursor: &mut Cursor,
) -> Result<Arc<CompilationUnit>> {
    match walk_children(visitor, &TreeRef::CompilationUnit(cu.clone()), cursor)? {
        Some(TreeRef::CompilationUnit(new)) => Ok(new),
        _ => Ok(cu.clone()),
    }
}

pub fn walk_class<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    class: &Arc<ClassDecl>,
    cursor: &mut Cursor,
) -> Result<Arc<ClassDecl>> {
    match walk_children(visitor, &TreeRef::Class(class.clone()), cursor)? {
        Some(TreeRef::Class(new)) => Ok(new),
        _ => Ok(class.clone()),
    }
}

pub fn walk_block<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    block: &Arc<Block>,
    cursor: &mut Cursor,
) -> Result<Arc<Block>> {
    match walk_children(visitor, &TreeRef::Block(block.clone()), cursor)? {
        Some(TreeRef::Block(new)) => Ok(new),
        _ => Ok(block.clone()),
    }
}

pub fn walk_statement<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    statement: &Arc<Statement>,
    cursor: &mut Cursor,
) -> Result<Arc<Statement>> {
    match walk_children(visitor, &TreeRef::Statement(statement.clone()), cursor)? {
        Some(TreeRef::Statement(new)) => Ok(new),
        _ => Ok(statement.clone()),
    }
}

pub fn walk_variable<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    variable: &Arc<NamedVariable>,
    cursor: &mut Cursor,
) -> Result<Arc<NamedVariable>> {
    match walk_children(visitor, &TreeRef::Variable(variable.clone()), cursor)? {
        Some(TreeRef::Variable(new)) => Ok(new),
        _ => Ok(variable.clone()),
    }
}

pub fn walk_expression<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    expr: &Arc<Expression>,
    cursor: &mut Cursor,
) -> Result<Arc<Expression>> {
    match walk_children(visitor, &TreeRef::Expression(expr.clone()), cursor)? {
        Some(TreeRef::Expression(new)) => Ok(new),
        _ => Ok(expr.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::build;
    use crate::shared::models::{ExprKind, JavaType, Literal, TreeKind};

    /// Renames string literal "old" to "new"
    struct Rename;

    impl TreeVisitor for Rename {
        fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
            let expr = walk_expression(self, expr, cursor)?;
            match &expr.kind {
                ExprKind::Literal(Literal::String(s)) if s == "old" => Ok(build::string_lit("new")),
                _ => Ok(expr),
            }
        }
    }

    /// Records the kind of the parent frame of every identifier
    #[derive(Default)]
    struct ParentKinds(Vec<TreeKind>);

    impl TreeVisitor for ParentKinds {
        fn visit_expression(&mut self, expr: &Arc<Expression>, cursor: &mut Cursor) -> Result<Arc<Expression>> {
            if expr.as_identifier().is_some() {
                if let Some(parent) = cursor.parent() {
                    self.0.push(parent.kind());
                }
            }
            walk_expression(self, expr, cursor)
        }
    }

    fn tree() -> (Arc<CompilationUnit>, Arc<Statement>) {
        let untouched = build::var_decl(JavaType::string(), "a", Some(build::ident("b", JavaType::string())));
        let touched = build::expr_stmt(build::string_lit("old"));
        let body = build::block(vec![untouched.clone(), touched]);
        let class = build::class("A", vec![build::method("m", vec![], body)]);
        (build::compilation_unit(None, &[], vec![class]), untouched)
    }

    #[test]
    fn test_unchanged_tree_is_reference_equal() {
        let (cu, _) = tree();
        let (out, _) = visit_tree(&mut ParentKinds::default(), &cu).unwrap();
        assert!(Arc::ptr_eq(&out, &cu));
    }

    #[test]
    fn test_rewrite_shares_untouched_siblings() {
        let (cu, untouched) = tree();
        let (out, _) = visit_tree(&mut Rename, &cu).unwrap();
        assert!(!Arc::ptr_eq(&out, &cu));

        let method = match out.classes[0].body.statements[0].as_ref() {
            Statement::MethodDecl(m) => m.clone(),
            _ => unreachable!(),
        };
        let body = method.body.as_ref().unwrap();
        assert!(Arc::ptr_eq(&body.statements[0], &untouched));
        assert_eq!(
            body.statements[1].as_expression().unwrap().as_literal(),
            Some(&Literal::String("new".into()))
        );
    }

    #[test]
    fn test_cursor_tracks_parents() {
        let (cu, _) = tree();
        let mut visitor = ParentKinds::default();
        let (_, cursor) = visit_tree(&mut visitor, &cu).unwrap();
        assert_eq!(visitor.0, vec![TreeKind::Variable]);
        assert_eq!(cursor.depth(), 1);
    }
}
