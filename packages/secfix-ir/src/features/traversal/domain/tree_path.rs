//! Root-to-node paths
//!
//! A [`TreePath`] is an immutable snapshot of the ancestors of a node, root
//! first. Flow queries and fix synthesis take paths instead of cursors so they
//! can run after the cursor has moved on.

use std::sync::Arc;

use crate::shared::models::{
    Block, CompilationUnit, MethodDecl, Statement, TreeKind, TreeRef,
};

#[derive(Debug, Clone)]
pub struct TreePath {
    nodes: Vec<TreeRef>,
}

impl TreePath {
    pub fn root(cu: Arc<CompilationUnit>) -> Self {
        Self {
            nodes: vec![TreeRef::CompilationUnit(cu)],
        }
    }

    pub fn from_nodes(nodes: Vec<TreeRef>) -> Self {
        Self { nodes }
    }

    /// Path extended by one child
    pub fn child(&self, node: TreeRef) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(node);
        Self { nodes }
    }

    /// Path truncated to `len` nodes
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            nodes: self.nodes[..len.min(self.nodes.len())].to_vec(),
        }
    }

    pub fn nodes(&self) -> &[TreeRef] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current (deepest) node
    pub fn value(&self) -> Option<&TreeRef> {
        self.nodes.last()
    }

    pub fn get(&self, index: usize) -> Option<&TreeRef> {
        self.nodes.get(index)
    }

    pub fn parent(&self) -> Option<&TreeRef> {
        self.nodes.len().checked_sub(2).and_then(|i| self.nodes.get(i))
    }

    pub fn compilation_unit(&self) -> Option<&Arc<CompilationUnit>> {
        self.nodes.first().and_then(TreeRef::as_compilation_unit)
    }

    /// Index of the nearest node of `kind`, the current node included
    pub fn first_enclosing_index(&self, kind: TreeKind) -> Option<usize> {
        self.nodes.iter().rposition(|n| n.kind() == kind)
    }

    pub fn first_enclosing(&self, kind: TreeKind) -> Option<&TreeRef> {
        self.first_enclosing_index(kind).map(|i| &self.nodes[i])
    }

    /// Nearest enclosing block, the current node included
    pub fn nearest_block(&self) -> Option<(usize, &Arc<Block>)> {
        self.nodes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, n)| n.as_block().map(|b| (i, b)))
    }

    pub fn enclosing_method(&self) -> Option<&Arc<MethodDecl>> {
        self.nodes.iter().rev().find_map(TreeRef::as_method)
    }

    /// Statement of the block at `block_index` that contains the current node
    pub fn enclosing_statement_in(&self, block_index: usize) -> Option<&Arc<Statement>> {
        self.nodes
            .get(block_index + 1)
            .and_then(TreeRef::as_statement)
    }

    /// `static { }` block, or an instance initializer directly in a class body
    pub fn is_static_or_init_block(&self, index: usize) -> bool {
        let Some(block) = self.nodes.get(index).and_then(TreeRef::as_block) else {
            return false;
        };
        if block.is_static {
            return true;
        }
        match index.checked_sub(1).and_then(|i| self.nodes.get(i)) {
            // A block statement whose parent block is a class body
            Some(TreeRef::Statement(s)) if matches!(s.as_ref(), Statement::Block(_)) => index
                .checked_sub(2)
                .and_then(|i| self.nodes.get(i))
                .zip(index.checked_sub(3).and_then(|i| self.nodes.get(i)))
                .map(|(body, owner)| body.as_block().is_some() && owner.kind() == TreeKind::Class)
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Body block of the enclosing method or initializer
    ///
    /// Walking outward, the first block whose parent is a method declaration,
    /// or which is itself a static or instance initializer.
    pub fn find_outer_executable_block(&self) -> Option<(usize, &Arc<Block>)> {
        for (i, node) in self.nodes.iter().enumerate().rev() {
            let Some(block) = node.as_block() else {
                continue;
            };
            let parent_is_method = i
                .checked_sub(1)
                .and_then(|p| self.nodes.get(p))
                .map(|p| p.kind() == TreeKind::Method)
                .unwrap_or(false);
            if parent_is_method || self.is_static_or_init_block(i) {
                return Some((i, block));
            }
        }
        None
    }

    /// Rebuild the path with the node at `index` replaced.
    ///
    /// Ancestors are rebuilt so that each contains its replaced child; nodes
    /// below `index` are dropped.
    pub fn replacing(&self, index: usize, node: TreeRef) -> TreePath {
        if index >= self.nodes.len() {
            return self.clone();
        }
        let mut replacement = node;
        let mut rebuilt = vec![replacement.clone()];
        for i in (0..index).rev() {
            replacement = self.nodes[i].replace_child(&self.nodes[i + 1], replacement);
            rebuilt.push(replacement.clone());
        }
        rebuilt.reverse();
        TreePath { nodes: rebuilt }
    }

    /// Path from `root` down to the node identical to `target`, depth first
    pub fn locate(root: TreeRef, target: &TreeRef) -> Option<TreePath> {
        fn search(nodes: &mut Vec<TreeRef>, target: &TreeRef) -> bool {
            let Some(current) = nodes.last() else {
                return false;
            };
            if current.ptr_eq(target) {
                return true;
            }
            for child in current.children() {
                nodes.push(child);
                if search(nodes, target) {
                    return true;
                }
                nodes.pop();
            }
            false
        }

        let mut nodes = vec![root];
        search(&mut nodes, target).then(|| TreePath { nodes })
    }

    /// Iterate ancestors of the current node, nearest first, with their indices
    pub fn ancestors(&self) -> impl Iterator<Item = (usize, &TreeRef)> {
        self.nodes.iter().enumerate().rev().skip(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::build;
    use crate::shared::models::JavaType;

    fn method_path() -> (TreePath, Arc<Statement>) {
        let stmt = build::expr_stmt(build::ident("x", JavaType::string()));
        let body = build::block(vec![stmt.clone()]);
        let method = build::method("run", vec![], body.clone());
        let class = build::class("A", vec![method.clone()]);
        let cu = build::compilation_unit(None, &[], vec![class.clone()]);
        let path = TreePath::root(cu)
            .child(TreeRef::Class(class.clone()))
            .child(TreeRef::Block(class.body.clone()))
            .child(TreeRef::Statement(method))
            .child(TreeRef::Block(body))
            .child(TreeRef::Statement(stmt.clone()));
        (path, stmt)
    }

    #[test]
    fn test_outer_executable_block_is_method_body() {
        let (path, _) = method_path();
        let (index, _) = path.find_outer_executable_block().unwrap();
        assert_eq!(index, 4);
        assert!(path.enclosing_method().is_some());
    }

    #[test]
    fn test_class_body_is_not_executable() {
        let (path, _) = method_path();
        let class_level = path.prefix(3);
        assert!(class_level.find_outer_executable_block().is_none());
    }

    #[test]
    fn test_static_block_is_executable() {
        let stmt = build::expr_stmt(build::ident("x", JavaType::string()));
        let init = build::static_block(vec![stmt.clone()]);
        let init_stmt = Arc::new(Statement::Block(init.clone()));
        let class = build::class("A", vec![init_stmt.clone()]);
        let cu = build::compilation_unit(None, &[], vec![class.clone()]);
        let path = TreePath::root(cu)
            .child(TreeRef::Class(class.clone()))
            .child(TreeRef::Block(class.body.clone()))
            .child(TreeRef::Statement(init_stmt))
            .child(TreeRef::Block(init))
            .child(TreeRef::Statement(stmt));
        assert!(path.is_static_or_init_block(4));
        assert_eq!(path.find_outer_executable_block().map(|(i, _)| i), Some(4));
    }

    #[test]
    fn test_locate_finds_nested_node() {
        let (path, stmt) = method_path();
        let cu = path.compilation_unit().unwrap().clone();
        let located = TreePath::locate(TreeRef::CompilationUnit(cu), &TreeRef::Statement(stmt)).unwrap();
        assert_eq!(located.len(), path.len());
        assert!(located.nodes().iter().zip(path.nodes()).all(|(a, b)| a.ptr_eq(b)));
    }

    #[test]
    fn test_replacing_rebuilds_ancestors() {
        let (path, stmt) = method_path();
        let replacement = build::expr_stmt(build::ident("y", JavaType::string()));
        let rebuilt = path.replacing(5, TreeRef::Statement(replacement.clone()));

        assert_eq!(rebuilt.len(), 6);
        let block = rebuilt.get(4).and_then(TreeRef::as_block).unwrap();
        assert!(Arc::ptr_eq(&block.statements[0], &replacement));
        assert!(!Arc::ptr_eq(&block.statements[0], &stmt));

        let cu = rebuilt.compilation_unit().unwrap();
        let class = rebuilt.get(1).and_then(TreeRef::as_class).unwrap();
        assert!(Arc::ptr_eq(&cu.classes[0], class));
    }
}
