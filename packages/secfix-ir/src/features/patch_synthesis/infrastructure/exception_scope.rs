//! Exception type selection for synthesized guards
//!
//! A guard may throw `IOException` only where the enclosing scope already
//! handles it: a `try` body whose catch accepts it, or a method declaring a
//! compatible type. Anything else gets the unchecked fallback.

use crate::features::patch_synthesis::domain::ThrownException;
use crate::features::traversal::TreePath;
use crate::shared::models::{fqn, Statement, TreeKind, TreeRef};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionScope;

impl ExceptionScope {
    pub fn new() -> Self {
        Self
    }

    /// Exception a guard inserted at the end of `path` should throw
    pub fn choose(&self, path: &TreePath) -> ThrownException {
        let nodes = path.nodes();
        for index in (0..nodes.len()).rev() {
            let node = &nodes[index];
            if path.is_static_or_init_block(index) {
                return ThrownException::RuntimeException;
            }
            if let Some(method) = node.as_method() {
                return if method.declares_throwable(fqn::IO_EXCEPTION) {
                    ThrownException::IoException
                } else {
                    ThrownException::RuntimeException
                };
            }
            if node.kind() == TreeKind::Class {
                return ThrownException::RuntimeException;
            }
            if let TreeRef::Statement(statement) = node {
                if let Statement::Try(t) = statement.as_ref() {
                    let in_body = nodes
                        .get(index + 1)
                        .and_then(TreeRef::as_block)
                        .map(|b| std::sync::Arc::ptr_eq(b, &t.body))
                        .unwrap_or(false);
                    if in_body && t.catches.iter().any(|c| c.accepts(fqn::IO_EXCEPTION)) {
                        return ThrownException::IoException;
                    }
                }
            }
        }
        ThrownException::RuntimeException
    }
}
