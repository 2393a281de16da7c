//! Expression substitution inside a statement

use std::sync::Arc;

use crate::shared::models::{Expression, TreeRef};

/// Rebuild `node` with the expression identical to `target` swapped for
/// `replacement`; `None` when `target` is not inside `node`.
pub fn replace_in(node: &TreeRef, target: &Arc<Expression>, replacement: Arc<Expression>) -> Option<TreeRef> {
    if let TreeRef::Expression(e) = node {
        if Arc::ptr_eq(e, target) {
            return Some(TreeRef::Expression(replacement));
        }
    }
    node.children().into_iter().find_map(|child| {
        let rebuilt = replace_in(&child, target, replacement.clone())?;
        Some(node.replace_child(&child, rebuilt))
    })
}

/// Rebuild `node` with every expression structurally equal to `target`
/// swapped for `replacement`; `None` when there is none.
///
/// Matches are outermost first, so an occurrence nested inside another is
/// replaced along with it.
pub fn replace_all_in(node: &TreeRef, target: &Expression, replacement: &Arc<Expression>) -> Option<TreeRef> {
    if let TreeRef::Expression(e) = node {
        if **e == *target {
            return Some(TreeRef::Expression(replacement.clone()));
        }
    }
    let mut changed = false;
    let children = node
        .children()
        .into_iter()
        .map(|child| match replace_all_in(&child, target, replacement) {
            Some(rebuilt) => {
                changed = true;
                rebuilt
            }
            None => child,
        })
        .collect();
    changed.then(|| node.with_children(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::build::{self, jdk};
    use crate::shared::models::{JavaType, Statement};
    use crate::shared::utils::print_statement;

    #[test]
    fn test_replaces_identical_node_only() {
        let name = build::ident("name", JavaType::string());
        let same_text = build::ident("name", JavaType::string());
        let call = build::new_instance(jdk::file_of_strings(), vec![same_text.clone(), name.clone()]);
        let stmt = build::var_decl(JavaType::file(), "f", Some(call));

        let out = replace_in(&TreeRef::Statement(stmt.clone()), &name, build::ident("safe", JavaType::string()))
            .and_then(|r| r.as_statement().cloned())
            .unwrap();
        assert_eq!(print_statement(&out), "File f = new File(name, safe);\n");
        assert_eq!(print_statement(&stmt), "File f = new File(name, name);\n");
    }

    #[test]
    fn test_replace_all_covers_same_text_sibling() {
        let name = build::ident("name", JavaType::string());
        let same_text = build::ident("name", JavaType::string());
        let call = build::new_instance(jdk::file_of_strings(), vec![same_text, name.clone()]);
        let stmt = build::var_decl(JavaType::file(), "f", Some(call));

        let out = replace_all_in(&TreeRef::Statement(stmt.clone()), &name, &build::ident("safe", JavaType::string()))
            .and_then(|r| r.as_statement().cloned())
            .unwrap();
        assert_eq!(print_statement(&out), "File f = new File(safe, safe);\n");
        assert_eq!(print_statement(&stmt), "File f = new File(name, name);\n");
    }

    #[test]
    fn test_replace_all_ignores_other_types() {
        let name = build::ident("name", JavaType::string());
        let file_named_name = build::ident("name", JavaType::file());
        let stmt = build::expr_stmt(build::new_instance(
            jdk::file_of_parent_and_child(),
            vec![file_named_name, name.clone()],
        ));

        let out = replace_all_in(&TreeRef::Statement(stmt), &name, &build::ident("safe", JavaType::string()))
            .and_then(|r| r.as_statement().cloned())
            .unwrap();
        assert_eq!(print_statement(&out), "new File(name, safe);\n");
    }

    #[test]
    fn test_missing_target() {
        let stmt: Arc<Statement> = build::expr_stmt(build::ident("a", JavaType::string()));
        assert!(replace_in(
            &TreeRef::Statement(stmt.clone()),
            &build::ident("a", JavaType::string()),
            build::null_lit()
        )
        .is_none());
        assert!(replace_all_in(&TreeRef::Statement(stmt), &build::ident("b", JavaType::string()), &build::null_lit())
            .is_none());
    }
}
