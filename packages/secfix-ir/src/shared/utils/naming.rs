//! Fresh local variable names
//!
//! A generated name is `base`, then `base1`, `base2`, ... whichever comes first
//! that is not declared in the nearest block or any enclosing scope.

use rustc_hash::FxHashSet;

use crate::features::traversal::TreePath;
use crate::shared::models::{Statement, TreeRef};

/// Every name a new local at the end of `path` could collide with
///
/// - anything declared in the subtree of the nearest block (locals, loop
///   variables, catch parameters, resources), including nested scopes
/// - names declared directly in enclosing blocks, which covers fields
/// - parameters of enclosing methods
/// - for/for-each variables and try resources or catch parameters of enclosing statements
pub fn names_in_scope(path: &TreePath) -> FxHashSet<String> {
    let mut names = FxHashSet::default();

    if let Some((_, block)) = path.nearest_block() {
        collect_declared(&TreeRef::Block(block.clone()), &mut names);
    }

    for node in path.nodes() {
        match node {
            TreeRef::Block(block) => {
                for statement in &block.statements {
                    names.extend(statement.declared_names().into_iter().map(str::to_string));
                }
            }
            TreeRef::Statement(statement) => match statement.as_ref() {
                Statement::MethodDecl(m) => {
                    names.extend(m.parameters.iter().map(|p| p.name.clone()));
                }
                Statement::ForEach(f) => {
                    names.insert(f.variable.name.clone());
                }
                Statement::For(f) => {
                    for init in &f.init {
                        names.extend(init.declared_names().into_iter().map(str::to_string));
                    }
                }
                Statement::Try(t) => {
                    for resource in &t.resources {
                        names.extend(resource.variables.iter().map(|v| v.name.clone()));
                    }
                    names.extend(t.catches.iter().map(|c| c.parameter.name.clone()));
                }
                _ => {}
            },
            _ => {}
        }
    }

    names
}

fn collect_declared(node: &TreeRef, names: &mut FxHashSet<String>) {
    if let Some(variable) = node.as_variable() {
        names.insert(variable.name.clone());
    }
    for child in node.children() {
        collect_declared(&child, names);
    }
}

/// Lowest-suffixed variant of `base` missing from `taken`
pub fn lowest_free_name(base: &str, taken: &FxHashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

pub fn generate_variable_name(base: &str, path: &TreePath) -> String {
    lowest_free_name(base, &names_in_scope(path))
}
