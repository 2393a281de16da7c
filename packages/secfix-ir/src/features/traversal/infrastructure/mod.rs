pub mod walker;

pub use walker::{
    visit_ref, visit_tree, walk_block, walk_class, walk_compilation_unit, walk_expression,
    walk_statement, walk_variable,
};
