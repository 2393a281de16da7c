//! Shared utilities

pub mod naming;
pub mod printer;

pub use naming::{generate_variable_name, lowest_free_name, names_in_scope};
pub use printer::{print_block, print_compilation_unit, print_expression, print_statement};
