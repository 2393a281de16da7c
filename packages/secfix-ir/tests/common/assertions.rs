//! Custom assertions over printed trees

use secfix_ir::shared::models::CompilationUnit;
use secfix_ir::shared::utils::{print_block, print_compilation_unit};

use super::fixtures::body;

/// Method body, one trimmed statement line per entry
pub fn body_lines(cu: &CompilationUnit) -> Vec<String> {
    print_block(&body(cu)).lines().map(|l| l.trim().to_string()).collect()
}

pub fn printed_body(cu: &CompilationUnit) -> String {
    print_block(&body(cu))
}

/// Assert that the line starting with `first` is directly followed by one starting with `second`
pub fn assert_followed_by(cu: &CompilationUnit, first: &str, second: &str) {
    let lines = body_lines(cu);
    let index = lines
        .iter()
        .position(|l| l.starts_with(first))
        .unwrap_or_else(|| panic!("no line starting with {:?} in:\n{}", first, lines.join("\n")));
    assert!(
        lines.get(index + 1).map_or(false, |l| l.starts_with(second)),
        "expected {:?} right after {:?} in:\n{}",
        second,
        first,
        lines.join("\n")
    );
}

pub fn assert_imports(cu: &CompilationUnit, fqn: &str) {
    let printed = print_compilation_unit(cu);
    assert!(
        printed.contains(&format!("import {};", fqn)),
        "missing import {} in:\n{}",
        fqn,
        printed
    );
}

/// Assert that a second analysis leaves `cu` alone
pub fn assert_fixed_point(cu: &std::sync::Arc<CompilationUnit>) {
    let again = secfix_ir::analyze(cu, &secfix_ir::Catalog::builtin());
    assert!(
        *again == **cu,
        "second analysis changed the tree:\n{}\n---\n{}",
        print_compilation_unit(cu),
        print_compilation_unit(&again)
    );
}
