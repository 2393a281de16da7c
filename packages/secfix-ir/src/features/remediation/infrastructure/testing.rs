//! Fixtures for visitor unit tests

use std::sync::Arc;

use crate::features::patch_synthesis::take_imports;
use crate::features::traversal::{visit_tree, TreeVisitor};
use crate::shared::models::{build, Block, CompilationUnit, JavaType, Statement};
use crate::shared::utils::print_block;

/// `class A { void m(..) throws .. { <statements> } }`
pub fn unit(imports: &[&str], throws: Vec<JavaType>, statements: Vec<Arc<Statement>>) -> Arc<CompilationUnit> {
    let method = build::method_with(
        vec![],
        "m",
        vec![
            build::param(JavaType::file(), "dir"),
            build::param(JavaType::class(crate::shared::models::fqn::ZIP_ENTRY), "entry"),
        ],
        throws,
        build::block(statements),
    );
    build::compilation_unit(Some("com.example"), imports, vec![build::class("A", vec![method])])
}

/// Run one pass and apply its import requests
pub fn run(visitor: &mut dyn TreeVisitor, cu: &Arc<CompilationUnit>) -> Arc<CompilationUnit> {
    let (out, mut cursor) = visit_tree(visitor, cu).unwrap();
    take_imports(&mut cursor).apply(&out)
}

pub fn body(cu: &CompilationUnit) -> Arc<Block> {
    match cu.classes[0].body.statements[0].as_ref() {
        Statement::MethodDecl(m) => m.body.clone().unwrap(),
        other => panic!("expected a method, found {:?}", other),
    }
}

pub fn printed_body(cu: &CompilationUnit) -> String {
    print_block(&body(cu))
}

/// Members of the first class, one level of nesting less than in the unit
pub fn printed_members(cu: &CompilationUnit) -> String {
    print_block(&cu.classes[0].body)
}
