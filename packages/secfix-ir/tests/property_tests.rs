//! Property-based tests
//!
//! - Idempotence: analyze(analyze(t)) == analyze(t) for any mix of findings
//! - Purity: the input tree is never modified
//! - Naming: extracted variables never shadow a local of the same method

mod common;

use std::sync::Arc;

use common::*;
use proptest::prelude::*;
use secfix_ir::shared::models::build;
use secfix_ir::shared::models::{CompilationUnit, JavaType, Statement};
use secfix_ir::shared::utils::print_compilation_unit;
use secfix_ir::{analyze, Catalog};

/// Building blocks of generated method bodies; `i` keeps names apart
fn snippet(kind: u8, i: usize) -> Vec<Arc<Statement>> {
    match kind % 7 {
        0 => vec![random_decl(&format!("r{}", i))],
        1 => vec![cookie_decl(&format!("c{}", i)), filler()],
        2 => vec![xml_input_factory_decl(&format!("xif{}", i))],
        3 => vec![document_builder_factory_decl(&format!("dbf{}", i))],
        4 => vec![temp_file_decl(&format!("tmp{}", i))],
        5 => vec![output_stream(&format!("out{}", i), child_of_dir("entry"))],
        _ => vec![
            file_decl(&format!("f{}", i), child_of_dir("entry")),
            output_stream(&format!("out{}", i), file_var(&format!("f{}", i))),
        ],
    }
}

fn generated_unit(kinds: &[u8]) -> Arc<CompilationUnit> {
    let statements = kinds.iter().enumerate().flat_map(|(i, k)| snippet(*k, i)).collect();
    method_unit(
        &["java.util.Random"],
        vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
        vec![io_exception()],
        statements,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_analysis_is_idempotent(kinds in prop::collection::vec(any::<u8>(), 0..6)) {
        let catalog = Catalog::builtin();
        let once = analyze(&generated_unit(&kinds), &catalog);
        let twice = analyze(&once, &catalog);
        prop_assert!(
            *twice == *once,
            "not a fixed point:\n{}\n---\n{}",
            print_compilation_unit(&once),
            print_compilation_unit(&twice)
        );
    }

    #[test]
    fn prop_input_tree_unchanged(kinds in prop::collection::vec(any::<u8>(), 1..5)) {
        let cu = generated_unit(&kinds);
        let before = print_compilation_unit(&cu);
        let _ = analyze(&cu, &Catalog::builtin());
        prop_assert_eq!(print_compilation_unit(&cu), before);
    }

    #[test]
    fn prop_extracted_name_is_fresh(taken in 0usize..5) {
        // zipEntryFile, zipEntryFile1, .. zipEntryFile{taken-1} already declared
        let mut statements: Vec<Arc<Statement>> = (0..taken)
            .map(|n| {
                let name = if n == 0 { "zipEntryFile".to_string() } else { format!("zipEntryFile{}", n) };
                file_decl(&name, file_var("dir"))
            })
            .collect();
        statements.push(output_stream("out", child_of_dir("entry")));
        let cu = method_unit(
            &[],
            vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
            vec![],
            statements,
        );

        let expected = if taken == 0 { "zipEntryFile".to_string() } else { format!("zipEntryFile{}", taken) };
        let out = analyze(&cu, &Catalog::builtin());
        let declaration = format!("final File {} = new File(dir, entry.getName());", expected);
        prop_assert!(body_lines(&out).contains(&declaration), "{}", printed_body(&out));
    }
}
