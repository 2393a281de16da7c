//! Zip slip scenarios through the full analyzer

mod common;

use std::sync::Arc;

use common::*;
use pretty_assertions::assert_eq;
use secfix_ir::shared::models::build::{self, jdk};
use secfix_ir::shared::models::JavaType;
use secfix_ir::{analyze, Analyzer, Catalog, EngineConfig, Preset};

#[test]
fn test_guard_inserted_after_file_declaration() {
    let out = analyze(&zip_slip_unit(), &Catalog::builtin());
    assert_eq!(
        printed_body(&out),
        "File f = new File(dir, entry.getName());\n\
         if (!f.toPath().normalize().startsWith(dir.toPath().normalize())) {\n    \
         throw new IOException(\"Bad zip entry\");\n\
         }\n\
         FileOutputStream out = new FileOutputStream(f);\n"
    );
    assert_imports(&out, "java.io.IOException");
    assert_fixed_point(&out);
}

#[test]
fn test_loop_with_concatenated_path() {
    let cu = zip_slip_loop_unit();
    let out = analyze(&cu, &Catalog::builtin());

    assert_followed_by(
        &out,
        "File f = new File(base, entry.getName());",
        "if (!f.toPath().normalize().startsWith(base)) {",
    );
    assert_followed_by(&out, "if (!f.toPath()", "throw new IOException(");
    assert_fixed_point(&out);

    // Input tree is untouched
    assert!(printed_body(&cu).contains("new File(base + File.separator + entry.getName())"));
}

#[test]
fn test_nested_construction_extracted_then_guarded() {
    let cu = method_unit(
        &[],
        vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
        vec![],
        vec![output_stream("out", child_of_dir("entry"))],
    );
    let outcome = Analyzer::builtin().run(&cu).unwrap();
    assert_eq!(outcome.applied_passes, 2);
    assert_eq!(
        printed_body(&outcome.tree),
        "final File zipEntryFile = new File(dir, entry.getName());\n\
         if (!zipEntryFile.toPath().normalize().startsWith(dir.toPath().normalize())) {\n    \
         throw new RuntimeException(\"Bad zip entry\");\n\
         }\n\
         FileOutputStream out = new FileOutputStream(zipEntryFile);\n"
    );
    assert_fixed_point(&outcome.tree);
}

#[test]
fn test_extracted_name_avoids_existing_locals() {
    let cu = method_unit(
        &[],
        vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
        vec![],
        vec![
            file_decl("zipEntryFile", file_var("dir")),
            output_stream("out", child_of_dir("entry")),
        ],
    );
    let out = analyze(&cu, &Catalog::builtin());
    assert!(printed_body(&out).contains("final File zipEntryFile1 = new File(dir, entry.getName());"));
}

#[test]
fn test_existing_negated_guard_suppresses_fix() {
    let cu = method_unit(
        &[],
        vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
        vec![io_exception()],
        vec![
            file_decl("f", child_of_dir("entry")),
            build::if_stmt(
                build::not(contained_in_dir("f")),
                build::block_stmt(vec![build::throw_new(io_exception(), "outside of target dir")]),
                None,
            ),
            output_stream("out", file_var("f")),
        ],
    );
    assert!(Arc::ptr_eq(&analyze(&cu, &Catalog::builtin()), &cu));
}

#[test]
fn test_sink_on_checked_branch_suppresses_fix() {
    let cu = method_unit(
        &[],
        vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
        vec![io_exception()],
        vec![
            file_decl("f", child_of_dir("entry")),
            build::if_stmt(
                contained_in_dir("f"),
                build::block_stmt(vec![output_stream("out", file_var("f"))]),
                None,
            ),
        ],
    );
    assert!(Arc::ptr_eq(&analyze(&cu, &Catalog::builtin()), &cu));
}

#[test]
fn test_file_never_written_is_left_alone() {
    let cu = method_unit(
        &[],
        vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
        vec![],
        vec![file_decl("f", child_of_dir("entry"))],
    );
    assert!(Arc::ptr_eq(&analyze(&cu, &Catalog::builtin()), &cu));
}

#[test]
fn test_partial_path_fix_enabled_by_config() {
    let canonical = |name: &str| build::call(file_var(name), jdk::file_get_canonical_path(), vec![]);
    let check = build::call(canonical("f"), jdk::string_starts_with(), vec![canonical("dir")]);
    let cu = method_unit(
        &[],
        vec![build::param(JavaType::file(), "dir"), build::param(JavaType::file(), "f")],
        vec![io_exception()],
        vec![build::if_stmt(
            build::not(check),
            build::block_stmt(vec![build::throw_new(io_exception(), "outside")]),
            None,
        )],
    );

    assert!(Arc::ptr_eq(&analyze(&cu, &Catalog::builtin()), &cu));

    let config = EngineConfig::preset(Preset::Balanced)
        .remediation("zip-slip", |c| c.fix_partial_path(true))
        .build()
        .unwrap();
    let outcome = Analyzer::new(config, Catalog::builtin()).unwrap().run(&cu).unwrap();
    assert!(outcome.changed);
    assert!(body_lines(&outcome.tree)[0]
        .starts_with("if (!f.getCanonicalPath().startsWith(dir.getCanonicalPath() + File.separator)) {"));
}

#[test]
fn test_custom_variable_prefix() {
    let config = EngineConfig::preset(Preset::Balanced)
        .remediation("zip-slip", |c| c.new_variable_prefix("archived"))
        .build()
        .unwrap();
    let cu = method_unit(
        &[],
        vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
        vec![],
        vec![output_stream("out", child_of_dir("entry"))],
    );
    let outcome = Analyzer::new(config, Catalog::builtin()).unwrap().run(&cu).unwrap();
    assert!(printed_body(&outcome.tree).starts_with("final File archivedFile = new File(dir, entry.getName());\n"));
}
