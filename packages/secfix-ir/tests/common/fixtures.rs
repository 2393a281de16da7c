//! Tree fixtures
//!
//! Every fixture is one public class `Worker` in package `com.example` with a
//! single method `extract(..)`; the statements under test form its body.

use std::sync::Arc;

use secfix_ir::shared::models::build::{self, jdk};
use secfix_ir::shared::models::{fqn, Block, CompilationUnit, Expression, JavaType, Parameter, Statement};

pub fn zip_entry() -> JavaType {
    JavaType::class(fqn::ZIP_ENTRY)
}

pub fn io_exception() -> JavaType {
    JavaType::class(fqn::IO_EXCEPTION)
}

/// `class Worker { public void extract(<params>) throws <throws> { <statements> } }`
pub fn method_unit(
    imports: &[&str],
    params: Vec<Parameter>,
    throws: Vec<JavaType>,
    statements: Vec<Arc<Statement>>,
) -> Arc<CompilationUnit> {
    let method = build::method_with(vec![], "extract", params, throws, build::block(statements));
    build::compilation_unit(Some("com.example"), imports, vec![build::class("Worker", vec![method])])
}

/// Method body of the fixture class
pub fn body(cu: &CompilationUnit) -> Arc<Block> {
    match cu.classes[0].body.statements[0].as_ref() {
        Statement::MethodDecl(m) => m.body.clone().expect("method body"),
        other => panic!("expected a method, found {:?}", other),
    }
}

// ============================================================================
// Zip slip
// ============================================================================

pub fn entry_name(entry: &str) -> Arc<Expression> {
    build::call(build::ident(entry, zip_entry()), jdk::zip_entry_get_name(), vec![])
}

pub fn file_var(name: &str) -> Arc<Expression> {
    build::ident(name, JavaType::file())
}

pub fn file_decl(name: &str, init: Arc<Expression>) -> Arc<Statement> {
    build::var_decl(JavaType::file(), name, Some(init))
}

pub fn output_stream(name: &str, file: Arc<Expression>) -> Arc<Statement> {
    build::var_decl(
        JavaType::class("java.io.FileOutputStream"),
        name,
        Some(build::new_instance(jdk::file_output_stream_of_file(), vec![file])),
    )
}

/// `new File(dir, entry.getName())`
pub fn child_of_dir(entry: &str) -> Arc<Expression> {
    build::new_instance(jdk::file_of_parent_and_child(), vec![file_var("dir"), entry_name(entry)])
}

/// `f.toPath().normalize().startsWith(dir.toPath().normalize())`
pub fn contained_in_dir(file: &str) -> Arc<Expression> {
    let normalized = |name: &str| {
        build::call(
            build::call(file_var(name), jdk::file_to_path(), vec![]),
            jdk::path_normalize(),
            vec![],
        )
    };
    build::call(normalized(file), jdk::path_starts_with_path(), vec![normalized("dir")])
}

/// Single zip entry written below `dir`, no check
pub fn zip_slip_unit() -> Arc<CompilationUnit> {
    method_unit(
        &["java.io.File", "java.io.FileOutputStream"],
        vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
        vec![io_exception()],
        vec![file_decl("f", child_of_dir("entry")), output_stream("out", file_var("f"))],
    )
}

/// Every entry of an archive written to `base + File.separator + name`
///
/// ```java
/// for (ZipEntry entry : entries) {
///     File f = new File(base + File.separator + entry.getName());
///     FileOutputStream out = new FileOutputStream(f);
/// }
/// ```
pub fn zip_slip_loop_unit() -> Arc<CompilationUnit> {
    let separator = build::static_field(JavaType::file(), "separator", JavaType::string());
    let path = build::add(build::add(build::ident("base", JavaType::string()), separator), entry_name("entry"));
    let loop_body = build::block_stmt(vec![
        file_decl("f", build::new_instance(jdk::file_of_string(), vec![path])),
        output_stream("out", file_var("f")),
    ]);
    method_unit(
        &["java.io.File", "java.io.FileOutputStream", "java.util.List", "java.util.zip.ZipEntry"],
        vec![
            build::param(JavaType::string(), "base"),
            build::param(JavaType::class("java.util.List"), "entries"),
        ],
        vec![io_exception()],
        vec![build::for_each(
            zip_entry(),
            "entry",
            build::ident("entries", JavaType::class("java.util.List")),
            loop_body,
        )],
    )
}

// ============================================================================
// Other vulnerability classes
// ============================================================================

pub fn random_decl(name: &str) -> Arc<Statement> {
    build::var_decl(
        JavaType::class(fqn::RANDOM),
        name,
        Some(build::new_instance(jdk::random(), vec![])),
    )
}

pub fn cookie_decl(name: &str) -> Arc<Statement> {
    build::var_decl(
        JavaType::class(fqn::COOKIE),
        name,
        Some(build::new_instance(
            jdk::cookie(),
            vec![build::string_lit("session"), build::ident("id", JavaType::string())],
        )),
    )
}

pub fn set_secure(cookie: &str, value: Arc<Expression>) -> Arc<Statement> {
    build::expr_stmt(build::call(
        build::ident(cookie, JavaType::class(fqn::COOKIE)),
        jdk::cookie_set_secure(),
        vec![value],
    ))
}

pub fn xml_input_factory_decl(name: &str) -> Arc<Statement> {
    build::var_decl(
        JavaType::class(fqn::XML_INPUT_FACTORY),
        name,
        Some(build::static_call(jdk::xml_input_factory_new_instance(), vec![])),
    )
}

pub fn document_builder_factory_decl(name: &str) -> Arc<Statement> {
    build::var_decl(
        JavaType::class(fqn::DOCUMENT_BUILDER_FACTORY),
        name,
        Some(build::static_call(jdk::document_builder_factory_new_instance(), vec![])),
    )
}

pub fn transformer_factory_decl(name: &str) -> Arc<Statement> {
    build::var_decl(
        JavaType::class(fqn::TRANSFORMER_FACTORY),
        name,
        Some(build::static_call(jdk::transformer_factory_new_instance(), vec![])),
    )
}

/// `AccessController.doPrivileged(action)`
pub fn do_privileged() -> Arc<Statement> {
    build::expr_stmt(build::static_call(
        jdk::access_controller_do_privileged(),
        vec![build::ident("action", JavaType::class(fqn::PRIVILEGED_ACTION))],
    ))
}

pub fn secure_random_decl(name: &str) -> Arc<Statement> {
    build::var_decl(
        JavaType::class(fqn::SECURE_RANDOM),
        name,
        Some(build::new_instance(jdk::secure_random(), vec![])),
    )
}

pub fn set_seed(random: &str, seed: Arc<Expression>) -> Arc<Statement> {
    build::expr_stmt(build::call(
        build::ident(random, JavaType::class(fqn::SECURE_RANDOM)),
        jdk::secure_random_set_seed(),
        vec![seed],
    ))
}

/// `File <name> = File.createTempFile("app", ".tmp");`
pub fn temp_file_decl(name: &str) -> Arc<Statement> {
    file_decl(
        name,
        build::static_call(
            jdk::file_create_temp_file(),
            vec![build::string_lit("app"), build::string_lit(".tmp")],
        ),
    )
}

pub fn file_step(file: &str, method: secfix_ir::shared::models::MethodType) -> Arc<Statement> {
    build::expr_stmt(build::call(file_var(file), method, vec![]))
}

/// Filler statement after the one under test
pub fn filler() -> Arc<Statement> {
    build::expr_stmt(build::null_lit())
}

/// Unit with one statement list and no parameters
pub fn plain_unit(imports: &[&str], statements: Vec<Arc<Statement>>) -> Arc<CompilationUnit> {
    method_unit(imports, vec![], vec![], statements)
}
