//! One scenario per built-in catalog entry, plus JSON catalogs

mod common;

use std::io::Write;
use std::sync::Arc;

use common::*;
use pretty_assertions::assert_eq;
use secfix_ir::shared::models::build::{self, jdk};
use secfix_ir::shared::models::{fqn, JavaType};
use secfix_ir::{analyze, Analyzer, Catalog, CatalogEntry, EngineConfig, Preset, Remediation};
use tempfile::NamedTempFile;

#[test]
fn test_cookie_marked_secure() {
    let out = analyze(&plain_unit(&[], vec![cookie_decl("c"), filler()]), &Catalog::builtin());
    assert_eq!(
        printed_body(&out),
        "Cookie c = new Cookie(\"session\", id);\nc.setSecure(true);\nnull;\n"
    );
    assert_fixed_point(&out);
}

#[test]
fn test_cookie_insecure_flag_flipped() {
    let cu = plain_unit(&[], vec![cookie_decl("c"), set_secure("c", build::bool_lit(false))]);
    let out = analyze(&cu, &Catalog::builtin());
    assert_eq!(printed_body(&out), "Cookie c = new Cookie(\"session\", id);\nc.setSecure(true);\n");
}

#[test]
fn test_cookie_with_computed_flag_untouched() {
    let cu = plain_unit(
        &[],
        vec![cookie_decl("c"), set_secure("c", build::ident("https", JavaType::boolean()))],
    );
    assert!(Arc::ptr_eq(&analyze(&cu, &Catalog::builtin()), &cu));
}

#[test]
fn test_random_replaced() {
    let out = analyze(&plain_unit(&["java.util.Random"], vec![random_decl("r")]), &Catalog::builtin());
    assert_eq!(printed_body(&out), "Random r = new SecureRandom();\n");
    assert_imports(&out, fqn::SECURE_RANDOM);
    assert_fixed_point(&out);
}

#[test]
fn test_predictable_seed_removed() {
    let cu = plain_unit(
        &[],
        vec![
            secure_random_decl("random"),
            set_seed("random", build::static_call(jdk::system_current_time_millis(), vec![])),
        ],
    );
    let out = analyze(&cu, &Catalog::builtin());
    assert_eq!(printed_body(&out), "SecureRandom random = new SecureRandom();\n");
}

#[test]
fn test_xml_input_factory_hardened() {
    let cu = plain_unit(&["javax.xml.stream.XMLInputFactory"], vec![xml_input_factory_decl("xif"), filler()]);
    let out = analyze(&cu, &Catalog::builtin());
    assert_eq!(
        printed_body(&out),
        "XMLInputFactory xif = XMLInputFactory.newInstance();\n\
         xif.setProperty(XMLInputFactory.IS_SUPPORTING_EXTERNAL_ENTITIES, false);\n\
         xif.setProperty(XMLInputFactory.SUPPORT_DTD, false);\n\
         null;\n"
    );
    assert_fixed_point(&out);
}

#[test]
fn test_document_builder_factory_hardened() {
    let out = analyze(&plain_unit(&[], vec![document_builder_factory_decl("dbf")]), &Catalog::builtin());
    let lines = body_lines(&out);
    assert_eq!(lines[0], "DocumentBuilderFactory dbf = DocumentBuilderFactory.newInstance();");
    assert_eq!(
        lines[1],
        "String FEATURE = \"http://apache.org/xml/features/disallow-doctype-decl\";"
    );
    assert_eq!(lines[2], "try {");
    assert_eq!(lines[3], "dbf.setFeature(FEATURE, true);");
    assert_imports(&out, "javax.xml.parsers.ParserConfigurationException");
    assert_fixed_point(&out);
}

#[test]
fn test_temp_file_created_with_files_api() {
    let out = analyze(&plain_unit(&[], vec![temp_file_decl("tmp")]), &Catalog::builtin());
    assert_eq!(
        printed_body(&out),
        "File tmp = Files.createTempFile(\"app\", \".tmp\").toFile();\n"
    );
    assert_imports(&out, fqn::FILES);
    assert_fixed_point(&out);
}

#[test]
fn test_temp_directory_idiom_replaced() {
    let cu = plain_unit(
        &[],
        vec![
            temp_file_decl("tmp"),
            file_step("tmp", jdk::file_delete()),
            file_step("tmp", jdk::file_mkdir()),
        ],
    );
    let out = analyze(&cu, &Catalog::builtin());
    assert_eq!(
        printed_body(&out),
        "File tmp = Files.createTempDirectory(\"app\" + \".tmp\").toFile();\n"
    );
    assert_fixed_point(&out);
}

#[test]
fn test_transformer_factory_hardened() {
    let out = analyze(&plain_unit(&[], vec![transformer_factory_decl("tf")]), &Catalog::builtin());
    assert_eq!(
        printed_body(&out),
        "TransformerFactory tf = TransformerFactory.newInstance();\n\
         tf.setAttribute(XMLConstants.ACCESS_EXTERNAL_DTD, \"\");\n\
         tf.setAttribute(XMLConstants.ACCESS_EXTERNAL_STYLESHEET, \"\");\n\
         tf.setFeature(XMLConstants.FEATURE_SECURE_PROCESSING, true);\n"
    );
    assert_imports(&out, fqn::XML_CONSTANTS);
    assert_fixed_point(&out);
}

#[test]
fn test_privileged_call_reported_not_rewritten() {
    let cu = plain_unit(&[], vec![do_privileged()]);
    let outcome = Analyzer::builtin().run(&cu).unwrap();
    assert!(!outcome.changed);
    assert!(Arc::ptr_eq(&outcome.tree, &cu));
    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(
        outcome.findings[0].to_string(),
        "[improper-privilege-management] Worker.extract: AccessController.doPrivileged(action)"
    );
}

#[test]
fn test_every_entry_in_one_unit() {
    let cu = plain_unit(
        &["java.util.Random"],
        vec![
            random_decl("r"),
            cookie_decl("c"),
            xml_input_factory_decl("xif"),
            document_builder_factory_decl("dbf"),
            transformer_factory_decl("tf"),
            temp_file_decl("tmp"),
            do_privileged(),
        ],
    );
    let outcome = Analyzer::builtin().run(&cu).unwrap();
    assert!(outcome.changed);
    assert!(!outcome.has_failures());
    assert_eq!(outcome.applied_passes, 6);
    assert_eq!(outcome.findings.len(), 1);
    assert_fixed_point(&outcome.tree);
}

#[test]
fn test_json_catalog_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(Catalog::builtin().to_json().unwrap().as_bytes()).unwrap();

    let catalog = Catalog::from_json_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(catalog, Catalog::builtin());
}

#[test]
fn test_custom_catalog_runs_only_its_entries() {
    let catalog = Catalog::new(vec![CatalogEntry::new("random", "Weak PRNG", Remediation::SecureRandom)]).unwrap();
    let cu = plain_unit(&["java.util.Random"], vec![random_decl("r"), cookie_decl("c")]);
    let out = analyze(&cu, &catalog);
    let lines = body_lines(&out);
    assert_eq!(lines, vec!["Random r = new SecureRandom();", "Cookie c = new Cookie(\"session\", id);"]);
}

#[test]
fn test_custom_path_traversal_source() {
    let json = r#"[{
        "id": "archive-entries",
        "display_name": "Archive entry names",
        "remediation": {
            "type": "path_traversal",
            "user_input": ["java.util.zip.ZipEntry getName()"],
            "new_variable_prefix": "entry"
        }
    }]"#;
    let catalog = Catalog::from_json(json).unwrap();
    let cu = method_unit(
        &[],
        vec![build::param(JavaType::file(), "dir"), build::param(zip_entry(), "entry")],
        vec![],
        vec![output_stream("out", child_of_dir("entry"))],
    );
    let out = analyze(&cu, &catalog);
    assert!(printed_body(&out).starts_with("final File entryFile = new File(dir, entry.getName());\n"));
}

#[test]
fn test_override_for_id_outside_catalog_rejected() {
    let catalog = Catalog::new(vec![CatalogEntry::new("random", "Weak PRNG", Remediation::SecureRandom)]).unwrap();
    let config = EngineConfig::preset(Preset::Balanced)
        .remediation("zip-slip", |c| c.new_variable_prefix("entry"))
        .build()
        .unwrap();
    assert!(Analyzer::new(config, catalog).is_err());
}
