/*
 * DocumentBuilderFactory Hardening
 *
 * A `DocumentBuilderFactory.newInstance()` that never reaches
 * `setFeature("http://apache.org/xml/features/disallow-doctype-decl", true)`
 * gets the feature switched on right after its configuration:
 *
 *   String FEATURE = "http://apache.org/xml/features/disallow-doctype-decl";
 *   try {
 *       dbf.setFeature(FEATURE, true);
 *   } catch (ParserConfigurationException e) {
 *       throw new IllegalStateException("ParserConfigurationException was thrown. The feature '"
 *               + FEATURE + "' is not supported by your XML processor.", e);
 *   }
 *
 * A project with external DTDs cannot refuse DOCTYPEs. There, a factory
 * that sets none of the entity features gets them all switched off instead:
 *
 *   String FEATURE = null;
 *   try {
 *       FEATURE = "http://xml.org/sax/features/external-parameter-entities";
 *       dbf.setFeature(FEATURE, false);
 *       ...
 *       dbf.setXIncludeAware(false);
 *       dbf.setExpandEntityReferences(false);
 *       dbf.setFeature(XMLConstants.FEATURE_SECURE_PROCESSING, true);
 *   } catch (ParserConfigurationException e) { ... }
 *
 * Feature names may reach `setFeature` as literals or through locals; a
 * value flow from every occurrence of a feature literal decides. Field
 * factories are configured in an initializer block after the field.
 */

use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};

use super::scan::{
    class_body_owner, expression_paths, expressions_in, field_initializer, member_bodies, parent_call,
    variable_name, variable_read, Receiver,
};
use crate::errors::Result;
use crate::features::matching::MethodSignature;
use crate::features::patch_synthesis::{record_fix, register_import, FixKind, PendingFix};
use crate::features::remediation::ports::PassServices;
use crate::features::taint_analysis::FnFlowSpec;
use crate::features::traversal::infrastructure::walk_block;
use crate::features::traversal::{Cursor, TreePath, TreeVisitor};
use crate::shared::models::build::{self, jdk};
use crate::shared::models::{
    fqn, unwrap_parens, Block, ExprKind, Expression, JavaType, Literal, NamedVariable, Statement, TreeRef,
};
use crate::shared::utils::{lowest_free_name, names_in_scope};

pub const DISALLOW_DOCTYPE_DECL: &str = "http://apache.org/xml/features/disallow-doctype-decl";
pub const EXTERNAL_GENERAL_ENTITIES: &str = "http://xml.org/sax/features/external-general-entities";
pub const EXTERNAL_PARAMETER_ENTITIES: &str = "http://xml.org/sax/features/external-parameter-entities";
pub const LOAD_EXTERNAL_DTD: &str = "http://apache.org/xml/features/nonvalidating/load-external-dtd";

/// Entity features in the order they are switched off
const ENTITY_FEATURES: [&str; 3] = [EXTERNAL_PARAMETER_ENTITIES, LOAD_EXTERNAL_DTD, EXTERNAL_GENERAL_ENTITIES];

const FEATURE_BASE_NAME: &str = "FEATURE";

static NEW_INSTANCE: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("javax.xml.parsers.DocumentBuilderFactory newInstance*(..)").expect("factory descriptor")
});

static SET_FEATURE: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("javax.xml.parsers.DocumentBuilderFactory setFeature(java.lang.String, boolean)")
        .expect("setFeature descriptor")
});

static SET_XINCLUDE_AWARE: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("javax.xml.parsers.DocumentBuilderFactory setXIncludeAware(boolean)")
        .expect("setXIncludeAware descriptor")
});

/// What the code around a factory already configures
#[derive(Debug, Default, Clone)]
struct Configured {
    doctype_disallowed: bool,
    entity_features: FxHashSet<&'static str>,
    xinclude_aware: bool,
}

pub struct DocumentBuilderFactoryVisitor {
    services: PassServices,
    /// DTDs the project's XML documents refer to
    external_dtds: Vec<String>,
}

impl DocumentBuilderFactoryVisitor {
    pub fn new(services: PassServices) -> Self {
        Self {
            services,
            external_dtds: Vec::new(),
        }
    }

    /// Builder: Set the external DTDs in use
    pub fn with_external_dtds(mut self, dtds: Vec<String>) -> Self {
        self.external_dtds = dtds;
        self
    }

    fn is_factory(&self, variable: &NamedVariable) -> bool {
        variable
            .initializer
            .as_ref()
            .map(|init| self.services.matcher.matches(unwrap_parens(init), &NEW_INSTANCE))
            .unwrap_or(false)
    }

    /// Configuration below each of `bases`, keyed by receiver name
    fn configured(&self, bases: &[TreePath]) -> FxHashMap<String, Configured> {
        let mut configured: FxHashMap<String, Configured> = FxHashMap::default();
        let matcher = self.services.matcher.clone();
        for path in bases.iter().flat_map(expression_paths) {
            let Some(expr) = path.value().and_then(TreeRef::as_expression).cloned() else {
                continue;
            };
            if matcher.matches(&expr, &SET_XINCLUDE_AWARE) {
                if let Some(name) = receiver_of(&expr) {
                    configured.entry(name).or_default().xinclude_aware = true;
                }
                continue;
            }
            let Some(feature) = feature_of(&expr) else {
                continue;
            };
            let literal = expr.clone();
            let matcher = matcher.clone();
            let spec = FnFlowSpec::value(
                move |n| n.is(&literal),
                move |n| matcher.is_argument_of(&n.path, &SET_FEATURE, 0),
            );
            for sink in self.services.flow_from(path).find_sinks(&spec).sinks {
                let Some(call) = parent_call(&sink.path) else {
                    continue;
                };
                let Some(name) = receiver_of(&call) else {
                    continue;
                };
                let entry = configured.entry(name).or_default();
                if feature == DISALLOW_DOCTYPE_DECL {
                    entry.doctype_disallowed |= call
                        .arguments()
                        .get(1)
                        .map(|v| matches!(unwrap_parens(v).kind, ExprKind::Literal(Literal::Boolean(true))))
                        .unwrap_or(false);
                } else {
                    entry.entity_features.insert(feature);
                }
            }
        }
        configured
    }

    /// Last statement of `following` configuring the factory, if any
    fn last_configuration(&self, name: &str, following: &[Arc<Statement>]) -> Option<Arc<Statement>> {
        following
            .iter()
            .filter(|statement| {
                expressions_in(&TreeRef::Statement((*statement).clone()))
                    .iter()
                    .any(|e| Receiver::Local(name).is_receiver_of(e) && self.services.matcher.matches(e, &SET_FEATURE))
            })
            .last()
            .cloned()
    }

    fn harden(&self, block: &Arc<Block>, cursor: &mut Cursor) {
        let factories: Vec<(usize, &Arc<Statement>, &Arc<NamedVariable>)> = block
            .statements
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_var_decl().map(|d| (i, s, d)))
            .flat_map(|(i, s, d)| d.variables.iter().map(move |v| (i, s, v)))
            .filter(|(_, _, v)| self.is_factory(v))
            .collect();
        if factories.is_empty() {
            return;
        }

        let owner = class_body_owner(cursor);
        let bases = match owner {
            Some(_) => member_bodies(&cursor.path()),
            None => vec![cursor.path()],
        };
        let configured = self.configured(&bases);
        let mut taken = names_in_scope(&cursor.path());
        for (index, declaration, factory) in factories {
            let Some(init) = factory.initializer.clone() else {
                continue;
            };
            let state = configured.get(&factory.name).cloned().unwrap_or_default();
            let with_dtds = !self.external_dtds.is_empty();
            if state.doctype_disallowed || (with_dtds && !state.entity_features.is_empty()) {
                continue;
            }

            let feature = lowest_free_name(FEATURE_BASE_NAME, &taken);
            taken.insert(feature.clone());
            let exception = lowest_free_name("e", &taken);
            let read = variable_read(factory, owner.as_ref());
            let statements = if with_dtds {
                disable_external_entities(&read, &feature, &exception, !state.xinclude_aware)
            } else {
                disallow_doctype(&read, &feature, &exception)
            };

            let (anchor, statements) = match owner {
                Some(_) => (declaration.clone(), vec![field_initializer(declaration, statements)]),
                None => (
                    self.last_configuration(&factory.name, &block.statements[index + 1..])
                        .unwrap_or_else(|| declaration.clone()),
                    statements,
                ),
            };
            tracing::debug!(factory = %factory.name, external_dtds = with_dtds, "hardening DocumentBuilderFactory");
            if record_fix(cursor, PendingFix::new(anchor, init, FixKind::InsertStatementsAfter(statements))) {
                register_import(cursor, fqn::PARSER_CONFIGURATION_EXCEPTION);
                if with_dtds {
                    register_import(cursor, fqn::XML_CONSTANTS);
                }
            }
        }
    }
}

impl TreeVisitor for DocumentBuilderFactoryVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        self.harden(block, cursor);
        self.services.commit(cursor, block, walked)
    }
}

/// Feature literal `expr` stands for, if it is one this visitor tracks
fn feature_of(expr: &Expression) -> Option<&'static str> {
    let ExprKind::Literal(Literal::String(value)) = &expr.kind else {
        return None;
    };
    std::iter::once(DISALLOW_DOCTYPE_DECL)
        .chain(ENTITY_FEATURES)
        .find(|feature| *feature == value.as_str())
}

fn receiver_of(call: &Expression) -> Option<String> {
    call.as_method_invocation()
        .and_then(|m| m.select.as_ref())
        .and_then(|s| variable_name(unwrap_parens(s)))
        .map(str::to_string)
}

fn set_feature(factory: &Arc<Expression>, feature: Arc<Expression>, enabled: bool) -> Arc<Statement> {
    build::expr_stmt(build::call(
        build::fresh_copy(factory),
        jdk::document_builder_factory_set_feature(),
        vec![feature, build::bool_lit(enabled)],
    ))
}

/// `catch (ParserConfigurationException <exception>) { throw new IllegalStateException(<message>, <exception>); }`
fn rethrow_unsupported(try_body: Vec<Arc<Statement>>, message_prefix: &str, feature: &str, exception: &str) -> Arc<Statement> {
    let parser_exception = JavaType::class(fqn::PARSER_CONFIGURATION_EXCEPTION);
    let message = build::add(
        build::add(build::string_lit(message_prefix), build::ident(feature, JavaType::string())),
        build::string_lit("' is not supported by your XML processor."),
    );
    let rethrow = Arc::new(Statement::Throw(build::new_instance(
        jdk::illegal_state_exception(),
        vec![message, build::ident(exception, parser_exception.clone())],
    )));
    build::try_stmt(
        build::block(try_body),
        vec![build::catch_clause(parser_exception, exception, build::block(vec![rethrow]))],
        None,
    )
}

fn disallow_doctype(factory: &Arc<Expression>, feature: &str, exception: &str) -> Vec<Arc<Statement>> {
    let declaration = build::var_decl(JavaType::string(), feature, Some(build::string_lit(DISALLOW_DOCTYPE_DECL)));
    let enable = set_feature(factory, build::ident(feature, JavaType::string()), true);
    let guarded = rethrow_unsupported(
        vec![enable],
        "ParserConfigurationException was thrown. The feature '",
        feature,
        exception,
    );
    vec![declaration, guarded]
}

fn disable_external_entities(
    factory: &Arc<Expression>,
    feature: &str,
    exception: &str,
    xinclude_aware: bool,
) -> Vec<Arc<Statement>> {
    let feature_read = || build::ident(feature, JavaType::string());
    let declaration = build::var_decl(JavaType::string(), feature, Some(build::null_lit()));

    let mut body = Vec::new();
    for name in ENTITY_FEATURES {
        body.push(build::expr_stmt(build::assign(feature_read(), build::string_lit(name))));
        body.push(set_feature(factory, feature_read(), false));
    }
    if xinclude_aware {
        body.push(build::expr_stmt(build::call(
            build::fresh_copy(factory),
            jdk::document_builder_factory_set_xinclude_aware(),
            vec![build::bool_lit(false)],
        )));
    }
    body.push(build::expr_stmt(build::call(
        build::fresh_copy(factory),
        jdk::document_builder_factory_set_expand_entity_references(),
        vec![build::bool_lit(false)],
    )));
    body.push(set_feature(
        factory,
        build::static_field(JavaType::class(fqn::XML_CONSTANTS), "FEATURE_SECURE_PROCESSING", JavaType::string()),
        true,
    ));
    vec![declaration, rethrow_unsupported(body, "The feature '", feature, exception)]
}
