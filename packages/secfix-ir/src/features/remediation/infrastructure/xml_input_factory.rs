/*
 * XMLInputFactory Hardening
 *
 * A factory created by `XMLInputFactory.new*(..)` must disable external
 * entities and DTD processing before use:
 *
 *   XMLInputFactory xif = XMLInputFactory.newInstance();
 *   xif.setProperty(XMLInputFactory.IS_SUPPORTING_EXTERNAL_ENTITIES, false);
 *   xif.setProperty(XMLInputFactory.SUPPORT_DTD, false);
 *
 * For a local, missing properties are inserted after the last top-level
 * `setProperty` on the factory, or after its declaration. For a field, the
 * whole class is searched for configuration and the missing properties go
 * into an initializer block right after the field.
 *
 * DTD support explicitly enabled, an installed `XMLResolver`, or a project
 * with external DTDs means DTDs are handled and only the external entity
 * property is added.
 */

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::scan::{
    class_body_owner, expressions_in, field_initializer, member_bodies, variable_read, Receiver,
};
use crate::errors::Result;
use crate::features::matching::MethodSignature;
use crate::features::patch_synthesis::{record_fix, register_import, FixKind, PendingFix};
use crate::features::remediation::ports::PassServices;
use crate::features::traversal::infrastructure::walk_block;
use crate::features::traversal::{Cursor, TreeVisitor};
use crate::shared::models::build::{self, jdk};
use crate::shared::models::{
    fqn, unwrap_parens, Block, ExprKind, Expression, JavaType, Literal, NamedVariable, Statement, TreeRef,
};

const EXTERNAL_ENTITIES_FIELD: &str = "IS_SUPPORTING_EXTERNAL_ENTITIES";
const SUPPORT_DTD_FIELD: &str = "SUPPORT_DTD";
const EXTERNAL_ENTITIES_KEY: &str = "javax.xml.stream.isSupportingExternalEntities";
const SUPPORT_DTD_KEY: &str = "javax.xml.stream.supportDTD";

static NEW_FACTORY: Lazy<MethodSignature> =
    Lazy::new(|| MethodSignature::parse("javax.xml.stream.XMLInputFactory new*(..)").expect("factory descriptor"));

static SET_PROPERTY: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("javax.xml.stream.XMLInputFactory setProperty(java.lang.String, ..)")
        .expect("setProperty descriptor")
});

static SET_RESOLVER: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("javax.xml.stream.XMLInputFactory setXMLResolver(..)").expect("setXMLResolver descriptor")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    ExternalEntities,
    SupportDtd,
}

/// What the statements after a factory declaration configure
#[derive(Debug, Default)]
struct FactoryState {
    external_entities_disabled: bool,
    dtd_disabled: bool,
    dtd_enabled: bool,
    resolver: bool,
    /// Last statement of the block that is a bare `setProperty` on the factory
    last_setter: Option<Arc<Statement>>,
}

impl FactoryState {
    fn missing(&self, dtds_required: bool) -> Vec<Property> {
        let mut missing = Vec::new();
        if !self.external_entities_disabled {
            missing.push(Property::ExternalEntities);
        }
        if !(self.dtd_disabled || self.dtd_enabled || self.resolver || dtds_required) {
            missing.push(Property::SupportDtd);
        }
        missing
    }
}

pub struct XmlInputFactoryVisitor {
    services: PassServices,
    /// DTDs the project's XML documents refer to
    external_dtds: Vec<String>,
}

impl XmlInputFactoryVisitor {
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
            .map(|init| self.services.matcher.matches(unwrap_parens(init), &NEW_FACTORY))
            .unwrap_or(false)
    }

    fn scan(&self, receiver: Receiver<'_>, following: &[Arc<Statement>]) -> FactoryState {
        let mut state = FactoryState::default();
        for statement in following {
            for expr in expressions_in(&TreeRef::Statement(statement.clone())) {
                if !receiver.is_receiver_of(&expr) {
                    continue;
                }
                if self.services.matcher.matches(&expr, &SET_RESOLVER) {
                    state.resolver = true;
                    continue;
                }
                if !self.services.matcher.matches(&expr, &SET_PROPERTY) {
                    continue;
                }
                let args = expr.arguments();
                let value = args.get(1).and_then(boolean_value);
                match args.first().and_then(property_of) {
                    Some(Property::ExternalEntities) => {
                        state.external_entities_disabled |= value == Some(false);
                    }
                    Some(Property::SupportDtd) => {
                        state.dtd_disabled |= value == Some(false);
                        state.dtd_enabled |= value == Some(true);
                    }
                    None => {}
                }
            }
            if statement
                .as_expression()
                .map(|e| receiver.is_receiver_of(e) && self.services.matcher.matches(e, &SET_PROPERTY))
                .unwrap_or(false)
            {
                state.last_setter = Some(statement.clone());
            }
        }
        state
    }

    /// Record the missing properties of every factory declared in `block`
    fn harden(&self, block: &Arc<Block>, cursor: &mut Cursor) {
        let owner = class_body_owner(cursor);
        // Statements of every method and initializer configure a field
        let class_statements: Vec<Arc<Statement>> = match owner {
            Some(_) => member_bodies(&cursor.path())
                .iter()
                .filter_map(|path| path.value().and_then(TreeRef::as_block).cloned())
                .flat_map(|body| body.statements.clone())
                .collect(),
            None => Vec::new(),
        };

        for (index, statement) in block.statements.iter().enumerate() {
            let Some(decls) = statement.as_var_decl() else {
                continue;
            };
            for variable in decls.variables.iter().filter(|v| self.is_factory(v)) {
                let state = match owner {
                    Some(_) => self.scan(Receiver::Field(&variable.name), &class_statements),
                    None => self.scan(Receiver::Local(&variable.name), &block.statements[index + 1..]),
                };
                let missing = state.missing(!self.external_dtds.is_empty());
                let Some(init) = variable.initializer.clone() else {
                    continue;
                };
                if missing.is_empty() {
                    continue;
                }
                tracing::debug!(
                    factory = %variable.name,
                    field = owner.is_some(),
                    missing = missing.len(),
                    "hardening XMLInputFactory"
                );
                let factory = variable_read(variable, owner.as_ref());
                let statements: Vec<Arc<Statement>> =
                    missing.iter().map(|property| disable(&factory, *property)).collect();
                let (anchor, statements) = match owner {
                    Some(_) => (statement.clone(), vec![field_initializer(statement, statements)]),
                    None => (state.last_setter.unwrap_or_else(|| statement.clone()), statements),
                };
                if record_fix(cursor, PendingFix::new(anchor, init, FixKind::InsertStatementsAfter(statements))) {
                    register_import(cursor, fqn::XML_INPUT_FACTORY);
                }
            }
        }
    }
}

impl TreeVisitor for XmlInputFactoryVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        self.harden(block, cursor);
        self.services.commit(cursor, block, walked)
    }
}

/// `<factory>.setProperty(XMLInputFactory.<PROPERTY>, false);`
fn disable(factory: &Arc<Expression>, property: Property) -> Arc<Statement> {
    let field = match property {
        Property::ExternalEntities => EXTERNAL_ENTITIES_FIELD,
        Property::SupportDtd => SUPPORT_DTD_FIELD,
    };
    build::expr_stmt(build::call(
        build::fresh_copy(factory),
        jdk::xml_input_factory_set_property(),
        vec![
            build::static_field(JavaType::class(fqn::XML_INPUT_FACTORY), field, JavaType::string()),
            build::bool_lit(false),
        ],
    ))
}

fn property_of(arg: &Arc<Expression>) -> Option<Property> {
    let by_field = |name: &str| match name {
        EXTERNAL_ENTITIES_FIELD => Some(Property::ExternalEntities),
        SUPPORT_DTD_FIELD => Some(Property::SupportDtd),
        _ => None,
    };
    match &unwrap_parens(arg).kind {
        ExprKind::FieldAccess(fa) => by_field(&fa.name),
        ExprKind::Identifier(id) if id.field_owner.is_some() => by_field(&id.name),
        ExprKind::Literal(Literal::String(key)) => match key.as_str() {
            EXTERNAL_ENTITIES_KEY => Some(Property::ExternalEntities),
            SUPPORT_DTD_KEY => Some(Property::SupportDtd),
            _ => None,
        },
        _ => None,
    }
}

/// `true`/`false` literals and `Boolean.TRUE`/`Boolean.FALSE`
fn boolean_value(arg: &Arc<Expression>) -> Option<bool> {
    match &unwrap_parens(arg).kind {
        ExprKind::Literal(Literal::Boolean(b)) => Some(*b),
        ExprKind::FieldAccess(fa) if fa.target.ty.is_of_class("java.lang.Boolean") => match fa.name.as_str() {
            "TRUE" => Some(true),
            "FALSE" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::remediation::infrastructure::testing::{printed_body, printed_members, run, unit};
    use crate::shared::models::Modifier;
    use pretty_assertions::assert_eq;

    fn factory() -> Arc<Statement> {
        build::var_decl(
            JavaType::class(fqn::XML_INPUT_FACTORY),
            "xif",
            Some(build::static_call(jdk::xml_input_factory_new_instance(), vec![])),
        )
    }

    fn set(property: &str, value: bool) -> Arc<Statement> {
        build::expr_stmt(build::call(
            build::ident("xif", JavaType::class(fqn::XML_INPUT_FACTORY)),
            jdk::xml_input_factory_set_property(),
            vec![
                build::static_field(JavaType::class(fqn::XML_INPUT_FACTORY), property, JavaType::string()),
                build::bool_lit(value),
            ],
        ))
    }

    fn fix(statements: Vec<Arc<Statement>>) -> String {
        let cu = unit(&["javax.xml.stream.XMLInputFactory"], vec![], statements);
        let mut visitor = XmlInputFactoryVisitor::new(PassServices::default());
        printed_body(&run(&mut visitor, &cu))
    }

    #[test]
    fn test_both_properties_added_after_declaration() {
        assert_eq!(
            fix(vec![factory(), build::expr_stmt(build::null_lit())]),
            "XMLInputFactory xif = XMLInputFactory.newInstance();\n\
             xif.setProperty(XMLInputFactory.IS_SUPPORTING_EXTERNAL_ENTITIES, false);\n\
             xif.setProperty(XMLInputFactory.SUPPORT_DTD, false);\n\
             null;\n"
        );
    }

    #[test]
    fn test_missing_property_follows_existing_setter() {
        assert_eq!(
            fix(vec![factory(), set(SUPPORT_DTD_FIELD, false), build::expr_stmt(build::null_lit())]),
            "XMLInputFactory xif = XMLInputFactory.newInstance();\n\
             xif.setProperty(XMLInputFactory.SUPPORT_DTD, false);\n\
             xif.setProperty(XMLInputFactory.IS_SUPPORTING_EXTERNAL_ENTITIES, false);\n\
             null;\n"
        );
    }

    #[test]
    fn test_string_keys_recognized() {
        let literal_set = |key: &str| {
            build::expr_stmt(build::call(
                build::ident("xif", JavaType::class(fqn::XML_INPUT_FACTORY)),
                jdk::xml_input_factory_set_property(),
                vec![build::string_lit(key), build::bool_lit(false)],
            ))
        };
        let cu = unit(
            &[],
            vec![],
            vec![factory(), literal_set(EXTERNAL_ENTITIES_KEY), literal_set(SUPPORT_DTD_KEY)],
        );
        let mut visitor = XmlInputFactoryVisitor::new(PassServices::default());
        assert!(Arc::ptr_eq(&run(&mut visitor, &cu), &cu));
    }

    #[test]
    fn test_resolver_suppresses_dtd_property() {
        let resolver = build::expr_stmt(build::call(
            build::ident("xif", JavaType::class(fqn::XML_INPUT_FACTORY)),
            jdk::xml_input_factory_set_resolver(),
            vec![build::ident("resolver", JavaType::class("javax.xml.stream.XMLResolver"))],
        ));
        assert_eq!(
            fix(vec![factory(), resolver]),
            "XMLInputFactory xif = XMLInputFactory.newInstance();\n\
             xif.setProperty(XMLInputFactory.IS_SUPPORTING_EXTERNAL_ENTITIES, false);\n\
             xif.setXMLResolver(resolver);\n"
        );
    }

    #[test]
    fn test_dtd_enabled_respected() {
        assert_eq!(
            fix(vec![factory(), set(EXTERNAL_ENTITIES_FIELD, false), set(SUPPORT_DTD_FIELD, true)]),
            "XMLInputFactory xif = XMLInputFactory.newInstance();\n\
             xif.setProperty(XMLInputFactory.IS_SUPPORTING_EXTERNAL_ENTITIES, false);\n\
             xif.setProperty(XMLInputFactory.SUPPORT_DTD, true);\n"
        );
    }

    #[test]
    fn test_external_dtds_keep_dtd_support() {
        let cu = unit(&[], vec![], vec![factory()]);
        let mut visitor = XmlInputFactoryVisitor::new(PassServices::default())
            .with_external_dtds(vec!["http://example.com/catalog.dtd".to_string()]);
        assert_eq!(
            printed_body(&run(&mut visitor, &cu)),
            "XMLInputFactory xif = XMLInputFactory.newInstance();\n\
             xif.setProperty(XMLInputFactory.IS_SUPPORTING_EXTERNAL_ENTITIES, false);\n"
        );
    }

    fn field_unit(modifiers: Vec<Modifier>, methods: Vec<Arc<Statement>>) -> Arc<crate::shared::models::CompilationUnit> {
        let field = build::var_decl_with(
            modifiers,
            JavaType::class(fqn::XML_INPUT_FACTORY),
            "xif",
            Some(build::static_call(jdk::xml_input_factory_new_instance(), vec![])),
        );
        let mut members = vec![field];
        members.extend(methods);
        build::compilation_unit(Some("com.example"), &[], vec![build::class("A", members)])
    }

    #[test]
    fn test_field_factory_hardened_in_initializer() {
        let cu = field_unit(vec![Modifier::Private], vec![]);
        let mut visitor = XmlInputFactoryVisitor::new(PassServices::default());
        let out = run(&mut visitor, &cu);
        assert_eq!(
            printed_members(&out),
            "private XMLInputFactory xif = XMLInputFactory.newInstance();\n\
             {\n    \
             xif.setProperty(XMLInputFactory.IS_SUPPORTING_EXTERNAL_ENTITIES, false);\n    \
             xif.setProperty(XMLInputFactory.SUPPORT_DTD, false);\n\
             }\n"
        );
        assert!(crate::shared::utils::print_compilation_unit(&out).contains("import javax.xml.stream.XMLInputFactory;"));
        assert!(Arc::ptr_eq(&run(&mut XmlInputFactoryVisitor::new(PassServices::default()), &out), &out));
    }

    #[test]
    fn test_field_configured_in_method_counts() {
        let owner = JavaType::class("A");
        let configure = build::method(
            "configure",
            vec![],
            build::block(vec![build::expr_stmt(build::call(
                build::static_field_ident("xif", owner, JavaType::class(fqn::XML_INPUT_FACTORY)),
                jdk::xml_input_factory_set_property(),
                vec![
                    build::static_field(JavaType::class(fqn::XML_INPUT_FACTORY), SUPPORT_DTD_FIELD, JavaType::string()),
                    build::bool_lit(false),
                ],
            ))]),
        );
        let cu = field_unit(vec![Modifier::Private, Modifier::Static], vec![configure]);
        let mut visitor = XmlInputFactoryVisitor::new(PassServices::default());
        let printed = printed_members(&run(&mut visitor, &cu));
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines[1], "static {");
        assert_eq!(lines[2], "    xif.setProperty(XMLInputFactory.IS_SUPPORTING_EXTERNAL_ENTITIES, false);");
        assert_eq!(lines[3], "}");
        assert_eq!(lines.len(), 7);
    }
}
