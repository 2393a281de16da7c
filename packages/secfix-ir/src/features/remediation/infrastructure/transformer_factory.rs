/*
 * TransformerFactory Hardening
 *
 * A factory created by `TransformerFactory.new*(..)` must not fetch external
 * DTDs or stylesheets:
 *
 *   TransformerFactory tf = TransformerFactory.newInstance();
 *   tf.setAttribute(XMLConstants.ACCESS_EXTERNAL_DTD, "");
 *   tf.setAttribute(XMLConstants.ACCESS_EXTERNAL_STYLESHEET, "");
 *   tf.setFeature(XMLConstants.FEATURE_SECURE_PROCESSING, true);
 *
 * Missing settings follow the last configuring call on a local factory, or
 * go into an initializer block after a field factory. Code that allows an
 * access protocol or switches secure processing off has made a choice; such
 * a factory is left alone.
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

const ACCESS_EXTERNAL_DTD: &str = "ACCESS_EXTERNAL_DTD";
const ACCESS_EXTERNAL_STYLESHEET: &str = "ACCESS_EXTERNAL_STYLESHEET";
const FEATURE_SECURE_PROCESSING: &str = "FEATURE_SECURE_PROCESSING";
const ACCESS_EXTERNAL_DTD_KEY: &str = "http://javax.xml.XMLConstants/property/accessExternalDTD";
const ACCESS_EXTERNAL_STYLESHEET_KEY: &str = "http://javax.xml.XMLConstants/property/accessExternalStylesheet";
const FEATURE_SECURE_PROCESSING_KEY: &str = "http://javax.xml.XMLConstants/feature/secure-processing";

static NEW_FACTORY: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("javax.xml.transform.TransformerFactory new*(..)").expect("factory descriptor")
});

static SET_ATTRIBUTE: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("javax.xml.transform.TransformerFactory setAttribute(java.lang.String, ..)")
        .expect("setAttribute descriptor")
});

static SET_FEATURE: Lazy<MethodSignature> = Lazy::new(|| {
    MethodSignature::parse("javax.xml.transform.TransformerFactory setFeature(java.lang.String, boolean)")
        .expect("setFeature descriptor")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Setting {
    ExternalDtd,
    ExternalStylesheet,
    SecureProcessing,
}

const SETTINGS: [Setting; 3] = [Setting::ExternalDtd, Setting::ExternalStylesheet, Setting::SecureProcessing];

impl Setting {
    fn field(&self) -> &'static str {
        match self {
            Self::ExternalDtd => ACCESS_EXTERNAL_DTD,
            Self::ExternalStylesheet => ACCESS_EXTERNAL_STYLESHEET,
            Self::SecureProcessing => FEATURE_SECURE_PROCESSING,
        }
    }

    fn of(arg: &Arc<Expression>) -> Option<Self> {
        let name = match &unwrap_parens(arg).kind {
            ExprKind::FieldAccess(fa) => fa.name.as_str(),
            ExprKind::Identifier(id) if id.field_owner.is_some() => id.name.as_str(),
            ExprKind::Literal(Literal::String(key)) => match key.as_str() {
                ACCESS_EXTERNAL_DTD_KEY => ACCESS_EXTERNAL_DTD,
                ACCESS_EXTERNAL_STYLESHEET_KEY => ACCESS_EXTERNAL_STYLESHEET,
                FEATURE_SECURE_PROCESSING_KEY => FEATURE_SECURE_PROCESSING,
                _ => return None,
            },
            _ => return None,
        };
        SETTINGS.into_iter().find(|s| s.field() == name)
    }
}

#[derive(Debug, Default)]
struct FactoryState {
    configured: Vec<Setting>,
    /// A protocol is allowed or secure processing is off
    deliberately_open: bool,
    last_setter: Option<Arc<Statement>>,
}

impl FactoryState {
    fn missing(&self) -> Vec<Setting> {
        if self.deliberately_open {
            return Vec::new();
        }
        SETTINGS
            .into_iter()
            .filter(|s| !self.configured.contains(s))
            .collect()
    }
}

pub struct TransformerFactoryVisitor {
    services: PassServices,
}

impl TransformerFactoryVisitor {
    pub fn new(services: PassServices) -> Self {
        Self { services }
    }

    fn is_factory(&self, variable: &NamedVariable) -> bool {
        variable
            .initializer
            .as_ref()
            .map(|init| self.services.matcher.matches(unwrap_parens(init), &NEW_FACTORY))
            .unwrap_or(false)
    }

    fn is_configuration(&self, expr: &Expression) -> bool {
        self.services.matcher.matches(expr, &SET_ATTRIBUTE) || self.services.matcher.matches(expr, &SET_FEATURE)
    }

    fn scan(&self, receiver: Receiver<'_>, statements: &[Arc<Statement>]) -> FactoryState {
        let mut state = FactoryState::default();
        for statement in statements {
            for expr in expressions_in(&TreeRef::Statement(statement.clone())) {
                if !receiver.is_receiver_of(&expr) || !self.is_configuration(&expr) {
                    continue;
                }
                let args = expr.arguments();
                let Some(setting) = args.first().and_then(Setting::of) else {
                    continue;
                };
                let value = args.get(1).map(|v| &unwrap_parens(v).kind);
                state.deliberately_open |= match setting {
                    Setting::SecureProcessing => matches!(value, Some(ExprKind::Literal(Literal::Boolean(false)))),
                    _ => matches!(value, Some(ExprKind::Literal(Literal::String(s))) if !s.is_empty()),
                };
                state.configured.push(setting);
            }
            if statement
                .as_expression()
                .map(|e| receiver.is_receiver_of(e) && self.is_configuration(e))
                .unwrap_or(false)
            {
                state.last_setter = Some(statement.clone());
            }
        }
        state
    }

    fn harden(&self, block: &Arc<Block>, cursor: &mut Cursor) {
        let owner = class_body_owner(cursor);
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
                let Some(init) = variable.initializer.clone() else {
                    continue;
                };
                let state = match owner {
                    Some(_) => self.scan(Receiver::Field(&variable.name), &class_statements),
                    None => self.scan(Receiver::Local(&variable.name), &block.statements[index + 1..]),
                };
                let missing = state.missing();
                if missing.is_empty() {
                    continue;
                }
                tracing::debug!(factory = %variable.name, missing = missing.len(), "hardening TransformerFactory");
                let factory = variable_read(variable, owner.as_ref());
                let statements: Vec<Arc<Statement>> = missing.iter().map(|s| configure(&factory, *s)).collect();
                let (anchor, statements) = match owner {
                    Some(_) => (statement.clone(), vec![field_initializer(statement, statements)]),
                    None => (state.last_setter.unwrap_or_else(|| statement.clone()), statements),
                };
                if record_fix(cursor, PendingFix::new(anchor, init, FixKind::InsertStatementsAfter(statements))) {
                    register_import(cursor, fqn::XML_CONSTANTS);
                }
            }
        }
    }
}

impl TreeVisitor for TransformerFactoryVisitor {
    fn visit_block(&mut self, block: &Arc<Block>, cursor: &mut Cursor) -> Result<Arc<Block>> {
        let walked = walk_block(self, block, cursor)?;
        self.harden(block, cursor);
        self.services.commit(cursor, block, walked)
    }
}

/// `tf.setAttribute(XMLConstants.<ACCESS>, "");` or `tf.setFeature(XMLConstants.FEATURE_SECURE_PROCESSING, true);`
fn configure(factory: &Arc<Expression>, setting: Setting) -> Arc<Statement> {
    let key = build::static_field(JavaType::class(fqn::XML_CONSTANTS), setting.field(), JavaType::string());
    let call = match setting {
        Setting::SecureProcessing => build::call(
            build::fresh_copy(factory),
            jdk::transformer_factory_set_feature(),
            vec![key, build::bool_lit(true)],
        ),
        _ => build::call(
            build::fresh_copy(factory),
            jdk::transformer_factory_set_attribute(),
            vec![key, build::string_lit("")],
        ),
    };
    build::expr_stmt(call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::remediation::infrastructure::testing::{printed_body, printed_members, run, unit};
    use crate::shared::models::Modifier;
    use crate::shared::utils::print_compilation_unit;
    use pretty_assertions::assert_eq;

    fn tf() -> Arc<Expression> {
        build::ident("tf", JavaType::class(fqn::TRANSFORMER_FACTORY))
    }

    fn factory() -> Arc<Statement> {
        build::var_decl(
            JavaType::class(fqn::TRANSFORMER_FACTORY),
            "tf",
            Some(build::static_call(jdk::transformer_factory_new_instance(), vec![])),
        )
    }

    fn set_attribute(field: &str, value: &str) -> Arc<Statement> {
        build::expr_stmt(build::call(
            tf(),
            jdk::transformer_factory_set_attribute(),
            vec![
                build::static_field(JavaType::class(fqn::XML_CONSTANTS), field, JavaType::string()),
                build::string_lit(value),
            ],
        ))
    }

    fn fix(statements: Vec<Arc<Statement>>) -> Arc<crate::shared::models::CompilationUnit> {
        let cu = unit(&[], vec![], statements);
        run(&mut TransformerFactoryVisitor::new(PassServices::default()), &cu)
    }

    #[test]
    fn test_all_settings_added_after_declaration() {
        let out = fix(vec![factory(), build::expr_stmt(build::null_lit())]);
        assert_eq!(
            printed_body(&out),
            "TransformerFactory tf = TransformerFactory.newInstance();\n\
             tf.setAttribute(XMLConstants.ACCESS_EXTERNAL_DTD, \"\");\n\
             tf.setAttribute(XMLConstants.ACCESS_EXTERNAL_STYLESHEET, \"\");\n\
             tf.setFeature(XMLConstants.FEATURE_SECURE_PROCESSING, true);\n\
             null;\n"
        );
        assert!(print_compilation_unit(&out).contains("import javax.xml.XMLConstants;"));
    }

    #[test]
    fn test_missing_settings_follow_existing_one() {
        let out = fix(vec![factory(), set_attribute(ACCESS_EXTERNAL_DTD, ""), build::expr_stmt(build::null_lit())]);
        assert_eq!(
            printed_body(&out),
            "TransformerFactory tf = TransformerFactory.newInstance();\n\
             tf.setAttribute(XMLConstants.ACCESS_EXTERNAL_DTD, \"\");\n\
             tf.setAttribute(XMLConstants.ACCESS_EXTERNAL_STYLESHEET, \"\");\n\
             tf.setFeature(XMLConstants.FEATURE_SECURE_PROCESSING, true);\n\
             null;\n"
        );
    }

    #[test]
    fn test_allowed_protocol_left_alone() {
        let cu = unit(&[], vec![], vec![factory(), set_attribute(ACCESS_EXTERNAL_STYLESHEET, "file")]);
        let out = run(&mut TransformerFactoryVisitor::new(PassServices::default()), &cu);
        assert!(Arc::ptr_eq(&out, &cu));
    }

    #[test]
    fn test_secure_processing_literal_key_recognized() {
        let disabled = build::expr_stmt(build::call(
            tf(),
            jdk::transformer_factory_set_feature(),
            vec![build::string_lit(FEATURE_SECURE_PROCESSING_KEY), build::bool_lit(false)],
        ));
        let cu = unit(&[], vec![], vec![factory(), disabled]);
        let out = run(&mut TransformerFactoryVisitor::new(PassServices::default()), &cu);
        assert!(Arc::ptr_eq(&out, &cu));
    }

    #[test]
    fn test_hardened_factory_is_stable() {
        let out = fix(vec![factory()]);
        let again = run(&mut TransformerFactoryVisitor::new(PassServices::default()), &out);
        assert!(Arc::ptr_eq(&again, &out));
    }

    #[test]
    fn test_field_factory_gets_static_initializer() {
        let field = build::var_decl_with(
            vec![Modifier::Private, Modifier::Static, Modifier::Final],
            JavaType::class(fqn::TRANSFORMER_FACTORY),
            "TF",
            Some(build::static_call(jdk::transformer_factory_new_instance(), vec![])),
        );
        let cu = build::compilation_unit(Some("com.example"), &[], vec![build::class("A", vec![field])]);
        let out = run(&mut TransformerFactoryVisitor::new(PassServices::default()), &cu);
        assert_eq!(
            printed_members(&out),
            "private static final TransformerFactory TF = TransformerFactory.newInstance();\n\
             static {\n    \
             TF.setAttribute(XMLConstants.ACCESS_EXTERNAL_DTD, \"\");\n    \
             TF.setAttribute(XMLConstants.ACCESS_EXTERNAL_STYLESHEET, \"\");\n    \
             TF.setFeature(XMLConstants.FEATURE_SECURE_PROCESSING, true);\n\
             }\n"
        );
        let again = run(&mut TransformerFactoryVisitor::new(PassServices::default()), &out);
        assert!(Arc::ptr_eq(&again, &out));
    }
}
