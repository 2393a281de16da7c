//! Typed node constructors
//!
//! Fix templates and tests build fragments through these helpers so that every
//! synthesized node carries the type and method attribution a parser would
//! have produced.

use std::sync::Arc;

use super::expression::{
    Assignment, Binary, BinaryOp, ExprKind, Expression, FieldAccess, Identifier, Literal,
    MethodInvocation, NewArray, NewClass, Ternary, TypeCast, Unary, UnaryOp,
};
use super::java_type::{fqn, JavaType, MethodType};
use super::tree::{
    Block, Catch, ClassDecl, CompilationUnit, ForEach, If, Import, MethodDecl, Modifier,
    NamedVariable, Parameter, Statement, Try, VariableDecls, While,
};

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

pub fn expr(kind: ExprKind, ty: JavaType) -> Arc<Expression> {
    Arc::new(Expression::new(kind, ty))
}

/// Local variable or parameter read
pub fn ident(name: &str, ty: JavaType) -> Arc<Expression> {
    expr(
        ExprKind::Identifier(Identifier {
            name: name.to_string(),
            field_owner: None,
        }),
        ty,
    )
}

/// Field read through a simple name (`separator` after a static import)
pub fn static_field_ident(name: &str, owner: JavaType, ty: JavaType) -> Arc<Expression> {
    expr(
        ExprKind::Identifier(Identifier {
            name: name.to_string(),
            field_owner: Some(owner),
        }),
        ty,
    )
}

/// Type name used as a qualifier (`File` in `File.separator`)
pub fn type_name(ty: JavaType) -> Arc<Expression> {
    let name = ty.simple_name().unwrap_or("").to_string();
    ident(&name, ty)
}

pub fn string_lit(value: &str) -> Arc<Expression> {
    expr(ExprKind::Literal(Literal::String(value.to_string())), JavaType::string())
}

pub fn char_lit(value: char) -> Arc<Expression> {
    expr(
        ExprKind::Literal(Literal::Char(value)),
        JavaType::Primitive(super::java_type::Primitive::Char),
    )
}

pub fn int_lit(value: i64) -> Arc<Expression> {
    expr(
        ExprKind::Literal(Literal::Int(value)),
        JavaType::Primitive(super::java_type::Primitive::Int),
    )
}

pub fn bool_lit(value: bool) -> Arc<Expression> {
    expr(ExprKind::Literal(Literal::Boolean(value)), JavaType::boolean())
}

pub fn long_lit(value: i64) -> Arc<Expression> {
    expr(
        ExprKind::Literal(Literal::Long(value)),
        JavaType::Primitive(super::java_type::Primitive::Long),
    )
}

pub fn null_lit() -> Arc<Expression> {
    expr(ExprKind::Literal(Literal::Null), JavaType::Null)
}

pub fn field_access(target: Arc<Expression>, name: &str, ty: JavaType) -> Arc<Expression> {
    expr(
        ExprKind::FieldAccess(FieldAccess {
            target,
            name: name.to_string(),
        }),
        ty,
    )
}

/// `Owner.NAME`
pub fn static_field(owner: JavaType, name: &str, ty: JavaType) -> Arc<Expression> {
    field_access(type_name(owner), name, ty)
}

/// Instance call `receiver.name(args)`, typed by `method`
pub fn call(receiver: Arc<Expression>, method: MethodType, args: Vec<Arc<Expression>>) -> Arc<Expression> {
    let ty = method.return_type.clone();
    expr(
        ExprKind::MethodInvocation(MethodInvocation {
            select: Some(receiver),
            name: method.name.clone(),
            arguments: args,
            method_type: Some(method),
        }),
        ty,
    )
}

/// Static call `Owner.name(args)`
pub fn static_call(method: MethodType, args: Vec<Arc<Expression>>) -> Arc<Expression> {
    let owner = type_name(method.declaring_type.clone());
    call(owner, method, args)
}

/// Unqualified call `name(args)` of a method of the enclosing class
pub fn local_call(method: MethodType, args: Vec<Arc<Expression>>) -> Arc<Expression> {
    let ty = method.return_type.clone();
    expr(
        ExprKind::MethodInvocation(MethodInvocation {
            select: None,
            name: method.name.clone(),
            arguments: args,
            method_type: Some(method),
        }),
        ty,
    )
}

/// `new Owner(args)`
pub fn new_instance(constructor: MethodType, args: Vec<Arc<Expression>>) -> Arc<Expression> {
    let ty = constructor.declaring_type.clone();
    let class_name = ty.simple_name().unwrap_or("").to_string();
    expr(
        ExprKind::NewClass(NewClass {
            class_name,
            arguments: args,
            constructor_type: Some(constructor),
        }),
        ty,
    )
}

/// `new <element>[dimension]`; arrays are typed `Unknown`
pub fn new_array(element: JavaType, dimension: Arc<Expression>) -> Arc<Expression> {
    let element_type_name = element.simple_name().unwrap_or("Object").to_string();
    expr(
        ExprKind::NewArray(NewArray {
            element_type_name,
            dimension,
        }),
        JavaType::Unknown,
    )
}

pub fn binary(operator: BinaryOp, left: Arc<Expression>, right: Arc<Expression>, ty: JavaType) -> Arc<Expression> {
    expr(ExprKind::Binary(Binary { operator, left, right }), ty)
}

/// `left + right`, typed as String when either side is a String
pub fn add(left: Arc<Expression>, right: Arc<Expression>) -> Arc<Expression> {
    let ty = if left.ty.is_string() || right.ty.is_string() {
        JavaType::string()
    } else {
        left.ty.clone()
    };
    binary(BinaryOp::Add, left, right, ty)
}

pub fn and(left: Arc<Expression>, right: Arc<Expression>) -> Arc<Expression> {
    binary(BinaryOp::And, left, right, JavaType::boolean())
}

pub fn or(left: Arc<Expression>, right: Arc<Expression>) -> Arc<Expression> {
    binary(BinaryOp::Or, left, right, JavaType::boolean())
}

pub fn not(operand: Arc<Expression>) -> Arc<Expression> {
    expr(
        ExprKind::Unary(Unary {
            operator: UnaryOp::Not,
            operand,
        }),
        JavaType::boolean(),
    )
}

pub fn parens(inner: Arc<Expression>) -> Arc<Expression> {
    let ty = inner.ty.clone();
    expr(ExprKind::Parens(inner), ty)
}

pub fn assign(target: Arc<Expression>, value: Arc<Expression>) -> Arc<Expression> {
    let ty = target.ty.clone();
    expr(
        ExprKind::Assignment(Assignment {
            target,
            value,
            operator: None,
        }),
        ty,
    )
}

pub fn cast(ty: JavaType, expression: Arc<Expression>) -> Arc<Expression> {
    let type_name = ty.simple_name().unwrap_or("").to_string();
    expr(ExprKind::TypeCast(TypeCast { type_name, expression }), ty)
}

pub fn ternary(condition: Arc<Expression>, then_expr: Arc<Expression>, else_expr: Arc<Expression>) -> Arc<Expression> {
    let ty = then_expr.ty.clone();
    expr(
        ExprKind::Ternary(Ternary {
            condition,
            then_expr,
            else_expr,
        }),
        ty,
    )
}

/// Structurally equal copy with fresh node identities
pub fn fresh_copy(original: &Arc<Expression>) -> Arc<Expression> {
    let children = original.children().into_iter().map(fresh_copy).collect();
    Arc::new(original.with_children(children))
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

pub fn expr_stmt(expression: Arc<Expression>) -> Arc<Statement> {
    Arc::new(Statement::Expr(expression))
}

pub fn variable(name: &str, ty: JavaType, initializer: Option<Arc<Expression>>) -> Arc<NamedVariable> {
    Arc::new(NamedVariable {
        name: name.to_string(),
        ty,
        initializer,
    })
}

/// `Type name = init;` with the type name taken from `ty`
pub fn var_decl(ty: JavaType, name: &str, initializer: Option<Arc<Expression>>) -> Arc<Statement> {
    var_decl_with(Vec::new(), ty, name, initializer)
}

/// `final Type name = init;`
pub fn final_var_decl(ty: JavaType, name: &str, initializer: Arc<Expression>) -> Arc<Statement> {
    var_decl_with(vec![Modifier::Final], ty, name, Some(initializer))
}

pub fn var_decl_with(
    modifiers: Vec<Modifier>,
    ty: JavaType,
    name: &str,
    initializer: Option<Arc<Expression>>,
) -> Arc<Statement> {
    let type_name = ty.simple_name().unwrap_or("var").to_string();
    Arc::new(Statement::VarDecl(VariableDecls {
        modifiers,
        type_name,
        variables: vec![variable(name, ty, initializer)],
    }))
}

pub fn block(statements: Vec<Arc<Statement>>) -> Arc<Block> {
    Arc::new(Block::new(statements))
}

pub fn static_block(statements: Vec<Arc<Statement>>) -> Arc<Block> {
    Arc::new(Block {
        is_static: true,
        statements,
    })
}

pub fn block_stmt(statements: Vec<Arc<Statement>>) -> Arc<Statement> {
    Arc::new(Statement::Block(block(statements)))
}

pub fn if_stmt(
    condition: Arc<Expression>,
    then_branch: Arc<Statement>,
    else_branch: Option<Arc<Statement>>,
) -> Arc<Statement> {
    Arc::new(Statement::If(If {
        condition,
        then_branch,
        else_branch,
    }))
}

pub fn while_stmt(condition: Arc<Expression>, body: Arc<Statement>) -> Arc<Statement> {
    Arc::new(Statement::While(While { condition, body }))
}

pub fn for_each(ty: JavaType, name: &str, iterable: Arc<Expression>, body: Arc<Statement>) -> Arc<Statement> {
    let type_name = ty.simple_name().unwrap_or("var").to_string();
    Arc::new(Statement::ForEach(ForEach {
        type_name,
        variable: variable(name, ty, None),
        iterable,
        body,
    }))
}

pub fn catch_clause(exception: JavaType, name: &str, body: Arc<Block>) -> Catch {
    let type_name = exception.simple_name().unwrap_or("Exception").to_string();
    Catch {
        type_names: vec![type_name],
        types: vec![exception.clone()],
        parameter: variable(name, exception, None),
        body,
    }
}

pub fn try_stmt(body: Arc<Block>, catches: Vec<Catch>, finally: Option<Arc<Block>>) -> Arc<Statement> {
    Arc::new(Statement::Try(Try {
        resources: Vec::new(),
        body,
        catches,
        finally,
    }))
}

pub fn return_stmt(value: Option<Arc<Expression>>) -> Arc<Statement> {
    Arc::new(Statement::Return(value))
}

/// `throw new <exception>("<message>");`
pub fn throw_new(exception: JavaType, message: &str) -> Arc<Statement> {
    let ctor = MethodType::constructor(exception, vec![JavaType::string()]);
    Arc::new(Statement::Throw(new_instance(ctor, vec![string_lit(message)])))
}

pub fn throw_runtime(message: &str) -> Arc<Statement> {
    throw_new(JavaType::class(fqn::RUNTIME_EXCEPTION), message)
}

// ═══════════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════════

pub fn param(ty: JavaType, name: &str) -> Parameter {
    Parameter {
        type_name: ty.simple_name().unwrap_or("Object").to_string(),
        name: name.to_string(),
        ty,
    }
}

/// `public void name(params) { body }`
pub fn method(name: &str, parameters: Vec<Parameter>, body: Arc<Block>) -> Arc<Statement> {
    method_with(vec![Modifier::Public], name, parameters, Vec::new(), body)
}

pub fn method_with(
    modifiers: Vec<Modifier>,
    name: &str,
    parameters: Vec<Parameter>,
    throws: Vec<JavaType>,
    body: Arc<Block>,
) -> Arc<Statement> {
    Arc::new(Statement::MethodDecl(Arc::new(MethodDecl {
        modifiers,
        return_type_name: Some("void".to_string()),
        name: name.to_string(),
        parameters,
        throws,
        body: Some(body),
    })))
}

/// Method with an explicit return type name, `None` for constructors
pub fn method_returning(
    modifiers: Vec<Modifier>,
    return_type_name: Option<&str>,
    name: &str,
    parameters: Vec<Parameter>,
    body: Arc<Block>,
) -> Arc<Statement> {
    Arc::new(Statement::MethodDecl(Arc::new(MethodDecl {
        modifiers,
        return_type_name: return_type_name.map(str::to_string),
        name: name.to_string(),
        parameters,
        throws: Vec::new(),
        body: Some(body),
    })))
}

pub fn class(name: &str, members: Vec<Arc<Statement>>) -> Arc<ClassDecl> {
    Arc::new(ClassDecl {
        modifiers: vec![Modifier::Public],
        name: name.to_string(),
        ty: JavaType::class(name),
        body: block(members),
    })
}

pub fn compilation_unit(package: Option<&str>, imports: &[&str], classes: Vec<Arc<ClassDecl>>) -> Arc<CompilationUnit> {
    Arc::new(CompilationUnit {
        package: package.map(str::to_string),
        imports: imports.iter().map(|i| Import::new(*i)).collect(),
        classes,
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// JDK method attribution
// ═══════════════════════════════════════════════════════════════════════════

/// Method types of the library members the remediations read or synthesize
pub mod jdk {
    use super::super::java_type::{fqn, JavaType, MethodType, Primitive};

    fn string() -> JavaType {
        JavaType::string()
    }

    fn long() -> JavaType {
        JavaType::Primitive(Primitive::Long)
    }

    fn int() -> JavaType {
        JavaType::Primitive(Primitive::Int)
    }

    pub fn file_of_parent_and_child() -> MethodType {
        MethodType::constructor(JavaType::file(), vec![JavaType::file(), string()])
    }

    pub fn file_of_strings() -> MethodType {
        MethodType::constructor(JavaType::file(), vec![string(), string()])
    }

    pub fn file_of_string() -> MethodType {
        MethodType::constructor(JavaType::file(), vec![string()])
    }

    pub fn file_to_path() -> MethodType {
        MethodType::method(JavaType::file(), "toPath", vec![], JavaType::path())
    }

    pub fn file_get_canonical_path() -> MethodType {
        MethodType::method(JavaType::file(), "getCanonicalPath", vec![], string())
    }

    pub fn file_get_canonical_file() -> MethodType {
        MethodType::method(JavaType::file(), "getCanonicalFile", vec![], JavaType::file())
    }

    pub fn file_get_absolute_path() -> MethodType {
        MethodType::method(JavaType::file(), "getAbsolutePath", vec![], string())
    }

    pub fn file_delete() -> MethodType {
        MethodType::method(JavaType::file(), "delete", vec![], JavaType::boolean())
    }

    pub fn file_mkdir() -> MethodType {
        MethodType::method(JavaType::file(), "mkdir", vec![], JavaType::boolean())
    }

    pub fn file_mkdirs() -> MethodType {
        MethodType::method(JavaType::file(), "mkdirs", vec![], JavaType::boolean())
    }

    pub fn file_create_temp_file() -> MethodType {
        MethodType::static_method(
            JavaType::file(),
            "createTempFile",
            vec![string(), string()],
            JavaType::file(),
        )
    }

    pub fn file_create_temp_file_in() -> MethodType {
        MethodType::static_method(
            JavaType::file(),
            "createTempFile",
            vec![string(), string(), JavaType::file()],
            JavaType::file(),
        )
    }

    pub fn path_normalize() -> MethodType {
        MethodType::method(JavaType::path(), "normalize", vec![], JavaType::path())
    }

    pub fn path_starts_with_path() -> MethodType {
        MethodType::method(JavaType::path(), "startsWith", vec![JavaType::path()], JavaType::boolean())
    }

    pub fn path_starts_with_string() -> MethodType {
        MethodType::method(JavaType::path(), "startsWith", vec![string()], JavaType::boolean())
    }

    pub fn path_resolve() -> MethodType {
        MethodType::method(JavaType::path(), "resolve", vec![string()], JavaType::path())
    }

    pub fn path_to_file() -> MethodType {
        MethodType::method(JavaType::path(), "toFile", vec![], JavaType::file())
    }

    pub fn string_starts_with() -> MethodType {
        MethodType::method(string(), "startsWith", vec![string()], JavaType::boolean())
    }

    pub fn string_get_bytes() -> MethodType {
        MethodType::method(string(), "getBytes", vec![], JavaType::Unknown)
    }

    pub fn files_create_temp_file() -> MethodType {
        MethodType::static_method(
            JavaType::class(fqn::FILES),
            "createTempFile",
            vec![string(), string()],
            JavaType::path(),
        )
    }

    pub fn files_create_temp_file_in() -> MethodType {
        MethodType::static_method(
            JavaType::class(fqn::FILES),
            "createTempFile",
            vec![JavaType::path(), string(), string()],
            JavaType::path(),
        )
    }

    pub fn files_create_temp_directory() -> MethodType {
        MethodType::static_method(
            JavaType::class(fqn::FILES),
            "createTempDirectory",
            vec![string()],
            JavaType::path(),
        )
    }

    pub fn files_create_temp_directory_in() -> MethodType {
        MethodType::static_method(
            JavaType::class(fqn::FILES),
            "createTempDirectory",
            vec![JavaType::path(), string()],
            JavaType::path(),
        )
    }

    pub fn zip_entry_get_name() -> MethodType {
        MethodType::method(JavaType::class(fqn::ZIP_ENTRY), "getName", vec![], string())
    }

    pub fn zip_archive_entry_get_name() -> MethodType {
        MethodType::method(JavaType::class(fqn::ZIP_ARCHIVE_ENTRY), "getName", vec![], string())
    }

    pub fn file_output_stream_of_string() -> MethodType {
        MethodType::constructor(JavaType::class("java.io.FileOutputStream"), vec![string()])
    }

    pub fn file_output_stream_of_file() -> MethodType {
        MethodType::constructor(JavaType::class("java.io.FileOutputStream"), vec![JavaType::file()])
    }

    pub fn random() -> MethodType {
        MethodType::constructor(JavaType::class(fqn::RANDOM), vec![])
    }

    pub fn random_seeded() -> MethodType {
        MethodType::constructor(JavaType::class(fqn::RANDOM), vec![long()])
    }

    pub fn secure_random() -> MethodType {
        MethodType::constructor(JavaType::class(fqn::SECURE_RANDOM), vec![])
    }

    pub fn secure_random_set_seed() -> MethodType {
        MethodType::method(JavaType::class(fqn::SECURE_RANDOM), "setSeed", vec![long()], JavaType::void())
    }

    pub fn system_current_time_millis() -> MethodType {
        MethodType::static_method(JavaType::class(fqn::SYSTEM), "currentTimeMillis", vec![], long())
    }

    pub fn system_nano_time() -> MethodType {
        MethodType::static_method(JavaType::class(fqn::SYSTEM), "nanoTime", vec![], long())
    }

    pub fn date_get_time() -> MethodType {
        MethodType::method(JavaType::class(fqn::DATE), "getTime", vec![], long())
    }

    pub fn cookie() -> MethodType {
        MethodType::constructor(JavaType::class(fqn::COOKIE), vec![string(), string()])
    }

    pub fn cookie_set_secure() -> MethodType {
        MethodType::method(JavaType::class(fqn::COOKIE), "setSecure", vec![JavaType::boolean()], JavaType::void())
    }

    pub fn xml_input_factory_new_instance() -> MethodType {
        MethodType::static_method(
            JavaType::class(fqn::XML_INPUT_FACTORY),
            "newInstance",
            vec![],
            JavaType::class(fqn::XML_INPUT_FACTORY),
        )
    }

    pub fn xml_input_factory_set_property() -> MethodType {
        MethodType::method(
            JavaType::class(fqn::XML_INPUT_FACTORY),
            "setProperty",
            vec![string(), JavaType::class(fqn::OBJECT)],
            JavaType::void(),
        )
    }

    pub fn xml_input_factory_set_resolver() -> MethodType {
        MethodType::method(
            JavaType::class(fqn::XML_INPUT_FACTORY),
            "setXMLResolver",
            vec![JavaType::class("javax.xml.stream.XMLResolver")],
            JavaType::void(),
        )
    }

    pub fn document_builder_factory_new_instance() -> MethodType {
        MethodType::static_method(
            JavaType::class(fqn::DOCUMENT_BUILDER_FACTORY),
            "newInstance",
            vec![],
            JavaType::class(fqn::DOCUMENT_BUILDER_FACTORY),
        )
    }

    pub fn document_builder_factory_set_feature() -> MethodType {
        MethodType::method(
            JavaType::class(fqn::DOCUMENT_BUILDER_FACTORY),
            "setFeature",
            vec![string(), JavaType::boolean()],
            JavaType::void(),
        )
    }

    pub fn document_builder_factory_set_xinclude_aware() -> MethodType {
        MethodType::method(
            JavaType::class(fqn::DOCUMENT_BUILDER_FACTORY),
            "setXIncludeAware",
            vec![JavaType::boolean()],
            JavaType::void(),
        )
    }

    pub fn document_builder_factory_set_expand_entity_references() -> MethodType {
        MethodType::method(
            JavaType::class(fqn::DOCUMENT_BUILDER_FACTORY),
            "setExpandEntityReferences",
            vec![JavaType::boolean()],
            JavaType::void(),
        )
    }

    pub fn transformer_factory_new_instance() -> MethodType {
        MethodType::static_method(
            JavaType::class(fqn::TRANSFORMER_FACTORY),
            "newInstance",
            vec![],
            JavaType::class(fqn::TRANSFORMER_FACTORY),
        )
    }

    pub fn transformer_factory_set_attribute() -> MethodType {
        MethodType::method(
            JavaType::class(fqn::TRANSFORMER_FACTORY),
            "setAttribute",
            vec![string(), JavaType::class(fqn::OBJECT)],
            JavaType::void(),
        )
    }

    pub fn transformer_factory_set_feature() -> MethodType {
        MethodType::method(
            JavaType::class(fqn::TRANSFORMER_FACTORY),
            "setFeature",
            vec![string(), JavaType::boolean()],
            JavaType::void(),
        )
    }

    /// `random(int, int, int, boolean, boolean, char[], Random)` of the given
    /// `RandomStringUtils` class
    pub fn random_string_utils_random(owner: &str) -> MethodType {
        MethodType::static_method(
            JavaType::class(owner),
            "random",
            vec![
                int(),
                int(),
                int(),
                JavaType::boolean(),
                JavaType::boolean(),
                JavaType::Unknown,
                JavaType::class(fqn::RANDOM),
            ],
            string(),
        )
    }

    pub fn random_string_utils_random_alphanumeric(owner: &str) -> MethodType {
        MethodType::static_method(JavaType::class(owner), "randomAlphanumeric", vec![int()], string())
    }

    pub fn secure_random_next_bytes() -> MethodType {
        MethodType::method(JavaType::class(fqn::SECURE_RANDOM), "nextBytes", vec![JavaType::Unknown], JavaType::void())
    }

    pub fn access_controller_do_privileged() -> MethodType {
        MethodType::static_method(
            JavaType::class(fqn::ACCESS_CONTROLLER),
            "doPrivileged",
            vec![JavaType::class(fqn::PRIVILEGED_ACTION)],
            JavaType::class(fqn::OBJECT),
        )
    }

    pub fn illegal_state_exception() -> MethodType {
        MethodType::constructor(
            JavaType::class(fqn::ILLEGAL_STATE_EXCEPTION),
            vec![string(), JavaType::class(fqn::THROWABLE)],
        )
    }
}
