//! Declaration and statement nodes
//!
//! The tree is an immutable, typed model of one Java compilation unit. Children
//! are held through `Arc` so that a rewrite only allocates the spine from the
//! changed node up to the root; untouched subtrees are shared with the input.

use std::sync::Arc;

use super::expression::Expression;
use super::java_type::JavaType;

// ═══════════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════════

/// Root of a tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnit {
    /// Package declaration, `None` for the default package
    pub package: Option<String>,

    /// Import declarations in source order
    pub imports: Vec<Import>,

    /// Top-level type declarations
    pub classes: Vec<Arc<ClassDecl>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Import {
    /// Fully-qualified name (`java.io.File`, or `java.io.File.separator` when static)
    pub qualified_name: String,
    pub is_static: bool,
}

impl Import {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            is_static: false,
        }
    }

    /// Package part of a non-static import
    pub fn package(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map(|(pkg, _)| pkg)
            .unwrap_or("")
    }
}

impl CompilationUnit {
    /// `true` when `fqn` is visible by simple name without a new import
    pub fn imports_type(&self, fqn: &str) -> bool {
        let (pkg, _) = fqn.rsplit_once('.').unwrap_or(("", fqn));
        if pkg == "java.lang" || self.package.as_deref() == Some(pkg) {
            return true;
        }
        self.imports.iter().any(|i| {
            !i.is_static
                && (i.qualified_name == fqn
                    || (i.qualified_name.ends_with(".*") && i.package() == pkg))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Synchronized,
}

impl Modifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::Static => "static",
            Self::Final => "final",
            Self::Abstract => "abstract",
            Self::Synchronized => "synchronized",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub ty: JavaType,

    /// Member block; holds fields, methods, nested classes and initializer blocks
    pub body: Arc<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub modifiers: Vec<Modifier>,

    /// Return type as written, `None` for constructors
    pub return_type_name: Option<String>,
    pub name: String,
    pub parameters: Vec<Parameter>,

    /// Declared thrown types
    pub throws: Vec<JavaType>,

    /// `None` for abstract and interface methods
    pub body: Option<Arc<Block>>,
}

impl MethodDecl {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }

    /// `true` when some `throws` clause entry accepts an exception of type `fqn`
    pub fn declares_throwable(&self, fqn: &str) -> bool {
        let thrown = JavaType::class(fqn);
        self.throws
            .iter()
            .filter_map(JavaType::fqn)
            .any(|declared| thrown.is_assignable_to(declared))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub type_name: String,
    pub name: String,
    pub ty: JavaType,
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// Brace-delimited statement sequence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// `static { ... }` initializer
    pub is_static: bool,
    pub statements: Vec<Arc<Statement>>,
}

impl Block {
    pub fn new(statements: Vec<Arc<Statement>>) -> Self {
        Self {
            is_static: false,
            statements,
        }
    }

    pub fn with_statements(&self, statements: Vec<Arc<Statement>>) -> Self {
        Self {
            is_static: self.is_static,
            statements,
        }
    }

    /// Index of a statement by identity
    pub fn position_of(&self, statement: &Arc<Statement>) -> Option<usize> {
        self.statements
            .iter()
            .position(|s| Arc::ptr_eq(s, statement))
    }

    /// `true` when control cannot fall off the end of the block
    pub fn completes_abruptly(&self) -> bool {
        self.statements
            .last()
            .map(|s| s.completes_abruptly())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VarDecl(VariableDecls),
    Expr(Arc<Expression>),
    If(If),
    While(While),
    For(For),
    ForEach(ForEach),
    Try(Try),
    Block(Arc<Block>),
    Return(Option<Arc<Expression>>),
    Throw(Arc<Expression>),
    Break,
    Continue,
    /// Method declaration inside a class body
    MethodDecl(Arc<MethodDecl>),
    /// Nested or local class declaration
    ClassDecl(Arc<ClassDecl>),
}

impl Statement {
    /// `true` for statements after which the next sibling is unreachable
    pub fn completes_abruptly(&self) -> bool {
        match self {
            Self::Return(_) | Self::Throw(_) | Self::Break | Self::Continue => true,
            Self::Block(b) => b.completes_abruptly(),
            Self::If(i) => {
                i.then_branch.completes_abruptly()
                    && i.else_branch
                        .as_ref()
                        .map(|e| e.completes_abruptly())
                        .unwrap_or(false)
            }
            _ => false,
        }
    }

    pub fn as_var_decl(&self) -> Option<&VariableDecls> {
        match self {
            Self::VarDecl(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Arc<Expression>> {
        match self {
            Self::Expr(e) => Some(e),
            _ => None,
        }
    }

    /// Local names declared directly by this statement
    pub fn declared_names(&self) -> Vec<&str> {
        match self {
            Self::VarDecl(v) => v.variables.iter().map(|n| n.name.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecls {
    pub modifiers: Vec<Modifier>,

    /// Declared type as written
    pub type_name: String,
    pub variables: Vec<Arc<NamedVariable>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedVariable {
    pub name: String,
    pub ty: JavaType,
    pub initializer: Option<Arc<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Arc<Expression>,
    pub then_branch: Arc<Statement>,
    pub else_branch: Option<Arc<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Arc<Expression>,
    pub body: Arc<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub init: Vec<Arc<Statement>>,
    pub condition: Option<Arc<Expression>>,
    pub update: Vec<Arc<Expression>>,
    pub body: Arc<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForEach {
    pub type_name: String,
    pub variable: Arc<NamedVariable>,
    pub iterable: Arc<Expression>,
    pub body: Arc<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Try {
    /// try-with-resources declarations
    pub resources: Vec<VariableDecls>,
    pub body: Arc<Block>,
    pub catches: Vec<Catch>,
    pub finally: Option<Arc<Block>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    /// Caught types as written; more than one for multi-catch
    pub type_names: Vec<String>,
    pub types: Vec<JavaType>,
    pub parameter: Arc<NamedVariable>,
    pub body: Arc<Block>,
}

impl Catch {
    /// `true` when an exception of type `fqn` is caught by this clause
    pub fn accepts(&self, fqn: &str) -> bool {
        let thrown = JavaType::class(fqn);
        self.types
            .iter()
            .filter_map(JavaType::fqn)
            .any(|caught| thrown.is_assignable_to(caught))
    }
}
