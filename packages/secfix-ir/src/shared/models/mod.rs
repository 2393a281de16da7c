//! Typed syntax tree
//!
//! Immutable, `Arc`-shared nodes for one compilation unit. Identity is
//! `Arc::ptr_eq`; `PartialEq` compares structure.

pub mod build;
pub mod expression;
pub mod java_type;
pub mod tree;
pub mod tree_ref;

pub use expression::{
    unwrap_parens, Assignment, Binary, BinaryOp, ExprKind, Expression, FieldAccess, Identifier,
    Literal, MethodInvocation, NewArray, NewClass, Ternary, TypeCast, Unary, UnaryOp,
};
pub use java_type::{fqn, ClassType, JavaType, MethodType, Primitive, CONSTRUCTOR_NAME};
pub use tree::{
    Block, Catch, ClassDecl, CompilationUnit, For, ForEach, If, Import, MethodDecl, Modifier,
    NamedVariable, Parameter, Statement, Try, VariableDecls, While,
};
pub use tree_ref::{node_id, TreeKind, TreeRef};
