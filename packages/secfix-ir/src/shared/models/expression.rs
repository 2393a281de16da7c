//! Expression nodes
//!
//! Expressions are immutable and shared through `Arc`. Two handles denote the
//! same node iff `Arc::ptr_eq` holds; `PartialEq` is deep structural equality.

use std::sync::Arc;

use super::java_type::{JavaType, MethodType};

/// Typed expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Expression kind
    pub kind: ExprKind,

    /// Static type attributed by the parser
    pub ty: JavaType,
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Name read: `x`, or a statically imported field `separator`
    Identifier(Identifier),
    /// Literal value
    Literal(Literal),
    /// Field access: `File.separator`, `XMLInputFactory.SUPPORT_DTD`
    FieldAccess(FieldAccess),
    /// Method call: `entry.getName()`
    MethodInvocation(MethodInvocation),
    /// Instance creation: `new File(dir, name)`
    NewClass(NewClass),
    /// Array creation with one dimension: `new byte[64]`
    NewArray(NewArray),
    /// Binary operation: `a + b`
    Binary(Binary),
    /// Unary operation: `!ok`
    Unary(Unary),
    /// Assignment used as an expression: `x = y`, `x += y`
    Assignment(Assignment),
    /// Parenthesized expression
    Parens(Arc<Expression>),
    /// Cast: `(ZipEntry) e`
    TypeCast(TypeCast),
    /// Conditional: `c ? a : b`
    Ternary(Ternary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,

    /// Declaring type when the identifier names a field rather than a local
    pub field_owner: Option<JavaType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccess {
    pub target: Arc<Expression>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInvocation {
    /// Receiver, `None` for unqualified calls
    pub select: Option<Arc<Expression>>,
    pub name: String,
    pub arguments: Vec<Arc<Expression>>,
    pub method_type: Option<MethodType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewClass {
    /// Class name as written in source
    pub class_name: String,
    pub arguments: Vec<Arc<Expression>>,
    pub constructor_type: Option<MethodType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewArray {
    /// Element type as written in source
    pub element_type_name: String,
    pub dimension: Arc<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub operator: BinaryOp,
    pub left: Arc<Expression>,
    pub right: Arc<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    pub operator: UnaryOp,
    pub operand: Arc<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Arc<Expression>,
    pub value: Arc<Expression>,

    /// Operator of a compound assignment (`+=` is `Some(Add)`)
    pub operator: Option<BinaryOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeCast {
    pub type_name: String,
    pub expression: Arc<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ternary {
    pub condition: Arc<Expression>,
    pub then_expr: Arc<Expression>,
    pub else_expr: Arc<Expression>,
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Char(char),
    Int(i64),
    Long(i64),
    Boolean(bool),
    Null,
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Negate => "-",
            Self::Plus => "+",
        }
    }
}

/// Strip any number of enclosing parentheses
pub fn unwrap_parens(expr: &Arc<Expression>) -> &Arc<Expression> {
    let mut current = expr;
    while let ExprKind::Parens(inner) = &current.kind {
        current = inner;
    }
    current
}

impl Expression {
    pub fn new(kind: ExprKind, ty: JavaType) -> Self {
        Self { kind, ty }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match &self.kind {
            ExprKind::Identifier(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_method_invocation(&self) -> Option<&MethodInvocation> {
        match &self.kind {
            ExprKind::MethodInvocation(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_new_class(&self) -> Option<&NewClass> {
        match &self.kind {
            ExprKind::NewClass(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Binary> {
        match &self.kind {
            ExprKind::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_field_access(&self) -> Option<&FieldAccess> {
        match &self.kind {
            ExprKind::FieldAccess(f) => Some(f),
            _ => None,
        }
    }

    /// Local variable name when this is a plain identifier that is not a field
    pub fn local_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(i) if i.field_owner.is_none() => Some(&i.name),
            _ => None,
        }
    }

    /// `true` for method invocations and instance creations
    pub fn is_call(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::MethodInvocation(_) | ExprKind::NewClass(_)
        )
    }

    /// Method attribution of a call site
    pub fn method_type(&self) -> Option<&MethodType> {
        match &self.kind {
            ExprKind::MethodInvocation(m) => m.method_type.as_ref(),
            ExprKind::NewClass(n) => n.constructor_type.as_ref(),
            _ => None,
        }
    }

    /// Call arguments (empty for non-calls)
    pub fn arguments(&self) -> &[Arc<Expression>] {
        match &self.kind {
            ExprKind::MethodInvocation(m) => &m.arguments,
            ExprKind::NewClass(n) => &n.arguments,
            _ => &[],
        }
    }

    /// Direct sub-expressions in evaluation order
    pub fn children(&self) -> Vec<&Arc<Expression>> {
        match &self.kind {
            ExprKind::Identifier(_) | ExprKind::Literal(_) => Vec::new(),
            ExprKind::FieldAccess(f) => vec![&f.target],
            ExprKind::MethodInvocation(m) => m.select.iter().chain(m.arguments.iter()).collect(),
            ExprKind::NewClass(n) => n.arguments.iter().collect(),
            ExprKind::NewArray(a) => vec![&a.dimension],
            ExprKind::Binary(b) => vec![&b.left, &b.right],
            ExprKind::Unary(u) => vec![&u.operand],
            ExprKind::Assignment(a) => vec![&a.target, &a.value],
            ExprKind::Parens(inner) => vec![inner],
            ExprKind::TypeCast(c) => vec![&c.expression],
            ExprKind::Ternary(t) => vec![&t.condition, &t.then_expr, &t.else_expr],
        }
    }

    /// Rebuild this node with replaced children, given in [`Expression::children`] order.
    ///
    /// Surplus or missing children leave the corresponding slots untouched.
    pub fn with_children(&self, children: Vec<Arc<Expression>>) -> Expression {
        let mut it = children.into_iter();
        let mut next = |old: &Arc<Expression>| it.next().unwrap_or_else(|| old.clone());
        let kind = match &self.kind {
            ExprKind::Identifier(_) | ExprKind::Literal(_) => self.kind.clone(),
            ExprKind::FieldAccess(f) => ExprKind::FieldAccess(FieldAccess {
                target: next(&f.target),
                name: f.name.clone(),
            }),
            ExprKind::MethodInvocation(m) => {
                let select = m.select.as_ref().map(|s| next(s));
                let arguments = m.arguments.iter().map(|a| next(a)).collect();
                ExprKind::MethodInvocation(MethodInvocation {
                    select,
                    name: m.name.clone(),
                    arguments,
                    method_type: m.method_type.clone(),
                })
            }
            ExprKind::NewClass(n) => ExprKind::NewClass(NewClass {
                class_name: n.class_name.clone(),
                arguments: n.arguments.iter().map(|a| next(a)).collect(),
                constructor_type: n.constructor_type.clone(),
            }),
            ExprKind::NewArray(a) => ExprKind::NewArray(NewArray {
                element_type_name: a.element_type_name.clone(),
                dimension: next(&a.dimension),
            }),
            ExprKind::Binary(b) => {
                let left = next(&b.left);
                let right = next(&b.right);
                ExprKind::Binary(Binary {
                    operator: b.operator,
                    left,
                    right,
                })
            }
            ExprKind::Unary(u) => ExprKind::Unary(Unary {
                operator: u.operator,
                operand: next(&u.operand),
            }),
            ExprKind::Assignment(a) => {
                let target = next(&a.target);
                let value = next(&a.value);
                ExprKind::Assignment(Assignment {
                    target,
                    value,
                    operator: a.operator,
                })
            }
            ExprKind::Parens(inner) => ExprKind::Parens(next(inner)),
            ExprKind::TypeCast(c) => ExprKind::TypeCast(TypeCast {
                type_name: c.type_name.clone(),
                expression: next(&c.expression),
            }),
            ExprKind::Ternary(t) => {
                let condition = next(&t.condition);
                let then_expr = next(&t.then_expr);
                let else_expr = next(&t.else_expr);
                ExprKind::Ternary(Ternary {
                    condition,
                    then_expr,
                    else_expr,
                })
            }
        };
        Expression {
            kind,
            ty: self.ty.clone(),
        }
    }

    /// Pre-order search for a node by identity
    pub fn contains_node(&self, target: &Arc<Expression>) -> bool {
        self.children()
            .into_iter()
            .any(|c| Arc::ptr_eq(c, target) || c.contains_node(target))
    }

    /// Names of locals read anywhere in this expression
    pub fn local_reads(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_local_reads(self, &mut out);
        out
    }
}

fn collect_local_reads<'a>(expr: &'a Expression, out: &mut Vec<&'a str>) {
    if let Some(name) = expr.local_name() {
        out.push(name);
    }
    for child in expr.children() {
        collect_local_reads(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::build;

    #[test]
    fn test_unwrap_parens_nested() {
        let inner = build::ident("x", JavaType::string());
        let wrapped = build::parens(build::parens(inner.clone()));
        assert!(Arc::ptr_eq(unwrap_parens(&wrapped), &inner));
    }

    #[test]
    fn test_with_children_preserves_order() {
        let a = build::string_lit("a");
        let b = build::string_lit("b");
        let sum = build::add(a.clone(), b.clone());
        let swapped = sum.with_children(vec![b.clone(), a.clone()]);
        let binary = swapped.as_binary().unwrap();
        assert!(Arc::ptr_eq(&binary.left, &b));
        assert!(Arc::ptr_eq(&binary.right, &a));
    }

    #[test]
    fn test_local_reads_skip_fields() {
        let sep = build::static_field_ident("separator", JavaType::file(), JavaType::string());
        let expr = build::add(
            build::add(build::ident("dir", JavaType::string()), sep),
            build::ident("name", JavaType::string()),
        );
        assert_eq!(expr.local_reads(), vec!["dir", "name"]);
    }
}
