//! Recognition of path separator expressions

use std::sync::Arc;

use crate::shared::models::{fqn, unwrap_parens, ExprKind, Expression, Literal};

fn is_separator_name(name: &str) -> bool {
    name == "separator" || name == "separatorChar"
}

/// `File.separator`, `File.separatorChar` (also statically imported), `"/"`,
/// `"\\"`, `'/'` or `'\\'`
pub fn is_file_separator(expr: &Arc<Expression>) -> bool {
    let expr = unwrap_parens(expr);
    match &expr.kind {
        ExprKind::FieldAccess(fa) => is_separator_name(&fa.name) && fa.target.ty.is_of_class(fqn::FILE),
        ExprKind::Identifier(id) => {
            is_separator_name(&id.name)
                && id
                    .field_owner
                    .as_ref()
                    .map(|owner| owner.is_of_class(fqn::FILE))
                    .unwrap_or(false)
        }
        ExprKind::Literal(Literal::String(s)) => s == "/" || s == "\\",
        ExprKind::Literal(Literal::Char(c)) => *c == '/' || *c == '\\',
        _ => false,
    }
}

/// String literal whose value ends with a separator (`"base/"`)
pub fn ends_with_separator(expr: &Arc<Expression>) -> bool {
    match &unwrap_parens(expr).kind {
        ExprKind::Literal(Literal::String(s)) => s.ends_with('/') || s.ends_with('\\'),
        _ => false,
    }
}
