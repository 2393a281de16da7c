//! Containment guards
//!
//! A guard throws unless the normalized tainted path lies under the normalized
//! parent directory. The operand types pick one of three templates.

use std::sync::Arc;

use super::template::{Fragment, SourceTemplate, TemplateError};
use crate::shared::models::build::{self, jdk};
use crate::shared::models::{fqn, Expression, JavaType};

/// Default message of the thrown exception
pub const BAD_ZIP_ENTRY: &str = "Bad zip entry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardVariant {
    /// `File` checked against a `File` directory
    FileFile,
    /// `File` checked against a `String` directory
    FileString,
    /// `Path` checked against a `Path` directory
    PathPath,
}

impl GuardVariant {
    /// Variant for the static types of the tainted value and its parent;
    /// `None` when either type is outside the three supported shapes
    pub fn select(tainted: &JavaType, parent: &JavaType) -> Option<Self> {
        if tainted.is_file() && parent.is_file() {
            Some(Self::FileFile)
        } else if tainted.is_file() && parent.is_string() {
            Some(Self::FileString)
        } else if tainted.is_path() && parent.is_path() {
            Some(Self::PathPath)
        } else {
            None
        }
    }

    fn operand_types(&self) -> (&'static str, &'static str) {
        match self {
            Self::FileFile => (fqn::FILE, fqn::FILE),
            Self::FileString => (fqn::FILE, fqn::STRING),
            Self::PathPath => (fqn::PATH, fqn::PATH),
        }
    }

    /// `<tainted>.normalize().startsWith(<parent>...)`
    fn check(&self, tainted: Arc<Expression>, parent: Arc<Expression>) -> Arc<Expression> {
        let normalized = |e: Arc<Expression>| build::call(e, jdk::path_normalize(), vec![]);
        let as_path = |e: Arc<Expression>| build::call(e, jdk::file_to_path(), vec![]);
        match self {
            Self::FileFile => build::call(
                normalized(as_path(tainted)),
                jdk::path_starts_with_path(),
                vec![normalized(as_path(parent))],
            ),
            Self::FileString => build::call(
                normalized(as_path(tainted)),
                jdk::path_starts_with_string(),
                vec![parent],
            ),
            Self::PathPath => build::call(
                normalized(tainted),
                jdk::path_starts_with_path(),
                vec![normalized(parent)],
            ),
        }
    }
}

/// Exception type a synthesized guard throws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrownException {
    IoException,
    RuntimeException,
}

impl ThrownException {
    pub fn fqn(&self) -> &'static str {
        match self {
            Self::IoException => fqn::IO_EXCEPTION,
            Self::RuntimeException => fqn::RUNTIME_EXCEPTION,
        }
    }

    pub fn java_type(&self) -> JavaType {
        JavaType::class(self.fqn())
    }

    /// Whether the thrown type has to be imported
    pub fn needs_import(&self) -> bool {
        matches!(self, Self::IoException)
    }
}

/// Template for `if (!<check>) { throw new <exception>("<message>"); }`.
///
/// Operands are `[tainted, parent]`. Both are copied into the guard so the
/// rendered statement never shares nodes with the statement it follows.
pub fn guard_template(
    variant: GuardVariant,
    exception: ThrownException,
    message: &str,
) -> Result<SourceTemplate, TemplateError> {
    let (tainted_ty, parent_ty) = variant.operand_types();
    let check = match variant {
        GuardVariant::FileFile => {
            "#{any(%T)}.toPath().normalize().startsWith(#{any(%P)}.toPath().normalize())"
        }
        GuardVariant::FileString => "#{any(%T)}.toPath().normalize().startsWith(#{any(%P)})",
        GuardVariant::PathPath => "#{any(%T)}.normalize().startsWith(#{any(%P)}.normalize())",
    }
    .replace("%T", tainted_ty)
    .replace("%P", parent_ty);
    let text = format!(
        "if (!{}) {{\n    throw new {}(\"{}\");\n}}",
        check,
        exception.java_type().simple_name().unwrap_or("RuntimeException"),
        message
    );

    let message = message.to_string();
    let template = SourceTemplate::new(text, move |operands| {
        let condition = build::not(variant.check(
            build::fresh_copy(&operands[0]),
            build::fresh_copy(&operands[1]),
        ));
        let throw = build::throw_new(exception.java_type(), &message);
        Fragment::Statements(vec![build::if_stmt(condition, build::block_stmt(vec![throw]), None)])
    })?;

    Ok(if exception.needs_import() {
        template.imports([exception.fqn()])
    } else {
        template
    })
}
