//! Source templates
//!
//! A template pairs its Java-like source text with a typed builder. The text
//! declares the operands through `#{any(<type>)}` placeholders, in order; the
//! builder receives the operands once they have been checked against those
//! declarations and produces the fragment to splice.
//!
//! ```text
//! if (!#{any(java.io.File)}.toPath().normalize().startsWith(#{any(java.io.File)}.toPath().normalize())) {
//!     throw new RuntimeException("Bad zip entry");
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::shared::models::{Expression, JavaType, Statement};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\{([^}]*)\}").expect("placeholder regex"));

static ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^any\(\s*([\w$.]*)\s*\)$").expect("any placeholder regex"));

/// Template could not be built or instantiated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Placeholder is not `#{any(<type>)}`
    #[error("malformed placeholder '#{{{placeholder}}}' in template")]
    MalformedPlaceholder { placeholder: String },

    /// Operand count differs from the placeholder count
    #[error("template expects {expected} operands, got {found}")]
    Arity { expected: usize, found: usize },

    /// Operand type is unresolved
    #[error("operand {index} has an unknown type, expected {expected}")]
    UnknownOperandType { index: usize, expected: String },

    /// Operand type does not fit its placeholder
    #[error("operand {index} of type {found} is not assignable to {expected}")]
    TypeMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// Statements were rendered where an expression is required
    #[error("template renders statements, an expression is required: {text}")]
    NotAnExpression { text: String },
}

/// Spliceable result of rendering a template
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Statements(Vec<Arc<Statement>>),
    Expression(Arc<Expression>),
}

/// One `#{any(...)}` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParam {
    /// Fully-qualified class or primitive keyword; `None` accepts any operand
    pub type_name: Option<String>,
}

impl TemplateParam {
    fn check(&self, index: usize, operand: &Expression) -> Result<(), TemplateError> {
        let Some(expected) = &self.type_name else {
            return Ok(());
        };
        match &operand.ty {
            JavaType::Unknown => Err(TemplateError::UnknownOperandType {
                index,
                expected: expected.clone(),
            }),
            JavaType::Primitive(p) if p.keyword() == expected.as_str() => Ok(()),
            ty if ty.is_assignable_to(expected) => Ok(()),
            ty => Err(TemplateError::TypeMismatch {
                index,
                expected: expected.clone(),
                found: ty
                    .fqn()
                    .or_else(|| ty.simple_name())
                    .unwrap_or("null")
                    .to_string(),
            }),
        }
    }
}

type Builder = Arc<dyn Fn(&[Arc<Expression>]) -> Fragment + Send + Sync>;

#[derive(Clone)]
pub struct SourceTemplate {
    text: String,
    parameters: Vec<TemplateParam>,
    imports: Vec<String>,
    build: Builder,
}

impl fmt::Debug for SourceTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceTemplate")
            .field("text", &self.text)
            .field("parameters", &self.parameters)
            .field("imports", &self.imports)
            .finish()
    }
}

impl SourceTemplate {
    /// Parse the placeholders of `text`
    pub fn new<F>(text: impl Into<String>, build: F) -> Result<Self, TemplateError>
    where
        F: Fn(&[Arc<Expression>]) -> Fragment + Send + Sync + 'static,
    {
        let text = text.into();
        let parameters = PLACEHOLDER
            .captures_iter(&text)
            .map(|caps| {
                let inner = caps[1].trim();
                ANY.captures(inner)
                    .map(|any| TemplateParam {
                        type_name: Some(any[1].to_string()).filter(|t| !t.is_empty()),
                    })
                    .ok_or_else(|| TemplateError::MalformedPlaceholder {
                        placeholder: inner.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            text,
            parameters,
            imports: Vec::new(),
            build: Arc::new(build),
        })
    }

    /// Builder: Types the rendered fragment needs imported
    pub fn imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.extend(imports.into_iter().map(Into::into));
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &[TemplateParam] {
        &self.parameters
    }

    pub fn required_imports(&self) -> &[String] {
        &self.imports
    }

    /// Check the operands and build the fragment
    pub fn render(&self, operands: &[Arc<Expression>]) -> Result<Fragment, TemplateError> {
        if operands.len() != self.parameters.len() {
            return Err(TemplateError::Arity {
                expected: self.parameters.len(),
                found: operands.len(),
            });
        }
        for (index, (param, operand)) in self.parameters.iter().zip(operands).enumerate() {
            param.check(index, operand)?;
        }
        Ok((self.build)(operands))
    }

    /// Render a template that produces an expression
    pub fn render_expression(&self, operands: &[Arc<Expression>]) -> Result<Arc<Expression>, TemplateError> {
        match self.render(operands)? {
            Fragment::Expression(e) => Ok(e),
            Fragment::Statements(_) => Err(TemplateError::NotAnExpression {
                text: self.text.clone(),
            }),
        }
    }
}
