//! Method signature descriptors
//!
//! Descriptor grammar: `<declaring-type> <method-name>(<arguments>)`
//!
//! - declaring type: fully-qualified name, `*` matches within one segment,
//!   `..` matches any number of package segments (`java..Files`)
//! - method name: identifier with optional `*` globs, or `<constructor>`
//! - arguments: comma separated; `..` matches any argument sequence, `*` one
//!   argument of any type, anything else a type pattern
//!
//! ```text
//! java.io.File <constructor>(.., java.lang.String)
//! java.util.zip.ZipEntry getName()
//! java.nio.file.Files newBufferedWriter(java.nio.file.Path, ..)
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::config::ConfigError;
use crate::shared::models::{JavaType, MethodType};

static DESCRIPTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([\w$.*]+)\s+(<constructor>|[\w$*]+)\s*\(([^()]*)\)\s*$")
        .expect("descriptor regex")
});

static TYPE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w$*]+(?:\.{1,2}[\w$*]+)*(?:\[\])*$").expect("type pattern regex"));

/// Descriptor that does not follow the grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid method signature '{descriptor}': {reason}")]
pub struct SignatureError {
    pub descriptor: String,
    pub reason: String,
}

impl SignatureError {
    fn new(descriptor: &str, reason: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<SignatureError> for ConfigError {
    fn from(err: SignatureError) -> Self {
        ConfigError::invalid_signature(err.descriptor, err.reason)
    }
}

/// Type name pattern
#[derive(Debug, Clone)]
pub enum TypePattern {
    Exact(String),
    Glob(Regex),
}

impl TypePattern {
    fn parse(descriptor: &str, text: &str) -> Result<Self, SignatureError> {
        if !TYPE_PATTERN.is_match(text) {
            return Err(SignatureError::new(
                descriptor,
                format!("'{}' is not a type pattern", text),
            ));
        }
        if !text.contains('*') && !text.contains("..") {
            return Ok(Self::Exact(text.to_string()));
        }
        let mut pattern = String::from("^");
        let mut rest = text;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("..") {
                pattern.push_str(r"\.(?:[\w$]+\.)*");
                rest = after;
            } else if let Some(after) = rest.strip_prefix('*') {
                pattern.push_str(r"[\w$]*");
                rest = after;
            } else {
                let c = rest.chars().next().unwrap_or_default();
                pattern.push_str(&regex::escape(&c.to_string()));
                rest = &rest[c.len_utf8()..];
            }
        }
        pattern.push('$');
        Regex::new(&pattern)
            .map(Self::Glob)
            .map_err(|e| SignatureError::new(descriptor, e.to_string()))
    }

    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == name,
            Self::Glob(re) => re.is_match(name),
        }
    }

    /// Exact type name match (primitives by keyword)
    pub fn matches_type(&self, ty: &JavaType) -> bool {
        match ty {
            JavaType::Class(c) => self.matches_name(&c.fqn),
            JavaType::Primitive(p) => self.matches_name(p.keyword()),
            JavaType::Null | JavaType::Unknown => false,
        }
    }

    /// Type or any of its supertypes matches
    pub fn matches_type_or_supertype(&self, ty: &JavaType) -> bool {
        match ty {
            JavaType::Class(c) => {
                self.matches_name(&c.fqn) || c.supertypes.iter().any(|s| self.matches_name(s))
            }
            other => self.matches_type(other),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NamePattern {
    Constructor,
    Name(TypePattern),
}

#[derive(Debug, Clone)]
pub enum ArgPattern {
    /// `..`
    AnySequence,
    /// `*`
    Any,
    Type(TypePattern),
}

/// Parsed method signature descriptor
#[derive(Debug, Clone)]
pub struct MethodSignature {
    descriptor: String,
    declaring_type: TypePattern,
    name: NamePattern,
    arguments: Vec<ArgPattern>,
}

impl MethodSignature {
    pub fn parse(descriptor: &str) -> Result<Self, SignatureError> {
        let caps = DESCRIPTOR
            .captures(descriptor)
            .ok_or_else(|| SignatureError::new(descriptor, "expected '<type> <name>(<arguments>)'"))?;

        let declaring_type = TypePattern::parse(descriptor, &caps[1])?;
        let name = match &caps[2] {
            "<constructor>" => NamePattern::Constructor,
            other => NamePattern::Name(TypePattern::parse(descriptor, other)?),
        };

        let raw_args = caps[3].trim();
        let mut arguments = Vec::new();
        if !raw_args.is_empty() {
            for arg in raw_args.split(',').map(str::trim) {
                arguments.push(match arg {
                    "" => return Err(SignatureError::new(descriptor, "empty argument pattern")),
                    ".." => ArgPattern::AnySequence,
                    "*" => ArgPattern::Any,
                    ty => ArgPattern::Type(TypePattern::parse(descriptor, ty)?),
                });
            }
        }

        Ok(Self {
            descriptor: descriptor.trim().to_string(),
            declaring_type,
            name,
            arguments,
        })
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.name, NamePattern::Constructor)
    }

    /// Match a resolved method; the declaring type may match through a supertype
    pub fn matches_method_type(&self, method: &MethodType) -> bool {
        let name_ok = match &self.name {
            NamePattern::Constructor => method.is_constructor(),
            NamePattern::Name(p) => !method.is_constructor() && p.matches_name(&method.name),
        };
        name_ok
            && self
                .declaring_type
                .matches_type_or_supertype(&method.declaring_type)
            && match_arguments(&self.arguments, &method.parameter_types)
    }
}

impl std::fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.descriptor)
    }
}

fn match_arguments(patterns: &[ArgPattern], types: &[JavaType]) -> bool {
    match patterns.split_first() {
        None => types.is_empty(),
        Some((ArgPattern::AnySequence, rest)) => {
            (0..=types.len()).any(|skip| match_arguments(rest, &types[skip..]))
        }
        Some((first, rest)) => match types.split_first() {
            None => false,
            Some((ty, tail)) => {
                let ok = match first {
                    ArgPattern::Any => true,
                    ArgPattern::Type(p) => p.matches_type(ty),
                    ArgPattern::AnySequence => true,
                };
                ok && match_arguments(rest, tail)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::build::jdk;
    use crate::shared::models::fqn;

    #[test]
    fn test_parse_constructor_with_wildcards() {
        let sig = MethodSignature::parse("java.io.File <constructor>(.., java.lang.String)").unwrap();
        assert!(sig.is_constructor());
        assert!(sig.matches_method_type(&jdk::file_of_parent_and_child()));
        assert!(sig.matches_method_type(&jdk::file_of_strings()));
        assert!(sig.matches_method_type(&jdk::file_of_string()));
        assert!(!sig.matches_method_type(&jdk::file_to_path()));
    }

    #[test]
    fn test_declaring_type_matches_supertype() {
        let sig = MethodSignature::parse("java.util.zip.ZipEntry getName()").unwrap();
        assert!(sig.matches_method_type(&jdk::zip_entry_get_name()));
        assert!(sig.matches_method_type(&jdk::zip_archive_entry_get_name()));
    }

    #[test]
    fn test_glob_patterns() {
        let sig = MethodSignature::parse("java..Files createTemp*(..)").unwrap();
        assert!(sig.matches_method_type(&jdk::files_create_temp_file()));
        assert!(sig.matches_method_type(&jdk::files_create_temp_directory()));

        let sig = MethodSignature::parse("java.io.File * ()").unwrap();
        assert!(sig.matches_method_type(&jdk::file_to_path()));
        assert!(!sig.matches_method_type(&jdk::file_create_temp_file()));
    }

    #[test]
    fn test_exact_argument_count() {
        let sig = MethodSignature::parse("java.io.File createTempFile(java.lang.String, java.lang.String)").unwrap();
        assert!(sig.matches_method_type(&jdk::file_create_temp_file()));
        assert!(!sig.matches_method_type(&jdk::file_create_temp_file_in()));

        let any = MethodSignature::parse("java.io.File createTempFile(*, *, *)").unwrap();
        assert!(any.matches_method_type(&jdk::file_create_temp_file_in()));
    }

    #[test]
    fn test_primitive_arguments() {
        let sig = MethodSignature::parse("java.security.SecureRandom setSeed(long)").unwrap();
        assert!(sig.matches_method_type(&jdk::secure_random_set_seed()));
        let ctor = MethodType::constructor(JavaType::class(fqn::RANDOM), vec![]);
        assert!(!sig.matches_method_type(&ctor));
    }

    #[test]
    fn test_invalid_descriptors() {
        for bad in [
            "",
            "java.io.File",
            "java.io.File getName(",
            "getName()",
            "java.io.File get-Name()",
            "java.io.File getName(java.lang.String,)",
            "java.io.File getName(a b)",
        ] {
            assert!(MethodSignature::parse(bad).is_err(), "accepted '{}'", bad);
        }
    }

    #[test]
    fn test_signature_error_converts_to_config_error() {
        let err: ConfigError = MethodSignature::parse("nope").unwrap_err().into();
        assert!(matches!(err, ConfigError::InvalidSignature { .. }));
    }
}
