//! Static type attribution
//!
//! Every expression and declaration in the tree carries a [`JavaType`] supplied by
//! the parser. Class types carry their flattened supertype list so that
//! assignability checks never need a classpath at analysis time.

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Fully-qualified names used across the crate
pub mod fqn {
    pub const OBJECT: &str = "java.lang.Object";
    pub const STRING: &str = "java.lang.String";
    pub const SYSTEM: &str = "java.lang.System";
    pub const THROWABLE: &str = "java.lang.Throwable";
    pub const EXCEPTION: &str = "java.lang.Exception";
    pub const RUNTIME_EXCEPTION: &str = "java.lang.RuntimeException";
    pub const ILLEGAL_STATE_EXCEPTION: &str = "java.lang.IllegalStateException";
    pub const IO_EXCEPTION: &str = "java.io.IOException";
    pub const FILE_NOT_FOUND_EXCEPTION: &str = "java.io.FileNotFoundException";
    pub const FILE: &str = "java.io.File";
    pub const PATH: &str = "java.nio.file.Path";
    pub const PATHS: &str = "java.nio.file.Paths";
    pub const FILES: &str = "java.nio.file.Files";
    pub const RANDOM: &str = "java.util.Random";
    pub const SECURE_RANDOM: &str = "java.security.SecureRandom";
    pub const DATE: &str = "java.util.Date";
    pub const ZIP_ENTRY: &str = "java.util.zip.ZipEntry";
    pub const ZIP_ARCHIVE_ENTRY: &str = "org.apache.commons.compress.archivers.zip.ZipArchiveEntry";
    pub const COOKIE: &str = "javax.servlet.http.Cookie";
    pub const XML_INPUT_FACTORY: &str = "javax.xml.stream.XMLInputFactory";
    pub const DOCUMENT_BUILDER_FACTORY: &str = "javax.xml.parsers.DocumentBuilderFactory";
    pub const PARSER_CONFIGURATION_EXCEPTION: &str =
        "javax.xml.parsers.ParserConfigurationException";
    pub const XML_CONSTANTS: &str = "javax.xml.XMLConstants";
    pub const TRANSFORMER_FACTORY: &str = "javax.xml.transform.TransformerFactory";
    pub const RANDOM_STRING_UTILS: &str = "org.apache.commons.lang3.RandomStringUtils";
    pub const LEGACY_RANDOM_STRING_UTILS: &str = "org.apache.commons.lang.RandomStringUtils";
    pub const PRIVILEGED_ACTION: &str = "java.security.PrivilegedAction";
    pub const ACCESS_CONTROLLER: &str = "java.security.AccessController";
}

/// Static type of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaType {
    /// Reference type
    Class(ClassType),
    /// Primitive type
    Primitive(Primitive),
    /// Type of the `null` literal
    Null,
    /// Unresolved or erased type
    Unknown,
}

/// Reference type with its flattened supertype hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    /// Fully-qualified name, e.g. `java.io.File`
    pub fqn: String,

    /// Transitive supertypes (classes and interfaces), nearest first
    pub supertypes: Vec<String>,
}

/// Primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Void => "void",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Known JDK hierarchy
// ═══════════════════════════════════════════════════════════════════════════

lazy_static! {
    /// Supertypes of library types the remediations synthesize or inspect.
    ///
    /// Parsers attach full hierarchies to the types they resolve; this table
    /// covers types that are created from scratch by fix templates.
    static ref KNOWN_SUPERTYPES: FxHashMap<&'static str, &'static [&'static str]> = {
        let mut m: FxHashMap<&'static str, &'static [&'static str]> = FxHashMap::default();
        m.insert(fqn::OBJECT, &[]);
        m.insert(fqn::STRING, &[fqn::OBJECT, "java.lang.CharSequence", "java.lang.Comparable"]);
        m.insert(fqn::THROWABLE, &[fqn::OBJECT]);
        m.insert(fqn::EXCEPTION, &[fqn::THROWABLE, fqn::OBJECT]);
        m.insert(fqn::RUNTIME_EXCEPTION, &[fqn::EXCEPTION, fqn::THROWABLE, fqn::OBJECT]);
        m.insert(
            fqn::ILLEGAL_STATE_EXCEPTION,
            &[fqn::RUNTIME_EXCEPTION, fqn::EXCEPTION, fqn::THROWABLE, fqn::OBJECT],
        );
        m.insert(fqn::IO_EXCEPTION, &[fqn::EXCEPTION, fqn::THROWABLE, fqn::OBJECT]);
        m.insert(
            fqn::FILE_NOT_FOUND_EXCEPTION,
            &[fqn::IO_EXCEPTION, fqn::EXCEPTION, fqn::THROWABLE, fqn::OBJECT],
        );
        m.insert(
            fqn::PARSER_CONFIGURATION_EXCEPTION,
            &[fqn::EXCEPTION, fqn::THROWABLE, fqn::OBJECT],
        );
        m.insert(fqn::FILE, &[fqn::OBJECT, "java.io.Serializable", "java.lang.Comparable"]);
        m.insert(fqn::PATH, &["java.lang.Comparable", "java.lang.Iterable", "java.nio.file.Watchable", fqn::OBJECT]);
        m.insert(fqn::FILES, &[fqn::OBJECT]);
        m.insert(fqn::RANDOM, &[fqn::OBJECT, "java.io.Serializable"]);
        m.insert(fqn::SECURE_RANDOM, &[fqn::RANDOM, fqn::OBJECT, "java.io.Serializable"]);
        m.insert(fqn::ZIP_ENTRY, &[fqn::OBJECT, "java.lang.Cloneable"]);
        m.insert(fqn::ZIP_ARCHIVE_ENTRY, &[fqn::ZIP_ENTRY, fqn::OBJECT]);
        m.insert(fqn::COOKIE, &[fqn::OBJECT, "java.lang.Cloneable", "java.io.Serializable"]);
        m.insert(fqn::XML_INPUT_FACTORY, &[fqn::OBJECT]);
        m.insert(fqn::DOCUMENT_BUILDER_FACTORY, &[fqn::OBJECT]);
        m.insert(fqn::TRANSFORMER_FACTORY, &[fqn::OBJECT]);
        m.insert(fqn::XML_CONSTANTS, &[fqn::OBJECT]);
        m.insert("java.io.OutputStream", &[fqn::OBJECT, "java.io.Closeable", "java.io.Flushable"]);
        m.insert("java.io.FileOutputStream", &["java.io.OutputStream", fqn::OBJECT, "java.io.Closeable"]);
        m
    };
}

impl JavaType {
    /// Class type with supertypes taken from the known hierarchy table
    pub fn class(fqn: impl Into<String>) -> Self {
        let fqn = fqn.into();
        let supertypes = KNOWN_SUPERTYPES
            .get(fqn.as_str())
            .map(|s| s.iter().map(|t| t.to_string()).collect())
            .unwrap_or_else(|| vec![fqn::OBJECT.to_string()]);
        Self::Class(ClassType { fqn, supertypes })
    }

    /// Class type with an explicit hierarchy (as resolved by a parser)
    pub fn class_with_supertypes(fqn: impl Into<String>, supertypes: Vec<String>) -> Self {
        Self::Class(ClassType {
            fqn: fqn.into(),
            supertypes,
        })
    }

    pub fn string() -> Self {
        Self::class(fqn::STRING)
    }

    pub fn file() -> Self {
        Self::class(fqn::FILE)
    }

    pub fn path() -> Self {
        Self::class(fqn::PATH)
    }

    pub fn boolean() -> Self {
        Self::Primitive(Primitive::Boolean)
    }

    pub fn void() -> Self {
        Self::Primitive(Primitive::Void)
    }

    /// Fully-qualified name for class types
    pub fn fqn(&self) -> Option<&str> {
        match self {
            Self::Class(c) => Some(&c.fqn),
            _ => None,
        }
    }

    /// Simple (unqualified) name for class types, keyword for primitives
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Self::Class(c) => Some(c.fqn.rsplit('.').next().unwrap_or(&c.fqn)),
            Self::Primitive(p) => Some(p.keyword()),
            _ => None,
        }
    }

    /// Exact class match
    pub fn is_of_class(&self, fqn: &str) -> bool {
        self.fqn() == Some(fqn)
    }

    /// `true` when a value of this type can be assigned to `target`
    pub fn is_assignable_to(&self, target: &str) -> bool {
        match self {
            Self::Class(c) => c.fqn == target || c.supertypes.iter().any(|s| s == target),
            Self::Null => true,
            _ => false,
        }
    }

    pub fn is_string(&self) -> bool {
        self.is_of_class(fqn::STRING)
    }

    pub fn is_file(&self) -> bool {
        self.is_of_class(fqn::FILE)
    }

    pub fn is_path(&self) -> bool {
        self.is_of_class(fqn::PATH)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl Default for JavaType {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Name used for constructors in method types and signature descriptors
pub const CONSTRUCTOR_NAME: &str = "<constructor>";

/// Resolved method (or constructor) attribution of a call site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodType {
    /// Type declaring the method
    pub declaring_type: JavaType,

    /// Method name, [`CONSTRUCTOR_NAME`] for constructors
    pub name: String,

    /// Declared parameter types
    pub parameter_types: Vec<JavaType>,

    /// Declared return type (the constructed type for constructors)
    pub return_type: JavaType,

    /// Static method
    #[serde(default)]
    pub is_static: bool,
}

impl MethodType {
    pub fn method(
        declaring_type: JavaType,
        name: impl Into<String>,
        parameter_types: Vec<JavaType>,
        return_type: JavaType,
    ) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            parameter_types,
            return_type,
            is_static: false,
        }
    }

    pub fn static_method(
        declaring_type: JavaType,
        name: impl Into<String>,
        parameter_types: Vec<JavaType>,
        return_type: JavaType,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::method(declaring_type, name, parameter_types, return_type)
        }
    }

    pub fn constructor(declaring_type: JavaType, parameter_types: Vec<JavaType>) -> Self {
        Self {
            return_type: declaring_type.clone(),
            declaring_type,
            name: CONSTRUCTOR_NAME.to_string(),
            parameter_types,
            is_static: false,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}
