//! Remediation catalog
//!
//! A catalog is an ordered list of entries, each naming one vulnerability
//! class and the parameters its visitor runs with. Catalogs are either the
//! built-in one or loaded from JSON:
//!
//! ```json
//! [
//!   {
//!     "id": "servlet-path-traversal",
//!     "display_name": "Path traversal from request parameters",
//!     "tags": ["CWE-22"],
//!     "remediation": {
//!       "type": "path_traversal",
//!       "user_input": ["javax.servlet.ServletRequest getParameter(java.lang.String)"],
//!       "new_variable_prefix": "requested"
//!     }
//!   }
//! ]
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult, RemediationConfig};
use crate::features::patch_synthesis::domain::BAD_ZIP_ENTRY;
use crate::shared::models::fqn;

/// Vulnerability class handled by one catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Remediation {
    /// User input reaching a file or path construction
    PathTraversal {
        /// Source method descriptors
        user_input: Vec<String>,

        /// Base of extracted variable names (`zipEntry` → `zipEntryFile`)
        #[serde(default = "default_variable_prefix")]
        new_variable_prefix: String,

        /// Also rewrite `startsWith(dir.getCanonicalPath())` partial-path checks
        #[serde(default)]
        fix_partial_path: bool,

        /// Message of the exception thrown by inserted guards
        #[serde(default = "default_guard_message")]
        guard_message: String,
    },
    /// `Cookie` instances never marked secure
    CookieSecure,
    /// `new Random()` used where a CSPRNG is expected
    SecureRandom,
    /// `SecureRandom.setSeed` with a predictable seed
    SecureRandomSeed,
    /// `XMLInputFactory` with external entities or DTDs enabled
    XmlInputFactory,
    /// `DocumentBuilderFactory` accepting DOCTYPE declarations
    DocumentBuilderFactory,
    /// `TransformerFactory` fetching external DTDs or stylesheets
    TransformerFactory,
    /// `File.createTempFile` with default permissions
    SecureTempFile,
    /// Temporary directory made from a deleted temporary file
    TempDirectory,
    /// commons-lang `RandomStringUtils` backed by `java.util.Random`
    RandomStringUtils,
    /// Privileged actions and `AccessController.doPrivileged`; report only
    PrivilegedCode,
}

fn default_variable_prefix() -> String {
    "input".to_string()
}

fn default_guard_message() -> String {
    BAD_ZIP_ENTRY.to_string()
}

impl Remediation {
    /// Stable name of the variant, as written in the `type` tag
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::PathTraversal { .. } => "path_traversal",
            Self::CookieSecure => "cookie_secure",
            Self::SecureRandom => "secure_random",
            Self::SecureRandomSeed => "secure_random_seed",
            Self::XmlInputFactory => "xml_input_factory",
            Self::DocumentBuilderFactory => "document_builder_factory",
            Self::TransformerFactory => "transformer_factory",
            Self::SecureTempFile => "secure_temp_file",
            Self::TempDirectory => "temp_directory",
            Self::RandomStringUtils => "random_string_utils",
            Self::PrivilegedCode => "privileged_code",
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if let Self::PathTraversal {
            user_input,
            new_variable_prefix,
            fix_partial_path,
            ..
        } = self
        {
            if user_input.is_empty() {
                return Err(ConfigError::Validation(
                    "path_traversal needs at least one user_input signature".to_string(),
                ));
            }
            RemediationConfig {
                new_variable_prefix: Some(new_variable_prefix.clone()),
                fix_partial_path: *fix_partial_path,
                user_input_signatures: user_input.clone(),
                ..RemediationConfig::default()
            }
            .validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique id, also the key of configuration overrides
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub remediation: Remediation,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, remediation: Remediation) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            tags: Vec::new(),
            remediation,
        }
    }

    /// Builder: Add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Validated list of catalog entries
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Validate and wrap `entries`
    pub fn new(entries: Vec<CatalogEntry>) -> ConfigResult<Self> {
        let mut seen = BTreeSet::new();
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(ConfigError::Validation("catalog entry with empty id".to_string()));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigError::DuplicateRemediation(entry.id.clone()));
            }
            entry.remediation.validate()?;
        }
        Ok(Self { entries })
    }

    /// The eleven built-in remediations
    pub fn builtin() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }

    /// Parse a JSON array of entries
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn from_json_file(path: &str) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_entries() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new(
            "zip-slip",
            "Zip slip",
            Remediation::PathTraversal {
                user_input: vec![
                    format!("{} getName()", fqn::ZIP_ENTRY),
                    format!("{} getName()", fqn::ZIP_ARCHIVE_ENTRY),
                ],
                new_variable_prefix: "zipEntry".to_string(),
                fix_partial_path: false,
                guard_message: BAD_ZIP_ENTRY.to_string(),
            },
        )
        .tag("CWE-22"),
        CatalogEntry::new("cookie-secure", "Insecure cookie", Remediation::CookieSecure)
            .tag("CWE-614"),
        CatalogEntry::new("secure-random", "Insecure randomness", Remediation::SecureRandom)
            .tag("CWE-330"),
        CatalogEntry::new(
            "secure-random-seed",
            "Predictable SecureRandom seed",
            Remediation::SecureRandomSeed,
        )
        .tag("CWE-337"),
        CatalogEntry::new(
            "xml-input-factory",
            "XXE in XMLInputFactory",
            Remediation::XmlInputFactory,
        )
        .tag("CWE-611"),
        CatalogEntry::new(
            "document-builder-factory",
            "XXE in DocumentBuilderFactory",
            Remediation::DocumentBuilderFactory,
        )
        .tag("CWE-611"),
        CatalogEntry::new(
            "transformer-factory",
            "XXE in TransformerFactory",
            Remediation::TransformerFactory,
        )
        .tag("CWE-611"),
        CatalogEntry::new(
            "secure-temp-file",
            "Temporary file with default permissions",
            Remediation::SecureTempFile,
        )
        .tag("CWE-377"),
        CatalogEntry::new(
            "temp-directory",
            "Temporary directory hijacking",
            Remediation::TempDirectory,
        )
        .tag("CWE-379"),
        CatalogEntry::new(
            "random-string-utils",
            "Predictable RandomStringUtils",
            Remediation::RandomStringUtils,
        )
        .tag("CWE-338"),
        CatalogEntry::new(
            "improper-privilege-management",
            "Improper privilege management",
            Remediation::PrivilegedCode,
        )
        .tag("CWE-269"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 11);
        assert!(Catalog::new(catalog.entries().to_vec()).is_ok());
        assert!(catalog.get("zip-slip").is_some());
        let kinds: BTreeSet<&str> = catalog.entries().iter().map(|e| e.remediation.kind_name()).collect();
        assert_eq!(kinds.len(), 11);
    }

    #[test]
    fn test_json_round_trip_keeps_entries() {
        let catalog = Catalog::builtin();
        let json = catalog.to_json().unwrap();
        assert!(json.contains("\"type\": \"path_traversal\""));
        assert_eq!(Catalog::from_json(&json).unwrap(), catalog);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"[{
            "id": "servlet",
            "display_name": "Servlet path traversal",
            "remediation": {
                "type": "path_traversal",
                "user_input": ["javax.servlet.ServletRequest getParameter(java.lang.String)"]
            }
        }]"#;
        let catalog = Catalog::from_json(json).unwrap();
        match &catalog.entries()[0].remediation {
            Remediation::PathTraversal {
                new_variable_prefix,
                guard_message,
                fix_partial_path,
                ..
            } => {
                assert_eq!(new_variable_prefix, "input");
                assert_eq!(guard_message, BAD_ZIP_ENTRY);
                assert!(!fix_partial_path);
            }
            other => panic!("unexpected remediation {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let entries = vec![
            CatalogEntry::new("a", "A", Remediation::SecureRandom),
            CatalogEntry::new("a", "A again", Remediation::CookieSecure),
        ];
        assert!(matches!(
            Catalog::new(entries),
            Err(ConfigError::DuplicateRemediation(id)) if id == "a"
        ));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let json = r#"[{
            "id": "broken",
            "display_name": "Broken",
            "remediation": { "type": "path_traversal", "user_input": ["getName("] }
        }]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(ConfigError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let json = r#"[{ "id": "x", "display_name": "X", "remediation": { "type": "sql_injection" } }]"#;
        assert!(matches!(Catalog::from_json(json), Err(ConfigError::Json(_))));
    }
}
