//! Configuration error types

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Range validation error
    #[error("Invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Override names a remediation the catalog does not contain
    #[error("Unknown remediation '{id}'. {suggestion}")]
    UnknownRemediation {
        id: String,
        suggestion: String,
        known: Vec<String>,
    },

    /// Two catalog entries share an id
    #[error("Duplicate remediation id '{0}' in catalog")]
    DuplicateRemediation(String),

    /// Method signature descriptor could not be parsed
    #[error("Invalid method signature '{descriptor}': {reason}")]
    InvalidSignature { descriptor: String, reason: String },

    /// Missing version field in YAML
    #[error("Missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    /// Unsupported version
    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Unknown preset name
    #[error("Unknown preset '{0}'. Valid presets: fast, balanced, thorough, custom")]
    UnknownPreset(String),

    /// Disabled remediation has overrides (strict mode)
    #[error("Remediation '{id}' is disabled but has configuration overrides. {hint}")]
    DisabledRemediationOverride { id: String, hint: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error (catalog files)
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a range error with a hint
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    /// Create an unknown remediation error with a closest-id suggestion
    pub fn unknown_remediation(id: impl Into<String>, known: Vec<String>) -> Self {
        let id = id.into();
        let suggestion = find_closest_match(&id, &known);

        Self::UnknownRemediation {
            id,
            suggestion,
            known,
        }
    }

    pub fn invalid_signature(descriptor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            descriptor: descriptor.into(),
            reason: reason.into(),
        }
    }
}

/// Find closest match using simple edit distance
fn find_closest_match(target: &str, candidates: &[String]) -> String {
    match candidates
        .iter()
        .min_by_key(|candidate| levenshtein_distance(target, candidate))
    {
        Some(closest) => format!("Did you mean '{}'?", closest),
        None => "The catalog is empty".to_string(),
    }
}

/// Simple Levenshtein distance implementation
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, c1) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, c2) in b.iter().enumerate() {
            let cost = usize::from(c1 != c2);
            curr[j + 1] = (prev[j + 1] + 1) // deletion
                .min(curr[j] + 1) // insertion
                .min(prev[j] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("zip-slip", "zip-slip"), 0);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
    }

    #[test]
    fn test_unknown_remediation_suggests_closest() {
        let known = vec!["zip-slip".to_string(), "secure-random".to_string()];
        let err = ConfigError::unknown_remediation("zip-slpi", known);

        let msg = err.to_string();
        assert!(msg.contains("zip-slpi"));
        assert!(msg.contains("Did you mean 'zip-slip'?"));
    }

    #[test]
    fn test_unknown_remediation_empty_catalog() {
        let err = ConfigError::unknown_remediation("anything", vec![]);
        assert!(err.to_string().contains("catalog is empty"));
    }

    #[test]
    fn test_error_formatting() {
        let err = ConfigError::range_with_hint(
            "max_cycles",
            0,
            1,
            100,
            "At least one cycle is needed to apply fixes",
        );

        let msg = err.to_string();
        assert!(msg.contains("max_cycles"));
        assert!(msg.contains("1..=100"));
        assert!(msg.contains("At least one cycle"));
    }

    #[test]
    fn test_unsupported_version_error() {
        let err = ConfigError::UnsupportedVersion {
            found: 2,
            supported: vec![1],
        };

        let msg = err.to_string();
        assert!(msg.contains("version 2"));
        assert!(msg.contains("Supported versions: 1"));
    }

    #[test]
    fn test_invalid_signature_error() {
        let err = ConfigError::invalid_signature("java.io.File", "missing argument list");
        let msg = err.to_string();
        assert!(msg.contains("java.io.File"));
        assert!(msg.contains("missing argument list"));
    }
}
