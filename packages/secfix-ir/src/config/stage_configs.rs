//! Stage-specific configuration types
//!
//! The flow engine, the fixed-point driver and every remediation have their own
//! configuration struct with validation.

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use crate::features::matching::domain::MethodSignature;
use serde::{Deserialize, Serialize};

// ============================================================================
// Local flow engine
// ============================================================================

/// Local Flow Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Maximum statement nesting depth the walker descends (1..=4096)
    pub max_depth: usize,

    /// Loop bodies are re-walked until the state is stable or this bound is hit (1..=1024)
    pub max_loop_iterations: usize,
}

impl FlowConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_depth == 0 || self.max_depth > 4096 {
            return Err(ConfigError::range_with_hint(
                "max_depth",
                self.max_depth,
                1,
                4096,
                "Statement nesting depth must be at least 1",
            ));
        }

        if self.max_loop_iterations == 0 || self.max_loop_iterations > 1024 {
            return Err(ConfigError::range_with_hint(
                "max_loop_iterations",
                self.max_loop_iterations,
                1,
                1024,
                "Loop fixed point needs at least one iteration",
            ));
        }

        Ok(())
    }

    /// Builder: Set max_depth
    pub fn max_depth(mut self, v: usize) -> Self {
        self.max_depth = v;
        self
    }

    /// Builder: Set max_loop_iterations
    pub fn max_loop_iterations(mut self, v: usize) -> Self {
        self.max_loop_iterations = v;
        self
    }

    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                max_depth: 32,
                max_loop_iterations: 4,
            },
            Preset::Balanced | Preset::Custom => Self {
                max_depth: 64,
                max_loop_iterations: 8,
            },
            Preset::Thorough => Self {
                max_depth: 256,
                max_loop_iterations: 32,
            },
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

// ============================================================================
// Fixed-point driver
// ============================================================================

/// Driver Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Upper bound on rewrite cycles per tree (1..=100)
    pub max_cycles: usize,

    /// Abort the run on the first failing pass instead of isolating it
    pub fail_fast: bool,
}

impl DriverConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_cycles == 0 || self.max_cycles > 100 {
            return Err(ConfigError::range_with_hint(
                "max_cycles",
                self.max_cycles,
                1,
                100,
                "At least one cycle is needed to apply fixes",
            ));
        }
        Ok(())
    }

    /// Builder: Set max_cycles
    pub fn max_cycles(mut self, v: usize) -> Self {
        self.max_cycles = v;
        self
    }

    /// Builder: Set fail_fast
    pub fn fail_fast(mut self, v: bool) -> Self {
        self.fail_fast = v;
        self
    }

    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                max_cycles: 3,
                fail_fast: false,
            },
            Preset::Balanced | Preset::Custom => Self {
                max_cycles: 10,
                fail_fast: false,
            },
            Preset::Thorough => Self {
                max_cycles: 25,
                fail_fast: false,
            },
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

// ============================================================================
// Per-remediation overrides
// ============================================================================

/// Remediation Configuration
///
/// Applied on top of a catalog entry. Fields a remediation does not use are
/// ignored by it. Whether an entry runs at all is decided by
/// [`RemediationControl`](super::engine_config::RemediationControl).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    /// Base for generated variable names (`zipEntry` → `zipEntryFile`)
    pub new_variable_prefix: Option<String>,

    /// Rewrite `startsWith(dir.getCanonicalPath())` to include a trailing separator
    pub fix_partial_path: bool,

    /// Extra user-input sources as method signature descriptors
    pub user_input_signatures: Vec<String>,

    /// DTDs the project's XML documents load; XML factories keep DTD support for them
    pub external_dtds: Vec<String>,
}

impl RemediationConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(prefix) = &self.new_variable_prefix {
            if !is_java_identifier(prefix) {
                return Err(ConfigError::Validation(format!(
                    "new_variable_prefix must be a Java identifier, got '{}'",
                    prefix
                )));
            }
        }

        for descriptor in &self.user_input_signatures {
            MethodSignature::parse(descriptor)?;
        }

        for dtd in &self.external_dtds {
            if dtd.trim().is_empty() || dtd.contains('"') {
                return Err(ConfigError::Validation(format!(
                    "external_dtds entries must be non-empty and quote-free, got '{}'",
                    dtd
                )));
            }
        }

        Ok(())
    }

    /// Builder: Set new_variable_prefix
    pub fn new_variable_prefix(mut self, v: impl Into<String>) -> Self {
        self.new_variable_prefix = Some(v.into());
        self
    }

    /// Builder: Set fix_partial_path
    pub fn fix_partial_path(mut self, v: bool) -> Self {
        self.fix_partial_path = v;
        self
    }

    /// Builder: Add a user-input source signature
    pub fn user_input_signature(mut self, descriptor: impl Into<String>) -> Self {
        self.user_input_signatures.push(descriptor.into());
        self
    }

    /// Builder: Add an external DTD in use
    pub fn external_dtd(mut self, dtd: impl Into<String>) -> Self {
        self.external_dtds.push(dtd.into());
        self
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self {
            new_variable_prefix: None,
            fix_partial_path: matches!(preset, Preset::Thorough),
            user_input_signatures: Vec::new(),
            external_dtds: Vec::new(),
        }
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

fn is_java_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

// ============================================================================
// Validatable implementations
// ============================================================================

impl Validatable for FlowConfig {
    fn validate(&self) -> ConfigResult<()> {
        FlowConfig::validate(self)
    }

    fn config_name(&self) -> &'static str {
        "FlowConfig"
    }
}

impl Validatable for DriverConfig {
    fn validate(&self) -> ConfigResult<()> {
        DriverConfig::validate(self)
    }

    fn config_name(&self) -> &'static str {
        "DriverConfig"
    }
}

impl Validatable for RemediationConfig {
    fn validate(&self) -> ConfigResult<()> {
        RemediationConfig::validate(self)
    }

    fn config_name(&self) -> &'static str {
        "RemediationConfig"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_config_presets_valid() {
        for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough, Preset::Custom] {
            assert!(FlowConfig::from_preset(preset).validate().is_ok());
            assert!(DriverConfig::from_preset(preset).validate().is_ok());
            assert!(RemediationConfig::from_preset(preset).validate().is_ok());
        }
    }

    #[test]
    fn test_flow_config_range() {
        let err = FlowConfig::default().max_depth(0).validate().unwrap_err();
        assert!(err.to_string().contains("max_depth"));

        let err = FlowConfig::default()
            .max_loop_iterations(5000)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_loop_iterations"));
    }

    #[test]
    fn test_driver_config_range() {
        assert!(DriverConfig::default().max_cycles(0).validate().is_err());
        assert!(DriverConfig::default().max_cycles(101).validate().is_err());
        assert!(DriverConfig::default().max_cycles(1).validate().is_ok());
    }

    #[test]
    fn test_remediation_prefix_must_be_identifier() {
        assert!(RemediationConfig::default()
            .new_variable_prefix("zipEntry")
            .validate()
            .is_ok());
        assert!(RemediationConfig::default()
            .new_variable_prefix("9lives")
            .validate()
            .is_err());
    }

    #[test]
    fn test_remediation_signatures_validated() {
        let ok = RemediationConfig::default()
            .user_input_signature("javax.servlet.ServletRequest getParameter(java.lang.String)");
        assert!(ok.validate().is_ok());

        let bad = RemediationConfig::default().user_input_signature("not a signature(");
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_external_dtds_validated() {
        let ok = RemediationConfig::default().external_dtd("http://example.com/catalog.dtd");
        assert!(ok.validate().is_ok());
        assert!(RemediationConfig::default().external_dtd(" ").validate().is_err());
        assert!(RemediationConfig::default().external_dtd("a\"b.dtd").validate().is_err());
    }

    #[test]
    fn test_thorough_enables_partial_path() {
        assert!(RemediationConfig::from_preset(Preset::Thorough).fix_partial_path);
        assert!(!RemediationConfig::from_preset(Preset::Fast).fix_partial_path);
    }
}
