//! Preset configurations
//!
//! Presets provide complete default configurations for common use cases.

use serde::{Deserialize, Serialize};

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// CI/CD: shallow flow walks, few fix cycles
    ///
    /// - Flow: max_depth=32, max_loop_iterations=4
    /// - Driver: max_cycles=3
    Fast,

    /// Development: default limits
    ///
    /// - Flow: max_depth=64, max_loop_iterations=8
    /// - Driver: max_cycles=10
    Balanced,

    /// Security audit: deep walks, partial-path fixes on
    ///
    /// - Flow: max_depth=256, max_loop_iterations=32
    /// - Driver: max_cycles=25
    /// - Path traversal: fix_partial_path=true
    Thorough,

    /// Custom: User-defined (YAML only)
    ///
    /// Starts from balanced limits; overrides are expected.
    Custom,
}

impl Preset {
    /// Parse preset from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "thorough" => Ok(Self::Thorough),
            "custom" => Ok(Self::Custom),
            _ => Err(format!(
                "Unknown preset '{}'. Valid presets: fast, balanced, thorough, custom",
                s
            )),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
            Self::Custom => "custom",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Balanced
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
