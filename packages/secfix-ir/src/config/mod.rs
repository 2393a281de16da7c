//! Configuration System
//!
//! Three levels of control:
//! - Level 1: Preset - one-liner defaults
//! - Level 2: Overrides - closure-based adjustment of one area
//! - Level 3: YAML - complete control from a versioned file
//!
//! # Examples
//!
//! ```rust,ignore
//! use secfix_ir::config::{EngineConfig, Preset};
//!
//! let config = EngineConfig::preset(Preset::Fast).build()?;
//!
//! let config = EngineConfig::preset(Preset::Balanced)
//!     .driver(|c| c.max_cycles(5))
//!     .remediation("zip-slip", |c| c.new_variable_prefix("entry"))
//!     .build()?;
//!
//! let config = EngineConfig::from_yaml("team-security.yaml")?;
//! ```

pub mod engine_config;
pub mod error;
pub mod io;
pub mod preset;
pub mod provenance;
pub mod stage_configs;
pub mod validation;

// Re-exports
pub use engine_config::{EngineConfig, RemediationControl, ValidatedConfig};
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use preset::Preset;
pub use provenance::{ConfigProvenance, ConfigSource};
pub use stage_configs::{DriverConfig, FlowConfig, RemediationConfig};
pub use validation::{Validatable, ValidatableCollection};
