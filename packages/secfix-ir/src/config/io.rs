//! Configuration I/O (YAML loading)
//!
//! Defines YAML schema types. Loading and export live on `EngineConfig`.

use std::collections::BTreeMap;

use super::{engine_config::RemediationControl, stage_configs::*};
use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1); absent is reported as an error
    #[serde(default)]
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Remediation on/off switches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediations: Option<RemediationControl>,

    /// Fine-grained overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<FlowConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverConfig>,

    /// Keyed by catalog id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub remediations: BTreeMap<String, RemediationConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ConfigError;
    use crate::config::{EngineConfig, Preset};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = EngineConfig::preset(Preset::Balanced)
            .flow(|c| c.max_depth(50))
            .remediation("zip-slip", |c| c.new_variable_prefix("entry"));

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("preset: balanced"));
        assert!(yaml.contains("max_depth: 50"));
        assert!(yaml.contains("zip-slip"));

        let reloaded = EngineConfig::from_yaml_str(&yaml, "roundtrip").unwrap();
        assert_eq!(reloaded.flow().max_depth, 50);
        assert_eq!(
            reloaded.remediation("zip-slip").unwrap().new_variable_prefix.as_deref(),
            Some("entry")
        );
    }

    #[test]
    fn test_yaml_loading() {
        let temp_file = write_temp(
            r#"
version: 1
preset: fast
remediations:
  disabled: [secure-random]
overrides:
  driver:
    max_cycles: 5
  remediations:
    zip-slip:
      fix_partial_path: true
"#,
        );
        let path = temp_file.path().to_str().unwrap();

        let config = EngineConfig::from_yaml(path).unwrap();
        assert_eq!(config.driver().max_cycles, 5);
        assert!(config.remediation("secure-random").is_none());
        assert!(config.remediation("zip-slip").unwrap().fix_partial_path);
        assert!(matches!(
            config.as_inner().provenance().get_source("driver.*"),
            Some(crate::config::ConfigSource::Yaml { .. })
        ));
    }

    #[test]
    fn test_yaml_missing_version() {
        let temp_file = write_temp("preset: fast\n");
        let result = EngineConfig::from_yaml(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::MissingVersion)));
    }

    #[test]
    fn test_yaml_unsupported_version() {
        let temp_file = write_temp("version: 2\npreset: fast\n");
        let result = EngineConfig::from_yaml(temp_file.path().to_str().unwrap());
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn test_yaml_unknown_field_rejected() {
        let result = EngineConfig::from_yaml_str("version: 1\npreset: fast\nstages: {}\n", "inline");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_yaml_unknown_preset() {
        let result = EngineConfig::from_yaml_str("version: 1\npreset: turbo\n", "inline");
        assert!(matches!(result, Err(ConfigError::UnknownPreset(p)) if p == "turbo"));
    }

    #[test]
    fn test_yaml_invalid_range() {
        let result = EngineConfig::from_yaml_str(
            "version: 1\npreset: fast\noverrides:\n  flow:\n    max_depth: 0\n",
            "inline",
        );
        assert!(matches!(result, Err(ConfigError::Range { .. })));
    }
}
