//! Engine configuration with RemediationControl
//!
//! Main configuration struct with preset-based defaults and override support.

use std::collections::{BTreeMap, BTreeSet};

use super::{
    error::{ConfigError, ConfigResult},
    io::{ConfigExportV1, ConfigOverrides},
    preset::Preset,
    provenance::{ConfigProvenance, ConfigSource},
    stage_configs::*,
};
use serde::{Deserialize, Serialize};

/// Remediation control (on/off switches for catalog entries)
///
/// Every catalog entry runs unless it is listed in `disabled`. When `only` is
/// set, entries outside it are skipped as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemediationControl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only: Option<BTreeSet<String>>,

    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub disabled: BTreeSet<String>,
}

impl RemediationControl {
    /// Only the given entries run
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Some(ids.into_iter().map(Into::into).collect()),
            disabled: BTreeSet::new(),
        }
    }

    /// Enable a specific remediation
    pub fn enable(mut self, id: &str) -> Self {
        self.disabled.remove(id);
        if let Some(only) = self.only.as_mut() {
            only.insert(id.to_string());
        }
        self
    }

    /// Disable a specific remediation
    pub fn disable(mut self, id: &str) -> Self {
        self.disabled.insert(id.to_string());
        self
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        if self.disabled.contains(id) {
            return false;
        }
        self.only.as_ref().map_or(true, |only| only.contains(id))
    }

    /// Every id this control mentions
    pub fn mentioned_ids(&self) -> impl Iterator<Item = &String> {
        self.only.iter().flatten().chain(self.disabled.iter())
    }
}

/// Engine configuration (builder)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base preset
    pub(crate) preset: Preset,

    /// Remediation control (on/off switches)
    pub remediations: RemediationControl,

    /// Strict mode: error on disabled remediation overrides (default: false)
    /// - true: build() fails with ConfigError::DisabledRemediationOverride
    /// - false: build() warns and ignores disabled remediation overrides
    pub(crate) strict_mode: bool,

    pub(crate) flow: Option<FlowConfig>,
    pub(crate) driver: Option<DriverConfig>,

    /// Remediation-specific overrides, keyed by catalog id
    pub(crate) remediation_overrides: BTreeMap<String, RemediationConfig>,

    /// Provenance tracking (field-level)
    pub(crate) provenance: ConfigProvenance,
}

impl EngineConfig {
    /// Level 1: Create from preset
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            remediations: RemediationControl::default(),
            strict_mode: false,
            flow: None,
            driver: None,
            remediation_overrides: BTreeMap::new(),
            provenance: ConfigProvenance::from_preset(preset),
        }
    }

    /// Enable strict mode (errors on disabled remediation overrides)
    pub fn strict_mode(mut self, enabled: bool) -> Self {
        self.strict_mode = enabled;
        self
    }

    /// Configure remediation control (closure-based)
    pub fn with_remediations<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RemediationControl) -> RemediationControl,
    {
        self.remediations = f(self.remediations);
        self.provenance
            .track_field("remediations.control", ConfigSource::Builder);
        self
    }

    /// Level 2: Override the flow engine limits
    pub fn flow<F>(mut self, f: F) -> Self
    where
        F: FnOnce(FlowConfig) -> FlowConfig,
    {
        let base = FlowConfig::from_preset(self.preset);
        self.flow = Some(f(base));
        self.provenance.track_field("flow.*", ConfigSource::Builder);
        self
    }

    /// Level 2: Override the driver
    pub fn driver<F>(mut self, f: F) -> Self
    where
        F: FnOnce(DriverConfig) -> DriverConfig,
    {
        let base = DriverConfig::from_preset(self.preset);
        self.driver = Some(f(base));
        self.provenance
            .track_field("driver.*", ConfigSource::Builder);
        self
    }

    /// Level 2: Override one remediation
    ///
    /// # Example
    /// ```ignore
    /// let config = EngineConfig::preset(Preset::Balanced)
    ///     .remediation("zip-slip", |c| c.new_variable_prefix("entry"))
    ///     .build()?;
    /// ```
    pub fn remediation<F>(mut self, id: &str, f: F) -> Self
    where
        F: FnOnce(RemediationConfig) -> RemediationConfig,
    {
        let base = self
            .remediation_overrides
            .remove(id)
            .unwrap_or_else(|| RemediationConfig::from_preset(self.preset));
        self.remediation_overrides.insert(id.to_string(), f(base));
        self.provenance
            .track_field(&format!("remediations.{}.*", id), ConfigSource::Builder);
        self
    }

    /// Build and validate
    pub fn build(self) -> ConfigResult<ValidatedConfig> {
        if let Some(ref cfg) = self.flow {
            cfg.validate()?;
        }
        if let Some(ref cfg) = self.driver {
            cfg.validate()?;
        }
        for cfg in self.remediation_overrides.values() {
            cfg.validate()?;
        }

        self.validate_remediation_control()?;

        Ok(ValidatedConfig(self))
    }

    /// RemediationControl consistency validation
    fn validate_remediation_control(&self) -> ConfigResult<()> {
        for id in self.remediation_overrides.keys() {
            if self.remediations.is_enabled(id) {
                continue;
            }
            if self.strict_mode {
                return Err(ConfigError::DisabledRemediationOverride {
                    id: id.clone(),
                    hint: format!(
                        "Remove .remediation(\"{}\", ..) or enable it with .with_remediations(|r| r.enable(\"{}\"))",
                        id, id
                    ),
                });
            }
            tracing::warn!(
                remediation = %id,
                source = %self.provenance.source_of_remediation(id),
                "remediation override ignored (remediation disabled); enable strict_mode to error on this"
            );
        }
        Ok(())
    }

    pub fn get_preset(&self) -> Preset {
        self.preset
    }

    pub fn provenance(&self) -> &ConfigProvenance {
        &self.provenance
    }

    /// Load from YAML file (v1 schema)
    pub fn from_yaml(path: &str) -> ConfigResult<ValidatedConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content, path)
    }

    /// Load from YAML text; `origin` is recorded as the provenance path
    pub fn from_yaml_str(content: &str, origin: &str) -> ConfigResult<ValidatedConfig> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        match export.version {
            None => return Err(ConfigError::MissingVersion),
            Some(1) => {}
            Some(found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: vec![1],
                })
            }
        }

        let preset = Preset::from_str(&export.preset)
            .map_err(|_| ConfigError::UnknownPreset(export.preset.clone()))?;

        let mut config = Self::preset(preset);
        let source = || ConfigSource::Yaml {
            path: origin.to_string(),
        };

        if let Some(control) = export.remediations {
            config.remediations = control;
            config
                .provenance
                .track_field("remediations.control", source());
        }

        if let Some(overrides) = export.overrides {
            if let Some(flow) = overrides.flow {
                config.flow = Some(flow);
                config.provenance.track_field("flow.*", source());
            }
            if let Some(driver) = overrides.driver {
                config.driver = Some(driver);
                config.provenance.track_field("driver.*", source());
            }
            for (id, remediation) in overrides.remediations {
                config
                    .provenance
                    .track_field(&format!("remediations.{}.*", id), source());
                config.remediation_overrides.insert(id, remediation);
            }
        }

        config.build()
    }

    /// Export to YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(1),
            preset: self.preset.to_string(),
            remediations: Some(self.remediations.clone()),
            overrides: Some(ConfigOverrides {
                flow: self.flow.clone(),
                driver: self.driver.clone(),
                remediations: self.remediation_overrides.clone(),
            }),
        };

        Ok(serde_yaml::to_string(&export)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

/// Validated engine configuration
///
/// Only obtainable through [`EngineConfig::build`] or the YAML loaders.
#[derive(Debug, Clone)]
pub struct ValidatedConfig(EngineConfig);

impl ValidatedConfig {
    pub fn into_inner(self) -> EngineConfig {
        self.0
    }

    pub fn as_inner(&self) -> &EngineConfig {
        &self.0
    }

    pub fn preset(&self) -> Preset {
        self.0.preset
    }

    /// Effective flow engine limits
    pub fn flow(&self) -> FlowConfig {
        self.0
            .flow
            .clone()
            .unwrap_or_else(|| FlowConfig::from_preset(self.0.preset))
    }

    /// Effective driver settings
    pub fn driver(&self) -> DriverConfig {
        self.0
            .driver
            .clone()
            .unwrap_or_else(|| DriverConfig::from_preset(self.0.preset))
    }

    /// Effective settings of one remediation (None if disabled)
    pub fn remediation(&self, id: &str) -> Option<RemediationConfig> {
        if !self.0.remediations.is_enabled(id) {
            return None;
        }
        Some(
            self.0
                .remediation_overrides
                .get(id)
                .cloned()
                .unwrap_or_else(|| RemediationConfig::from_preset(self.0.preset)),
        )
    }

    /// Fail when overrides or switches name ids outside `known`
    pub fn check_known_ids<'a, I>(&self, known: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: BTreeSet<&str> = known.into_iter().collect();
        let mentioned = self
            .0
            .remediation_overrides
            .keys()
            .chain(self.0.remediations.mentioned_ids());
        for id in mentioned {
            if !known.contains(id.as_str()) {
                return Err(ConfigError::unknown_remediation(
                    id.clone(),
                    known.iter().map(|k| k.to_string()).collect(),
                ));
            }
        }
        Ok(())
    }

    /// Get a human-readable description of the configuration
    pub fn describe(&self) -> String {
        let flow = self.flow();
        let driver = self.driver();
        format!(
            "{} [max_depth={}, max_loop_iterations={}, max_cycles={}{}]",
            self.0.preset,
            flow.max_depth,
            flow.max_loop_iterations,
            driver.max_cycles,
            if driver.fail_fast { ", fail_fast" } else { "" }
        )
    }
}

impl Default for ValidatedConfig {
    fn default() -> Self {
        ValidatedConfig(EngineConfig::default())
    }
}
