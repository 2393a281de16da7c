//! Configuration provenance
//!
//! Records which layer set each overridden area: the preset, a YAML file or
//! the builder. Keys are dotted area paths such as `driver.*` or
//! `remediations.zip-slip.*`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::preset::Preset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Preset(Preset),
    Yaml { path: String },
    Builder,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Preset(p) => write!(f, "preset:{}", p),
            ConfigSource::Yaml { path } => write!(f, "yaml:{}", path),
            ConfigSource::Builder => f.write_str("builder"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigProvenance {
    preset: Preset,
    /// Area path to the layer that last set it, sorted by path
    overrides: BTreeMap<String, ConfigSource>,
}

impl ConfigProvenance {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            preset,
            overrides: BTreeMap::new(),
        }
    }

    /// Record that `area` was set by `source`; a later layer wins
    pub fn track_field(&mut self, area: &str, source: ConfigSource) {
        self.overrides.insert(area.to_string(), source);
    }

    /// Layer that set `area`, the preset when nothing overrode it
    pub fn source_of(&self, area: &str) -> ConfigSource {
        self.overrides
            .get(area)
            .cloned()
            .unwrap_or(ConfigSource::Preset(self.preset))
    }

    /// Explicitly tracked source of `area`
    pub fn get_source(&self, area: &str) -> Option<&ConfigSource> {
        self.overrides.get(area)
    }

    /// Layer that set the overrides of one remediation
    pub fn source_of_remediation(&self, id: &str) -> ConfigSource {
        self.source_of(&format!("remediations.{}.*", id))
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn overrides(&self) -> &BTreeMap<String, ConfigSource> {
        &self.overrides
    }

    /// Multi-line report, one overridden area per line
    pub fn summary(&self) -> String {
        let mut out = format!("Base preset: {}", self.preset);
        for (area, source) in &self.overrides {
            out.push_str(&format!("\n  {} <- {}", area, source));
        }
        out
    }
}
