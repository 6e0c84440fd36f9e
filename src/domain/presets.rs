//! Section-keyed filter presets.
//!
//! Consumers that have no persisted filter state fall back to a preset chosen
//! by the section the component list lives in. The mapping is data, loaded
//! from the configuration file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::filter::FilterSettings;

/// A named way of narrowing a component list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Preset {
    /// A fixed list of component codes.
    Codes {
        /// Codes to show, matched exactly.
        codes: Vec<String>,
    },
    /// A filter run through the filter engine.
    Filter {
        /// The settings to apply.
        settings: FilterSettings,
    },
}

/// Presets by name, and the preset each section uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetTable {
    /// Presets keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presets: BTreeMap<String, Preset>,

    /// Section identifier to preset name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, String>,
}

impl PresetTable {
    /// Looks up the preset for a section.
    ///
    /// Unknown sections have no preset. A section that names a preset which
    /// does not exist is a configuration mistake; it is logged and treated the
    /// same way.
    #[must_use]
    pub fn for_section(&self, section: &str) -> Option<&Preset> {
        let Some(name) = self.sections.get(section) else {
            debug!(section, "no preset configured for section");
            return None;
        };

        let preset = self.presets.get(name);
        if preset.is_none() {
            warn!(section, preset = %name, "section refers to an unknown preset");
        }
        preset
    }

    /// Registers a preset under `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, preset: Preset) {
        self.presets.insert(name.into(), preset);
    }

    /// Maps a section to a preset name.
    pub fn assign(&mut self, section: impl Into<String>, preset: impl Into<String>) {
        self.sections.insert(section.into(), preset.into());
    }
}
