use std::{collections::BTreeMap, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::domain::presets::{Preset, PresetTable};

/// Configuration for a BOM view workspace.
///
/// This struct holds settings that control how component lists are resolved
/// and persisted, including the persistence debounce window and the
/// section preset table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// How long filter changes must settle before they are persisted, in
    /// milliseconds.
    debounce_ms: u64,

    /// Language used when a command does not name one.
    ///
    /// When unset, component lists are shown in the base language.
    pub default_language: Option<String>,

    /// Section presets used by preview consumers when a module has no
    /// persisted filter state.
    presets: PresetTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            default_language: None,
            presets: PresetTable::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the persistence debounce window.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Sets the persistence debounce window.
    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
    }

    /// Returns the section preset table.
    #[must_use]
    pub const fn presets(&self) -> &PresetTable {
        &self.presets
    }

    /// Returns the section preset table for modification.
    pub const fn presets_mut(&mut self) -> &mut PresetTable {
        &mut self.presets
    }

    /// Looks up the preset configured for a section.
    #[must_use]
    pub fn preset_for_section(&self, section: &str) -> Option<&Preset> {
        self.presets.for_section(section)
    }
}

const fn default_debounce_ms() -> u64 {
    250
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// Persistence debounce window in milliseconds.
        #[serde(default = "default_debounce_ms")]
        debounce_ms: u64,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_language: Option<String>,

        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        presets: BTreeMap<String, Preset>,

        /// Section identifier to preset name.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        sections: BTreeMap<String, String>,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                debounce_ms,
                default_language,
                presets,
                sections,
            } => Self {
                debounce_ms,
                default_language,
                presets: PresetTable { presets, sections },
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            debounce_ms: config.debounce_ms,
            default_language: config.default_language,
            presets: config.presets.presets,
            sections: config.presets.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ndebounce_ms = 40\ndefault_language = \"de\"\n\n[presets.frame]\nkind = \"codes\"\ncodes = [\"FR-100\"]\n\n[sections]\nintro = \"frame\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.debounce(), Duration::from_millis(40));
        assert_eq!(config.default_language.as_deref(), Some("de"));
        assert_eq!(
            config.preset_for_section("intro"),
            Some(&Preset::Codes {
                codes: vec!["FR-100".to_string()]
            })
        );
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ndebounce_ms = \"soon\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_keeps_presets() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = Config::default();
        config.set_debounce(Duration::from_millis(10));
        config.presets_mut().insert(
            "frame",
            Preset::Codes {
                codes: vec!["FR-100".to_string(), "BL-200".to_string()],
            },
        );
        config.presets_mut().assign("intro", "frame");

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded, config);
    }
}
