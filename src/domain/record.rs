//! The filter state persisted on the owning content entity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::filter::FilterSettings;

/// The last resolved filter state of a component list.
///
/// Written by the persistence bridge and read back by consumers that do not
/// run interactive filtering. Both fields stay absent until the first
/// resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRecord {
    /// The settings that produced `filtered_component_codes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_settings: Option<FilterSettings>,

    /// The visible codes at the time of the write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_component_codes: Option<Vec<String>>,
}

impl FilterRecord {
    /// Builds a record from a resolution.
    #[must_use]
    pub fn new(settings: FilterSettings, visible_codes: &BTreeSet<String>) -> Self {
        Self {
            filter_settings: Some(settings),
            filtered_component_codes: Some(visible_codes.iter().cloned().collect()),
        }
    }

    /// The persisted codes, if present and non-empty.
    #[must_use]
    pub fn codes(&self) -> Option<&[String]> {
        self.filtered_component_codes
            .as_deref()
            .filter(|codes| !codes.is_empty())
    }
}
