//! Per-language string overlays for a component list.
//!
//! An overlay never mutates the snapshot. It only decides, field by field,
//! whether a translated string replaces the base-language one.

use std::{borrow::Cow, collections::HashMap, fmt};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::domain::{component::Component, text::non_empty};

/// Title shown when no translation provides one.
pub const DEFAULT_TITLE: &str = "Component List";

/// A column of the component list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Column {
    /// Running row number.
    Number,
    /// Tree level.
    Level,
    /// Component code.
    Code,
    /// Component description.
    Description,
    /// Quantity.
    Quantity,
}

impl Column {
    /// Every column, in display order.
    pub const ALL: [Self; 5] = [
        Self::Number,
        Self::Level,
        Self::Code,
        Self::Description,
        Self::Quantity,
    ];

    /// The built-in header label.
    #[must_use]
    pub const fn default_label(self) -> &'static str {
        match self {
            Self::Number => "N°",
            Self::Level => "Level",
            Self::Code => "Code",
            Self::Description => "Description",
            Self::Quantity => "Qty",
        }
    }

    /// Looks up a column by its serialized id.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.to_string() == id)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Number => "number",
            Self::Level => "level",
            Self::Code => "code",
            Self::Description => "description",
            Self::Quantity => "quantity",
        })
    }
}

/// Language-specific overrides for one module.
///
/// Empty strings are dropped when the overlay is built or deserialized, so
/// every stored override has content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOverlay {
    #[serde(
        default,
        with = "crate::domain::text::optional",
        skip_serializing_if = "Option::is_none"
    )]
    title: Option<NonEmptyString>,

    #[serde(
        default,
        deserialize_with = "known_headers",
        skip_serializing_if = "HashMap::is_empty"
    )]
    headers: HashMap<Column, String>,

    #[serde(
        default,
        deserialize_with = "non_empty_values",
        skip_serializing_if = "HashMap::is_empty"
    )]
    descriptions: HashMap<String, String>,
}

fn non_empty_values<'de, D, K>(deserializer: D) -> Result<HashMap<K, String>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Eq + std::hash::Hash,
{
    let raw = Option::<HashMap<K, String>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.into_iter().filter(|(_, value)| !value.is_empty()).collect())
}

/// Header overrides for column ids this list does not have are dropped.
fn known_headers<'de, D>(deserializer: D) -> Result<HashMap<Column, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, String> = non_empty_values(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(id, label)| match Column::from_id(&id) {
            Some(column) => Some((column, label)),
            None => {
                debug!(column = %id, "ignoring header for unknown column");
                None
            }
        })
        .collect())
}

impl TranslationOverlay {
    /// Sets the translated title. An empty string clears it.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_empty(title);
        self
    }

    /// Sets a translated header. An empty string removes the override.
    #[must_use]
    pub fn with_header(mut self, column: Column, label: impl Into<String>) -> Self {
        let label = label.into();
        if label.is_empty() {
            self.headers.remove(&column);
        } else {
            self.headers.insert(column, label);
        }
        self
    }

    /// Sets a translated description for a component code. An empty string
    /// removes the override.
    #[must_use]
    pub fn with_description(mut self, code: impl Into<String>, text: impl Into<String>) -> Self {
        let code = code.into();
        let text = text.into();
        if text.is_empty() {
            self.descriptions.remove(&code);
        } else {
            self.descriptions.insert(code, text);
        }
        self
    }

    /// Whether the overlay carries no override at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.headers.is_empty() && self.descriptions.is_empty()
    }
}

/// A string ready for display, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displayed<'a> {
    /// The text to show.
    pub text: Cow<'a, str>,
    /// `true` when the text comes from the translation.
    pub overridden: bool,
}

impl<'a> Displayed<'a> {
    const fn base(text: &'a str) -> Self {
        Self {
            text: Cow::Borrowed(text),
            overridden: false,
        }
    }

    const fn translated(text: &'a str) -> Self {
        Self {
            text: Cow::Borrowed(text),
            overridden: true,
        }
    }

    /// Converts into an owned value.
    #[must_use]
    pub fn into_owned(self) -> Displayed<'static> {
        Displayed {
            text: Cow::Owned(self.text.into_owned()),
            overridden: self.overridden,
        }
    }
}

impl fmt::Display for Displayed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Resolves displayed strings against an optional translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overlay<'t> {
    translation: Option<&'t TranslationOverlay>,
}

impl<'t> Overlay<'t> {
    /// Creates an overlay. `None` passes every base string through.
    #[must_use]
    pub const fn new(translation: Option<&'t TranslationOverlay>) -> Self {
        Self { translation }
    }

    /// Whether a translation is active.
    #[must_use]
    pub const fn is_translated(&self) -> bool {
        self.translation.is_some()
    }

    /// The panel title.
    #[must_use]
    pub fn title(&self) -> Displayed<'t> {
        self.translation
            .and_then(|t| t.title.as_ref())
            .map_or(Displayed::base(DEFAULT_TITLE), |title| {
                Displayed::translated(title.as_str())
            })
    }

    /// The header for a column.
    #[must_use]
    pub fn header(&self, column: Column) -> Displayed<'t> {
        self.translation
            .and_then(|t| t.headers.get(&column))
            .map_or(Displayed::base(column.default_label()), |label| {
                Displayed::translated(label)
            })
    }

    /// The description shown for a component.
    #[must_use]
    pub fn description<'a>(&self, component: &'a Component) -> Displayed<'a>
    where
        't: 'a,
    {
        self.translation
            .and_then(|t| t.descriptions.get(&component.code))
            .map_or(Displayed::base(&component.description), |text| {
                Displayed::translated(text)
            })
    }
}

/// Shorthand for the displayed description of a component.
#[must_use]
pub fn overlay<'a>(
    component: &'a Component,
    translation: Option<&'a TranslationOverlay>,
) -> Displayed<'a> {
    Overlay::new(translation).description(component)
}
