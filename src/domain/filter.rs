//! Filter settings and the filter engine.
//!
//! [`filter_bom`] composes the code, description and level rules with a
//! logical AND. A code filter that names a component present in the BOM
//! switches to hierarchical matching: the anchor's subtree replaces the
//! string predicate.

use std::{collections::BTreeSet, fmt};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{
    component::{Line, ResolvedLine},
    hierarchy::{Subtree, resolve_subtree},
    text::non_empty,
};

/// How a filter string is compared against a field.
///
/// All comparisons are case-insensitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    /// The field contains the filter string.
    #[default]
    Contains,
    /// The field starts with the filter string.
    StartsWith,
    /// The field equals the filter string.
    Equals,
}

impl MatchType {
    /// Applies the predicate. `needle` must already be lowercase.
    fn matches(self, field: &str, needle: &str) -> bool {
        let field = field.to_lowercase();
        match self {
            Self::Contains => field.contains(needle),
            Self::StartsWith => field.starts_with(needle),
            Self::Equals => field == needle,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::Equals => "equals",
        })
    }
}

/// The filter configuration of one component list.
///
/// Filter strings are stored as [`NonEmptyString`]; an empty string in the
/// serialized form is read back as "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSettings {
    /// Component code to filter by.
    #[serde(
        default,
        with = "crate::domain::text::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub code_filter: Option<NonEmptyString>,

    /// Predicate used when the code filter falls back to string matching.
    #[serde(default)]
    pub code_filter_type: MatchType,

    /// Description text to filter by.
    #[serde(
        default,
        with = "crate::domain::text::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub description_filter: Option<NonEmptyString>,

    /// Predicate used for the description filter.
    #[serde(default)]
    pub description_filter_type: MatchType,

    /// Exact level to keep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_filter: Option<u32>,

    /// Master switch. When `false` every line is shown.
    #[serde(default)]
    pub enable_filtering: bool,
}

impl FilterSettings {
    /// Settings that filter on nothing but still drop unresolved lines.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enable_filtering: true,
            ..Self::default()
        }
    }

    /// Sets the code filter. An empty string clears it.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>, match_type: MatchType) -> Self {
        self.code_filter = non_empty(code);
        self.code_filter_type = match_type;
        self
    }

    /// Sets the description filter. An empty string clears it.
    #[must_use]
    pub fn with_description(mut self, text: impl Into<String>, match_type: MatchType) -> Self {
        self.description_filter = non_empty(text);
        self.description_filter_type = match_type;
        self
    }

    /// Sets the level filter.
    #[must_use]
    pub const fn with_level(mut self, level: u32) -> Self {
        self.level_filter = Some(level);
        self
    }

    /// Whether any individual rule is configured.
    #[must_use]
    pub const fn has_rules(&self) -> bool {
        self.code_filter.is_some() || self.description_filter.is_some() || self.level_filter.is_some()
    }
}

/// The outcome of running the filter engine over a line sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilterResult<'a> {
    /// Codes of the lines in `effective_items`, plus the subtree anchor
    /// when the code rule resolved one.
    pub visible_codes: BTreeSet<String>,
    /// The lines that passed, in their original order.
    pub effective_items: Vec<&'a Line>,
    /// The subtree that replaced string matching for the code rule, if any.
    pub subtree: Option<Subtree>,
}

impl ResolvedFilterResult<'_> {
    /// Iterates over the effective lines that reference a component.
    pub fn resolved_items(&self) -> impl Iterator<Item = &ResolvedLine> {
        self.effective_items.iter().filter_map(|line| line.resolved())
    }

    /// Whether the hierarchical override was used for the code rule.
    #[must_use]
    pub const fn is_hierarchical(&self) -> bool {
        self.subtree.is_some()
    }
}

enum CodeRule {
    Subtree(Subtree),
    Text { needle: String, match_type: MatchType },
}

/// The rules of a [`FilterSettings`], prepared once per evaluation.
struct Criteria {
    code: Option<CodeRule>,
    description: Option<(String, MatchType)>,
    level: Option<u32>,
}

impl Criteria {
    fn new(lines: &[Line], settings: &FilterSettings) -> Self {
        let code = settings.code_filter.as_ref().map(|code| {
            resolve_subtree(lines, code.as_str()).map_or_else(
                || CodeRule::Text {
                    needle: code.as_str().to_lowercase(),
                    match_type: settings.code_filter_type,
                },
                CodeRule::Subtree,
            )
        });

        let description = settings
            .description_filter
            .as_ref()
            .map(|text| (text.as_str().to_lowercase(), settings.description_filter_type));

        Self {
            code,
            description,
            level: settings.level_filter,
        }
    }

    fn matches(&self, line: &ResolvedLine) -> bool {
        let code_ok = match &self.code {
            None => true,
            Some(CodeRule::Subtree(subtree)) => subtree.contains(line.code()),
            Some(CodeRule::Text { needle, match_type }) => match_type.matches(line.code(), needle),
        };

        let description_ok = self
            .description
            .as_ref()
            .is_none_or(|(needle, match_type)| match_type.matches(line.description(), needle));

        let level_ok = self.level.is_none_or(|level| level == line.level);

        code_ok && description_ok && level_ok
    }

    fn into_subtree(self) -> Option<Subtree> {
        match self.code {
            Some(CodeRule::Subtree(subtree)) => Some(subtree),
            _ => None,
        }
    }
}

/// Runs the filter engine.
///
/// Pure and order-preserving. With filtering disabled every line is
/// returned, unresolved lines included. Otherwise unresolved lines are
/// always dropped and the remaining rules are combined with AND.
#[instrument(level = "debug", skip_all, fields(lines = lines.len()))]
#[must_use]
pub fn filter_bom<'a>(lines: &'a [Line], settings: &FilterSettings) -> ResolvedFilterResult<'a> {
    if !settings.enable_filtering {
        return ResolvedFilterResult {
            visible_codes: lines.iter().filter_map(Line::code).map(str::to_string).collect(),
            effective_items: lines.iter().collect(),
            subtree: None,
        };
    }

    let criteria = Criteria::new(lines, settings);

    let effective_items: Vec<&Line> = lines
        .iter()
        .filter(|line| line.resolved().is_some_and(|resolved| criteria.matches(resolved)))
        .collect();

    let mut visible_codes: BTreeSet<String> = effective_items
        .iter()
        .filter_map(|line| line.code())
        .map(str::to_string)
        .collect();

    let subtree = criteria.into_subtree();
    if let Some(subtree) = &subtree {
        visible_codes.insert(subtree.anchor().to_string());
    }
    debug!(
        visible = effective_items.len(),
        hierarchical = subtree.is_some(),
        "filter resolved"
    );

    ResolvedFilterResult {
        visible_codes,
        effective_items,
        subtree,
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::component::{
        Component, LineItem, Snapshot,
        fixtures::{abcd, snapshot},
    };

    fn codes(result: &ResolvedFilterResult<'_>) -> Vec<String> {
        result
            .resolved_items()
            .map(|line| line.code().to_string())
            .collect()
    }

    fn parts() -> Snapshot {
        Snapshot::ingest(
            [
                (0, "FR-100", "Frame assembly"),
                (1, "BL-200", "Hex bolt M8"),
                (1, "WS-210", "Washer M8"),
                (0, "WH-300", "Wheel assembly"),
                (1, "BL-201", "Hex bolt M10"),
            ]
            .into_iter()
            .zip(1..)
            .map(|((level, code, description), id)| LineItem {
                id,
                level,
                quantity: 1.0,
                component: Some(Component::new(code, description)),
            }),
        )
    }

    #[test]
    fn hierarchical_code_filter_keeps_subtree() {
        let snapshot = abcd();
        let settings = FilterSettings::enabled().with_code("A", MatchType::Equals);

        let result = filter_bom(snapshot.lines(), &settings);

        assert_eq!(codes(&result), vec!["A", "B", "C"]);
        assert!(result.visible_codes.contains("A"));
        assert!(result.is_hierarchical());
    }

    #[test]
    fn equals_on_leaf_yields_only_that_leaf() {
        let snapshot = abcd();
        let settings = FilterSettings::enabled().with_code("B", MatchType::Equals);

        let result = filter_bom(snapshot.lines(), &settings);

        assert_eq!(codes(&result), vec!["B"]);
        assert_eq!(
            result.visible_codes,
            BTreeSet::from(["B".to_string()])
        );
    }

    #[test]
    fn level_filter_alone() {
        let snapshot = abcd();
        let settings = FilterSettings::enabled().with_level(1);

        let result = filter_bom(snapshot.lines(), &settings);

        assert_eq!(codes(&result), vec!["B", "C"]);
    }

    #[test]
    fn missing_anchor_falls_back_to_string_matching() {
        let snapshot = abcd();
        let settings = FilterSettings::enabled().with_code("Z", MatchType::Contains);

        let result = filter_bom(snapshot.lines(), &settings);

        assert!(result.effective_items.is_empty());
        assert!(result.visible_codes.is_empty());
        assert!(!result.is_hierarchical());
    }

    #[test]
    fn string_fallback_matches_partial_codes() {
        let snapshot = parts();
        let settings = FilterSettings::enabled().with_code("bl-", MatchType::StartsWith);

        let result = filter_bom(snapshot.lines(), &settings);

        assert_eq!(codes(&result), vec!["BL-200", "BL-201"]);
    }

    #[test_case(MatchType::Contains, "bolt", &["BL-200", "BL-201"] ; "contains")]
    #[test_case(MatchType::StartsWith, "HEX BOLT M1", &["BL-201"] ; "starts with")]
    #[test_case(MatchType::Equals, "washer m8", &["WS-210"] ; "equals")]
    #[test_case(MatchType::Equals, "washer", &[] ; "equals needs whole field")]
    fn description_predicates(match_type: MatchType, text: &str, expected: &[&str]) {
        let snapshot = parts();
        let settings = FilterSettings::enabled().with_description(text, match_type);

        let result = filter_bom(snapshot.lines(), &settings);

        assert_eq!(codes(&result), expected);
    }

    #[test]
    fn description_never_resolves_hierarchy() {
        let snapshot = parts();
        let settings = FilterSettings::enabled().with_description("Frame assembly", MatchType::Equals);

        let result = filter_bom(snapshot.lines(), &settings);

        assert_eq!(codes(&result), vec!["FR-100"]);
    }

    #[test]
    fn rules_inside_a_subtree_apply_per_line() {
        let snapshot = parts();
        let settings = FilterSettings::enabled()
            .with_code("fr-100", MatchType::Contains)
            .with_level(1);

        let result = filter_bom(snapshot.lines(), &settings);

        // The anchor itself is at level 0 and is dropped by the level rule.
        assert_eq!(codes(&result), vec!["BL-200", "WS-210"]);
        assert_eq!(result.subtree.as_ref().map(Subtree::anchor), Some("FR-100"));
    }

    #[test]
    fn anchor_stays_visible_when_other_rules_drop_its_line() {
        let snapshot = abcd();
        let settings = FilterSettings::enabled()
            .with_code("A", MatchType::Equals)
            .with_level(1);

        let result = filter_bom(snapshot.lines(), &settings);

        assert_eq!(codes(&result), vec!["B", "C"]);
        assert_eq!(
            result.visible_codes,
            ["A", "B", "C"].into_iter().map(String::from).collect()
        );
    }

    #[test]
    fn anchor_is_visible_even_when_nothing_else_matches() {
        let snapshot = parts();
        let settings = FilterSettings::enabled()
            .with_code("WH-300", MatchType::Equals)
            .with_description("washer", MatchType::Contains);

        let result = filter_bom(snapshot.lines(), &settings);

        assert!(result.effective_items.is_empty());
        assert_eq!(
            result.visible_codes,
            BTreeSet::from(["WH-300".to_string()])
        );
    }

    #[test]
    fn disabled_filtering_returns_everything() {
        let snapshot = Snapshot::ingest(vec![
            LineItem {
                id: 1,
                level: 0,
                quantity: 1.0,
                component: Some(Component::new("A", "")),
            },
            LineItem {
                id: 2,
                level: 1,
                quantity: 1.0,
                component: None,
            },
        ]);
        let mut settings = FilterSettings::default()
            .with_code("nothing", MatchType::Equals)
            .with_level(7);
        settings.enable_filtering = false;

        let result = filter_bom(snapshot.lines(), &settings);

        assert_eq!(result.effective_items.len(), snapshot.len());
        assert!(
            result
                .effective_items
                .iter()
                .zip(snapshot.lines())
                .all(|(a, b)| *a == b)
        );
    }

    #[test]
    fn enabled_filtering_drops_unresolved_lines() {
        let snapshot = Snapshot::ingest(vec![
            LineItem {
                id: 1,
                level: 0,
                quantity: 1.0,
                component: None,
            },
            LineItem {
                id: 2,
                level: 0,
                quantity: 1.0,
                component: Some(Component::new("A", "")),
            },
        ]);

        let result = filter_bom(snapshot.lines(), &FilterSettings::enabled());

        assert_eq!(result.effective_items.len(), 1);
        assert_eq!(result.effective_items[0].id(), 2);
    }

    #[test]
    fn order_is_preserved() {
        let snapshot = snapshot(&[(0, "Z9"), (0, "A1"), (0, "M5")]);
        let result = filter_bom(snapshot.lines(), &FilterSettings::enabled());
        assert_eq!(codes(&result), vec!["Z9", "A1", "M5"]);
    }

    #[test]
    fn settings_use_camel_case_and_treat_empty_strings_as_absent() {
        let settings: FilterSettings = serde_json::from_str(
            r#"{
                "codeFilter": "",
                "codeFilterType": "startsWith",
                "descriptionFilter": "bolt",
                "levelFilter": 2,
                "enableFiltering": true
            }"#,
        )
        .unwrap();

        assert!(settings.code_filter.is_none());
        assert_eq!(settings.code_filter_type, MatchType::StartsWith);
        assert_eq!(
            settings.description_filter.as_ref().map(NonEmptyString::as_str),
            Some("bolt")
        );
        assert_eq!(settings.description_filter_type, MatchType::Contains);
        assert_eq!(settings.level_filter, Some(2));
        assert!(settings.enable_filtering);
    }
}
