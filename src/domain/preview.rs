//! Read side for consumers that do not run interactive filtering.
//!
//! Preview and translation screens reproduce the editor's component list from
//! the persisted [`FilterRecord`]. When the module has never been filtered
//! they fall back to the section preset, and when the chosen selection matches
//! nothing in the loaded snapshot they show everything instead.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::{
    component::{Line, Snapshot},
    filter::filter_bom,
    presets::Preset,
    record::FilterRecord,
    translation::{Overlay, TranslationOverlay},
    view::ResolvedView,
};

/// Where a preview selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionSource {
    /// The codes persisted on the module.
    Persisted,
    /// The preset configured for the section.
    Preset,
    /// No selection applied.
    Unfiltered,
}

/// The lines a preview consumer shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSelection<'a> {
    /// Lines to display, in document order.
    pub items: Vec<&'a Line>,
    /// Where the selection came from.
    pub source: SelectionSource,
    /// `true` when the selection matched nothing and the full snapshot is
    /// shown instead.
    pub failed_open: bool,
}

impl PreviewSelection<'_> {
    /// Builds the displayable view for this selection.
    #[must_use]
    pub fn view(&self, snapshot: &Snapshot, translation: Option<&TranslationOverlay>) -> ResolvedView {
        ResolvedView::build(snapshot, &self.items, Overlay::new(translation))
    }
}

/// Chooses the lines a preview shows.
///
/// Persisted codes win when present and non-empty; otherwise the section
/// preset is used; otherwise the snapshot is shown unfiltered. If the chosen
/// selection matches no line, the full snapshot is shown.
#[instrument(level = "debug", skip_all, fields(lines = lines.len()))]
#[must_use]
pub fn select<'a>(
    lines: &'a [Line],
    record: Option<&FilterRecord>,
    preset: Option<&Preset>,
) -> PreviewSelection<'a> {
    let (source, items) = if let Some(codes) = record.and_then(FilterRecord::codes) {
        (SelectionSource::Persisted, by_codes(lines, codes))
    } else if let Some(preset) = preset {
        let items = match preset {
            Preset::Codes { codes } => by_codes(lines, codes),
            Preset::Filter { settings } => filter_bom(lines, settings).effective_items,
        };
        (SelectionSource::Preset, items)
    } else {
        debug!("no persisted codes or preset, showing all lines");
        return PreviewSelection {
            items: lines.iter().collect(),
            source: SelectionSource::Unfiltered,
            failed_open: false,
        };
    };

    if items.iter().any(|line| line.resolved().is_some()) {
        return PreviewSelection {
            items,
            source,
            failed_open: false,
        };
    }

    info!(?source, "selection matches no line, showing the full list");
    PreviewSelection {
        items: lines.iter().collect(),
        source,
        failed_open: true,
    }
}

fn by_codes<'a>(lines: &'a [Line], codes: &[String]) -> Vec<&'a Line> {
    let wanted: HashSet<&str> = codes.iter().map(String::as_str).collect();
    lines
        .iter()
        .filter(|line| line.code().is_some_and(|code| wanted.contains(code)))
        .collect()
}
