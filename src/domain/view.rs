//! The presentation-facing result of a resolution.
//!
//! A [`ResolvedView`] is what a component list renders: numbered rows with
//! translated descriptions, the displayed title and headers, a count summary,
//! and a status that tells an empty BOM apart from a filter that matched
//! nothing.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::instrument;

use crate::domain::{
    component::{Line, Snapshot},
    filter::{FilterSettings, filter_bom},
    translation::{Column, Displayed, Overlay, TranslationOverlay},
};

/// One displayed row of a component list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Running number, starting at 1, recomputed on every resolution.
    pub index: usize,
    /// Tree level of the line.
    pub level: u32,
    /// Component code.
    pub code: String,
    /// Description, translated where an override exists.
    pub description: String,
    /// Whether `description` comes from the translation.
    pub description_overridden: bool,
    /// Quantity.
    pub quantity: f64,
}

/// Counts shown next to a filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of displayable lines in the BOM.
    pub total_count: usize,
    /// Number of rows after filtering.
    pub visible_count: usize,
}

/// The state a component list is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewStatus {
    /// The line store has not answered yet.
    Loading,
    /// The line store failed or does not know the BOM.
    Unavailable,
    /// The BOM has no displayable lines at all.
    EmptyBom,
    /// The BOM has lines but none passed the filter.
    NoMatches,
    /// At least one row is visible.
    Ready,
}

/// Everything a component list needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedView {
    /// Panel title.
    pub title: String,
    /// Column headers, in display order, with their override flag.
    pub headers: Vec<Header>,
    /// The visible rows.
    pub rows: Vec<Row>,
    /// Total and visible counts.
    pub summary: Summary,
    /// The state of the list.
    pub status: ViewStatus,
    /// Codes of the visible rows, plus the subtree anchor when the code rule
    /// resolved one.
    #[serde(skip)]
    pub visible_codes: BTreeSet<String>,
}

/// A displayed column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// The column.
    pub column: Column,
    /// The label to show.
    pub label: String,
    /// Whether `label` comes from the translation.
    pub overridden: bool,
}

impl ResolvedView {
    /// Builds the view for a set of effective lines.
    ///
    /// Unresolved lines are skipped. Row numbers follow the order of `items`.
    #[must_use]
    pub fn build(snapshot: &Snapshot, items: &[&Line], overlay: Overlay<'_>) -> Self {
        let rows: Vec<Row> = items
            .iter()
            .filter_map(|line| line.resolved())
            .zip(1..)
            .map(|(line, index)| {
                let Displayed { text, overridden } = overlay.description(&line.component);
                Row {
                    index,
                    level: line.level,
                    code: line.code().to_string(),
                    description: text.into_owned(),
                    description_overridden: overridden,
                    quantity: line.quantity,
                }
            })
            .collect();

        let total_count = snapshot.resolved().count();
        let status = if total_count == 0 {
            ViewStatus::EmptyBom
        } else if rows.is_empty() {
            ViewStatus::NoMatches
        } else {
            ViewStatus::Ready
        };

        let visible_codes = rows.iter().map(|row| row.code.clone()).collect();

        Self {
            title: overlay.title().text.into_owned(),
            headers: headers(overlay),
            summary: Summary {
                total_count,
                visible_count: rows.len(),
            },
            rows,
            status,
            visible_codes,
        }
    }

    /// Replaces the status, keeping everything else.
    #[must_use]
    pub fn with_status(mut self, status: ViewStatus) -> Self {
        self.status = status;
        self
    }
}

fn headers(overlay: Overlay<'_>) -> Vec<Header> {
    Column::ALL
        .into_iter()
        .map(|column| {
            let Displayed { text, overridden } = overlay.header(column);
            Header {
                column,
                label: text.into_owned(),
                overridden,
            }
        })
        .collect()
}

/// Runs the interactive pipeline: filter, then overlay.
#[instrument(level = "debug", skip_all)]
#[must_use]
pub fn resolve_view(
    snapshot: &Snapshot,
    settings: &FilterSettings,
    translation: Option<&TranslationOverlay>,
) -> ResolvedView {
    let result = filter_bom(snapshot.lines(), settings);
    ResolvedView {
        visible_codes: result.visible_codes,
        ..ResolvedView::build(snapshot, &result.effective_items, Overlay::new(translation))
    }
}
