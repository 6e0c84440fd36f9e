//! One interactive component list.
//!
//! A [`ViewSession`] owns the snapshot, the filter settings, the translation
//! and the persistence bridge of a single list. Resolving runs the pipeline on
//! whatever snapshot is current; while the authoritative fetch is outstanding
//! that is an empty placeholder, and the session must be resolved again once
//! the fetch has been applied.

use tracing::{debug, instrument, warn};

use crate::{
    domain::{FilterSettings, ResolvedView, Snapshot, TranslationOverlay, ViewStatus, resolve_view},
    storage::{Fetched, PersistenceBridge},
};

/// The state of a session's BOM data.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DataState {
    /// No authoritative fetch has been applied yet.
    #[default]
    Loading,
    /// The line store failed or does not know the BOM.
    Unavailable,
    /// The authoritative snapshot.
    Ready(Snapshot),
}

/// The state of one interactive component list.
#[derive(Debug, Default)]
pub struct ViewSession {
    data: DataState,
    settings: FilterSettings,
    translation: Option<TranslationOverlay>,
    bridge: Option<PersistenceBridge>,
}

impl ViewSession {
    /// Creates a session waiting for its first fetch.
    #[must_use]
    pub fn new(settings: FilterSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Attaches a persistence bridge. Resolutions over authoritative data are
    /// handed to it.
    #[must_use]
    pub fn with_bridge(mut self, bridge: PersistenceBridge) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// The current filter settings.
    #[must_use]
    pub const fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Replaces the filter settings.
    pub fn set_settings(&mut self, settings: FilterSettings) {
        self.settings = settings;
    }

    /// Replaces the translation. `None` shows the base language.
    pub fn set_translation(&mut self, translation: Option<TranslationOverlay>) {
        self.translation = translation;
    }

    /// The state of the BOM data.
    #[must_use]
    pub const fn data(&self) -> &DataState {
        &self.data
    }

    /// The snapshot the pipeline runs on.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        match &self.data {
            DataState::Ready(snapshot) => snapshot.clone(),
            DataState::Loading | DataState::Unavailable => Snapshot::placeholder(),
        }
    }

    /// Applies a fetch result.
    ///
    /// Returns `false` if the result was superseded and nothing changed.
    #[instrument(level = "debug", skip_all)]
    pub fn apply_fetch(&mut self, fetched: Fetched) -> bool {
        self.data = match fetched {
            Fetched::Superseded { bom_id } => {
                debug!(%bom_id, "ignoring superseded snapshot");
                return false;
            }
            Fetched::Current(Ok(snapshot)) => {
                debug!(lines = snapshot.len(), "snapshot applied");
                DataState::Ready(snapshot)
            }
            Fetched::Current(Err(error)) => {
                warn!(%error, "BOM data unavailable");
                DataState::Unavailable
            }
        };
        true
    }

    /// Runs the pipeline and returns the view to render.
    ///
    /// Over authoritative data the resolution is also handed to the
    /// persistence bridge.
    #[instrument(level = "debug", skip_all)]
    pub fn resolve(&mut self) -> ResolvedView {
        let snapshot = self.snapshot();
        let view = resolve_view(&snapshot, &self.settings, self.translation.as_ref());

        match self.data {
            DataState::Loading => view.with_status(ViewStatus::Loading),
            DataState::Unavailable => view.with_status(ViewStatus::Unavailable),
            DataState::Ready(_) => {
                if let Some(bridge) = &mut self.bridge {
                    bridge.on_resolved(&self.settings, &view.visible_codes);
                }
                view
            }
        }
    }

    /// Flushes pending persistence and ends the session.
    pub async fn close(self) {
        if let Some(bridge) = self.bridge {
            bridge.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tempfile::TempDir;

    use super::*;
    use crate::{
        domain::{Component, LineItem, MatchType},
        storage::{Directory, FetchError, RecordSink},
    };

    fn items() -> Vec<LineItem> {
        [(0, "A"), (1, "B"), (1, "C"), (0, "D")]
            .into_iter()
            .zip(1..)
            .map(|((level, code), id)| LineItem {
                id,
                level,
                quantity: 1.0,
                component: Some(Component::new(code, format!("{code} part"))),
            })
            .collect()
    }

    fn ready() -> Fetched {
        Fetched::Current(Ok(Snapshot::ingest(items())))
    }

    #[test]
    fn loading_resolves_on_a_placeholder() {
        let mut session = ViewSession::new(FilterSettings::default());

        let view = session.resolve();

        assert_eq!(view.status, ViewStatus::Loading);
        assert!(view.rows.is_empty());
        assert_eq!(view.summary.total_count, 0);
    }

    #[test]
    fn applied_fetch_is_resolved_again() {
        let mut session =
            ViewSession::new(FilterSettings::enabled().with_code("a", MatchType::Equals));
        session.resolve();

        assert!(session.apply_fetch(ready()));
        let view = session.resolve();

        assert_eq!(view.status, ViewStatus::Ready);
        assert_eq!(view.rows.len(), 3);
    }

    #[test]
    fn superseded_fetch_changes_nothing() {
        let mut session = ViewSession::new(FilterSettings::default());
        session.apply_fetch(ready());

        assert!(!session.apply_fetch(Fetched::Superseded {
            bom_id: "old".to_string()
        }));
        assert!(matches!(session.data(), DataState::Ready(_)));
    }

    #[test]
    fn failed_fetch_is_unavailable() {
        let mut session = ViewSession::new(FilterSettings::default());
        session.apply_fetch(Fetched::Current(Err(FetchError::BomNotFound(
            "x".to_string(),
        ))));

        let view = session.resolve();

        assert_eq!(view.status, ViewStatus::Unavailable);
        assert!(view.rows.is_empty());
    }

    #[test]
    fn translation_changes_apply_on_next_resolution() {
        let mut session = ViewSession::new(FilterSettings::default());
        session.apply_fetch(ready());

        session.set_translation(Some(TranslationOverlay::default().with_description("B", "Bolzen")));
        assert_eq!(session.resolve().rows[1].description, "Bolzen");

        session.set_translation(None);
        assert_eq!(session.resolve().rows[1].description, "B part");
    }

    #[tokio::test]
    async fn resolutions_over_ready_data_are_persisted() {
        let tmp = TempDir::new().unwrap();
        let dir = Arc::new(Directory::new(tmp.path().to_path_buf()));
        let bridge = PersistenceBridge::spawn("m1", dir.clone(), Duration::from_millis(10));
        let mut session =
            ViewSession::new(FilterSettings::enabled().with_level(1)).with_bridge(bridge);

        session.resolve();
        session.apply_fetch(ready());
        session.resolve();
        session.close().await;

        let record = dir.read_filter_record("m1").await.unwrap().unwrap();
        assert_eq!(
            record.filtered_component_codes,
            Some(vec!["B".to_string(), "C".to_string()])
        );
    }
}
