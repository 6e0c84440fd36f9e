//! Writes the resolved filter state back to its owning content entity.
//!
//! Each [`PersistenceBridge`] owns one entity and one worker task. Resolutions
//! land in a single slot that later resolutions overwrite; the worker waits
//! for the slot to settle for the debounce window, then writes the latest
//! record. Writes to one entity never overlap, are never retried, and a
//! failure is logged and dropped.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, instrument, warn};

use crate::{
    domain::{FilterRecord, FilterSettings},
    storage::source::RecordSink,
};

/// A fire-and-forget writer of [`FilterRecord`]s for one entity.
#[derive(Debug)]
pub struct PersistenceBridge {
    entity_id: String,
    last_written: Option<FilterSettings>,
    slot: watch::Sender<Option<FilterRecord>>,
    worker: JoinHandle<()>,
}

impl PersistenceBridge {
    /// Starts the worker for an entity.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        entity_id: impl Into<String>,
        sink: Arc<dyn RecordSink>,
        debounce: Duration,
    ) -> Self {
        let entity_id = entity_id.into();
        let (slot, rx) = watch::channel(None);
        let worker = tokio::spawn(drain(entity_id.clone(), sink, debounce, rx));

        Self {
            entity_id,
            last_written: None,
            slot,
            worker,
        }
    }

    /// Seeds the settings already stored on the entity, so resolving them
    /// again does not rewrite it.
    #[must_use]
    pub fn with_last_written(mut self, settings: Option<FilterSettings>) -> Self {
        self.last_written = settings;
        self
    }

    /// The entity this bridge writes to.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Schedules a write for a resolution.
    ///
    /// Returns `false` without scheduling anything when `settings` equal the
    /// last settings scheduled.
    #[instrument(level = "debug", skip_all, fields(entity = %self.entity_id))]
    pub fn on_resolved(&mut self, settings: &FilterSettings, visible_codes: &BTreeSet<String>) -> bool {
        if self.last_written.as_ref() == Some(settings) {
            debug!("settings unchanged, skipping write");
            return false;
        }

        self.last_written = Some(settings.clone());
        self.slot
            .send_replace(Some(FilterRecord::new(settings.clone(), visible_codes)));
        true
    }

    /// Flushes the pending record, if any, and stops the worker.
    pub async fn close(self) {
        let Self {
            entity_id,
            slot,
            worker,
            ..
        } = self;
        drop(slot);

        if let Err(error) = worker.await {
            warn!(entity = %entity_id, %error, "persistence worker stopped abnormally");
        }
    }
}

async fn drain(
    entity_id: String,
    sink: Arc<dyn RecordSink>,
    debounce: Duration,
    mut rx: watch::Receiver<Option<FilterRecord>>,
) {
    while rx.changed().await.is_ok() {
        // Wait for the slot to stay quiet for a full window. A closed channel
        // flushes immediately.
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = tokio::time::sleep(debounce) => break,
            }
        }

        let Some(record) = rx.borrow_and_update().clone() else {
            continue;
        };

        match sink.write_filter_record(&entity_id, &record).await {
            Ok(()) => debug!(entity = %entity_id, "filter state written"),
            Err(error) => warn!(entity = %entity_id, %error, "failed to write filter state"),
        }
    }
}
