//! Snapshot fetching with superseding.
//!
//! Every request takes a ticket. When fetches for several BOMs race, only the
//! fetch holding the most recent ticket is returned as current; the others
//! come back as [`Fetched::Superseded`] and must not be applied.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tracing::{debug, instrument};

use crate::{
    domain::Snapshot,
    storage::source::{BomSource, FetchError},
};

/// A claim on the right to apply a fetch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    bom_id: String,
    generation: u64,
}

impl FetchTicket {
    /// The BOM this ticket was issued for.
    #[must_use]
    pub fn bom_id(&self) -> &str {
        &self.bom_id
    }
}

/// The outcome of a fetch.
#[derive(Debug)]
pub enum Fetched {
    /// The fetch belongs to the latest request.
    Current(Result<Snapshot, FetchError>),
    /// A newer request was made while this one was in flight.
    Superseded {
        /// The BOM whose result was discarded.
        bom_id: String,
    },
}

/// Loads snapshots from a [`BomSource`], discarding superseded results.
///
/// Clones share the ticket counter, so a loader can be handed to several
/// tasks.
#[derive(Debug)]
pub struct SnapshotLoader<S: ?Sized> {
    source: Arc<S>,
    latest: Arc<AtomicU64>,
}

impl<S: ?Sized> Clone for SnapshotLoader<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            latest: Arc::clone(&self.latest),
        }
    }
}

impl<S> SnapshotLoader<S>
where
    S: BomSource + ?Sized,
{
    /// Creates a loader over a source.
    #[must_use]
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registers a request for a BOM, superseding every earlier ticket.
    pub fn request(&self, bom_id: impl Into<String>) -> FetchTicket {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        FetchTicket {
            bom_id: bom_id.into(),
            generation,
        }
    }

    /// Whether `ticket` is still the most recent request.
    #[must_use]
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.generation
    }

    /// Fetches the line items for a ticket and ingests them.
    #[instrument(level = "debug", skip(self, ticket), fields(bom_id = %ticket.bom_id))]
    pub async fn fetch(&self, ticket: FetchTicket) -> Fetched {
        let result = self
            .source
            .fetch_bom_items(&ticket.bom_id)
            .await
            .map(Snapshot::ingest);

        if self.is_current(&ticket) {
            Fetched::Current(result)
        } else {
            debug!(generation = ticket.generation, "discarding superseded fetch");
            Fetched::Superseded {
                bom_id: ticket.bom_id,
            }
        }
    }

    /// Requests and fetches in one step.
    pub async fn load(&self, bom_id: impl Into<String>) -> Fetched {
        let ticket = self.request(bom_id);
        self.fetch(ticket).await
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::{Component, LineItem, TranslationOverlay},
        storage::source::BomMeta,
    };

    /// Serves one single-line BOM per id after a per-id delay.
    struct Delayed {
        delays: HashMap<&'static str, Duration>,
    }

    #[async_trait]
    impl BomSource for Delayed {
        async fn fetch_bom_meta(&self, _bom_id: &str) -> Result<Option<BomMeta>, FetchError> {
            Ok(None)
        }

        async fn fetch_bom_items(&self, bom_id: &str) -> Result<Vec<LineItem>, FetchError> {
            let Some(delay) = self.delays.get(bom_id) else {
                return Err(FetchError::BomNotFound(bom_id.to_string()));
            };
            tokio::time::sleep(*delay).await;
            Ok(vec![LineItem {
                id: 1,
                level: 0,
                quantity: 1.0,
                component: Some(Component::new(bom_id, "root")),
            }])
        }

        async fn fetch_module_translation(
            &self,
            _module_id: &str,
            _language: &str,
        ) -> Result<Option<TranslationOverlay>, FetchError> {
            Ok(None)
        }
    }

    fn loader() -> SnapshotLoader<Delayed> {
        SnapshotLoader::new(Arc::new(Delayed {
            delays: HashMap::from([
                ("slow", Duration::from_millis(80)),
                ("fast", Duration::from_millis(5)),
            ]),
        }))
    }

    fn root_code(fetched: Fetched) -> String {
        match fetched {
            Fetched::Current(Ok(snapshot)) => snapshot.lines()[0].code().unwrap().to_string(),
            other => panic!("expected a current snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_request_is_current() {
        let loader = loader();

        assert_eq!(root_code(loader.load("fast").await), "fast");
    }

    #[tokio::test]
    async fn only_the_latest_request_is_applied() {
        let loader = loader();
        let slow = loader.request("slow");
        let fast = loader.request("fast");

        let slow_task = tokio::spawn({
            let loader = loader.clone();
            async move { loader.fetch(slow).await }
        });
        let fast_result = loader.fetch(fast).await;
        let slow_result = slow_task.await.unwrap();

        assert_eq!(root_code(fast_result), "fast");
        assert!(matches!(
            slow_result,
            Fetched::Superseded { bom_id } if bom_id == "slow"
        ));
    }

    #[tokio::test]
    async fn late_request_supersedes_a_finished_one() {
        let loader = loader();
        let first = loader.request("fast");
        let _second = loader.request("slow");

        assert!(!loader.is_current(&first));
        assert!(matches!(
            loader.fetch(first).await,
            Fetched::Superseded { .. }
        ));
    }

    #[tokio::test]
    async fn errors_are_returned_for_the_current_request() {
        let loader = loader();

        assert!(matches!(
            loader.load("missing").await,
            Fetched::Current(Err(FetchError::BomNotFound(_)))
        ));
    }
}
