//! The fetch and write boundaries of the engine.
//!
//! [`BomSource`] is the line store and translation provider; [`RecordSink`]
//! is the owning content entity the filter state is written back to. Both are
//! asynchronous and object safe.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FilterRecord, LineItem, TranslationOverlay};

/// Descriptive metadata for a BOM.
///
/// The engine treats this as opaque. Known fields are exposed for display,
/// everything else is carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomMeta {
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Revision label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// When the BOM was last changed upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Errors raised while fetching from a [`BomSource`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The identifier cannot name a stored object.
    #[error("invalid identifier: {0:?}")]
    InvalidId(String),
    /// The line store does not know the BOM.
    #[error("BOM {0} not found")]
    BomNotFound(String),
    /// Reading from storage failed.
    #[error("failed to read {}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// Stored data could not be decoded.
    #[error("malformed data in {}", path.display())]
    Malformed {
        /// The file being decoded.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while writing filter state.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The identifier cannot name a stored object.
    #[error("invalid identifier: {0:?}")]
    InvalidId(String),
    /// The existing entity could not be read back before merging.
    #[error(transparent)]
    Read(#[from] FetchError),
    /// The existing entity is not a JSON object.
    #[error("content entity {} is not a JSON object", path.display())]
    NotAnObject {
        /// The entity file.
        path: PathBuf,
    },
    /// The record could not be encoded.
    #[error("failed to encode filter record")]
    Encode(#[source] serde_json::Error),
    /// Writing to storage failed.
    #[error("failed to write {}", path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// Supplies BOM line items, metadata and module translations.
#[async_trait]
pub trait BomSource: Send + Sync {
    /// Fetches the metadata of a BOM. `None` if it has none.
    async fn fetch_bom_meta(&self, bom_id: &str) -> Result<Option<BomMeta>, FetchError>;

    /// Fetches the ordered line items of a BOM.
    async fn fetch_bom_items(&self, bom_id: &str) -> Result<Vec<LineItem>, FetchError>;

    /// Fetches the translation of a module into a language. `None` if the
    /// module has not been translated.
    async fn fetch_module_translation(
        &self,
        module_id: &str,
        language: &str,
    ) -> Result<Option<TranslationOverlay>, FetchError>;
}

/// Stores the filter state on its owning content entity.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Writes `record` onto the entity, leaving its other content intact.
    async fn write_filter_record(
        &self,
        entity_id: &str,
        record: &FilterRecord,
    ) -> Result<(), WriteError>;

    /// Reads the filter state of the entity. `None` if the entity does not
    /// exist.
    async fn read_filter_record(&self, entity_id: &str)
    -> Result<Option<FilterRecord>, FetchError>;
}

/// Checks that an identifier is safe to use as a single path segment.
pub(crate) fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.starts_with('.')
}
