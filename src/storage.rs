/// Writes resolved filter state back to content entities.
pub mod bridge;
pub mod directory;
/// Ticketed snapshot loading.
pub mod loader;
/// The data-fetch and persistence boundaries.
pub mod source;

pub use bridge::PersistenceBridge;
pub use directory::Directory;
pub use loader::{FetchTicket, Fetched, SnapshotLoader};
pub use source::{BomMeta, BomSource, FetchError, RecordSink, WriteError};
