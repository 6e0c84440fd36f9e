//! Component list views over bills of materials.
//!
//! A BOM is an ordered list of lines, each annotated with a tree level. This
//! crate resolves component subtrees from that flat list, filters it by code,
//! description and level, overlays per-language translations, and persists
//! the resolved filter state back to the content that owns the list.

pub mod domain;
pub use domain::{
    Config, FilterRecord, FilterSettings, MatchType, ResolvedView, Snapshot, TranslationOverlay,
    filter_bom, resolve_view,
};

pub mod session;
pub use session::{DataState, ViewSession};

/// Line store access, snapshot loading and filter-state persistence.
pub mod storage;
pub use storage::{Directory, PersistenceBridge, SnapshotLoader};
