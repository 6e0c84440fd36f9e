//! Domain models for component list views.
//!
//! This module contains the core domain types: line items and snapshots, the
//! hierarchy resolver, the filter engine, translation overlays, and the
//! persisted filter record.

/// Components, line items and immutable snapshots.
pub mod component;
pub use component::{Component, Line, LineItem, ResolvedLine, Snapshot};

mod config;
pub use config::Config;

/// Filter settings and the filter engine.
pub mod filter;
pub use filter::{FilterSettings, MatchType, ResolvedFilterResult, filter_bom};

/// Subtree resolution.
pub mod hierarchy;
pub use hierarchy::{Subtree, resolve, resolve_subtree};

/// Section presets.
pub mod presets;
pub use presets::{Preset, PresetTable};

/// Read side for non-interactive consumers.
pub mod preview;
pub use preview::{PreviewSelection, SelectionSource};

mod record;
pub use record::FilterRecord;

mod text;

/// Per-language string overlays.
pub mod translation;
pub use translation::{Column, Displayed, Overlay, TranslationOverlay, overlay};

/// Explicit parent/child structure.
pub mod tree;
pub use tree::BomTree;

/// Presentation-facing resolution results.
pub mod view;
pub use view::{ResolvedView, Row, Summary, ViewStatus, resolve_view};
