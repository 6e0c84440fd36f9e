//! Line items and the immutable snapshot they are ingested into.
//!
//! The wire shape ([`LineItem`]) allows the component reference to be absent.
//! Presence is decided once, when a [`Snapshot`] is built: every downstream
//! consumer works with [`Line`], which is either resolved or not.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A part that can appear on a bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Component {
    /// Component code, unique within a snapshot.
    pub code: String,
    /// Base-language description.
    #[serde(default)]
    pub description: String,
}

impl Component {
    /// Creates a component from a code and a description.
    #[must_use]
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// A single line item as delivered by the line store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Identifier, unique within one BOM.
    pub id: u64,
    /// Depth in the conceptual tree. Roots are at level 0.
    pub level: u32,
    /// Quantity of the component at this position.
    #[serde(default)]
    pub quantity: f64,
    /// The referenced component, if the line store could resolve it.
    #[serde(default)]
    pub component: Option<Component>,
}

/// A line whose component reference is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine {
    /// Identifier, unique within one BOM.
    pub id: u64,
    /// Depth in the conceptual tree.
    pub level: u32,
    /// Quantity of the component at this position.
    pub quantity: f64,
    /// The referenced component.
    pub component: Component,
}

impl ResolvedLine {
    /// The component code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.component.code
    }

    /// The base-language component description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.component.description
    }
}

/// A line of an ingested snapshot.
///
/// Unresolved lines keep their place in the sequence so that subtree
/// boundaries are computed on the real pre-order traversal, but they never
/// reach a filtered view or a presentation row.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// The line references a component.
    Resolved(ResolvedLine),
    /// The line store delivered no component for this line.
    Unresolved {
        /// Identifier, unique within one BOM.
        id: u64,
        /// Depth in the conceptual tree.
        level: u32,
    },
}

impl Line {
    /// The line identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::Resolved(line) => line.id,
            Self::Unresolved { id, .. } => *id,
        }
    }

    /// The line's depth in the tree.
    #[must_use]
    pub const fn level(&self) -> u32 {
        match self {
            Self::Resolved(line) => line.level,
            Self::Unresolved { level, .. } => *level,
        }
    }

    /// The resolved line, if the component is present.
    #[must_use]
    pub const fn resolved(&self) -> Option<&ResolvedLine> {
        match self {
            Self::Resolved(line) => Some(line),
            Self::Unresolved { .. } => None,
        }
    }

    /// The component code, if the component is present.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.resolved().map(ResolvedLine::code)
    }
}

impl From<LineItem> for Line {
    fn from(item: LineItem) -> Self {
        match item.component {
            Some(component) => Self::Resolved(ResolvedLine {
                id: item.id,
                level: item.level,
                quantity: item.quantity,
                component,
            }),
            None => Self::Unresolved {
                id: item.id,
                level: item.level,
            },
        }
    }
}

/// An immutable, ordered snapshot of the lines of one BOM.
///
/// Cloning is cheap; the lines are shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    lines: Arc<[Line]>,
}

impl Snapshot {
    /// Ingests line items in the order the line store delivered them.
    #[must_use]
    pub fn ingest(items: impl IntoIterator<Item = LineItem>) -> Self {
        let lines: Vec<Line> = items
            .into_iter()
            .map(Line::from)
            .inspect(|line| {
                if let Line::Unresolved { id, level } = line {
                    debug!(id, level, "line item has no component reference");
                }
            })
            .collect();

        Self {
            lines: lines.into(),
        }
    }

    /// An empty snapshot, used while the authoritative fetch is outstanding.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// All lines, in document order.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Iterates over the lines that reference a component.
    pub fn resolved(&self) -> impl Iterator<Item = &ResolvedLine> {
        self.lines.iter().filter_map(Line::resolved)
    }

    /// Total number of lines, including unresolved ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the snapshot has no lines at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines that were delivered without a component.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| line.resolved().is_none())
            .count()
    }
}
