//! Subtree resolution over a level-annotated, pre-order line sequence.

use std::collections::BTreeSet;

use nonempty::NonEmpty;
use tracing::instrument;

use crate::domain::component::Line;

/// The contiguous subtree rooted at an anchor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtree {
    /// Position of the anchor in the line sequence.
    pub anchor_index: usize,
    /// Level of the anchor line.
    pub anchor_level: u32,
    /// Codes of the anchor and its descendants, in document order.
    ///
    /// The head is always the anchor code, as stored.
    pub codes: NonEmpty<String>,
}

impl Subtree {
    /// The anchor code, in the casing stored in the snapshot.
    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.codes.head
    }

    /// Exact-string membership test.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    /// The codes as a set.
    #[must_use]
    pub fn into_set(self) -> BTreeSet<String> {
        self.codes.into_iter().collect()
    }
}

/// Finds the first line whose code case-insensitively equals `anchor_code`
/// and collects it together with the run of deeper lines that follows it.
///
/// Returns `None` when no line matches. Unresolved lines inside the run
/// extend it but contribute no code.
#[must_use]
pub fn resolve_subtree(lines: &[Line], anchor_code: &str) -> Option<Subtree> {
    let wanted = anchor_code.to_lowercase();

    let (anchor_index, anchor) = lines.iter().enumerate().find_map(|(index, line)| {
        line.resolved()
            .filter(|resolved| resolved.code().to_lowercase() == wanted)
            .map(|resolved| (index, resolved))
    })?;

    let mut codes = NonEmpty::new(anchor.code().to_string());
    codes.tail.extend(
        lines[anchor_index + 1..]
            .iter()
            .take_while(|line| line.level() > anchor.level)
            .filter_map(Line::code)
            .map(str::to_string),
    );

    Some(Subtree {
        anchor_index,
        anchor_level: anchor.level,
        codes,
    })
}

/// Resolves the codes of the subtree anchored at `anchor_code`.
///
/// An empty set means no line matched the anchor. That is an expected
/// outcome, not an error.
#[instrument(level = "trace", skip(lines))]
#[must_use]
pub fn resolve(lines: &[Line], anchor_code: &str) -> BTreeSet<String> {
    resolve_subtree(lines, anchor_code).map_or_else(BTreeSet::new, Subtree::into_set)
}
