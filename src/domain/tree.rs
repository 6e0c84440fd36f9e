//! Explicit parent/child structure reconstructed from line levels.
//!
//! The [`BomTree`] turns the flat, level-annotated sequence into a graph so
//! that callers can ask for parents, children and ancestors without
//! re-scanning. Nodes are positions in the line sequence; edges point from
//! child to parent.

use petgraph::{Direction, graphmap::DiGraphMap};
use tracing::instrument;

use crate::domain::component::Line;

/// The hierarchy of one snapshot.
#[derive(Debug, Default, Clone)]
pub struct BomTree {
    /// Nodes are line positions. Edges point from child to parent.
    graph: DiGraphMap<usize, ()>,
    roots: Vec<usize>,
}

impl BomTree {
    /// Reconstructs the hierarchy.
    ///
    /// A line's parent is the closest preceding line with a strictly smaller
    /// level. Lines with no such predecessor are roots.
    #[instrument(level = "debug", skip_all, fields(lines = lines.len()))]
    #[must_use]
    pub fn build(lines: &[Line]) -> Self {
        let mut graph = DiGraphMap::with_capacity(lines.len(), lines.len());
        let mut roots = Vec::new();

        // Positions of the open ancestors, shallowest first.
        let mut stack: Vec<usize> = Vec::new();

        for (position, line) in lines.iter().enumerate() {
            graph.add_node(position);

            while stack
                .last()
                .is_some_and(|&open| lines[open].level() >= line.level())
            {
                stack.pop();
            }

            match stack.last() {
                Some(&parent) => {
                    graph.add_edge(position, parent, ());
                }
                None => roots.push(position),
            }

            stack.push(position);
        }

        Self { graph, roots }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Positions of the top-level lines, in document order.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Position of the parent line.
    #[must_use]
    pub fn parent(&self, position: usize) -> Option<usize> {
        if !self.graph.contains_node(position) {
            return None;
        }
        self.graph
            .neighbors_directed(position, Direction::Outgoing)
            .next()
    }

    /// Positions of the direct children, in document order.
    #[must_use]
    pub fn children(&self, position: usize) -> Vec<usize> {
        if !self.graph.contains_node(position) {
            return Vec::new();
        }
        let mut children: Vec<usize> = self
            .graph
            .neighbors_directed(position, Direction::Incoming)
            .collect();
        children.sort_unstable();
        children
    }

    /// Positions of all ancestors, nearest first.
    #[must_use]
    pub fn ancestors(&self, position: usize) -> Vec<usize> {
        std::iter::successors(self.parent(position), |&p| self.parent(p)).collect()
    }

    /// Number of ancestors of a line. Roots have depth 0.
    #[must_use]
    pub fn depth_of(&self, position: usize) -> Option<usize> {
        self.graph
            .contains_node(position)
            .then(|| self.ancestors(position).len())
    }

    /// Positions of all descendants, in document order.
    #[must_use]
    pub fn descendants(&self, position: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut pending = self.children(position);
        pending.reverse();

        while let Some(next) = pending.pop() {
            out.push(next);
            let mut children = self.children(next);
            children.reverse();
            pending.extend(children);
        }

        out
    }
}
