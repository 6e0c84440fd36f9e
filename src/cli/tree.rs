use std::sync::Arc;

use bomview::{
    Directory,
    domain::{BomTree, Line},
};
use clap::Parser;
use tracing::instrument;

use super::{load_snapshot, terminal::Colorize};

/// Command arguments for `bomv tree`.
#[derive(Debug, Parser)]
pub struct Tree {
    /// The BOM to show.
    bom: String,

    /// Depth limit (0 shows only top-level lines).
    #[arg(long, value_name = "N")]
    depth: Option<usize>,
}

impl Tree {
    #[instrument(skip(directory))]
    pub async fn run(self, directory: &Arc<Directory>) -> anyhow::Result<()> {
        let snapshot = load_snapshot(directory, &self.bom).await?;
        let tree = BomTree::build(snapshot.lines());

        if tree.is_empty() {
            println!("{}", "This BOM has no components".dim());
            return Ok(());
        }

        for line in render(snapshot.lines(), &tree, self.depth) {
            println!("{line}");
        }

        let unresolved = snapshot.unresolved_count();
        if unresolved > 0 {
            println!();
            println!(
                "{}",
                format!("{unresolved} lines without a component").warning()
            );
        }

        Ok(())
    }
}

/// Draws the hierarchy with box-drawing connectors.
fn render(lines: &[Line], tree: &BomTree, max_depth: Option<usize>) -> Vec<String> {
    let mut out = Vec::new();
    for &root in tree.roots() {
        out.push(label(&lines[root]));

        let mut pending = Vec::new();
        push_children(tree, root, "", 1, max_depth, &mut pending);
        while let Some(entry) = pending.pop() {
            let (connector, continuation) = if entry.last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            out.push(format!(
                "{}{connector}{}",
                entry.prefix,
                label(&lines[entry.position])
            ));
            push_children(
                tree,
                entry.position,
                &format!("{}{continuation}", entry.prefix),
                entry.depth + 1,
                max_depth,
                &mut pending,
            );
        }
    }
    out
}

struct Pending {
    position: usize,
    prefix: String,
    depth: usize,
    last: bool,
}

/// Queues the children of `position` so they pop in document order.
fn push_children(
    tree: &BomTree,
    position: usize,
    prefix: &str,
    depth: usize,
    max_depth: Option<usize>,
    pending: &mut Vec<Pending>,
) {
    if max_depth.is_some_and(|max| depth > max) {
        return;
    }

    let children = tree.children(position);
    let last = children.len().saturating_sub(1);
    pending.extend(
        children
            .into_iter()
            .enumerate()
            .rev()
            .map(|(idx, child)| Pending {
                position: child,
                prefix: prefix.to_string(),
                depth,
                last: idx == last,
            }),
    );
}

fn label(line: &Line) -> String {
    match line {
        Line::Resolved(line) => format!(
            "{}  {} (×{})",
            line.code(),
            line.description(),
            line.quantity
        ),
        Line::Unresolved { id, .. } => format!("<line {id} has no component>"),
    }
}
