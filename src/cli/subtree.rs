use std::sync::Arc;

use bomview::{Directory, domain::resolve_subtree};
use clap::Parser;
use tracing::instrument;

use super::{load_snapshot, terminal::Colorize};

/// Command arguments for `bomv subtree`.
#[derive(Debug, Parser)]
pub struct Subtree {
    /// The BOM to search.
    bom: String,

    /// The anchor component code (case-insensitive).
    code: String,
}

impl Subtree {
    #[instrument(skip(directory))]
    pub async fn run(self, directory: &Arc<Directory>) -> anyhow::Result<()> {
        let snapshot = load_snapshot(directory, &self.bom).await?;

        let Some(subtree) = resolve_subtree(snapshot.lines(), &self.code) else {
            println!(
                "{}",
                format!("No component with code {} in BOM {}", self.code, self.bom).warning()
            );
            return Ok(());
        };

        println!("{}", subtree.anchor().heading());
        for code in &subtree.codes.tail {
            println!("  {code}");
        }
        println!();
        println!(
            "{}",
            format!(
                "{} codes in subtree (anchor level {}, line {})",
                subtree.codes.len(),
                subtree.anchor_level,
                subtree.anchor_index + 1
            )
            .dim()
        );

        Ok(())
    }
}
