use std::sync::Arc;

use anyhow::Context;
use bomview::{
    Directory,
    domain::{SelectionSource, preview},
    storage::RecordSink,
};
use clap::Parser;
use tracing::instrument;

use super::{
    list::{OutputFormat, render},
    load_snapshot, load_translation,
    terminal::Colorize,
};

/// Command arguments for `bomv preview`.
#[derive(Debug, Parser)]
pub struct Preview {
    /// The BOM to show.
    bom: String,

    /// The module that owns the list.
    #[arg(long)]
    module: String,

    /// The section the module belongs to. Selects the preset used when the
    /// module has no persisted filter state.
    #[arg(long)]
    section: Option<String>,

    /// Show translations for this language (defaults to the configured
    /// language).
    #[arg(long)]
    language: Option<String>,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Preview {
    #[instrument(skip(directory))]
    pub async fn run(self, directory: &Arc<Directory>) -> anyhow::Result<()> {
        let config = directory.config();
        let snapshot = load_snapshot(directory, &self.bom).await?;

        let record = directory
            .read_filter_record(&self.module)
            .await
            .with_context(|| format!("failed to read filter state of module {}", self.module))?;
        let preset = self
            .section
            .as_deref()
            .and_then(|section| config.preset_for_section(section));

        let language = self.language.as_deref().or(config.default_language.as_deref());
        let translation = load_translation(directory, Some(self.module.as_str()), language).await;

        let selection = preview::select(snapshot.lines(), record.as_ref(), preset);
        let view = selection.view(&snapshot, translation.as_ref());

        if self.output == OutputFormat::Table {
            let source = match selection.source {
                SelectionSource::Persisted => "persisted filter",
                SelectionSource::Preset => "section preset",
                SelectionSource::Unfiltered => "no filter",
            };
            println!("{}", format!("Selection: {source}").info());
            if selection.failed_open {
                println!(
                    "{}",
                    "The selection matches no component; showing the full list".warning()
                );
            }
            println!();
        }

        render(&view, self.output, translation.is_some())
    }
}
