use std::{path::PathBuf, sync::Arc};

mod list;
mod preview;
mod subtree;
mod terminal;
mod tree;

use anyhow::Context;
use bomview::{
    Directory, Snapshot, SnapshotLoader, TranslationOverlay,
    storage::{BomSource, Fetched},
};
use clap::ArgAction;
use list::List;
use preview::Preview;
use subtree::Subtree;
use terminal::Colorize;
use tracing::instrument;
use tree::Tree;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the BOM directory
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.unwrap_or(Command::Boms).run(self.root).await
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Initialize a new BOM directory
    Init,

    /// List the BOMs in the directory (default)
    Boms,

    /// Show the component list of a BOM with filters and translations
    List(List),

    /// Print the codes in the subtree of a component
    Subtree(Subtree),

    /// Print the reconstructed hierarchy of a BOM
    Tree(Tree),

    /// Show the component list as preview consumers see it
    ///
    /// Uses the filter state persisted on the module, falling back to the
    /// section preset and then to the full list.
    Preview(Preview),
}

impl Command {
    async fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = Arc::new(Directory::new(root));
        match self {
            Self::Init => init(&directory)?,
            Self::Boms => boms(&directory).await?,
            Self::List(command) => command.run(directory).await?,
            Self::Subtree(command) => command.run(&directory).await?,
            Self::Tree(command) => command.run(&directory).await?,
            Self::Preview(command) => command.run(&directory).await?,
        }
        Ok(())
    }
}

#[instrument(skip_all)]
fn init(directory: &Directory) -> anyhow::Result<()> {
    directory.init().map_err(anyhow::Error::msg)?;

    println!(
        "Initialized BOM directory in {}",
        directory.root().display()
    );
    println!("  Created: .bomview/config.toml");
    println!("  Created: boms/");
    println!("  Created: modules/");
    println!("  Created: translations/");
    println!();
    println!("Next steps:");
    println!("  Add a BOM as boms/<id>/items.json");
    println!("  bomv list <id>");

    Ok(())
}

#[instrument(skip_all)]
async fn boms(directory: &Directory) -> anyhow::Result<()> {
    let ids = directory.bom_ids();
    if ids.is_empty() {
        println!("{}", "No BOMs found".dim());
        return Ok(());
    }

    for id in ids {
        let meta = directory
            .fetch_bom_meta(&id)
            .await
            .with_context(|| format!("failed to read metadata of BOM {id}"))?
            .unwrap_or_default();

        let mut line = id.info();
        if let Some(name) = meta.name {
            line.push_str(&format!("  {name}"));
        }
        if let Some(revision) = meta.revision {
            line.push_str(&format!("  rev {revision}").dim());
        }
        println!("{line}");
    }

    Ok(())
}

/// Loads the authoritative snapshot of a BOM.
async fn load_snapshot(directory: &Arc<Directory>, bom: &str) -> anyhow::Result<Snapshot> {
    match SnapshotLoader::new(Arc::clone(directory)).load(bom).await {
        Fetched::Current(result) => result.with_context(|| format!("failed to load BOM {bom}")),
        Fetched::Superseded { bom_id } => anyhow::bail!("request for BOM {bom_id} was superseded"),
    }
}

/// Loads a module translation when both a module and a language are known.
///
/// A translation that cannot be read is logged and the list falls back to the
/// base language.
async fn load_translation(
    directory: &Directory,
    module: Option<&str>,
    language: Option<&str>,
) -> Option<TranslationOverlay> {
    let (Some(module), Some(language)) = (module, language) else {
        return None;
    };

    match directory.fetch_module_translation(module, language).await {
        Ok(Some(translation)) => Some(translation),
        Ok(None) => {
            tracing::info!(module, language, "module has no translation");
            None
        }
        Err(error) => {
            tracing::warn!(%error, module, language, "translation unavailable, using base language");
            None
        }
    }
}
