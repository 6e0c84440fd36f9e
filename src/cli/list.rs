use std::{fmt, sync::Arc};

use anyhow::Context;
use bomview::{
    Directory, FilterSettings, MatchType, PersistenceBridge, ResolvedView, ViewSession,
    domain::{Column, Row, ViewStatus},
    storage::{Fetched, RecordSink, SnapshotLoader},
};
use clap::{Parser, ValueEnum};
use tracing::instrument;

use super::{load_translation, terminal::Colorize};

/// Command arguments for `bomv list`.
#[derive(Debug, Parser)]
#[command(about = "Show the component list of a BOM with filters and translations")]
pub struct List {
    /// The BOM to show.
    bom: String,

    /// Filter by component code. A code present in the BOM selects its
    /// subtree.
    #[arg(long)]
    code: Option<String>,

    /// How the code filter is matched.
    #[arg(long, value_enum, default_value_t)]
    code_match: MatchArg,

    /// Filter by description.
    #[arg(long)]
    description: Option<String>,

    /// How the description filter is matched.
    #[arg(long, value_enum, default_value_t)]
    description_match: MatchArg,

    /// Show only lines at this tree level.
    #[arg(long)]
    level: Option<u32>,

    /// Show every line, ignoring all filter rules.
    #[arg(long, conflicts_with_all = ["code", "description", "level"])]
    no_filter: bool,

    /// The module that owns this list. Its persisted filter is used when no
    /// filter rule is given.
    #[arg(long)]
    module: Option<String>,

    /// Show translations for this language (defaults to the configured
    /// language).
    #[arg(long)]
    language: Option<String>,

    /// Write the resolved filter state back to the module.
    #[arg(long, requires = "module")]
    persist: bool,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Filter match types accepted on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum MatchArg {
    #[default]
    Contains,
    StartsWith,
    Equals,
}

impl From<MatchArg> for MatchType {
    fn from(value: MatchArg) -> Self {
        match value {
            MatchArg::Contains => Self::Contains,
            MatchArg::StartsWith => Self::StartsWith,
            MatchArg::Equals => Self::Equals,
        }
    }
}

impl List {
    #[instrument(skip(directory))]
    pub async fn run(self, directory: Arc<Directory>) -> anyhow::Result<()> {
        let config = directory.config();

        let persisted = match self.module.as_deref() {
            Some(module) => directory
                .read_filter_record(module)
                .await
                .with_context(|| format!("failed to read filter state of module {module}"))?
                .and_then(|record| record.filter_settings),
            None => None,
        };

        let settings = self.settings(persisted.as_ref());
        let language = self.language.as_deref().or(config.default_language.as_deref());
        let translation = load_translation(&directory, self.module.as_deref(), language).await;
        let translated = translation.is_some();

        let mut session = ViewSession::new(settings);
        session.set_translation(translation);
        if let (true, Some(module)) = (self.persist, self.module.as_deref()) {
            let bridge = PersistenceBridge::spawn(module, directory.clone(), config.debounce())
                .with_last_written(persisted);
            session = session.with_bridge(bridge);
        }

        let loader = SnapshotLoader::new(Arc::clone(&directory));
        let fetched = match loader.load(self.bom.as_str()).await {
            Fetched::Current(Err(error)) => {
                return Err(error).with_context(|| format!("failed to load BOM {}", self.bom));
            }
            fetched => fetched,
        };
        session.apply_fetch(fetched);
        let view = session.resolve();
        session.close().await;

        render(&view, self.output, translated)
    }

    /// Builds the filter settings from the flags, or uses the persisted
    /// settings when no rule was given.
    fn settings(&self, persisted: Option<&FilterSettings>) -> FilterSettings {
        if self.no_filter {
            return FilterSettings::default();
        }

        let mut settings = FilterSettings::enabled();
        if let Some(code) = &self.code {
            settings = settings.with_code(code, self.code_match.into());
        }
        if let Some(description) = &self.description {
            settings = settings.with_description(description, self.description_match.into());
        }
        if let Some(level) = self.level {
            settings = settings.with_level(level);
        }

        match persisted {
            Some(persisted) if !settings.has_rules() => persisted.clone(),
            _ => settings,
        }
    }
}

/// Renders a resolved view in the requested format.
///
/// With `translated`, fields still shown in the base language are highlighted
/// in table output.
pub fn render(view: &ResolvedView, output: OutputFormat, translated: bool) -> anyhow::Result<()> {
    match output {
        OutputFormat::Table => render_table(view, translated),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), view)
                .context("failed to render json output")?;
            println!();
        }
        OutputFormat::Csv => render_csv(view),
    }
    Ok(())
}

fn render_table(view: &ResolvedView, translated: bool) {
    println!("{}", view.title.heading());
    println!();

    match view.status {
        ViewStatus::EmptyBom => {
            println!("{}", "This BOM has no components".dim());
            return;
        }
        ViewStatus::NoMatches => {
            println!("{}", "No components match the filter".warning());
            println!("{}", summary(view).dim());
            return;
        }
        ViewStatus::Loading | ViewStatus::Unavailable | ViewStatus::Ready => {}
    }

    let data: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| Column::ALL.into_iter().map(|c| cell(row, c)).collect())
        .collect();

    // Determine column widths for alignment.
    let widths = view
        .headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            data.iter()
                .map(|row| display_width(&row[idx]))
                .max()
                .unwrap_or(0)
                .max(display_width(&header.label))
        })
        .collect::<Vec<_>>();

    for (header, &width) in view.headers.iter().zip(&widths) {
        let padded = pad(&header.label, width);
        if translated && !header.overridden {
            print!("{}  ", padded.untranslated());
        } else {
            print!("{padded}  ");
        }
    }
    println!();

    for width in &widths {
        print!("{:-<width$}  ", "");
    }
    println!();

    for (row, values) in view.rows.iter().zip(&data) {
        for ((column, value), &width) in Column::ALL.into_iter().zip(values).zip(&widths) {
            let padded = pad(value, width);
            if translated && column == Column::Description && !row.description_overridden {
                print!("{}  ", padded.untranslated());
            } else {
                print!("{padded}  ");
            }
        }
        println!();
    }

    println!();
    println!("{}", summary(view).dim());
}

fn render_csv(view: &ResolvedView) {
    let header_line = view
        .headers
        .iter()
        .map(|header| csv_escape(&header.label))
        .collect::<Vec<_>>()
        .join(",");
    println!("{header_line}");

    for row in &view.rows {
        let values = Column::ALL
            .into_iter()
            .map(|column| csv_escape(&cell(row, column)))
            .collect::<Vec<_>>();
        println!("{}", values.join(","));
    }
}

fn cell(row: &Row, column: Column) -> String {
    match column {
        Column::Number => row.index.to_string(),
        Column::Level => row.level.to_string(),
        Column::Code => row.code.clone(),
        Column::Description => row.description.clone(),
        Column::Quantity => row.quantity.to_string(),
    }
}

fn summary(view: &ResolvedView) -> String {
    format!(
        "{} of {} components shown",
        view.summary.visible_count, view.summary.total_count
    )
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn pad(value: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(value));
    format!("{value}{}", " ".repeat(fill))
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

impl fmt::Display for MatchArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Contains => "contains",
            Self::StartsWith => "starts-with",
            Self::Equals => "equals",
        })
    }
}
