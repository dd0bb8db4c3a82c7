//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use notebase_core::dedup::DedupPolicy;
use notebase_core::pipeline::{
    Document, IngestReport, ProgressReporter, discover_documents, ingest_documents,
};
use notebase_core::{render, search};
use notebase_markdown::IngestOptions;
use notebase_shared::{
    AppConfig, NotebaseError, TopicPath, init_config, load_config, load_config_from,
    validate_threshold,
};
use notebase_storage::{NoteStore, load_snapshot, save_snapshot};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Notebase — turn scattered Markdown notes into one deduplicated knowledge base.
#[derive(Parser)]
#[command(
    name = "notebase",
    version,
    about = "Ingest Markdown notes, merge near-duplicate topics, and query the result.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.notebase/notebase.toml.
    #[arg(long, global = true, env = "NOTEBASE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Rendering used by `show`.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Markdown,
    Text,
}

/// Where a read-only command gets its notes from.
#[derive(Args)]
pub(crate) struct SourceArgs {
    /// Note files or directories to ingest.
    pub paths: Vec<PathBuf>,

    /// Load a previously exported snapshot instead of ingesting.
    #[arg(long, conflicts_with = "paths")]
    pub snapshot: Option<PathBuf>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ingest note files or directories and print a summary.
    Ingest {
        /// Note files or directories (directories are walked recursively).
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Similarity threshold for merging duplicates (0.0–1.0).
        #[arg(long)]
        threshold: Option<f64>,

        /// Accept headings that skip nesting levels.
        #[arg(long)]
        lenient: bool,

        /// Write the resulting store to a JSON snapshot.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List topic paths in store order.
    List {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show one topic, e.g. "JavaScript > Event loop".
    Show {
        /// Topic path with segments separated by '>'.
        topic: String,

        /// Output format.
        #[arg(long, default_value = "markdown")]
        format: OutputFormat,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Search topics and bodies for keywords.
    Search {
        /// Words to look for.
        query: String,

        /// Maximum number of results.
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "notebase=warn",
        1 => "notebase=info",
        2 => "notebase=debug",
        _ => "notebase=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Ingest {
            paths,
            threshold,
            lenient,
            out,
        } => {
            let mut config = resolve_config(config_path.as_deref())?;
            if let Some(threshold) = threshold {
                validate_threshold(threshold)?;
                config.dedup.similarity_threshold = threshold;
            }
            if lenient {
                config.ingest.strict_headings = false;
            }
            cmd_ingest(&config, &paths, out.as_deref())
        }
        Command::List { source } => cmd_list(&resolve_config(config_path.as_deref())?, &source),
        Command::Show {
            topic,
            format,
            source,
        } => cmd_show(&resolve_config(config_path.as_deref())?, &topic, &format, &source),
        Command::Search {
            query,
            limit,
            source,
        } => cmd_search(&resolve_config(config_path.as_deref())?, &query, limit, &source),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Store loading
// ---------------------------------------------------------------------------

/// Ingest `paths` into a fresh store, reporting progress on stderr.
fn ingest_paths(config: &AppConfig, paths: &[PathBuf]) -> Result<(NoteStore, IngestReport)> {
    let files = discover_documents(paths, &config.ingest.extensions)?;
    if files.is_empty() {
        return Err(eyre!("no note files found in the given paths"));
    }

    let documents = files
        .iter()
        .map(|path| Document::read(path))
        .collect::<Result<Vec<_>, NotebaseError>>()?;

    let options = IngestOptions::from(config);
    let policy = DedupPolicy::from(config);
    let mut store = NoteStore::new();

    let reporter = CliProgress::new();
    let report = ingest_documents(&documents, &options, &policy, &mut store, &reporter);

    Ok((store, report))
}

/// Build a store from a snapshot or by ingesting paths.
fn load_store(config: &AppConfig, source: &SourceArgs) -> Result<NoteStore> {
    if let Some(snapshot) = &source.snapshot {
        return Ok(load_snapshot(snapshot)?);
    }
    if source.paths.is_empty() {
        return Err(eyre!("no input: pass note files/directories or --snapshot <FILE>"));
    }

    let (store, report) = ingest_paths(config, &source.paths)?;
    for failure in &report.failures {
        eprintln!("warning: skipped {}: {}", failure.source_file, failure.error);
    }
    Ok(store)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_ingest(config: &AppConfig, paths: &[PathBuf], out: Option<&Path>) -> Result<()> {
    info!(
        paths = paths.len(),
        threshold = config.dedup.similarity_threshold,
        strict = config.ingest.strict_headings,
        "ingesting notes"
    );

    let (store, report) = ingest_paths(config, paths)?;

    println!();
    println!("  Notes ingested!");
    println!("  Documents: {}", report.documents);
    println!("  Entries:   {}", report.entries_seen);
    println!("  Inserted:  {}", report.inserted);
    println!("  Merged:    {}", report.merged);
    println!("  Replaced:  {}", report.replaced);
    println!("  Failed:    {}", report.failures.len());
    println!("  Topics:    {}", store.len());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());

    for failure in &report.failures {
        println!("  ! {}: {}", failure.source_file, failure.error);
    }

    if let Some(out) = out {
        save_snapshot(&store, out)?;
        println!("  Snapshot:  {}", out.display());
    }
    println!();

    Ok(())
}

fn cmd_list(config: &AppConfig, source: &SourceArgs) -> Result<()> {
    let store = load_store(config, source)?;
    for entry in store.list() {
        println!("{}", entry.topic_path);
    }
    Ok(())
}

fn cmd_show(
    config: &AppConfig,
    topic: &str,
    format: &OutputFormat,
    source: &SourceArgs,
) -> Result<()> {
    let topic_path = TopicPath::parse(topic)?;
    let store = load_store(config, source)?;

    let entry = match store.get(&topic_path) {
        Ok(entry) => entry,
        Err(e) if e.is_not_found() => {
            let hint = search::search(&store, topic_path.leaf())
                .first()
                .map(|hit| format!(" (did you mean '{}'?)", hit.entry.topic_path))
                .unwrap_or_default();
            return Err(eyre!("{e}{hint}"));
        }
        Err(e) => return Err(e.into()),
    };

    let rendered = match format {
        OutputFormat::Markdown => render::render_markdown(entry),
        OutputFormat::Text => render::render_text(entry),
    };
    print!("{rendered}");
    Ok(())
}

fn cmd_search(config: &AppConfig, query: &str, limit: usize, source: &SourceArgs) -> Result<()> {
    let store = load_store(config, source)?;
    let hits = search::search(&store, query);

    if hits.is_empty() {
        println!("no matches for '{query}'");
        return Ok(());
    }

    for hit in hits.iter().take(limit) {
        println!(
            "{:>3}  {}  ({})",
            hit.score, hit.entry.topic_path, hit.entry.source_file
        );
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn document_started(&self, source_file: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Ingesting [{current}/{total}] {source_file}"));
    }

    fn document_failed(&self, source_file: &str, _error: &NotebaseError) {
        self.spinner.set_message(format!("Skipped {source_file}"));
    }

    fn done(&self, _report: &IngestReport) {
        self.spinner.finish_and_clear();
    }
}
