//! fairfax-grouper - Groups scanned newspaper files for ingestion.
//!
//! Usage:
//!   ffgroup pre-process [ROOTS]    Stage files not yet post-processed
//!   ffgroup post-process [ROOTS]   Promote finished units
//!   ffgroup list-unique [ROOTS]    List distinct file names in the date window
//!   ffgroup classify NAME...       Show how file names are classified
//!   ffgroup --legend               Explain the progress characters

use std::cell::Cell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use grouper_core::{
    DATE_DISPLAY_FORMAT, FileKind, GrouperConfig, GrouperSettings, TransferMode, classify,
};
use grouper_hash::Blake3Hasher;
use grouper_ops::{
    FsTransfer, LEGEND, ProcessingEvent, ProcessingObserver, TracingObserver,
};
use grouper_process::{
    DuplicateResolver, IngestionStateResolver, ItemFailure, PostProcessReport, PreProcessReport,
    UniqueFileListing, list_unique_files,
};

/// Progress characters per line before wrapping.
const LEGEND_LINE_WIDTH: usize = 100;

#[derive(Parser)]
#[command(
    name = "fairfax-grouper",
    version,
    about = "Groups scanned newspaper files into pre-process and post-process trees",
    long_about = "fairfax-grouper sorts scanned newspaper files by the publication, \
                  edition and date encoded in their names.\n\n\
                  `pre-process` stages files that are not yet in the post-processed \
                  tree, `post-process` promotes units marked with a `done` file."
)]
struct Cli {
    /// TOML settings file; command-line flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format for the run report
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Log every transfer and decision
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the meaning of the progress characters
    #[arg(long)]
    legend: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Stage source files that are not yet post-processed
    PreProcess {
        #[command(flatten)]
        roots: RootArgs,

        /// File mets.xml and other non-PDF files for review
        #[arg(long)]
        include_non_pdf_files: bool,
    },

    /// Promote units marked with a `done` file into the post-processed tree
    PostProcess {
        #[command(flatten)]
        roots: RootArgs,

        /// Also promote unit entries whose names start with `.`
        #[arg(long)]
        include_hidden: bool,
    },

    /// List each distinct archive file name in the date window once
    ListUnique {
        #[command(flatten)]
        roots: RootArgs,
    },

    /// Show how file names are classified
    Classify {
        /// Bare file names (not paths)
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Args)]
struct RootArgs {
    /// Tree holding the files to process
    #[arg(long, short = 's')]
    source_folder: Option<PathBuf>,

    /// Staging tree for files awaiting ingestion
    #[arg(long)]
    target_pre_process_folder: Option<PathBuf>,

    /// Canonical tree of ingested issues
    #[arg(long)]
    target_post_process_folder: Option<PathBuf>,

    /// Tree for files that need a person to look at them
    #[arg(long)]
    for_review_folder: Option<PathBuf>,

    /// First issue date to process (yyyyMMdd)
    #[arg(long)]
    starting_date: Option<String>,

    /// Last issue date to process (yyyyMMdd)
    #[arg(long)]
    ending_date: Option<String>,

    /// Create missing target folders
    #[arg(long)]
    create_targets: bool,

    /// Move files instead of copying them
    #[arg(long)]
    move_files: bool,

    /// Stop at the first file or unit that fails
    #[arg(long)]
    fail_fast: bool,
}

impl RootArgs {
    /// Command-line values as settings, so they layer over a settings file.
    fn to_settings(&self, verbose: bool) -> GrouperSettings {
        GrouperSettings {
            source_root: self.source_folder.clone(),
            pre_process_root: self.target_pre_process_folder.clone(),
            post_process_root: self.target_post_process_folder.clone(),
            for_review_root: self.for_review_folder.clone(),
            starting_date: self.starting_date.clone(),
            ending_date: self.ending_date.clone(),
            create_targets: self.create_targets.then_some(true),
            transfer_mode: self.move_files.then_some(TransferMode::Move),
            verbose: verbose.then_some(true),
            fail_fast: self.fail_fast.then_some(true),
            ..GrouperSettings::default()
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.legend {
        print_legend();
    }

    match &cli.command {
        Some(Command::PreProcess {
            roots,
            include_non_pdf_files,
        }) => {
            let mut overrides = roots.to_settings(cli.verbose);
            overrides.include_non_pdf_files = include_non_pdf_files.then_some(true);
            let settings = load_settings(cli.config.as_deref(), overrides)?;
            run_pre_process(&build_config(&settings)?, cli.format)?;
        }
        Some(Command::PostProcess {
            roots,
            include_hidden,
        }) => {
            let mut overrides = roots.to_settings(cli.verbose);
            overrides.include_hidden_unit_entries = include_hidden.then_some(true);
            let settings = load_settings(cli.config.as_deref(), overrides)?;
            run_post_process(&build_config(&settings)?, cli.format)?;
        }
        Some(Command::ListUnique { roots }) => {
            let mut settings = load_settings(cli.config.as_deref(), roots.to_settings(cli.verbose))?;
            // Only the source tree is read; the other roots just need a value.
            if let Some(source) = settings.source_root.clone() {
                for root in [
                    &mut settings.pre_process_root,
                    &mut settings.post_process_root,
                    &mut settings.for_review_root,
                ] {
                    root.get_or_insert_with(|| source.clone());
                }
            }
            run_list_unique(&build_config(&settings)?, cli.format)?;
        }
        Some(Command::Classify { names }) => {
            run_classify(names, cli.format)?;
        }
        None => {
            if !cli.legend {
                Cli::command().print_help()?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Settings file first, then command-line values on top.
fn load_settings(settings_file: Option<&Path>, overrides: GrouperSettings) -> Result<GrouperSettings> {
    let file = match settings_file {
        Some(path) => GrouperSettings::load(path)
            .wrap_err_with(|| format!("Failed to load settings from {}", path.display()))?,
        None => GrouperSettings::default(),
    };
    Ok(file.merge(overrides))
}

fn build_config(settings: &GrouperSettings) -> Result<GrouperConfig> {
    let mut builder = GrouperConfig::builder();
    settings.apply(&mut builder)?;

    let config = builder.build().wrap_err("Incomplete configuration")?;
    config.check()?;
    info!(
        "source={} pre={} post={} review={} dates={} mode={}",
        config.source_root.display(),
        config.pre_process_root.display(),
        config.post_process_root.display(),
        config.for_review_root.display(),
        config.window_description(),
        config.transfer_mode
    );
    Ok(config)
}

/// Run the pre-process pass and print its report.
fn run_pre_process(config: &GrouperConfig, format: OutputFormat) -> Result<()> {
    let hasher = Blake3Hasher::from_config(config);
    let transfer = FsTransfer::from_config(config);
    let observer = progress_observer(format);

    let report = DuplicateResolver::new(config, &hasher, &transfer, observer.as_ref())
        .run()
        .wrap_err("Pre-processing failed")?;
    finish_progress_line(format);

    match format {
        OutputFormat::Text => print_pre_process(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    fail_on_item_failures(&report.failures)
}

/// Run the post-process pass and print its report.
fn run_post_process(config: &GrouperConfig, format: OutputFormat) -> Result<()> {
    let transfer = FsTransfer::from_config(config);
    let observer = progress_observer(format);

    let report = IngestionStateResolver::new(config, &transfer, observer.as_ref())
        .run()
        .wrap_err("Post-processing failed")?;
    finish_progress_line(format);

    match format {
        OutputFormat::Text => print_post_process(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    fail_on_item_failures(&report.failures)
}

/// List distinct archive file names.
fn run_list_unique(config: &GrouperConfig, format: OutputFormat) -> Result<()> {
    let listing =
        list_unique_files(config, &TracingObserver).wrap_err("Listing unique files failed")?;

    match format {
        OutputFormat::Text => print_unique(&listing),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
    }

    fail_on_item_failures(&listing.failures)
}

/// Classify bare file names.
fn run_classify(names: &[String], format: OutputFormat) -> Result<()> {
    let mut invalid = 0;
    let mut results = Vec::with_capacity(names.len());

    for name in names {
        let result = classify(name);
        if result.is_err() {
            invalid += 1;
        }

        match format {
            OutputFormat::Text => match &result {
                Ok(kind) => println!("{name}: {}", describe_kind(kind)),
                Err(err) => println!("{name}: error: {err}"),
            },
            OutputFormat::Json => results.push(match result {
                Ok(kind) => serde_json::json!({ "name": name, "kind": kind }),
                Err(err) => serde_json::json!({ "name": name, "error": err.to_string() }),
            }),
        }
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if invalid > 0 {
        bail!("{invalid} name(s) could not be classified");
    }
    Ok(())
}

fn describe_kind(kind: &FileKind) -> String {
    match kind {
        FileKind::FairfaxPdf(identity) => format!(
            "{} title={} edition={} date={} qualifier={:?} extension={}",
            kind.label(),
            identity.title_code(),
            identity.edition_code(),
            identity.date().format(DATE_DISPLAY_FORMAT),
            identity.qualifier(),
            identity.extension()
        ),
        other => other.label().to_string(),
    }
}

fn print_legend() {
    println!("Progress legend:");
    for (symbol, meaning) in LEGEND {
        println!("  {symbol}  {meaning}");
    }
    println!();
}

fn print_pre_process(report: &PreProcessReport) {
    println!();
    println!("{}", "─".repeat(60));
    println!(" pre-process {}", report.source_root.display());
    println!(
        " {} files found, {} archive files decided in {:.2}s",
        report.files_found,
        report.decided(),
        report.elapsed.as_secs_f64()
    );
    println!("{}", "─".repeat(60));

    for (disposition, count) in &report.dispositions {
        println!("  {:<30} {:>8}", disposition.to_string(), count);
    }
    if report.mets_sent_to_review + report.other_sent_to_review > 0 {
        println!(
            "  {:<30} {:>8}",
            "unprocessed mets.xml", report.mets_sent_to_review
        );
        println!(
            "  {:<30} {:>8}",
            "unprocessed other", report.other_sent_to_review
        );
    }
    if report.non_pdf_ignored > 0 {
        println!("  {:<30} {:>8}", "non-pdf ignored", report.non_pdf_ignored);
    }
    println!();
    println!(
        " {} transferred, {} source files deleted",
        format_size(report.bytes_transferred),
        report.sources_deleted
    );
    print_failures(&report.failures);
}

fn print_post_process(report: &PostProcessReport) {
    println!();
    println!("{}", "─".repeat(60));
    println!(" post-process {}", report.source_root.display());
    println!(
        " {} sentinels found, {} units promoted in {:.2}s",
        report.sentinels_found,
        report.promoted.len(),
        report.elapsed.as_secs_f64()
    );
    println!("{}", "─".repeat(60));

    for unit in &report.promoted {
        let marker = if unit.renamed { "#" } else { " " };
        println!(
            " {marker} {} -> {} ({} entries)",
            unit.unit.display(),
            unit.target.display(),
            unit.entries
        );
    }
    for sentinel in &report.skipped_sentinels {
        println!("   skipped {}", sentinel.display());
    }
    println!();
    println!(
        " {} transferred, {} numbered units, {} source units deleted",
        format_size(report.bytes_transferred),
        report.units_renamed(),
        report.units_deleted
    );
    print_failures(&report.failures);
}

fn print_unique(listing: &UniqueFileListing) {
    for file in &listing.files {
        println!(
            "{}  {}",
            file.date.format(DATE_DISPLAY_FORMAT),
            file.name
        );
    }
    eprintln!(
        "{} unique of {} files found under {}",
        listing.files.len(),
        listing.files_found,
        listing.source_root.display()
    );
    print_failures(&listing.failures);
}

fn print_failures(failures: &[ItemFailure]) {
    if failures.is_empty() {
        return;
    }
    println!();
    println!("{} failure(s):", failures.len());
    for failure in failures {
        println!("  {failure}");
    }
}

fn fail_on_item_failures(failures: &[ItemFailure]) -> Result<()> {
    if !failures.is_empty() {
        bail!("{} file(s) or unit(s) could not be processed", failures.len());
    }
    Ok(())
}

/// Legend characters on stdout for text output; logging only for JSON.
fn progress_observer(format: OutputFormat) -> Box<dyn ProcessingObserver> {
    match format {
        OutputFormat::Text => Box::new(LegendObserver::default()),
        OutputFormat::Json => Box::new(TracingObserver),
    }
}

fn finish_progress_line(format: OutputFormat) {
    if format == OutputFormat::Text {
        println!();
    }
}

/// Prints one legend character per event and a line per status update.
#[derive(Default)]
struct LegendObserver {
    column: Cell<usize>,
}

impl LegendObserver {
    fn end_line(&self) {
        if self.column.get() > 0 {
            println!();
            self.column.set(0);
        }
    }
}

impl ProcessingObserver for LegendObserver {
    fn on_event(&self, event: &ProcessingEvent) {
        match event {
            ProcessingEvent::Status {
                phase,
                completed,
                total,
            } => {
                self.end_line();
                println!("{phase}: {completed}/{total}");
            }
            other => {
                TracingObserver.on_event(other);
                if let Some(symbol) = other.symbol() {
                    print!("{symbol}");
                    let column = self.column.get() + 1;
                    if column >= LEGEND_LINE_WIDTH {
                        println!();
                        self.column.set(0);
                    } else {
                        self.column.set(column);
                    }
                    let _ = io::stdout().flush();
                }
            }
        }
    }
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
