//! canonfile - content-addressed organizer and deduplicator for photos and videos.
//!
//! Usage:
//!   canonfile organize --src DIR --dst DIR [--dry[=false]] [--copy] [--deletedups]
//!   canonfile approx --dir DIR [--percent 95] [--deletedups]
//!   canonfile --help

use std::path::{Path, PathBuf};
use std::thread;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use canonfile_analyze::{ApproximateMatcher, MatchConfig, MatchReport};
use canonfile_core::{DEFAULT_THRESHOLD, DEFAULT_WORKERS, HashAlgorithm};
use canonfile_organize::{ItemOutcome, OrganizeConfig, OrganizeProgress, OrganizeReport, Organizer};

#[derive(Parser)]
#[command(
    name = "canonfile",
    version,
    about = "Content-addressed organizer and deduplicator for photos and videos",
    long_about = "canonfile files every photo and video under a canonical name derived \
                  from its content digest and capture time, so the destination tree \
                  itself is the dedup index.\n\n\
                  `organize` sorts a source tree into the destination layout; \
                  `approx` finds near-identical videos by block match ratio."
)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Move or copy media into the canonical layout
    Organize(OrganizeArgs),

    /// Find near-identical files by block digest match ratio
    Approx(ApproxArgs),
}

#[derive(Args)]
struct OrganizeArgs {
    /// Source directory
    #[arg(long)]
    src: Option<PathBuf>,

    /// Destination root
    #[arg(long)]
    dst: Option<PathBuf>,

    /// Only report what would happen (pass `--dry false` to act)
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    dry: bool,

    /// Copy instead of move
    #[arg(long)]
    copy: bool,

    /// Delete source files already present at the destination
    #[arg(long)]
    deletedups: bool,

    /// Number of workers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    numroutines: usize,

    /// Digest algorithm
    #[arg(long, default_value = "sha256")]
    hash: HashArg,

    /// Stop at the first failed file
    #[arg(long)]
    fail_fast: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args)]
struct ApproxArgs {
    /// Directory to scan
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Delete the earlier file of each matched pair
    #[arg(long)]
    deletedups: bool,

    /// Minimum match ratio in percent
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    percent: f64,

    /// Digest algorithm
    #[arg(long, default_value = "sha256")]
    hash: HashArg,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HashArg {
    Sha256,
    Blake3,
}

impl From<HashArg> for HashAlgorithm {
    fn from(arg: HashArg) -> Self {
        match arg {
            HashArg::Sha256 => HashAlgorithm::Sha256,
            HashArg::Blake3 => HashAlgorithm::Blake3,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Organize(args) => run_organize(args),
        Command::Approx(args) => run_approx(args),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print the help of a subcommand. Used when a required path is missing.
fn print_usage(subcommand: &str) -> Result<()> {
    let mut cli = Cli::command();
    if let Some(cmd) = cli.find_subcommand_mut(subcommand) {
        cmd.print_help()?;
    }
    Ok(())
}

/// Organize a source tree into the destination layout.
fn run_organize(args: OrganizeArgs) -> Result<()> {
    let (Some(src), Some(dst)) = (args.src, args.dst) else {
        return print_usage("organize");
    };

    let config = OrganizeConfig::builder()
        .source(src)
        .destination(dst)
        .dry_run(args.dry)
        .copy(args.copy)
        .delete_duplicates(args.deletedups)
        .workers(args.numroutines)
        .hash(HashAlgorithm::from(args.hash))
        .fail_fast(args.fail_fast)
        .build()
        .context("Invalid organize options")?;

    if config.dry_run {
        eprintln!("Dry run: nothing will be moved, copied or deleted.");
    }

    let organizer = Organizer::new(config);
    let progress = organizer.subscribe();
    let logger = thread::spawn(move || log_progress(progress));

    let result = organizer.run();
    drop(organizer);
    let _ = logger.join();

    let report = result.context("Organize failed")?;

    match args.format {
        OutputFormat::Text => print_organize_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.is_success() {
        bail!(
            "{} file(s) failed{}",
            report.counts.failed,
            if report.aborted { ", batch aborted" } else { "" }
        );
    }
    Ok(())
}

/// Drain progress snapshots until the organizer goes away.
fn log_progress(mut rx: Receiver<OrganizeProgress>) {
    loop {
        match rx.blocking_recv() {
            Ok(progress) => debug!(
                completed = progress.files_completed,
                total = progress.files_total,
                percent = %format!("{:.1}", progress.percentage()),
                "progress"
            ),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_organize_report(report: &OrganizeReport) {
    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} files found, {}",
        report.files_found,
        format_size(report.bytes_found)
    );
    println!(" {}", report.summary());
    println!(" Finished in {:.2}s", report.duration.as_secs_f64());
    println!("{}", "─".repeat(60));

    let collisions: Vec<_> = report
        .items
        .iter()
        .filter(|item| matches!(item.outcome, ItemOutcome::NameCollision { .. }))
        .collect();
    if !collisions.is_empty() {
        println!();
        println!("Name collisions (left in place):");
        for item in collisions {
            println!("  {}", item.source.display());
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("Failures:");
        for failure in &report.failures {
            println!("  {failure}");
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("{} warning(s) during scan", report.warnings.len());
    }
}

/// Find near-identical files under a directory.
fn run_approx(args: ApproxArgs) -> Result<()> {
    let Some(dir) = args.dir else {
        return print_usage("approx");
    };

    let config = MatchConfig::builder()
        .root(dir)
        .threshold(args.percent)
        .delete_duplicates(args.deletedups)
        .hash(HashAlgorithm::from(args.hash))
        .build()
        .context("Invalid approx options")?;

    let root = config.root.clone();
    eprintln!("Comparing files under {}...", root.display());

    let report = ApproximateMatcher::new(config)
        .run()
        .with_context(|| format!("Cannot scan {}", root.display()))?;

    match args.format {
        OutputFormat::Text => {
            let root = root.canonicalize().unwrap_or(root);
            print_match_report(&root, &report);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.errors.is_empty() {
        bail!("{} file(s) could not be processed", report.errors.len());
    }
    Ok(())
}

fn print_match_report(root: &Path, report: &MatchReport) {
    println!();
    for pair in &report.pairs {
        println!(
            "Match: {:6.2}% [{}] [{}]{}",
            pair.ratio,
            relative(root, &pair.earlier),
            relative(root, &pair.later),
            if pair.deleted { " (deleted first)" } else { "" }
        );
    }
    for miss in &report.near_misses {
        println!(
            "Equal size, no match: {:6.2}% [{}] [{}]",
            miss.ratio,
            relative(root, &miss.earlier),
            relative(root, &miss.later)
        );
    }

    println!("{}", "─".repeat(60));
    println!(" {} files analyzed", report.files_analyzed);
    println!(" Matches found: {}", report.pairs.len());
    println!(
        " Potential save: {:.2} MB ({})",
        report.potential_savings_mb(),
        format_size(report.potential_savings)
    );
    println!(" Deleted files: {}", report.deleted);
    println!("{}", "─".repeat(60));

    for error in &report.errors {
        println!("  error: {error}");
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
