//! fvh - A minimal line-level file version handler.
//!
//! Usage:
//!   fvh init                     Create a repository in the current directory
//!   fvh add <PATH>...            Track files
//!   fvh add --all                Track every file under the repository root
//!   fvh change -d <TEXT>         Record a change for every tracked file
//!   fvh show <FILE> [--at <ID>]  Print a file as rebuilt from its history
//!   fvh log [FILE]               List recorded changes
//!   fvh status                   Compare tracked files with their history
//!   fvh --help                   Show help
//!
//! The single-dash spellings `add -all` and `change -desc <TEXT>` are also
//! accepted.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use fvh_store::{ChangeId, FileState, Prefix, Repository};

#[derive(Parser)]
#[command(
    name = "fvh",
    version,
    about = "A minimal line-level file version handler",
    long_about = "fvh records line-level changes of tracked files.\n\n\
                  Run `fvh init` in a directory, track files with `fvh add`, \
                  then record changes with `fvh change -d <TEXT>`."
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a repository in the current directory
    Init,

    /// Track files for change recording
    Add {
        /// Files to track
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        paths: Vec<PathBuf>,

        /// Track every file under the repository root
        #[arg(short, long)]
        all: bool,
    },

    /// Record a change for every tracked file
    Change {
        /// Description stored with the change
        #[arg(short, long)]
        desc: String,
    },

    /// Print a tracked file as rebuilt from its history
    Show {
        /// Tracked path or file prefix
        target: String,

        /// Stop at this change id instead of the latest record
        #[arg(long)]
        at: Option<String>,
    },

    /// List recorded changes, oldest first
    Log {
        /// Limit to one tracked path or file prefix
        target: Option<String>,
    },

    /// Compare tracked files with their recorded history
    Status,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse_from(std::env::args_os().map(long_flag));
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Cannot read current directory")?;

    match cli.command {
        Command::Init => run_init(&cwd)?,
        Command::Add { paths, all } => run_add(&cwd, &paths, all)?,
        Command::Change { desc } => run_change(&cwd, &desc)?,
        Command::Show { target, at } => run_show(&cwd, &target, at.as_deref())?,
        Command::Log { target } => run_log(&cwd, target.as_deref())?,
        Command::Status => run_status(&cwd)?,
    }

    Ok(())
}

/// Rewrite the single-dash long flags to the form clap parses.
fn long_flag(arg: OsString) -> OsString {
    match arg.to_str() {
        Some("-all") => OsString::from("--all"),
        Some("-desc") => OsString::from("--desc"),
        _ => arg,
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_repository(cwd: &Path) -> Result<Repository> {
    let repo = Repository::discover(cwd)
        .context("Not inside an fvh repository (run `fvh init` first)")?;
    tracing::debug!(root = %repo.root().display(), "opened repository");
    Ok(repo)
}

/// Create the repository.
fn run_init(cwd: &Path) -> Result<()> {
    let repo = Repository::init(cwd).context("Failed to initialize repository")?;
    println!("Initialized fvh repository in {}", repo.root().display());
    Ok(())
}

/// Track files.
fn run_add(cwd: &Path, paths: &[PathBuf], all: bool) -> Result<()> {
    let repo = open_repository(cwd)?;

    let report = if all {
        eprintln!("Collecting files under {}...", repo.root().display());
        repo.add_all().context("Failed to add files")?
    } else {
        repo.add(paths).context("Failed to add files")?
    };

    for (prefix, path) in &report.registered {
        println!(" {}  {}", prefix, path.display());
    }
    println!(
        "{} file(s) added, {} already tracked",
        report.registered.len(),
        report.skipped.len()
    );
    Ok(())
}

/// Record a change.
fn run_change(cwd: &Path, description: &str) -> Result<()> {
    let repo = open_repository(cwd)?;

    if repo.tracked_files()?.is_empty() {
        tracing::warn!("no tracked files, use `fvh add` first");
        return Ok(());
    }

    let report = repo
        .record_change(description)
        .context("Failed to record change")?;

    for change in &report.recorded {
        println!(
            " {}  {:<40} +{} -{}",
            change.change_id,
            truncate(&change.path.display().to_string(), 40),
            change.lines_set,
            change.lines_deleted
        );
    }
    for (_, path) in &report.unchanged {
        println!(" {:<16}  {}", "unchanged", path.display());
    }
    println!(
        "{} record(s), {} line edit(s)",
        report.recorded.len(),
        report.total_edits()
    );
    Ok(())
}

/// Print reconstructed content.
fn run_show(cwd: &Path, target: &str, at: Option<&str>) -> Result<()> {
    let repo = open_repository(cwd)?;
    let prefix = repo.resolve_from(target, cwd)?;

    let lines = match at {
        Some(change) => repo.reconstruct_at(&prefix, &ChangeId::from(change))?,
        None => repo.reconstruct(&prefix)?,
    };

    print!("{}", lines.to_text());
    Ok(())
}

/// List change records.
fn run_log(cwd: &Path, target: Option<&str>) -> Result<()> {
    let repo = open_repository(cwd)?;
    let prefix = target.map(|t| repo.resolve_from(t, cwd)).transpose()?;

    let paths: HashMap<Prefix, PathBuf> = repo
        .tracked_files()?
        .into_iter()
        .map(|(prefix, file)| (prefix, file.path))
        .collect();
    let history = repo.history(prefix.as_ref())?;

    if history.is_empty() {
        println!(" No changes recorded.");
        return Ok(());
    }

    for (id, record) in &history {
        let path = paths
            .get(&record.owner)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| record.owner.to_string());
        let deleted = record.payload.deleted_count();
        println!(
            " {}  {}  {:<30} +{} -{}  {}",
            id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            truncate(&path, 30),
            record.payload.len() - deleted,
            deleted,
            record.description
        );
    }
    Ok(())
}

/// Show tracked file states.
fn run_status(cwd: &Path) -> Result<()> {
    let repo = open_repository(cwd)?;
    let statuses = repo.status()?;

    if statuses.is_empty() {
        println!(" No tracked files.");
        return Ok(());
    }

    let mut dirty = 0;
    for status in &statuses {
        if status.state != FileState::Clean {
            dirty += 1;
        }
        println!(
            " {:<9} {}  {} ({} change(s))",
            status.state.label(),
            status.prefix,
            status.path.display(),
            status.change_count
        );
    }

    if dirty > 0 {
        println!();
        println!("{} of {} file(s) differ from their history", dirty, statuses.len());
    }
    Ok(())
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 1).collect();
        format!("{}…", kept)
    }
}
