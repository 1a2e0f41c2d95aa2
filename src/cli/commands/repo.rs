//! `podrecon repo` command - repository statistics, snapshots and edits

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use clap::{Subcommand, ValueEnum};
use console::style;
use dialoguer::{theme::ColorfulTheme, Password};
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{load_config, load_repository, output_target, write_output};
use crate::cli::helpers::{read_ids_from_stdin, stdin_has_data};
use crate::cli::output::effective_format;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::auth::{EditToken, Sha256Authorizer};
use crate::core::editor::ChangeSet;
use crate::core::export::{snapshot_csv, snapshot_filename, snapshot_json, SnapshotFormat};
use crate::core::ingest::load_repository_file;
use crate::core::repository::{Repository, RepositoryRecord};
use crate::core::session::Session;

#[derive(Subcommand, Debug)]
pub enum RepoCommands {
    /// Show title counts and duplicate ISBNs
    Stats(StatsArgs),

    /// Write a snapshot of the repository
    Export(ExportArgs),

    /// Add or remove titles (password protected)
    Edit(EditArgs),
}

/// Snapshot file format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum SnapshotArg {
    #[default]
    Json,
    Csv,
}

impl From<SnapshotArg> for SnapshotFormat {
    fn from(arg: SnapshotArg) -> Self {
        match arg {
            SnapshotArg::Json => SnapshotFormat::Json,
            SnapshotArg::Csv => SnapshotFormat::Csv,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Repository data file (defaults to `repository:` in the config)
    #[arg(long)]
    pub repo: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Repository data file (defaults to `repository:` in the config)
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Snapshot format
    #[arg(long = "as", value_enum, default_value = "json")]
    pub format: SnapshotArg,

    /// Output file or directory (stdout if omitted)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Repository data file (defaults to `repository:` in the config)
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// File of titles to add (JSON array or CSV); same ISBN replaces
    #[arg(long)]
    pub add: Option<PathBuf>,

    /// ISBNs or Master Order IDs to remove (reads stdin if piped and none given)
    #[arg(long, num_args = 1..)]
    pub remove: Vec<String>,

    /// Read the editor password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,

    /// Where to write the edited repository
    #[arg(long, short = 'o')]
    pub out: PathBuf,

    /// Snapshot format for the edited repository
    #[arg(long = "as", value_enum, default_value = "json")]
    pub format: SnapshotArg,
}

pub fn run(cmd: RepoCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RepoCommands::Stats(args) => run_stats(args, global),
        RepoCommands::Export(args) => run_export(args, global),
        RepoCommands::Edit(args) => run_edit(args, global),
    }
}

fn run_stats(args: StatsArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let repository = load_repository(args.repo.as_deref(), &config)?;
    let stats = repository.stats();

    match effective_format(global.output) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("total,pod_ready,mpi,duplicates");
            println!("{},{},{},{}", stats.total, stats.pod_ready, stats.mpi, stats.duplicates);
        }
        OutputFormat::Tsv => {
            println!("total\tpod_ready\tmpi\tduplicates");
            println!("{}\t{}\t{}\t{}", stats.total, stats.pod_ready, stats.mpi, stats.duplicates);
        }
        OutputFormat::Table | OutputFormat::Auto => {
            println!("{}", style("Repository").bold());
            println!("  {:<16} {}", "Total titles", style(stats.total).cyan());
            println!("  {:<16} {}", "POD Ready", stats.pod_ready);
            println!("  {:<16} {}", "MPI", stats.mpi);
            let duplicates = if stats.duplicates > 0 {
                style(stats.duplicates).yellow()
            } else {
                style(stats.duplicates)
            };
            println!("  {:<16} {}", "Duplicate ISBNs", duplicates);
        }
    }
    Ok(())
}

fn snapshot_bytes(repository: &Repository, format: SnapshotFormat) -> Result<Vec<u8>> {
    match format {
        SnapshotFormat::Json => {
            let mut json = snapshot_json(repository.records()).into_diagnostic()?;
            json.push('\n');
            Ok(json.into_bytes())
        }
        SnapshotFormat::Csv => snapshot_csv(repository.records()).into_diagnostic(),
    }
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let repository = load_repository(args.repo.as_deref(), &config)?;
    let format = SnapshotFormat::from(args.format);

    let bytes = snapshot_bytes(&repository, format)?;
    let name = snapshot_filename(Local::now().naive_local(), format);
    write_output(output_target(args.out.as_deref(), &name).as_deref(), &bytes)
}

/// Parse the additions file into records
fn load_additions(path: &Path, max_text_len: usize) -> Result<Vec<RepositoryRecord>> {
    let rows = load_repository_file(path)?;
    Ok(rows
        .iter()
        .map(|row| RepositoryRecord::from_raw(row, max_text_len))
        .collect())
}

fn read_password(from_stdin: bool) -> Result<String> {
    if from_stdin {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).into_diagnostic()?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Editor password")
        .interact()
        .into_diagnostic()
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let authorizer = Sha256Authorizer::from_config(config.editor.password_sha256.as_deref())?;

    let secret = read_password(args.password_stdin)?;
    let token = EditToken::grant(&authorizer, &secret, config.session_ttl(), Utc::now())?;
    tracing::info!(
        issued_at = %token.issued_at(),
        expires_at = %token.expires_at(),
        "edit session granted"
    );

    let repository = load_repository(args.repo.as_deref(), &config)?;
    let mut session = Session::new(repository, config.limits.clone());

    let additions = match &args.add {
        Some(path) => load_additions(path, config.limits.max_description_length)?,
        None => Vec::new(),
    };
    let mut removals = args.remove.clone();
    if removals.is_empty() && !args.password_stdin && stdin_has_data() {
        removals = read_ids_from_stdin().unwrap_or_default();
    }

    let changes = ChangeSet {
        additions,
        removals,
    };
    if changes.is_empty() {
        eprintln!("{} Nothing to change", style("!").yellow());
    }

    let report = session.apply_edit(&changes, &token, Utc::now())?;

    let bytes = snapshot_bytes(session.repository(), SnapshotFormat::from(args.format))?;
    write_output(Some(&args.out), &bytes)?;

    if global.output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    eprintln!(
        "{} {} added, {} replaced, {} removed ({} titles now)",
        style("✓").green(),
        report.added,
        report.replaced,
        report.removed,
        session.repository().len()
    );
    for id in &report.unmatched_removals {
        eprintln!("{} '{}' not found in repository", style("!").yellow(), id);
    }
    Ok(())
}
