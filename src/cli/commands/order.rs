//! `podrecon order` command - process, review and batch-export order files

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{
    load_config, load_repository, output_target, upload_parsers, write_output,
};
use crate::cli::filters::{SortArg, StatusFilterArg};
use crate::cli::helpers::parse_line_numbers;
use crate::cli::output::{effective_format, lines_delimited, lines_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::archive::{export_directory, BatchEntry, DirectorySink};
use crate::core::config::Config;
use crate::core::export::{order_filename, ExportOutcome};
use crate::core::ingest::Upload;
use crate::core::mutator::{OrderFilter, OrderList, SortKey, StatusFilter};
use crate::core::order::{BatchSummary, OrderLine};
use crate::core::session::Session;

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// Match an order file against the repository and export it
    Process(ProcessArgs),

    /// Interactively review an order before exporting
    Review(ReviewArgs),

    /// Export every order file in a directory
    Batch(BatchArgs),
}

#[derive(clap::Args, Debug)]
pub struct ProcessArgs {
    /// Order spreadsheet (.csv, .xlsx or .xls)
    pub file: PathBuf,

    /// Order reference written on every exported row
    #[arg(long = "ref", short = 'r')]
    pub order_ref: String,

    /// Repository data file (defaults to `repository:` in the config)
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Line numbers to delete before export, comma separated
    #[arg(long, short = 'd')]
    pub delete: Option<String>,

    /// Sort the order before numbering the export
    #[arg(long, short = 's')]
    pub sort: Option<SortArg>,

    /// Status filter for the preview
    #[arg(long, default_value = "all")]
    pub filter: StatusFilterArg,

    /// Paper type filter for the preview
    #[arg(long)]
    pub paper: Option<String>,

    /// Write the export here (a directory gets a timestamped file name)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Print the order lines instead of the export
    #[arg(long)]
    pub preview: bool,
}

#[derive(clap::Args, Debug)]
pub struct ReviewArgs {
    /// Order spreadsheet (.csv, .xlsx or .xls)
    pub file: PathBuf,

    /// Order reference written on every exported row
    #[arg(long = "ref", short = 'r')]
    pub order_ref: String,

    /// Repository data file (defaults to `repository:` in the config)
    #[arg(long)]
    pub repo: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// Directory of order files; each file name is its order reference
    pub dir: PathBuf,

    /// Directory the exports are written to
    #[arg(long, short = 'o')]
    pub out: PathBuf,

    /// Repository data file (defaults to `repository:` in the config)
    #[arg(long)]
    pub repo: Option<PathBuf>,
}

pub fn run(cmd: OrderCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        OrderCommands::Process(args) => run_process(args, global),
        OrderCommands::Review(args) => run_review(args, global),
        OrderCommands::Batch(args) => run_batch(args, global),
    }
}

/// Load config and repository, then upload the order file into a session
fn open_session(
    file: &Path,
    order_ref: &str,
    repo: Option<&Path>,
    global: &GlobalOpts,
) -> Result<(Config, Session)> {
    let config = load_config(global)?;
    let repository = load_repository(repo, &config)?;
    let mut session = Session::new(repository, config.limits.clone());

    let upload = Upload::read(file, config.limits.max_file_size)?;
    let summary = session.upload(&upload, order_ref, &upload_parsers())?;
    print_summary(&summary);

    Ok((config, session))
}

fn print_summary(summary: &BatchSummary) {
    let marker = if summary.not_available == 0 {
        style("✓").green()
    } else {
        style("!").yellow()
    };
    eprintln!("{} {}", marker, summary);
}

fn run_process(args: ProcessArgs, global: &GlobalOpts) -> Result<()> {
    let (config, mut session) =
        open_session(&args.file, &args.order_ref, args.repo.as_deref(), global)?;

    if let Some(orders) = session.orders_mut() {
        if let Some(list) = &args.delete {
            let numbers = parse_line_numbers(list).map_err(|e| miette::miette!("{}", e))?;
            let removed = delete_line_numbers(orders, &numbers);
            eprintln!("{} Deleted {} line(s)", style("✓").green(), removed);
        }
        if let Some(sort) = args.sort {
            orders.toggle_sort(SortKey::from(sort));
        }
    }

    let Some(orders) = session.orders() else {
        return Ok(());
    };

    if args.preview {
        let filter = OrderFilter::new(StatusFilter::from(args.filter), args.paper.clone());
        let view: Vec<&OrderLine> = orders.view(&filter).into_iter().map(|(_, l)| l).collect();
        print_lines(&view, global.output)?;
        if args.out.is_none() {
            return Ok(());
        }
    }

    let now = Local::now().naive_local();
    match session.export(&config.customer, now.date()) {
        ExportOutcome::Ready(export) => {
            let bytes = export.to_csv().into_diagnostic()?;
            let target = output_target(args.out.as_deref(), &order_filename(now));
            write_output(target.as_deref(), &bytes)?;
            if export.excluded > 0 {
                eprintln!(
                    "{} {} unavailable line(s) left out of the export",
                    style("!").yellow(),
                    export.excluded
                );
            }
        }
        ExportOutcome::NothingToExport { .. } => warn_nothing_to_export(),
    }
    Ok(())
}

fn warn_nothing_to_export() {
    eprintln!(
        "{} No available items to export. All items are marked as Not Available.",
        style("!").yellow()
    );
}

/// Delete by displayed line number; unknown numbers are ignored
fn delete_line_numbers(orders: &mut OrderList, numbers: &[u32]) -> usize {
    let positions: Vec<usize> = numbers
        .iter()
        .filter_map(|&n| orders.position_of(n))
        .collect();
    orders.delete_many(&positions)
}

fn print_lines(lines: &[&OrderLine], format: OutputFormat) -> Result<()> {
    match effective_format(format) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(lines).into_diagnostic()?;
            println!("{}", json);
        }
        format @ (OutputFormat::Csv | OutputFormat::Tsv) => {
            let delimiter = if format == OutputFormat::Csv { b',' } else { b'\t' };
            let text = lines_delimited(lines.iter().copied(), delimiter).into_diagnostic()?;
            print!("{}", text);
        }
        OutputFormat::Table | OutputFormat::Auto => {
            if lines.is_empty() {
                println!("No order lines match the current filter.");
            } else {
                println!("{}", lines_table(lines.iter().copied()));
            }
        }
    }
    Ok(())
}

fn run_review(args: ReviewArgs, global: &GlobalOpts) -> Result<()> {
    let (config, mut session) =
        open_session(&args.file, &args.order_ref, args.repo.as_deref(), global)?;
    let theme = ColorfulTheme::default();
    let mut filter = OrderFilter::default();

    loop {
        let Some(orders) = session.orders() else {
            return Ok(());
        };
        let view: Vec<(usize, &OrderLine)> = orders.view(&filter);
        let lines: Vec<&OrderLine> = view.iter().map(|(_, l)| *l).collect();
        println!("{}", lines_table(lines.iter().copied()));
        if filter.is_active() {
            eprintln!("Showing {} of {} lines", lines.len(), orders.len());
        }
        eprintln!("{}", orders.summary());

        let sort_label = match orders.sorted_by() {
            Some(_) => "Restore upload order",
            None => "Sort by paper type",
        };
        let actions = [
            "Delete lines",
            sort_label,
            "Filter by status",
            "Filter by paper type",
            "Export",
            "Quit",
        ];
        let choice = Select::with_theme(&theme)
            .with_prompt("Action")
            .items(&actions)
            .default(0)
            .interact()
            .into_diagnostic()?;

        match choice {
            0 => {
                let labels: Vec<String> = view
                    .iter()
                    .map(|(_, l)| format!("{}  {}  {}", l.line_label(), l.isbn, l.description))
                    .collect();
                let picked = MultiSelect::with_theme(&theme)
                    .with_prompt("Lines to delete (space to select)")
                    .items(&labels)
                    .interact()
                    .into_diagnostic()?;
                let positions: Vec<usize> = picked.iter().map(|&i| view[i].0).collect();
                if let Some(orders) = session.orders_mut() {
                    let removed = orders.delete_many(&positions);
                    eprintln!("{} Deleted {} line(s)", style("✓").green(), removed);
                }
            }
            1 => {
                if let Some(orders) = session.orders_mut() {
                    orders.toggle_sort(SortKey::PaperDescription);
                }
            }
            2 => {
                let options = [
                    StatusFilterArg::All,
                    StatusFilterArg::Mpi,
                    StatusFilterArg::NotAvailable,
                    StatusFilterArg::PodReady,
                ];
                let names: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                let picked = Select::with_theme(&theme)
                    .with_prompt("Status filter")
                    .items(&names)
                    .default(0)
                    .interact()
                    .into_diagnostic()?;
                filter.status = StatusFilter::from(options[picked]);
            }
            3 => {
                let items = paper_choices(orders);
                let picked = Select::with_theme(&theme)
                    .with_prompt("Paper type")
                    .items(&items)
                    .default(0)
                    .interact()
                    .into_diagnostic()?;
                let paper = (picked > 0).then(|| items[picked].clone());
                filter = OrderFilter::new(filter.status, paper);
            }
            4 => {
                let now = Local::now().naive_local();
                match session.export(&config.customer, now.date()) {
                    ExportOutcome::Ready(export) => {
                        let name: String = Input::with_theme(&theme)
                            .with_prompt("Export file")
                            .default(order_filename(now))
                            .interact_text()
                            .into_diagnostic()?;
                        let bytes = export.to_csv().into_diagnostic()?;
                        write_output(Some(Path::new(&name)), &bytes)?;
                        return Ok(());
                    }
                    ExportOutcome::NothingToExport { .. } => warn_nothing_to_export(),
                }
            }
            _ => {
                let quit = Confirm::with_theme(&theme)
                    .with_prompt("Quit without exporting?")
                    .default(false)
                    .interact()
                    .into_diagnostic()?;
                if quit {
                    session.clear();
                    return Ok(());
                }
            }
        }
    }
}

const ALL_PAPER_TYPES: &str = "All paper types";

/// Paper filter menu: "all" first, then each paper type in the order
fn paper_choices(orders: &OrderList) -> Vec<String> {
    std::iter::once(ALL_PAPER_TYPES)
        .chain(orders.paper_types())
        .map(String::from)
        .collect()
}

fn run_batch(args: BatchArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let repository = load_repository(args.repo.as_deref(), &config)?;
    let mut sink = DirectorySink::create(&args.out).into_diagnostic()?;

    let report = export_directory(
        &args.dir,
        &repository,
        &upload_parsers(),
        &config.limits,
        &config.customer,
        Local::now().date_naive(),
        &mut sink,
    );

    if global.output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    for entry in &report.entries {
        match entry {
            BatchEntry::Exported {
                source,
                archive_name,
                lines,
                excluded,
            } => println!(
                "{} {} -> {} ({} lines, {} excluded)",
                style("✓").green(),
                source,
                style(archive_name).cyan(),
                lines,
                excluded
            ),
            BatchEntry::NothingToExport { source, .. } => {
                println!("{} {}: nothing to export", style("!").yellow(), source)
            }
            BatchEntry::Failed { source, error } => {
                println!("{} {}: {}", style("✗").red(), source, error)
            }
        }
    }
    eprintln!(
        "{} of {} file(s) exported to {}",
        report.exported(),
        report.entries.len(),
        style(sink.root().display()).cyan()
    );
    Ok(())
}
