//! `podrecon search` command - quick lookup of one title

use std::path::PathBuf;

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::json;

use crate::cli::commands::utils::{load_config, load_repository};
use crate::cli::output::effective_format;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::order::NOT_SPECIFIED;

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// ISBN (any spelling) or Master Order ID
    pub query: String,

    /// Repository data file (defaults to `repository:` in the config)
    #[arg(long)]
    pub repo: Option<PathBuf>,
}

pub fn run(args: SearchArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let repository = load_repository(args.repo.as_deref(), &config)?;

    let Some(hit) = repository.index().search(&args.query) else {
        eprintln!(
            "{} No match for '{}' by ISBN or Master Order ID",
            style("✗").red(),
            args.query.trim()
        );
        return Ok(());
    };
    let record = hit.record;
    let paper = if record.paper_description.is_empty() {
        NOT_SPECIFIED
    } else {
        record.paper_description.as_str()
    };

    match effective_format(global.output) {
        OutputFormat::Json => {
            let value = json!({
                "method": hit.method,
                "record": &**record,
            });
            println!("{}", serde_json::to_string_pretty(&value).into_diagnostic()?);
        }
        format @ (OutputFormat::Csv | OutputFormat::Tsv) => {
            let delimiter = if format == OutputFormat::Csv { b',' } else { b'\t' };
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(std::io::stdout());
            writer
                .write_record([
                    record.isbn.as_str(),
                    record.alternate_order_id.as_str(),
                    record.title.as_str(),
                    record.status.as_str(),
                    paper,
                ])
                .into_diagnostic()?;
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Table | OutputFormat::Auto => {
            println!(
                "{} Found by {}",
                style("✓").green(),
                style(hit.method).cyan()
            );
            println!("  {:<16} {}", "ISBN", record.isbn);
            println!("  {:<16} {}", "Master Order ID", record.alternate_order_id);
            println!("  {:<16} {}", "Title", style(&record.title).bold());
            println!("  {:<16} {}", "Status", record.status);
            println!("  {:<16} {}", "Paper", paper);
        }
    }
    Ok(())
}
