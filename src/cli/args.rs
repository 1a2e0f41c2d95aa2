//! Top-level argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, order::OrderCommands, repo::RepoCommands, search::SearchArgs,
    template::TemplateArgs,
};

#[derive(Parser, Debug)]
#[command(name = "podrecon")]
#[command(author, version, about = "Reconcile print-on-demand orders against a title repository")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Config file (defaults to ./podrecon.yaml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log verbosity; logs go to stderr
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Output format for listings and reports
    #[arg(long = "format", short = 'f', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process, review and batch-export order files
    #[command(subcommand)]
    Order(OrderCommands),

    /// Look up a single ISBN or Master Order ID
    Search(SearchArgs),

    /// Inspect, export and edit the title repository
    #[command(subcommand)]
    Repo(RepoCommands),

    /// Write the blank order template
    Template(TemplateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table on a terminal listing, TSV otherwise
    #[default]
    Auto,
    Table,
    Json,
    Csv,
    Tsv,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
