//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod filters;
pub mod helpers;
pub mod output;

pub use args::{Cli, Commands, GlobalOpts, LogLevel, OutputFormat};
pub use filters::{SortArg, StatusFilterArg};
