//! podrecon: print-on-demand order reconciliation
//!
//! Matches uploaded order spreadsheets against a book repository by ISBN or
//! Master Order ID, consolidates duplicate lines, and exports the fixed-format
//! CSV a printer ingests.

pub mod cli;
pub mod core;
