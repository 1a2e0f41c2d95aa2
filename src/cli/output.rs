//! Output formatting utilities

use std::io::IsTerminal;

use tabled::{settings::Style, Table, Tabled};

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;
use crate::core::order::OrderLine;

/// Determine the effective output format based on context
///
/// `Auto` renders a table for a terminal and TSV when piped.
pub fn effective_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if std::io::stdout().is_terminal() {
                OutputFormat::Table
            } else {
                OutputFormat::Tsv
            }
        }
        other => other,
    }
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "ISBN")]
    isbn: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Paper")]
    paper: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Status")]
    status: String,
}

/// ISBN column value: the match, or what was asked for
fn display_isbn(line: &OrderLine) -> &str {
    if line.isbn.is_empty() {
        &line.requested_identifier
    } else {
        &line.isbn
    }
}

/// Render order lines as a rounded table
pub fn lines_table<'a>(lines: impl IntoIterator<Item = &'a OrderLine>) -> String {
    let rows: Vec<LineRow> = lines
        .into_iter()
        .map(|line| LineRow {
            line: line.line_label(),
            isbn: display_isbn(line).to_string(),
            description: truncate_str(&line.description, 40),
            paper: truncate_str(&line.paper_description, 20),
            quantity: line.quantity,
            status: line.status.clone(),
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

/// Render order lines as delimited text: line, ISBN, description, qty, status
pub fn lines_delimited<'a>(
    lines: impl IntoIterator<Item = &'a OrderLine>,
    delimiter: u8,
) -> Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(["Line", "ISBN", "Description", "Paper", "Qty", "Status"])?;
    for line in lines {
        writer.write_record([
            line.line_label().as_str(),
            display_isbn(line),
            line.description.as_str(),
            line.paper_description.as_str(),
            line.quantity.to_string().as_str(),
            line.status.as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::index::LookupMethod;

    fn line(isbn: &str, requested: &str) -> OrderLine {
        OrderLine {
            line_number: 1,
            isbn: isbn.to_string(),
            requested_identifier: requested.to_string(),
            description: "Cleopatra's Sister".to_string(),
            status: "POD Ready".to_string(),
            paper_description: "Munken".to_string(),
            alternate_order_id: String::new(),
            quantity: 2,
            available: !isbn.is_empty(),
            lookup_method: LookupMethod::Identifier,
            consolidated_count: 1,
            original_index: 0,
        }
    }

    #[test]
    fn test_effective_format_passthrough() {
        assert_eq!(effective_format(OutputFormat::Json), OutputFormat::Json);
        assert_ne!(effective_format(OutputFormat::Auto), OutputFormat::Auto);
    }

    #[test]
    fn test_lines_table() {
        let table = lines_table(&[line("9780140175936", "9780140175936")]);
        assert!(table.contains("Line"));
        assert!(table.contains("001"));
        assert!(table.contains("Cleopatra's Sister"));
    }

    #[test]
    fn test_lines_delimited_shows_requested_when_unmatched() {
        let text = lines_delimited(&[line("", "9789999999999")], b'\t').unwrap();
        assert_eq!(
            text,
            "Line\tISBN\tDescription\tPaper\tQty\tStatus\n001\t9789999999999\tCleopatra's Sister\tMunken\t2\tPOD Ready\n"
        );
    }
}
