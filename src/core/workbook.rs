//! `.xlsx`/`.xls` decoding with calamine
//!
//! The first worksheet is read; its first row holds the headers. Blank rows
//! are skipped and integral numbers come out as JSON integers, so an ISBN
//! stored as a number keeps its digits.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Number, Value};

use crate::core::fields::RawRow;
use crate::core::ingest::{IngestError, RowParser, Upload};

/// Largest float that still converts to an exact integer
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookRowParser;

impl RowParser for WorkbookRowParser {
    fn parse(&self, upload: &Upload) -> Result<Vec<RawRow>, IngestError> {
        let parse_error = |message: String| IngestError::Parse {
            name: upload.name.clone(),
            message,
        };

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(upload.bytes.as_slice()))
            .map_err(|e| parse_error(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| parse_error("workbook has no worksheets".to_string()))?
            .map_err(|e| parse_error(e.to_string()))?;

        let mut sheet_rows = range.rows();
        let Some(header_row) = sheet_rows.next() else {
            return Ok(Vec::new());
        };
        let headers: Vec<String> = header_row.iter().map(header_text).collect();

        let mut rows = Vec::new();
        for cells in sheet_rows {
            let row: RawRow = headers
                .iter()
                .zip(cells)
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, cell)| (header.clone(), cell_value(cell)))
                .collect();

            if row.values().any(|v| !v.is_null()) {
                rows.push(row);
            }
        }

        tracing::debug!(file = %upload.name, rows = rows.len(), "workbook parsed");
        Ok(rows)
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => value_text(&cell_value(other)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::DateTime(dt) => float_value(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        _ => Value::Null,
    }
}

fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER {
        return Value::Number((f as i64).into());
    }
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}
