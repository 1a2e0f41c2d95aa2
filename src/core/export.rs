//! Printer CSV and repository snapshot export
//!
//! The order CSV is consumed by the printer's intake system, so its layout is
//! fixed: one `HDR` row describing the customer and order, then one `DTL` row
//! per exportable line.

use std::borrow::Borrow;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::order::OrderLine;
use crate::core::repository::RepositoryRecord;

/// Marker opening the header row
pub const HEADER_MARKER: &str = "HDR";
/// Marker opening each detail row
pub const DETAIL_MARKER: &str = "DTL";

/// Errors raised while serialising an export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to flush CSV buffer: {0}")]
    Buffer(String),
}

/// Postal address printed in the header row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub road: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub postcode: String,
    pub country_code: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            street: "Popson Street".to_string(),
            road: String::new(),
            city: "Bungay".to_string(),
            region: "Suffolk".to_string(),
            country: "UK".to_string(),
            postcode: "NR35 1ED".to_string(),
            country_code: "GB".to_string(),
        }
    }
}

/// The customer the printer ships to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerProfile {
    pub name: String,
    /// Order type literal, e.g. `Clays POD`
    #[serde(rename = "type")]
    pub kind: String,
    pub phone: String,
    pub address: Address,
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self {
            name: "Clays Ltd".to_string(),
            kind: "Clays POD".to_string(),
            phone: "01986 893 211".to_string(),
            address: Address::default(),
        }
    }
}

/// A ready-to-write order export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderExport {
    pub rows: Vec<Vec<String>>,
    /// Detail rows written
    pub exported: usize,
    /// Unavailable lines left out
    pub excluded: usize,
}

impl OrderExport {
    /// Serialise the rows as CRLF-terminated CSV
    pub fn to_csv(&self) -> Result<Vec<u8>, ExportError> {
        write_csv(&self.rows)
    }
}

/// Result of an order export attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Ready(OrderExport),
    /// Every line was unavailable (or there were none); nothing to send
    NothingToExport { excluded: usize },
}

/// Build the header row for an order
pub fn header_row(order_ref: &str, profile: &CustomerProfile, date: NaiveDate) -> Vec<String> {
    let address = &profile.address;
    vec![
        HEADER_MARKER.to_string(),
        order_ref.to_string(),
        date.format("%Y%m%d").to_string(),
        profile.kind.clone(),
        profile.name.clone(),
        address.street.clone(),
        address.road.clone(),
        address.city.clone(),
        address.region.clone(),
        address.country.clone(),
        address.postcode.clone(),
        address.country_code.clone(),
        profile.phone.clone(),
        String::new(),
    ]
}

/// Build the detail row for one line
pub fn detail_row(order_ref: &str, line: &OrderLine) -> Vec<String> {
    vec![
        DETAIL_MARKER.to_string(),
        order_ref.to_string(),
        line.line_label(),
        line.isbn.clone(),
        line.quantity.to_string(),
    ]
}

/// Export an order list; unavailable lines are skipped and counted
pub fn export_order(
    lines: &[OrderLine],
    order_ref: &str,
    profile: &CustomerProfile,
    date: NaiveDate,
) -> ExportOutcome {
    let (available, excluded): (Vec<&OrderLine>, Vec<&OrderLine>) =
        lines.iter().partition(|l| l.available);

    if !excluded.is_empty() {
        tracing::warn!(
            order_ref,
            excluded = excluded.len(),
            "unavailable lines left out of export"
        );
    }

    if available.is_empty() {
        return ExportOutcome::NothingToExport {
            excluded: excluded.len(),
        };
    }

    let mut rows = Vec::with_capacity(available.len() + 1);
    rows.push(header_row(order_ref, profile, date));
    rows.extend(available.iter().map(|line| detail_row(order_ref, line)));

    ExportOutcome::Ready(OrderExport {
        rows,
        exported: available.len(),
        excluded: excluded.len(),
    })
}

/// `pod_order_YYYY_MM_DD_HH_MM_SS.csv`
pub fn order_filename(now: NaiveDateTime) -> String {
    format!("pod_order_{}.csv", now.format("%Y_%m_%d_%H_%M_%S"))
}

// =========================================================================
// Repository snapshot
// =========================================================================

/// Column names of the snapshot, matching the ingestion aliases
pub const SNAPSHOT_COLUMNS: [&str; 12] = [
    "ISBN",
    "Master Order ID",
    "Title",
    "Status",
    "Paper Desc",
    "Trim Height",
    "Trim Width",
    "Bind Style",
    "Extent",
    "Cover Spec Code 1",
    "Cover Spine",
    "Packing",
];

/// Snapshot file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotFormat {
    #[default]
    Json,
    Csv,
}

impl SnapshotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Csv => "csv",
        }
    }
}

/// `repository_data_YYYY_MM_DD_HH_MM.<ext>`
pub fn snapshot_filename(now: NaiveDateTime, format: SnapshotFormat) -> String {
    format!(
        "repository_data_{}.{}",
        now.format("%Y_%m_%d_%H_%M"),
        format.extension()
    )
}

/// Flat projection of the records, ordered by numeric ISBN
///
/// Records without an identifier keep their relative order after the rest.
pub fn snapshot_rows<R: Borrow<RepositoryRecord>>(records: &[R]) -> Vec<Map<String, Value>> {
    let mut ordered: Vec<&RepositoryRecord> = records
        .iter()
        .map(|r| <R as Borrow<RepositoryRecord>>::borrow(r))
        .collect();
    ordered.sort_by_key(|r| r.isbn.parse::<u64>().ok().map_or((1, 0), |n| (0, n)));
    ordered.into_iter().map(snapshot_row).collect()
}

fn snapshot_row(record: &RepositoryRecord) -> Map<String, Value> {
    let text = |s: &str| Value::String(s.to_string());
    let opaque = |v: &Option<Value>| v.clone().unwrap_or_else(|| Value::String(String::new()));
    let physical = &record.physical;

    let values = [
        text(&record.isbn),
        text(&record.alternate_order_id),
        text(&record.title),
        text(record.status.as_str()),
        text(&record.paper_description),
        opaque(&physical.trim_height),
        opaque(&physical.trim_width),
        text(&physical.bind_style),
        opaque(&physical.extent),
        text(&physical.cover_spec_code),
        opaque(&physical.cover_spine),
        text(&physical.packing),
    ];

    SNAPSHOT_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .zip(values)
        .collect()
}

/// Pretty-printed JSON array snapshot
pub fn snapshot_json<R: Borrow<RepositoryRecord>>(records: &[R]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&snapshot_rows(records))?)
}

/// Tabular CSV snapshot with a header row
pub fn snapshot_csv<R: Borrow<RepositoryRecord>>(records: &[R]) -> Result<Vec<u8>, ExportError> {
    let mut rows: Vec<Vec<String>> = vec![SNAPSHOT_COLUMNS.iter().map(|c| c.to_string()).collect()];
    rows.extend(snapshot_rows(records).iter().map(|row| {
        row.values()
            .map(crate::core::fields::value_text)
            .collect::<Vec<_>>()
    }));
    write_csv(&rows)
}

fn write_csv(rows: &[Vec<String>]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}
