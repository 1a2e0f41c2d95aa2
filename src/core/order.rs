//! Order line matching and consolidation
//!
//! Turns the raw rows of an uploaded order spreadsheet into a numbered list of
//! [`OrderLine`]s. Each row is matched independently (ISBN first, Master Order
//! ID second); rows resolving to the same title are then folded into a single
//! line whose quantity is the sum of the parts. No row is ever dropped: bad
//! identifiers, bad quantities and missing titles all surface as visible lines.

use std::collections::HashMap;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::core::fields::{value_text, RawRow, ORDER_ISBN, ORDER_MASTER, ORDER_QUANTITY};
use crate::core::identifier::canonical;
use crate::core::index::{LookupMethod, RepositoryIndex};
use crate::core::mutator::OrderList;
use crate::core::repository::RepositoryRecord;

/// Description shown for unmatched lines
pub const NOT_FOUND: &str = "Not Found";
/// Status shown for unmatched lines
pub const NOT_AVAILABLE: &str = "Not Available";
/// Paper description shown when none is known
pub const NOT_SPECIFIED: &str = "Not specified";

/// Smallest accepted quantity
pub const MIN_QUANTITY: u32 = 1;
/// Largest accepted quantity
pub const MAX_QUANTITY: u32 = 10_000;

/// One consolidated order line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// Dense 1-based position in storage order, rendered as `001`
    #[serde(serialize_with = "serialize_line_number")]
    pub line_number: u32,

    /// Canonical ISBN of the matched title, empty when unmatched
    pub isbn: String,

    /// Identifier the upload asked for, as normalised from the row
    pub requested_identifier: String,

    pub description: String,

    pub status: String,

    pub paper_description: String,

    /// Master Order ID of the matched title
    pub alternate_order_id: String,

    pub quantity: u32,

    /// Whether a repository record matched
    pub available: bool,

    pub lookup_method: LookupMethod,

    /// Number of raw rows folded into this line
    pub consolidated_count: u32,

    /// Input row index that first produced this line
    pub original_index: usize,
}

impl OrderLine {
    /// Zero-padded three digit line number
    pub fn line_label(&self) -> String {
        format_line_number(self.line_number)
    }

    fn matched(record: &RepositoryRecord, requested: String, method: LookupMethod) -> Self {
        Self {
            line_number: 0,
            isbn: record.isbn.clone(),
            requested_identifier: requested,
            description: record.title.clone(),
            status: record.status.as_str().to_string(),
            paper_description: if record.paper_description.is_empty() {
                NOT_SPECIFIED.to_string()
            } else {
                record.paper_description.clone()
            },
            alternate_order_id: record.alternate_order_id.clone(),
            quantity: 0,
            available: true,
            lookup_method: method,
            consolidated_count: 1,
            original_index: 0,
        }
    }

    fn unmatched(requested: String) -> Self {
        Self {
            line_number: 0,
            isbn: String::new(),
            requested_identifier: requested,
            description: NOT_FOUND.to_string(),
            status: NOT_AVAILABLE.to_string(),
            paper_description: NOT_SPECIFIED.to_string(),
            alternate_order_id: String::new(),
            quantity: 0,
            available: false,
            lookup_method: LookupMethod::None,
            consolidated_count: 1,
            original_index: 0,
        }
    }
}

/// Render a line number as `001`
pub fn format_line_number(n: u32) -> String {
    format!("{:03}", n)
}

fn serialize_line_number<S: Serializer>(n: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_line_number(*n))
}

/// Consolidation key: the resolved title, or the row itself when unresolved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Identifier(String),
    Alternate(String),
    Row(usize),
}

struct Candidate {
    key: GroupKey,
    line: OrderLine,
}

/// Match, consolidate and number the rows of one upload
pub fn process(rows: &[RawRow], index: &RepositoryIndex, order_ref: &str) -> OrderList {
    let candidates = rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| match_row(row_index, row, index));
    let lines = consolidate(candidates);

    let list = OrderList::new(order_ref, lines);
    let summary = list.summary();
    tracing::info!(
        order_ref,
        rows = rows.len(),
        lines = summary.total,
        found = summary.found,
        not_available = summary.not_available,
        "order batch processed"
    );
    list
}

fn match_row(row_index: usize, row: &RawRow, index: &RepositoryIndex) -> Candidate {
    let requested = ORDER_ISBN
        .text(row)
        .and_then(|raw| canonical(&raw))
        .unwrap_or_default();

    let by_identifier = (!requested.is_empty())
        .then(|| index.by_isbn(&requested))
        .flatten()
        .map(|record| (record, LookupMethod::Identifier));

    let master = ORDER_MASTER.text(row).unwrap_or_default();
    let resolved = by_identifier.or_else(|| {
        index
            .by_alternate_id(&master)
            .map(|record| (record, LookupMethod::AlternateId))
    });

    let quantity = ORDER_QUANTITY.get(row).map(parse_quantity).unwrap_or(0);

    let (key, mut line) = match resolved {
        Some((record, method)) => {
            let key = if record.is_identified() {
                GroupKey::Identifier(record.isbn.clone())
            } else {
                GroupKey::Alternate(record.alternate_order_id.to_lowercase())
            };
            (key, OrderLine::matched(record, requested, method))
        }
        None => {
            tracing::debug!(row = row_index, identifier = %requested, master = %master, "row unmatched");
            (GroupKey::Row(row_index), OrderLine::unmatched(requested))
        }
    };

    line.quantity = quantity;
    line.original_index = row_index;
    Candidate { key, line }
}

/// Fold candidates sharing a key; first appearance fixes position and fields
fn consolidate(candidates: impl Iterator<Item = Candidate>) -> Vec<OrderLine> {
    let mut lines: Vec<OrderLine> = Vec::new();
    let mut positions: HashMap<GroupKey, usize> = HashMap::new();

    for Candidate { key, line } in candidates {
        match positions.get(&key) {
            Some(&pos) => {
                let existing = &mut lines[pos];
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                existing.consolidated_count += 1;
            }
            None => {
                positions.insert(key, lines.len());
                lines.push(line);
            }
        }
    }

    lines
}

/// Read a quantity cell, mapping anything outside 1..=10000 to 0
///
/// Text is read like a lenient integer parse: leading digits count, the rest
/// of the cell is ignored (`"12 copies"` is 12, `"2.9"` is 2).
pub fn parse_quantity(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    };

    match parsed {
        Some(q) if (i64::from(MIN_QUANTITY)..=i64::from(MAX_QUANTITY)).contains(&q) => q as u32,
        _ => {
            tracing::debug!(raw = %value_text(value), "invalid quantity");
            0
        }
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Anything too long to parse is far outside the accepted range anyway
    digits[..end].parse::<i64>().ok().map(|n| sign * n).or(Some(i64::MAX))
}

/// Counts reported after an upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub found: usize,
    pub pod_ready: usize,
    pub mpi: usize,
    pub not_available: usize,
    pub total_quantity: u64,
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} items found in repository ({} POD Ready, {} MPI, {} Not Available)",
            self.found, self.total, self.pod_ready, self.mpi, self.not_available
        )
    }
}
