//! Repository records - the catalogue of titles orders are matched against

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::core::fields::{
    RawRow, REPO_BIND_STYLE, REPO_COVER_SPEC, REPO_COVER_SPINE, REPO_EXTENT, REPO_MASTER_ORDER_ID,
    REPO_PACKING, REPO_PAPER, REPO_STATUS, REPO_TITLE, REPO_TRIM_HEIGHT, REPO_TRIM_WIDTH,
};
use crate::core::identifier::extract_identifier;
use crate::core::index::RepositoryIndex;

/// Default cap on sanitised text fields
pub const DEFAULT_MAX_TEXT_LEN: usize = 200;

/// Title shown when a record has none
pub const NO_TITLE: &str = "No title available";

/// Production status of a catalogue title
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TitleStatus {
    /// Can be printed on demand
    #[default]
    PodReady,
    /// Print as miscellaneous item
    Mpi,
    /// Any other free-text status from the source data
    Other(String),
}

impl TitleStatus {
    /// Parse a free-text status; blank means POD Ready
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("POD Ready") {
            TitleStatus::PodReady
        } else if text.eq_ignore_ascii_case("MPI") {
            TitleStatus::Mpi
        } else {
            TitleStatus::Other(text.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TitleStatus::PodReady => "POD Ready",
            TitleStatus::Mpi => "MPI",
            TitleStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for TitleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for TitleStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TitleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(TitleStatus::parse(&text))
    }
}

/// Physical print specification, carried through untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_height: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_width: Option<Value>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bind_style: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Value>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cover_spec_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_spine: Option<Value>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub packing: String,
}

/// One catalogue title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Canonical 13-digit ISBN, or empty when the source had none
    pub isbn: String,

    pub title: String,

    /// Master Order ID, usable as a fallback match key
    #[serde(default)]
    pub alternate_order_id: String,

    #[serde(default)]
    pub status: TitleStatus,

    #[serde(default)]
    pub paper_description: String,

    #[serde(default)]
    pub physical: PhysicalSpec,
}

impl RepositoryRecord {
    /// Build a record from one loosely-typed repository row
    ///
    /// Identifiers that do not normalise to 13 digits are dropped, leaving the
    /// record unidentified rather than half-identified.
    pub fn from_raw(row: &RawRow, max_text_len: usize) -> Self {
        let clean = |text: Option<String>| sanitize_text(&text.unwrap_or_default(), max_text_len);

        let isbn = extract_identifier(row);
        let isbn = if isbn.len() == crate::core::identifier::IDENTIFIER_LEN {
            isbn
        } else {
            String::new()
        };

        let title = clean(REPO_TITLE.text(row));

        Self {
            isbn,
            title: if title.is_empty() {
                NO_TITLE.to_string()
            } else {
                title
            },
            alternate_order_id: clean(REPO_MASTER_ORDER_ID.text(row)),
            status: TitleStatus::parse(&clean(REPO_STATUS.text(row))),
            paper_description: clean(REPO_PAPER.text(row)),
            physical: PhysicalSpec {
                trim_height: REPO_TRIM_HEIGHT.get(row).cloned(),
                trim_width: REPO_TRIM_WIDTH.get(row).cloned(),
                bind_style: clean(REPO_BIND_STYLE.text(row)),
                extent: REPO_EXTENT.get(row).cloned(),
                cover_spec_code: clean(REPO_COVER_SPEC.text(row)),
                cover_spine: REPO_COVER_SPINE.get(row).cloned(),
                packing: clean(REPO_PACKING.text(row)),
            },
        }
    }

    /// Whether the record has a canonical identifier
    pub fn is_identified(&self) -> bool {
        !self.isbn.is_empty()
    }
}

/// Trim, drop control characters and cap the length of a free-text field
pub fn sanitize_text(text: &str, max_len: usize) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control())
        .take(max_len)
        .collect();
    cleaned.trim().to_string()
}

/// Headline counts for the loaded repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryStats {
    pub total: usize,
    pub pod_ready: usize,
    pub mpi: usize,
    /// Extra occurrences of identifiers that appear more than once
    pub duplicates: usize,
}

/// The full record set together with its lookup index
///
/// The index is rebuilt wholesale whenever the record set is replaced.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    records: Vec<Arc<RepositoryRecord>>,
    index: RepositoryIndex,
}

impl Repository {
    pub fn new(records: Vec<RepositoryRecord>) -> Self {
        Self::from_shared(records.into_iter().map(Arc::new).collect())
    }

    pub(crate) fn from_shared(records: Vec<Arc<RepositoryRecord>>) -> Self {
        let index = RepositoryIndex::build(&records);
        tracing::info!(
            titles = records.len(),
            duplicates = index.duplicate_count(),
            "repository loaded"
        );
        Self { records, index }
    }

    /// Ingest raw repository rows
    pub fn from_raw_rows(rows: &[RawRow], max_text_len: usize) -> Self {
        Self::new(
            rows.iter()
                .map(|row| RepositoryRecord::from_raw(row, max_text_len))
                .collect(),
        )
    }

    pub fn records(&self) -> &[Arc<RepositoryRecord>] {
        &self.records
    }

    pub fn index(&self) -> &RepositoryIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            total: self.records.len(),
            pod_ready: self
                .records
                .iter()
                .filter(|r| r.status == TitleStatus::PodReady)
                .count(),
            mpi: self
                .records
                .iter()
                .filter(|r| r.status == TitleStatus::Mpi)
                .count(),
            duplicates: self.index.duplicate_count(),
        }
    }
}
