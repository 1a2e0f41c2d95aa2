//! Upload validation and row parsing
//!
//! Spreadsheet decoding is pluggable through [`RowParser`]. CSV is always
//! handled; `.xlsx`/`.xls` go to whichever parser is registered, normally
//! [`crate::core::workbook::WorkbookRowParser`].

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde_json::{Number, Value};
use thiserror::Error;

use crate::core::fields::RawRow;

/// Default upload size limit
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Delimiters tried when sniffing a CSV file, in tie-break order
const CSV_DELIMITERS: [u8; 4] = [b',', b'\t', b'|', b';'];

/// Errors that abort an upload; prior session state is kept
#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("an order reference is required before uploading a file")]
    #[diagnostic(code(podrecon::ingest::missing_ref), help("pass --ref <ORDER_REF>"))]
    MissingOrderRef,

    #[error("'{name}' is {size} bytes, over the {limit} byte limit")]
    #[diagnostic(code(podrecon::ingest::too_large))]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("invalid file extension for '{name}': only .xlsx, .xls and .csv files are allowed")]
    #[diagnostic(code(podrecon::ingest::extension))]
    UnsupportedExtension { name: String },

    #[error("no spreadsheet parser is available for .{extension} files")]
    #[diagnostic(
        code(podrecon::ingest::no_parser),
        help("save the sheet as CSV and upload that instead")
    )]
    NoParser { extension: String },

    #[error("failed to parse '{name}': {message}")]
    #[diagnostic(code(podrecon::ingest::parse))]
    Parse { name: String, message: String },

    #[error("'{name}' contains no data rows")]
    #[diagnostic(code(podrecon::ingest::empty))]
    EmptyUpload { name: String },

    #[error("failed to read '{}'", path.display())]
    #[diagnostic(code(podrecon::ingest::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Accepted upload types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Csv,
    Xlsx,
    Xls,
}

impl UploadKind {
    /// Classify a file name by extension, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(UploadKind::Csv),
            "xlsx" => Some(UploadKind::Xlsx),
            "xls" => Some(UploadKind::Xls),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            UploadKind::Csv => "csv",
            UploadKind::Xlsx => "xlsx",
            UploadKind::Xls => "xls",
        }
    }
}

/// An uploaded file held in memory
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file, refusing anything over `max_size` before loading it
    pub fn read(path: &Path, max_size: u64) -> Result<Self, IngestError> {
        let io = |source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let size = fs::metadata(path).map_err(io)?.len();
        check_size(&name, size, max_size)?;

        Ok(Self {
            name,
            bytes: fs::read(path).map_err(io)?,
        })
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Check size and extension of an upload
pub fn validate_upload(upload: &Upload, max_size: u64) -> Result<UploadKind, IngestError> {
    check_size(&upload.name, upload.bytes.len() as u64, max_size)?;
    UploadKind::from_name(&upload.name).ok_or_else(|| IngestError::UnsupportedExtension {
        name: upload.name.clone(),
    })
}

fn check_size(name: &str, size: u64, limit: u64) -> Result<(), IngestError> {
    if size > limit {
        return Err(IngestError::FileTooLarge {
            name: name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// External spreadsheet decoding: one call, rows out
pub trait RowParser {
    fn parse(&self, upload: &Upload) -> Result<Vec<RawRow>, IngestError>;
}

/// Header-row CSV with delimiter sniffing and dynamic typing
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRowParser;

impl RowParser for CsvRowParser {
    fn parse(&self, upload: &Upload) -> Result<Vec<RawRow>, IngestError> {
        let text = String::from_utf8_lossy(&upload.bytes);
        let text = text.trim_start_matches('\u{feff}');
        let parse_error = |e: csv::Error| IngestError::Parse {
            name: upload.name.clone(),
            message: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(guess_delimiter(text))
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(text.as_bytes());

        let headers = reader.headers().map_err(parse_error)?.clone();
        let mut rows = Vec::new();

        for record in reader.records() {
            let record = record.map_err(parse_error)?;
            let row: RawRow = headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, cell)| (header.to_string(), typed_cell(cell)))
                .collect();

            if row.values().any(|v| !v.is_null()) {
                rows.push(row);
            }
        }

        tracing::debug!(file = %upload.name, rows = rows.len(), "csv parsed");
        Ok(rows)
    }
}

/// Pick the candidate delimiter occurring most often on the header line
fn guess_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut best = CSV_DELIMITERS[0];
    let mut best_count = 0;
    for delimiter in CSV_DELIMITERS {
        let count = header.bytes().filter(|&b| b == delimiter).count();
        if count > best_count {
            best = delimiter;
            best_count = count;
        }
    }
    best
}

/// Type a CSV cell the way a spreadsheet would
///
/// Numbers with a leading zero stay text so identifiers keep their padding.
fn typed_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    let unsigned = trimmed.trim_start_matches('-');
    let leading_zero = unsigned.len() > 1 && unsigned.starts_with('0') && !unsigned.starts_with("0.");
    if !leading_zero {
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Number(i.into());
        }
        if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_string())
}

/// Parser lookup by upload kind
pub struct UploadParsers {
    csv: CsvRowParser,
    spreadsheet: Option<Box<dyn RowParser>>,
}

impl Default for UploadParsers {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadParsers {
    /// CSV only
    pub fn new() -> Self {
        Self {
            csv: CsvRowParser,
            spreadsheet: None,
        }
    }

    /// Register the external `.xlsx`/`.xls` parser
    pub fn with_spreadsheet(mut self, parser: Box<dyn RowParser>) -> Self {
        self.spreadsheet = Some(parser);
        self
    }

    pub fn parse(&self, upload: &Upload, kind: UploadKind) -> Result<Vec<RawRow>, IngestError> {
        match kind {
            UploadKind::Csv => self.csv.parse(upload),
            UploadKind::Xlsx | UploadKind::Xls => match &self.spreadsheet {
                Some(parser) => parser.parse(upload),
                None => Err(IngestError::NoParser {
                    extension: kind.extension().to_string(),
                }),
            },
        }
    }
}

/// Parse repository JSON: an array of flat objects
///
/// Non-object entries are skipped.
pub fn parse_repository_json(text: &str, name: &str) -> Result<Vec<RawRow>, IngestError> {
    let value: Value = serde_json::from_str(text).map_err(|e| IngestError::Parse {
        name: name.to_string(),
        message: e.to_string(),
    })?;

    let Value::Array(items) = value else {
        return Err(IngestError::Parse {
            name: name.to_string(),
            message: "expected a JSON array of records".to_string(),
        });
    };

    let total = items.len();
    let rows: Vec<RawRow> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if rows.len() < total {
        tracing::warn!(skipped = total - rows.len(), "non-object repository entries skipped");
    }
    Ok(rows)
}

/// Read and parse a repository file
///
/// JSON arrays are the normal form; a `.csv` snapshot is read back through
/// [`CsvRowParser`].
pub fn load_repository_file(path: &Path) -> Result<Vec<RawRow>, IngestError> {
    let name = path.display().to_string();
    let bytes = fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if UploadKind::from_name(&name) == Some(UploadKind::Csv) {
        return CsvRowParser.parse(&Upload::new(name, bytes));
    }
    parse_repository_json(&String::from_utf8_lossy(&bytes), &name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_upload_kind_from_name() {
        assert_eq!(UploadKind::from_name("orders.CSV"), Some(UploadKind::Csv));
        assert_eq!(UploadKind::from_name("orders.xlsx"), Some(UploadKind::Xlsx));
        assert_eq!(UploadKind::from_name("orders.xls"), Some(UploadKind::Xls));
        assert_eq!(UploadKind::from_name("orders.json"), None);
        assert_eq!(UploadKind::from_name("orders"), None);
    }

    #[test]
    fn test_validate_upload() {
        let upload = Upload::new("orders.csv", "ISBN,Qty\n");
        assert_eq!(validate_upload(&upload, 1024).unwrap(), UploadKind::Csv);

        assert!(matches!(
            validate_upload(&upload, 4),
            Err(IngestError::FileTooLarge { size: 9, limit: 4, .. })
        ));

        let upload = Upload::new("orders.txt", "x");
        assert!(matches!(
            validate_upload(&upload, 1024),
            Err(IngestError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn test_read_checks_size_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.csv");
        fs::write(&path, "ISBN,Qty\n9780140175936,1\n").unwrap();

        assert!(matches!(
            Upload::read(&path, 5),
            Err(IngestError::FileTooLarge { .. })
        ));
        let upload = Upload::read(&path, 1024).unwrap();
        assert_eq!(upload.name, "big.csv");
        assert_eq!(upload.stem(), "big");

        assert!(matches!(
            Upload::read(&dir.path().join("missing.csv"), 1024),
            Err(IngestError::Io { .. })
        ));
    }

    #[test]
    fn test_csv_dynamic_typing() {
        let upload = Upload::new(
            "o.csv",
            "ISBN,Qty,Master\n9780140175936,5,SA1657\n1E+12,2.5,\n0140175938,x,\n",
        );
        let rows = CsvRowParser.parse(&upload).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["ISBN"], json!(9780140175936_i64));
        assert_eq!(rows[0]["Qty"], json!(5));
        assert_eq!(rows[0]["Master"], json!("SA1657"));
        assert_eq!(rows[1]["ISBN"], json!(1e12));
        assert_eq!(rows[1]["Master"], Value::Null);
        assert_eq!(rows[2]["ISBN"], json!("0140175938"));
        assert_eq!(rows[2]["Qty"], json!("x"));
    }

    #[test]
    fn test_csv_delimiter_guessing() {
        for (delimiter, text) in [
            (b';', "ISBN;Qty\n9780140175936;3\n"),
            (b'\t', "ISBN\tQty\n9780140175936\t3\n"),
            (b'|', "ISBN|Qty\n9780140175936|3\n"),
        ] {
            assert_eq!(guess_delimiter(text), delimiter);
            let rows = CsvRowParser.parse(&Upload::new("o.csv", text)).unwrap();
            assert_eq!(rows[0]["Qty"], json!(3));
        }
        assert_eq!(guess_delimiter("ISBN\n"), b',');
    }

    #[test]
    fn test_csv_skips_blank_rows_and_bom() {
        let upload = Upload::new("o.csv", "\u{feff}ISBN,Qty\n\n,\n9780140175936,1\n");
        let rows = CsvRowParser.parse(&upload).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains_key("ISBN"));
    }

    #[test]
    fn test_spreadsheet_needs_parser() {
        struct Fixed;
        impl RowParser for Fixed {
            fn parse(&self, _upload: &Upload) -> Result<Vec<RawRow>, IngestError> {
                Ok(vec![json!({"ISBN": "9780140175936", "Qty": 1})
                    .as_object()
                    .cloned()
                    .unwrap()])
            }
        }

        let upload = Upload::new("o.xlsx", vec![0u8; 4]);
        assert!(matches!(
            UploadParsers::new().parse(&upload, UploadKind::Xlsx),
            Err(IngestError::NoParser { .. })
        ));

        let parsers = UploadParsers::new().with_spreadsheet(Box::new(Fixed));
        assert_eq!(parsers.parse(&upload, UploadKind::Xlsx).unwrap().len(), 1);
    }

    #[test]
    fn test_load_repository_file_csv_and_json() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("repo.csv");
        fs::write(&csv_path, "ISBN,Title\r\n9780140175936,Cleopatra's Sister\r\n").unwrap();
        let rows = load_repository_file(&csv_path).unwrap();
        assert_eq!(rows[0]["Title"], json!("Cleopatra's Sister"));

        let json_path = dir.path().join("repo.json");
        fs::write(&json_path, r#"[{"ISBN": "9780140175936"}]"#).unwrap();
        assert_eq!(load_repository_file(&json_path).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_repository_json() {
        let rows =
            parse_repository_json(r#"[{"ISBN": "9780140175936"}, 3, {"Title": "x"}]"#, "data.json")
                .unwrap();
        assert_eq!(rows.len(), 2);

        assert!(matches!(
            parse_repository_json(r#"{"ISBN": 1}"#, "data.json"),
            Err(IngestError::Parse { .. })
        ));
        assert!(matches!(
            parse_repository_json("not json", "data.json"),
            Err(IngestError::Parse { .. })
        ));
    }
}
