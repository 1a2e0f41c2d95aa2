//! Batch export of a directory of order files into an archive sink

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use walkdir::WalkDir;

use crate::core::config::Limits;
use crate::core::export::{export_order, CustomerProfile, ExportOutcome};
use crate::core::ingest::{Upload, UploadKind, UploadParsers};
use crate::core::repository::Repository;
use crate::core::session::prepare_order;

/// Destination for named byte buffers
pub trait ArchiveSink {
    fn put(&mut self, name: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Writes each entry as a file under a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Create the directory if needed
    pub fn create(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArchiveSink for DirectorySink {
    fn put(&mut self, name: &str, bytes: &[u8]) -> std::io::Result<()> {
        fs::write(self.root.join(name), bytes)
    }
}

/// Keeps entries in memory, ordered by name
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub entries: BTreeMap<String, Vec<u8>>,
}

impl ArchiveSink for MemorySink {
    fn put(&mut self, name: &str, bytes: &[u8]) -> std::io::Result<()> {
        self.entries.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Per-file result of a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BatchEntry {
    Exported {
        source: String,
        archive_name: String,
        lines: usize,
        excluded: usize,
    },
    NothingToExport {
        source: String,
        excluded: usize,
    },
    Failed {
        source: String,
        error: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn exported(&self) -> usize {
        self.count(|e| matches!(e, BatchEntry::Exported { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|e| matches!(e, BatchEntry::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&BatchEntry) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(e)).count()
    }
}

/// Archive entry name for an order reference
pub fn archive_name(order_ref: &str) -> String {
    let safe: String = order_ref
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("pod_order_{}.csv", safe)
}

/// Order files directly inside `dir`, sorted by name
pub fn order_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| UploadKind::from_name(&e.file_name().to_string_lossy()).is_some())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Process every order file in `dir`, each named after its order reference
///
/// A failing file is recorded and the run continues.
pub fn export_directory(
    dir: &Path,
    repository: &Repository,
    parsers: &UploadParsers,
    limits: &Limits,
    profile: &CustomerProfile,
    date: NaiveDate,
    sink: &mut dyn ArchiveSink,
) -> BatchReport {
    let mut report = BatchReport::default();

    for path in order_files(dir) {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let entry = match export_file(&path, repository, parsers, limits, profile, date, sink) {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(file = %source, %error, "batch entry failed");
                BatchEntry::Failed { source, error }
            }
        };
        report.entries.push(entry);
    }

    tracing::info!(
        files = report.entries.len(),
        exported = report.exported(),
        failed = report.failed(),
        "batch export finished"
    );
    report
}

fn export_file(
    path: &Path,
    repository: &Repository,
    parsers: &UploadParsers,
    limits: &Limits,
    profile: &CustomerProfile,
    date: NaiveDate,
    sink: &mut dyn ArchiveSink,
) -> Result<BatchEntry, String> {
    let upload = Upload::read(path, limits.max_file_size).map_err(|e| e.to_string())?;
    let order_ref = upload.stem().to_string();
    let orders = prepare_order(repository, &upload, &order_ref, parsers, limits)
        .map_err(|e| e.to_string())?;

    match export_order(orders.lines(), orders.order_ref(), profile, date) {
        ExportOutcome::Ready(export) => {
            let name = archive_name(orders.order_ref());
            let bytes = export.to_csv().map_err(|e| e.to_string())?;
            sink.put(&name, &bytes).map_err(|e| e.to_string())?;
            Ok(BatchEntry::Exported {
                source: upload.name,
                archive_name: name,
                lines: export.exported,
                excluded: export.excluded,
            })
        }
        ExportOutcome::NothingToExport { excluded } => Ok(BatchEntry::NothingToExport {
            source: upload.name,
            excluded,
        }),
    }
}
