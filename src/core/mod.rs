//! Core module - repository, order matching and export

pub mod archive;
pub mod auth;
pub mod config;
pub mod editor;
pub mod export;
pub mod fields;
pub mod identifier;
pub mod index;
pub mod ingest;
pub mod mutator;
pub mod order;
pub mod repository;
pub mod session;
pub mod workbook;

pub use archive::{ArchiveSink, BatchEntry, BatchReport, DirectorySink, MemorySink};
pub use auth::{Authorizer, EditError, EditToken, Sha256Authorizer};
pub use config::{Config, ConfigError, Limits};
pub use editor::{ChangeSet, MergeReport};
pub use export::{CustomerProfile, ExportError, ExportOutcome, OrderExport, SnapshotFormat};
pub use fields::RawRow;
pub use index::{LookupMethod, RepositoryIndex, SearchHit};
pub use ingest::{IngestError, RowParser, Upload, UploadKind, UploadParsers};
pub use mutator::{OrderFilter, OrderList, SortKey, StatusFilter};
pub use order::{BatchSummary, OrderLine};
pub use repository::{Repository, RepositoryRecord, RepositoryStats, TitleStatus};
pub use session::Session;
pub use workbook::WorkbookRowParser;
