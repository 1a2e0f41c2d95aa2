//! Working session: the loaded repository plus the current order batch
//!
//! All state is owned here and passed explicitly; every mutation goes through
//! `&mut self`, so uploads and edits are serialised by the borrow checker.

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::auth::{EditError, EditToken};
use crate::core::config::Limits;
use crate::core::editor::{self, ChangeSet, MergeReport};
use crate::core::export::{export_order, CustomerProfile, ExportOutcome};
use crate::core::ingest::{validate_upload, IngestError, Upload, UploadParsers};
use crate::core::mutator::OrderList;
use crate::core::order::{self, BatchSummary};
use crate::core::repository::{sanitize_text, Repository};

/// Check, parse and match one upload against a repository
///
/// The order reference is checked before the file is even looked at.
pub fn prepare_order(
    repository: &Repository,
    upload: &Upload,
    order_ref: &str,
    parsers: &UploadParsers,
    limits: &Limits,
) -> Result<OrderList, IngestError> {
    let order_ref = sanitize_text(order_ref, limits.max_description_length);
    if order_ref.is_empty() {
        return Err(IngestError::MissingOrderRef);
    }

    let kind = validate_upload(upload, limits.max_file_size)?;
    let rows = parsers.parse(upload, kind)?;
    if rows.is_empty() {
        return Err(IngestError::EmptyUpload {
            name: upload.name.clone(),
        });
    }

    Ok(order::process(&rows, repository.index(), &order_ref))
}

#[derive(Debug, Default)]
pub struct Session {
    repository: Repository,
    orders: Option<OrderList>,
    limits: Limits,
}

impl Session {
    pub fn new(repository: Repository, limits: Limits) -> Self {
        Self {
            repository,
            orders: None,
            limits,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Process an upload into the current batch
    ///
    /// On error the previous batch is left in place.
    pub fn upload(
        &mut self,
        upload: &Upload,
        order_ref: &str,
        parsers: &UploadParsers,
    ) -> Result<BatchSummary, IngestError> {
        let orders = prepare_order(&self.repository, upload, order_ref, parsers, &self.limits)?;
        let summary = orders.summary();
        self.orders = Some(orders);
        Ok(summary)
    }

    pub fn orders(&self) -> Option<&OrderList> {
        self.orders.as_ref()
    }

    pub fn orders_mut(&mut self) -> Option<&mut OrderList> {
        self.orders.as_mut()
    }

    /// Drop the current batch
    pub fn clear(&mut self) -> Option<OrderList> {
        self.orders.take()
    }

    /// Export the current batch; an empty session has nothing to export
    pub fn export(&self, profile: &CustomerProfile, date: NaiveDate) -> ExportOutcome {
        match &self.orders {
            Some(orders) => export_order(orders.lines(), orders.order_ref(), profile, date),
            None => ExportOutcome::NothingToExport { excluded: 0 },
        }
    }

    /// Merge a change set into the repository behind an edit token
    pub fn apply_edit(
        &mut self,
        changes: &ChangeSet,
        token: &EditToken,
        now: DateTime<Utc>,
    ) -> Result<MergeReport, EditError> {
        let (repository, report) = editor::merge(&self.repository, changes, token, now)?;
        self.repository = repository;
        Ok(report)
    }
}
