//! Sync and metadata export runs.

use std::path::Path;
use std::time::Duration;

use rusty_transfer_portal::{AuditRecord, BatchSize, MetadataRecord, PortalClient, QueryFilter};
use rusty_transfer_storage::{CannedAcl, ObjectLocation, StorageClient};
use tracing::{error, info, warn};

use crate::error::TransferError;
use crate::execute::{execute, ExecutionReport, StepOutcome};
use crate::file_move::{parse_file_move, FileMove};
use crate::indexer::{wait_for_indexer, IndexerStatus};
use crate::manifest::write_manifest_file;
use crate::resolve::{promote_to_public, resolve_source};
use crate::settings::TransferSettings;

/// Counters for a completed sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Audit records returned by the portal.
    pub total: usize,
    /// Records that reached execution.
    pub processed: usize,
    /// Records found in no bucket.
    pub skipped: usize,
    /// Records whose object was copied.
    pub copied: usize,
    pub tagged: usize,
    pub deleted: usize,
    pub patched: usize,
}

impl SyncSummary {
    fn record(&mut self, report: &ExecutionReport) {
        self.processed += 1;
        if report.copied == StepOutcome::Copied {
            self.copied += 1;
        }
        self.tagged += usize::from(report.tagged);
        self.deleted += usize::from(report.deleted);
        self.patched += 1;
    }
}

/// Result of `FileTransfer::sync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncSummary),
    /// The indexer never went idle; nothing was queried or moved.
    NotReady,
}

/// Result of `FileTransfer::dump_file_metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Completed {
        /// Rows written to the manifest.
        records: usize,
        /// Where the manifest was published.
        location: ObjectLocation,
    },
    NotReady,
}

/// Reconciles incorrect-bucket audits and exports file metadata.
pub struct FileTransfer<'a, P: PortalClient + ?Sized, S: StorageClient + ?Sized> {
    portal: &'a P,
    storage: &'a S,
    settings: TransferSettings,
    batch_size: Option<BatchSize>,
    query_filter: Option<QueryFilter>,
}

impl<'a, P: PortalClient + ?Sized, S: StorageClient + ?Sized> FileTransfer<'a, P, S> {
    /// Create a transfer over the given clients.
    pub fn new(portal: &'a P, storage: &'a S, settings: TransferSettings) -> Self {
        Self {
            portal,
            storage,
            settings,
            batch_size: None,
            query_filter: None,
        }
    }

    /// Restrict the audit query.
    ///
    /// # Arguments
    /// * `batch_size` - Result limit; `None` uses the portal default
    /// * `query_filter` - Extra search terms
    pub fn with_audit_query(
        mut self,
        batch_size: Option<BatchSize>,
        query_filter: Option<QueryFilter>,
    ) -> Self {
        self.batch_size = batch_size;
        self.query_filter = query_filter;
        self
    }

    async fn wait_for_indexer(&self) -> Result<IndexerStatus, TransferError> {
        let schedule: Vec<Duration> = self.settings.indexer_schedule();
        let portal: &P = self.portal;
        let status: IndexerStatus =
            wait_for_indexer(move || portal.is_indexing(), &schedule).await?;
        Ok(status)
    }

    /// Fetch audit records for files in the wrong bucket.
    pub async fn files_to_move(&self) -> Result<Vec<AuditRecord>, TransferError> {
        let records: Vec<AuditRecord> = self
            .portal
            .query_audit_flagged_files(self.batch_size, self.query_filter.as_ref())
            .await?;
        info!("Found {} files to move", records.len());
        Ok(records)
    }

    /// Move every audited file to its destination and update the portal.
    ///
    /// Records are processed one at a time. The first failure aborts the
    /// batch; earlier records stay done and later ones are left for the next
    /// run.
    pub async fn sync(&self) -> Result<SyncOutcome, TransferError> {
        if self.wait_for_indexer().await? == IndexerStatus::NotReady {
            return Ok(SyncOutcome::NotReady);
        }
        let records: Vec<AuditRecord> = self.files_to_move().await?;
        let mut summary = SyncSummary {
            total: records.len(),
            ..SyncSummary::default()
        };

        for (index, record) in records.iter().enumerate() {
            match self.sync_record(index, record).await {
                Ok(Some(report)) => summary.record(&report),
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!(
                        "Transfer failed at record {} ({}): {}. Detail: {}",
                        index, record.accession, e, record.detail
                    );
                    return Err(TransferError::RecordFailed {
                        index,
                        accession: record.accession.clone(),
                        source: Box::new(e),
                    });
                }
            }
        }

        info!(
            "Sync complete: {} processed, {} skipped of {}",
            summary.processed, summary.skipped, summary.total
        );
        Ok(SyncOutcome::Completed(summary))
    }

    async fn sync_record(
        &self,
        index: usize,
        record: &AuditRecord,
    ) -> Result<Option<ExecutionReport>, TransferError> {
        let mut file_move: FileMove = parse_file_move(record)?;
        info!(
            "{} {} ({})",
            index, file_move.accession, file_move.status
        );

        if self.settings.initial_transfer {
            file_move =
                promote_to_public(self.storage, file_move, &self.settings.public_bucket).await?;
        }

        let original: &str = &self.settings.original_bucket;
        let Some(resolved) = resolve_source(self.storage, file_move, original).await? else {
            return Ok(None);
        };
        let report: ExecutionReport = execute(self.portal, self.storage, &resolved, original).await?;
        Ok(Some(report))
    }

    /// Write the file manifest locally and publish it to the public bucket.
    pub async fn dump_file_metadata(&self) -> Result<ExportOutcome, TransferError> {
        if self.wait_for_indexer().await? == IndexerStatus::NotReady {
            return Ok(ExportOutcome::NotReady);
        }
        let records: Vec<MetadataRecord> = self.portal.query_file_metadata().await?;
        let path: &str = &self.settings.local_manifest_path;
        warn!("Dumping metadata to {}", path);
        let written: usize =
            write_manifest_file(Path::new(path), self.portal.metadata_fields(), records)?;

        let location = ObjectLocation::new(&self.settings.public_bucket, &self.settings.manifest_key);
        info!("Uploading {} to {}", path, location);
        self.storage
            .upload_file(path, &location, CannedAcl::BucketOwnerFullControl)
            .await?;
        Ok(ExportOutcome::Completed {
            records: written,
            location,
        })
    }
}
