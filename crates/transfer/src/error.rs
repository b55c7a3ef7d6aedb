//! Error types for transfer operations.

use rusty_transfer_portal::PortalError;
use rusty_transfer_storage::StorageError;
use thiserror::Error;

/// Errors that abort a sync or export run.
///
/// A record found in no bucket is not an error; it is skipped and counted.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Portal request failed.
    #[error(transparent)]
    Portal(#[from] PortalError),

    /// Storage request failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The audit message did not describe a move between two storage URIs.
    #[error("Invalid audit detail for {accession}: {reason} ({detail:?})")]
    InvalidAuditDetail {
        accession: String,
        detail: String,
        reason: String,
    },

    /// The local manifest could not be written.
    #[error("Failed to write manifest {path}: {message}")]
    Manifest { path: String, message: String },

    /// A record failed mid-batch; records after it were not attempted.
    #[error("Transfer aborted at record {index} ({accession}): {source}")]
    RecordFailed {
        index: usize,
        accession: String,
        #[source]
        source: Box<TransferError>,
    },
}

impl TransferError {
    /// The accession of the record that aborted the batch, if any.
    pub fn failed_accession(&self) -> Option<&str> {
        match self {
            TransferError::RecordFailed { accession, .. } => Some(accession),
            _ => None,
        }
    }
}
