//! File moves derived from incorrect-bucket audits.

use rusty_transfer_portal::AuditRecord;
use rusty_transfer_storage::ObjectLocation;

use crate::error::TransferError;

/// One object that should move from `source` to `destination`.
///
/// `source_bucket` and `source_key` are rewritten during source resolution
/// when the object is found somewhere other than the audit says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMove {
    /// Portal resource identifier of the file.
    pub accession: String,
    /// Status word from the audit message. Informational only.
    pub status: String,
    pub source_bucket: String,
    pub source_key: String,
    pub destination_bucket: String,
    pub destination_key: String,
}

impl FileMove {
    /// Current source location.
    pub fn source(&self) -> ObjectLocation {
        ObjectLocation::new(&self.source_bucket, &self.source_key)
    }

    /// Destination location.
    pub fn destination(&self) -> ObjectLocation {
        ObjectLocation::new(&self.destination_bucket, &self.destination_key)
    }

    /// Whether source and destination are the same object.
    pub fn is_self_move(&self) -> bool {
        self.source_bucket == self.destination_bucket && self.source_key == self.destination_key
    }

    /// Whether the current source is the given bucket.
    pub fn source_is(&self, bucket: &str) -> bool {
        self.source_bucket == bucket
    }
}

/// Parse an audit message of the form
/// `Move <status> file <id> from <scheme>://<bucket>/<key> to <scheme>://<bucket>/<key>`.
///
/// The source URI is the text after the last ` from ` that precedes the first
/// ` to `; the destination URI is the text after the last ` to `. The status is
/// the first word after `Move` and is empty when there is none.
///
/// # Arguments
/// * `record` - Audit record from the portal
///
/// # Returns
/// The parsed move, or `TransferError::InvalidAuditDetail` when the message
/// lacks the delimiters or both buckets are empty.
pub fn parse_file_move(record: &AuditRecord) -> Result<FileMove, TransferError> {
    let detail: &str = &record.detail;
    let invalid = |reason: &str| TransferError::InvalidAuditDetail {
        accession: record.accession.clone(),
        detail: detail.to_string(),
        reason: reason.to_string(),
    };

    let status: String = detail
        .split_once("Move")
        .and_then(|(_, rest)| rest.split(' ').nth(1))
        .unwrap_or_default()
        .to_string();

    let (before_to, _) = detail
        .split_once(" to ")
        .ok_or_else(|| invalid("missing ' to '"))?;
    let (_, source_uri) = before_to
        .rsplit_once(" from ")
        .ok_or_else(|| invalid("missing ' from '"))?;
    let (_, destination_uri) = detail
        .rsplit_once(" to ")
        .ok_or_else(|| invalid("missing ' to '"))?;

    let source: ObjectLocation =
        ObjectLocation::parse_uri(source_uri).map_err(|e| invalid(&e.to_string()))?;
    let destination: ObjectLocation =
        ObjectLocation::parse_uri(destination_uri).map_err(|e| invalid(&e.to_string()))?;

    if source.bucket.is_empty() && destination.bucket.is_empty() {
        return Err(invalid("source and destination buckets are both empty"));
    }

    Ok(FileMove {
        accession: record.accession.clone(),
        status,
        source_bucket: source.bucket,
        source_key: source.key,
        destination_bucket: destination.bucket,
        destination_key: destination.key,
    })
}
