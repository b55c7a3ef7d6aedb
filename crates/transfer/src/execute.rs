//! The copy, tag, delete and patch steps of one move.
//!
//! Each step is safe to repeat. Nothing is rolled back when a later step
//! fails; the next run's source resolution picks up from the real state.

use rusty_transfer_portal::PortalClient;
use rusty_transfer_storage::{StorageClient, StorageError, TagSet};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::TransferError;
use crate::file_move::FileMove;

/// Result of the copy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Object copied to the destination.
    Copied,
    /// Source and destination are the same object; nothing to do.
    SkippedSameLocation,
}

/// What each step did for one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub copied: StepOutcome,
    /// Retention tag applied to the original.
    pub tagged: bool,
    /// Source object deleted.
    pub deleted: bool,
    /// Portal response to the bucket update.
    pub patch_response: Value,
}

/// Copy the source object to the destination.
///
/// A self-move is a successful no-op.
pub async fn copy_file<S: StorageClient + ?Sized>(
    storage: &S,
    file_move: &FileMove,
) -> Result<StepOutcome, StorageError> {
    if file_move.is_self_move() {
        warn!("Source and destination same. Skipping move!");
        return Ok(StepOutcome::SkippedSameLocation);
    }
    info!(
        "Copying {} to {}",
        file_move.source(),
        file_move.destination()
    );
    storage
        .copy_object(&file_move.source(), &file_move.destination())
        .await?;
    Ok(StepOutcome::Copied)
}

/// Tag the source with the retention tag set if it is in the original bucket.
///
/// # Returns
/// `true` when the tag was applied, `false` when the source is elsewhere.
pub async fn tag_file<S: StorageClient + ?Sized>(
    storage: &S,
    file_move: &FileMove,
    original_bucket: &str,
) -> Result<bool, StorageError> {
    if !file_move.source_is(original_bucket) {
        warn!("Object not in {}. Skipping tag!", original_bucket);
        return Ok(false);
    }
    let tags: TagSet = TagSet::retention();
    info!("Tagging {} with {:?}", file_move.source(), tags);
    storage
        .put_object_tagging(&file_move.source(), &tags)
        .await?;
    Ok(true)
}

/// Delete the source object.
///
/// Refused (returns `false`) when the source is the original bucket or the
/// move is a self-move.
pub async fn delete_file<S: StorageClient + ?Sized>(
    storage: &S,
    file_move: &FileMove,
    original_bucket: &str,
) -> Result<bool, StorageError> {
    if file_move.source_is(original_bucket) {
        warn!("Not deleting from {}", original_bucket);
        return Ok(false);
    }
    if file_move.is_self_move() {
        warn!("Source and destination same. Skipping delete!");
        return Ok(false);
    }
    info!("Deleting {}", file_move.source());
    storage.delete_object(&file_move.source()).await?;
    Ok(true)
}

/// Record the destination bucket on the portal.
///
/// # Returns
/// The portal's response body.
pub async fn update_bucket_on_portal<P: PortalClient + ?Sized>(
    portal: &P,
    file_move: &FileMove,
) -> Result<Value, TransferError> {
    let response: Value = portal
        .patch_bucket(&file_move.accession, &file_move.destination_bucket)
        .await?;
    info!("Portal updated {}: {}", file_move.accession, response);
    Ok(response)
}

/// Run copy, tag, delete and patch in order for a resolved move.
///
/// The first failing step aborts the sequence and its error is returned.
pub async fn execute<P, S>(
    portal: &P,
    storage: &S,
    file_move: &FileMove,
    original_bucket: &str,
) -> Result<ExecutionReport, TransferError>
where
    P: PortalClient + ?Sized,
    S: StorageClient + ?Sized,
{
    let copied: StepOutcome = copy_file(storage, file_move).await?;
    let tagged: bool = tag_file(storage, file_move, original_bucket).await?;
    let deleted: bool = delete_file(storage, file_move, original_bucket).await?;
    let patch_response: Value = update_bucket_on_portal(portal, file_move).await?;
    Ok(ExecutionReport {
        copied,
        tagged,
        deleted,
        patch_response,
    })
}
