//! Source resolution.
//!
//! Before anything is copied, the engine works out where the object really is.
//! A previous run may have crashed after the copy, after the delete, or before
//! the portal patch, so the audit's nominal source cannot be trusted. The
//! candidates are checked in a fixed order and the first hit decides.
//!
//! | state | checked location | rewrite |
//! |---|---|---|
//! | `Unmoved` | nominal source | none |
//! | `PartiallyMoved` | destination | source := destination |
//! | `RecoveredFromOrigin` | original bucket, source key | source bucket := original |
//! | `Lost` | - | skip the record |

use rusty_transfer_storage::{ObjectLocation, StorageClient, StorageError};
use tracing::{info, warn};

use crate::file_move::FileMove;

/// Where an object was found during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Still at the nominal source: the transfer has not run, or ran but the
    /// delete or patch failed.
    Unmoved,
    /// Only at the destination: copy and delete happened, the patch did not.
    PartiallyMoved,
    /// Only in the original bucket under the source key.
    RecoveredFromOrigin,
    /// Nowhere. Left for manual cleanup.
    Lost,
}

impl Resolution {
    /// Checked states, in priority order.
    pub const CANDIDATES: [Resolution; 3] = [
        Resolution::Unmoved,
        Resolution::PartiallyMoved,
        Resolution::RecoveredFromOrigin,
    ];

    /// The location whose existence selects this state.
    pub fn check_location(
        &self,
        file_move: &FileMove,
        original_bucket: &str,
    ) -> Option<ObjectLocation> {
        match self {
            Resolution::Unmoved => Some(file_move.source()),
            Resolution::PartiallyMoved => Some(file_move.destination()),
            Resolution::RecoveredFromOrigin => Some(ObjectLocation::new(
                original_bucket,
                &file_move.source_key,
            )),
            Resolution::Lost => None,
        }
    }

    /// Rewrite the move for this state. `Lost` yields `None`.
    pub fn apply(&self, mut file_move: FileMove, original_bucket: &str) -> Option<FileMove> {
        match self {
            Resolution::Unmoved => {}
            Resolution::PartiallyMoved => {
                file_move.source_bucket = file_move.destination_bucket.clone();
                file_move.source_key = file_move.destination_key.clone();
            }
            Resolution::RecoveredFromOrigin => {
                file_move.source_bucket = original_bucket.to_string();
            }
            Resolution::Lost => return None,
        }
        Some(file_move)
    }
}

/// Find which state a move is in.
///
/// # Arguments
/// * `storage` - Storage client used for existence checks
/// * `file_move` - The move as parsed (or promoted)
/// * `original_bucket` - The canonical original bucket
///
/// # Returns
/// The first candidate whose checked location exists, or `Resolution::Lost`.
/// Existence-check failures other than not-found propagate.
pub async fn classify<S: StorageClient + ?Sized>(
    storage: &S,
    file_move: &FileMove,
    original_bucket: &str,
) -> Result<Resolution, StorageError> {
    for candidate in Resolution::CANDIDATES {
        let Some(location) = candidate.check_location(file_move, original_bucket) else {
            continue;
        };
        if storage.exists(&location).await? {
            return Ok(candidate);
        }
    }
    Ok(Resolution::Lost)
}

/// Resolve the true current source of a move.
///
/// # Returns
/// The rewritten move, or `None` when the object is in none of the checked
/// locations (logged, not an error).
pub async fn resolve_source<S: StorageClient + ?Sized>(
    storage: &S,
    file_move: FileMove,
    original_bucket: &str,
) -> Result<Option<FileMove>, StorageError> {
    let resolution: Resolution = classify(storage, &file_move, original_bucket).await?;
    match resolution {
        Resolution::Unmoved => {}
        Resolution::PartiallyMoved => info!(
            "{} already at destination {}, only the portal patch is outstanding",
            file_move.accession,
            file_move.destination()
        ),
        Resolution::RecoveredFromOrigin => info!(
            "{} missing from {} and {}, recovering from {}",
            file_move.accession,
            file_move.source(),
            file_move.destination(),
            original_bucket
        ),
        Resolution::Lost => warn!(
            "{} does not exist in any bucket! Skipping!",
            file_move.accession
        ),
    }
    Ok(resolution.apply(file_move, original_bucket))
}

/// Initial transfer mode: prefer a copy already in the public bucket.
///
/// If the source key exists in `public_bucket`, the source bucket is set to
/// it; otherwise the move is returned unchanged. Only for one-time bulk runs.
pub async fn promote_to_public<S: StorageClient + ?Sized>(
    storage: &S,
    mut file_move: FileMove,
    public_bucket: &str,
) -> Result<FileMove, StorageError> {
    let candidate = ObjectLocation::new(public_bucket, &file_move.source_key);
    if storage.exists(&candidate).await? {
        file_move.source_bucket = public_bucket.to_string();
    }
    Ok(file_move)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStorage;

    const ORIGINAL: &str = "encode-files";

    fn file_to_move() -> FileMove {
        FileMove {
            accession: "/files/ENCFF321OXI/".into(),
            status: "in".into(),
            source_bucket: "encode-pds-private-dev".into(),
            source_key: "2019/02/09/dc1388a0/ENCFF321OXI.bigBed".into(),
            destination_bucket: "encode-pds-public-dev".into(),
            destination_key: "2019/02/09/dc1388a0/ENCFF321OXI.bigBed".into(),
        }
    }

    #[tokio::test]
    async fn test_object_only_at_source_is_unchanged() {
        let mv = file_to_move();
        let storage = InMemoryStorage::new().with_object(&mv.source_bucket, &mv.source_key);

        let resolved = resolve_source(&storage, mv.clone(), ORIGINAL).await.unwrap();
        assert_eq!(resolved, Some(mv));
        assert_eq!(storage.heads(), 1);
    }

    #[tokio::test]
    async fn test_object_only_at_destination_becomes_source() {
        let mv = file_to_move();
        let storage =
            InMemoryStorage::new().with_object(&mv.destination_bucket, &mv.destination_key);

        let resolved = resolve_source(&storage, mv.clone(), ORIGINAL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.source_bucket, mv.destination_bucket);
        assert_eq!(resolved.source_key, mv.destination_key);
        assert!(resolved.is_self_move());
    }

    #[tokio::test]
    async fn test_object_only_at_origin_is_recovered() {
        let mut mv = file_to_move();
        mv.destination_key = "renamed/ENCFF321OXI.bigBed".into();
        let storage = InMemoryStorage::new().with_object(ORIGINAL, &mv.source_key);

        let resolved = resolve_source(&storage, mv.clone(), ORIGINAL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.source_bucket, ORIGINAL);
        assert_eq!(resolved.source_key, mv.source_key);
        assert_eq!(resolved.destination(), mv.destination());
    }

    #[tokio::test]
    async fn test_object_nowhere_is_skipped() {
        let storage = InMemoryStorage::new().with_object("unrelated", "key");

        let resolved = resolve_source(&storage, file_to_move(), ORIGINAL).await.unwrap();
        assert_eq!(resolved, None);
        assert_eq!(storage.heads(), 3);
    }

    #[tokio::test]
    async fn test_head_failure_propagates_instead_of_skipping() {
        let mv = file_to_move();
        let storage = InMemoryStorage::new()
            .with_object(&mv.source_bucket, &mv.source_key)
            .failing_heads();

        let err = resolve_source(&storage, mv, ORIGINAL).await.unwrap_err();
        assert!(matches!(err, StorageError::NetworkError { .. }));
        assert_eq!(storage.heads(), 1);
    }

    #[tokio::test]
    async fn test_source_wins_over_destination_and_origin() {
        let mv = file_to_move();
        let storage = InMemoryStorage::new()
            .with_object(&mv.source_bucket, &mv.source_key)
            .with_object(&mv.destination_bucket, &mv.destination_key)
            .with_object(ORIGINAL, &mv.source_key);

        let state = classify(&storage, &mv, ORIGINAL).await.unwrap();
        assert_eq!(state, Resolution::Unmoved);
    }

    #[tokio::test]
    async fn test_destination_wins_over_origin() {
        let mv = file_to_move();
        let storage = InMemoryStorage::new()
            .with_object(&mv.destination_bucket, &mv.destination_key)
            .with_object(ORIGINAL, &mv.source_key);

        let state = classify(&storage, &mv, ORIGINAL).await.unwrap();
        assert_eq!(state, Resolution::PartiallyMoved);
    }

    #[test]
    fn test_lost_apply_is_none() {
        assert_eq!(Resolution::Lost.apply(file_to_move(), ORIGINAL), None);
        assert_eq!(
            Resolution::Lost.check_location(&file_to_move(), ORIGINAL),
            None
        );
    }

    #[tokio::test]
    async fn test_promote_to_public_when_present() {
        let mv = file_to_move();
        let storage = InMemoryStorage::new().with_object("encode-public", &mv.source_key);

        let promoted = promote_to_public(&storage, mv.clone(), "encode-public")
            .await
            .unwrap();
        assert_eq!(promoted.source_bucket, "encode-public");
        assert_eq!(promoted.source_key, mv.source_key);
    }

    #[tokio::test]
    async fn test_promote_to_public_when_absent() {
        let mv = file_to_move();
        let storage = InMemoryStorage::new();

        let promoted = promote_to_public(&storage, mv.clone(), "encode-public")
            .await
            .unwrap();
        assert_eq!(promoted, mv);
    }
}
