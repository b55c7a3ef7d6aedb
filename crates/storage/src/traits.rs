//! Storage traits/interfaces for S3 operations.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{CannedAcl, ObjectLocation, TagSet};

/// Low-level S3 operations - implemented by each backend.
///
/// Every method addresses objects by bucket and key. Credentials belong to the
/// implementing client, never to the process.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Check if an object exists and return its size.
    /// Returns None if object doesn't exist.
    async fn head_object(&self, location: &ObjectLocation) -> Result<Option<u64>, StorageError>;

    /// Check if an object exists.
    ///
    /// A missing object is `Ok(false)`; any other failure propagates.
    async fn exists(&self, location: &ObjectLocation) -> Result<bool, StorageError> {
        Ok(self.head_object(location).await?.is_some())
    }

    /// Server-side copy of an object, overwriting the destination.
    async fn copy_object(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
    ) -> Result<(), StorageError>;

    /// Delete an object.
    async fn delete_object(&self, location: &ObjectLocation) -> Result<(), StorageError>;

    /// Replace the tag set of an object.
    async fn put_object_tagging(
        &self,
        location: &ObjectLocation,
        tags: &TagSet,
    ) -> Result<(), StorageError>;

    /// Upload from file path to S3.
    async fn upload_file(
        &self,
        file_path: &str,
        destination: &ObjectLocation,
        acl: CannedAcl,
    ) -> Result<(), StorageError>;
}
