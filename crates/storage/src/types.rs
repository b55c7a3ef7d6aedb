//! Shared data structures for storage operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Largest object S3 accepts in a single CopyObject request (5 GiB).
pub const MAX_SINGLE_COPY_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Default part size for multipart copies (512 MiB).
pub const DEFAULT_COPY_PART_SIZE: u64 = 512 * 1024 * 1024;

/// Smallest part S3 accepts in a multipart copy (5 MiB).
pub const MIN_COPY_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Largest part S3 accepts in a multipart copy (5 GiB).
pub const MAX_COPY_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Most parts one multipart upload may have.
pub const MAX_COPY_PARTS: u64 = 10_000;

/// Tag key marking an object that has been mirrored to another account.
pub const RETENTION_TAG_KEY: &str = "copied_to";

/// Tag value marking an object that has been mirrored to the open data account.
pub const RETENTION_TAG_VALUE: &str = "open_data_account";

/// Configuration settings for storage operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// AWS region.
    pub region: String,
    /// AWS credentials (access key, secret key, session token).
    #[serde(skip)]
    pub credentials: Option<AwsCredentials>,
    /// Part size used when an object is too large for a single copy request.
    pub copy_part_size: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            region: "us-west-2".into(),
            credentials: None,
            copy_part_size: DEFAULT_COPY_PART_SIZE,
        }
    }
}

impl StorageSettings {
    /// Set the credentials used by clients built from these settings.
    ///
    /// # Arguments
    /// * `credentials` - Access key pair scoped to the client session
    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

/// AWS credentials.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl AwsCredentials {
    /// Create credentials from an access key pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A bucket and key pair addressing one object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    /// Bucket name.
    pub bucket: String,
    /// Object key (no leading slash).
    pub key: String,
}

impl ObjectLocation {
    /// Create a new object location.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse a `<scheme>://<bucket>/<key...>` URI.
    ///
    /// The scheme is not interpreted. Everything after the first `/` following
    /// the bucket is the key, so nested prefixes are preserved.
    ///
    /// # Arguments
    /// * `uri` - Storage URI such as `s3://igvf-files/2024/01/01/uuid/IGVFFI0001.bam`
    ///
    /// # Returns
    /// The parsed location, or `StorageError::InvalidUri` when there is no
    /// `://` separator.
    pub fn parse_uri(uri: &str) -> Result<Self, StorageError> {
        let trimmed: &str = uri.trim();
        let (_, rest) = trimmed
            .split_once("://")
            .ok_or_else(|| StorageError::InvalidUri {
                uri: uri.to_string(),
            })?;
        let (bucket, key) = match rest.split_once('/') {
            Some((bucket, key)) => (bucket, key),
            None => (rest, ""),
        };
        Ok(Self::new(bucket, key))
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// A single object tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// The full tag set applied to an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    #[serde(rename = "TagSet")]
    pub tags: Vec<Tag>,
}

impl TagSet {
    /// Tag set signalling that the object has been mirrored to the open data account.
    pub fn retention() -> Self {
        Self {
            tags: vec![Tag {
                key: RETENTION_TAG_KEY.to_string(),
                value: RETENTION_TAG_VALUE.to_string(),
            }],
        }
    }
}

/// Canned ACL applied to uploaded objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CannedAcl {
    /// Leave the bucket default in place.
    #[default]
    Default,
    /// Grant the bucket owner full control.
    BucketOwnerFullControl,
}
