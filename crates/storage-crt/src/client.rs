//! AWS SDK S3 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    CompletedMultipartUpload, CompletedPart, ObjectCannedAcl, Tag, Tagging,
};
use aws_sdk_s3::Client as S3Client;
use tracing::{debug, warn};

use rusty_transfer_storage::{
    copy_strategy, plan_copy_parts, validate_copy_part_size, CannedAcl, CopyStrategy,
    ObjectLocation, StorageClient, StorageError, StorageSettings, TagSet,
};

use crate::error::CrtError;

/// StorageClient implementation using AWS SDK for Rust.
///
/// Each client carries its own credentials; building a second client with
/// different keys never affects the first.
pub struct CrtStorageClient {
    /// The underlying S3 client.
    s3_client: S3Client,
    /// Part size for multipart copies.
    copy_part_size: u64,
}

impl CrtStorageClient {
    /// Create a new CRT storage client.
    ///
    /// Uses the credentials in `settings` when present, otherwise the default
    /// credential chain.
    ///
    /// # Arguments
    /// * `settings` - Storage settings including region and optional credentials
    ///
    /// # Returns
    /// `StorageError::InvalidConfig` when `copy_part_size` is outside the
    /// part size range S3 accepts.
    pub async fn new(settings: StorageSettings) -> Result<Self, StorageError> {
        let copy_part_size: u64 = validate_copy_part_size(settings.copy_part_size)?;
        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(settings.region.clone()));

        let config_loader = if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "rusty-transfer",
            );
            config_loader.credentials_provider(credentials)
        } else {
            config_loader
        };

        let sdk_config = config_loader.load().await;
        let s3_client = S3Client::new(&sdk_config);

        Ok(Self {
            s3_client,
            copy_part_size,
        })
    }

    /// Create a client from an existing S3Client (for testing).
    ///
    /// # Arguments
    /// * `s3_client` - Pre-configured S3 client
    /// * `copy_part_size` - Part size for multipart copies
    pub fn from_client(s3_client: S3Client, copy_part_size: u64) -> Self {
        Self {
            s3_client,
            copy_part_size,
        }
    }

    async fn copy_single(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
    ) -> Result<(), CrtError> {
        self.s3_client
            .copy_object()
            .copy_source(encode_copy_source(source))
            .bucket(&destination.bucket)
            .key(&destination.key)
            .send()
            .await
            .map_err(|err| CrtError::SdkError {
                message: err.into_service_error().to_string(),
                retryable: true,
            })?;
        Ok(())
    }

    async fn copy_multipart(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
        size: u64,
    ) -> Result<(), CrtError> {
        let created = self
            .s3_client
            .create_multipart_upload()
            .bucket(&destination.bucket)
            .key(&destination.key)
            .send()
            .await
            .map_err(|err| CrtError::SdkError {
                message: err.into_service_error().to_string(),
                retryable: true,
            })?;

        let upload_id: String = created
            .upload_id()
            .ok_or(CrtError::IncompleteResponse {
                operation: "CreateMultipartUpload",
                field: "UploadId",
            })?
            .to_string();

        match self
            .copy_parts(source, destination, size, &upload_id)
            .await
        {
            Ok(parts) => {
                let completed = CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build();
                self.s3_client
                    .complete_multipart_upload()
                    .bucket(&destination.bucket)
                    .key(&destination.key)
                    .upload_id(&upload_id)
                    .multipart_upload(completed)
                    .send()
                    .await
                    .map_err(|err| CrtError::SdkError {
                        message: err.into_service_error().to_string(),
                        retryable: true,
                    })?;
                Ok(())
            }
            Err(err) => {
                // Abort is best effort.
                if let Err(abort_err) = self
                    .s3_client
                    .abort_multipart_upload()
                    .bucket(&destination.bucket)
                    .key(&destination.key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!(
                        "Failed to abort multipart copy to {}: {}",
                        destination,
                        abort_err.into_service_error()
                    );
                }
                Err(err)
            }
        }
    }

    async fn copy_parts(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
        size: u64,
        upload_id: &str,
    ) -> Result<Vec<CompletedPart>, CrtError> {
        let copy_source: String = encode_copy_source(source);
        let mut completed: Vec<CompletedPart> = Vec::new();

        for part in plan_copy_parts(size, self.copy_part_size) {
            debug!(
                "Copying part {} ({}) of {} to {}",
                part.part_number,
                part.range_header(),
                source,
                destination
            );
            let output = self
                .s3_client
                .upload_part_copy()
                .bucket(&destination.bucket)
                .key(&destination.key)
                .upload_id(upload_id)
                .part_number(part.part_number)
                .copy_source(&copy_source)
                .copy_source_range(part.range_header())
                .send()
                .await
                .map_err(|err| CrtError::SdkError {
                    message: err.into_service_error().to_string(),
                    retryable: true,
                })?;

            let e_tag: String = output
                .copy_part_result()
                .and_then(|r| r.e_tag())
                .ok_or(CrtError::IncompleteResponse {
                    operation: "UploadPartCopy",
                    field: "ETag",
                })?
                .to_string();

            completed.push(
                CompletedPart::builder()
                    .e_tag(e_tag)
                    .part_number(part.part_number)
                    .build(),
            );
        }

        Ok(completed)
    }
}

/// Build the `x-amz-copy-source` value for a location.
///
/// The key is percent-encoded except for unreserved characters and `/`.
pub fn encode_copy_source(location: &ObjectLocation) -> String {
    let mut encoded = String::with_capacity(location.bucket.len() + location.key.len() + 1);
    encoded.push_str(&location.bucket);
    encoded.push('/');
    for byte in location.key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[async_trait]
impl StorageClient for CrtStorageClient {
    async fn head_object(&self, location: &ObjectLocation) -> Result<Option<u64>, StorageError> {
        let request = self
            .s3_client
            .head_object()
            .bucket(&location.bucket)
            .key(&location.key);

        match request.send().await {
            Ok(output) => Ok(Some(output.content_length().map(|l| l as u64).unwrap_or(0))),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(None)
                } else {
                    Err(StorageError::NetworkError {
                        message: service_err.to_string(),
                        retryable: false,
                    })
                }
            }
        }
    }

    async fn copy_object(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
    ) -> Result<(), StorageError> {
        let size: u64 = self
            .head_object(source)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                bucket: source.bucket.clone(),
                key: source.key.clone(),
            })?;

        match copy_strategy(size) {
            CopyStrategy::SingleRequest => self.copy_single(source, destination).await?,
            CopyStrategy::Multipart => self.copy_multipart(source, destination, size).await?,
        }
        Ok(())
    }

    async fn delete_object(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        self.s3_client
            .delete_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|err| StorageError::NetworkError {
                message: err.into_service_error().to_string(),
                retryable: true,
            })?;
        Ok(())
    }

    async fn put_object_tagging(
        &self,
        location: &ObjectLocation,
        tags: &TagSet,
    ) -> Result<(), StorageError> {
        let tag_set: Vec<Tag> = tags
            .tags
            .iter()
            .map(|t| Tag::builder().key(&t.key).value(&t.value).build())
            .collect::<Result<Vec<Tag>, _>>()
            .map_err(CrtError::from)?;
        let tagging: Tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(CrtError::from)?;

        self.s3_client
            .put_object_tagging()
            .bucket(&location.bucket)
            .key(&location.key)
            .tagging(tagging)
            .send()
            .await
            .map_err(|err| StorageError::NetworkError {
                message: err.into_service_error().to_string(),
                retryable: true,
            })?;
        Ok(())
    }

    async fn upload_file(
        &self,
        file_path: &str,
        destination: &ObjectLocation,
        acl: CannedAcl,
    ) -> Result<(), StorageError> {
        let body = ByteStream::from_path(Path::new(file_path))
            .await
            .map_err(|e| StorageError::IoError {
                path: file_path.to_string(),
                message: e.to_string(),
            })?;

        let mut request = self
            .s3_client
            .put_object()
            .bucket(&destination.bucket)
            .key(&destination.key)
            .body(body);

        if acl == CannedAcl::BucketOwnerFullControl {
            request = request.acl(ObjectCannedAcl::BucketOwnerFullControl);
        }

        request.send().await.map_err(|err| StorageError::NetworkError {
            message: err.to_string(),
            retryable: true,
        })?;

        Ok(())
    }
}
