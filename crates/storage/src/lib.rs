//! Storage abstraction for bucket-to-bucket file transfers.
//!
//! This crate provides the platform-agnostic interface the transfer engine
//! uses to inspect and move objects:
//!
//! - **`StorageClient`** - existence checks, server-side copy, delete, tagging
//!   and file upload, addressed by `ObjectLocation`
//! - **Copy planning** - single-request vs multipart copy decisions
//!
//! The AWS SDK implementation lives in `rusty-transfer-storage-crt`.

mod copy;
mod error;
mod traits;
mod types;

pub use copy::{
    copy_strategy, plan_copy_parts, validate_copy_part_size, CopyPart, CopyStrategy,
};
pub use error::StorageError;
pub use traits::StorageClient;
pub use types::{
    AwsCredentials, CannedAcl, ObjectLocation, StorageSettings, Tag, TagSet,
    DEFAULT_COPY_PART_SIZE, MAX_COPY_PARTS, MAX_COPY_PART_SIZE, MAX_SINGLE_COPY_SIZE,
    MIN_COPY_PART_SIZE, RETENTION_TAG_KEY, RETENTION_TAG_VALUE,
};
