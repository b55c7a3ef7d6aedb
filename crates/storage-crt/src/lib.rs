//! AWS SDK S3 backend for rusty-transfer storage.
//!
//! This crate provides a `StorageClient` implementation using the AWS SDK for Rust.
//! It supports the S3 operations the transfer engine needs: HEAD, server-side
//! copy (single request or multipart), delete, tagging and file upload.
//!
//! # Example
//!
//! ```ignore
//! use rusty_transfer_storage_crt::CrtStorageClient;
//! use rusty_transfer_storage::{AwsCredentials, StorageSettings};
//!
//! let settings = StorageSettings::default()
//!     .with_credentials(AwsCredentials::new(access_key, secret_key));
//! let client = CrtStorageClient::new(settings).await?;
//! ```

mod client;
mod error;

pub use client::{encode_copy_source, CrtStorageClient};
pub use error::CrtError;
