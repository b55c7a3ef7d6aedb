//! Metadata portal client.
//!
//! - **Audit search** - files flagged with the incorrect-bucket audit
//! - **Metadata search** - manifest fields, flattened to dotted keys
//! - **Bucket patch** - point a file record at its new bucket
//! - **Indexer status** - whether search results are current
//!
//! Search URLs are built by pure functions in `query`, so the exact wire
//! shape can be tested without a server.

mod audit;
mod client;
mod error;
mod flatten;
pub mod query;
mod types;

pub use audit::{graph, is_zero_results, parse_audits, AuditRecord, NO_RESULTS_NOTIFICATION};
pub use client::{HttpPortalClient, PortalClient};
pub use error::PortalError;
pub use flatten::{flatten_record, FieldPath, MetadataRecord};
pub use types::{
    BatchSize, PortalCredentials, PortalSettings, QueryFilter, AUDIT_CATEGORY, AUDIT_TYPE,
    DEFAULT_METADATA_FIELDS, DEFAULT_METADATA_STATUSES, DEFAULT_METADATA_UPLOAD_STATUSES,
    DEFAULT_SERVER,
};
