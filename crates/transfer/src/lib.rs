//! Reconciliation of portal file records with bucket contents.
//!
//! A sync run waits for the portal indexer to go idle, fetches every file
//! flagged with an incorrect-bucket audit and, one record at a time:
//!
//! 1. parses the audit message into a [`FileMove`],
//! 2. resolves where the object actually is ([`resolve_source`]),
//! 3. copies, tags, deletes and patches ([`execute`]).
//!
//! Every step can be re-run. An interrupted batch is finished by running
//! sync again.
//!
//! A metadata run exports the released-file metadata as a TSV manifest and
//! publishes it to the public bucket.

pub mod engine;
pub mod error;
pub mod execute;
pub mod file_move;
pub mod indexer;
pub mod manifest;
pub mod resolve;
pub mod settings;

#[cfg(test)]
mod testing;

pub use engine::{ExportOutcome, FileTransfer, SyncOutcome, SyncSummary};
pub use error::TransferError;
pub use execute::{
    copy_file, delete_file, execute, tag_file, update_bucket_on_portal, ExecutionReport,
    StepOutcome,
};
pub use file_move::{parse_file_move, FileMove};
pub use indexer::{wait_for_indexer, IndexerStatus};
pub use manifest::{render_cell, sort_records, write_manifest, write_manifest_file};
pub use resolve::{classify, promote_to_public, resolve_source, Resolution};
pub use settings::{
    TransferSettings, DEFAULT_INDEXER_SCHEDULE_SECS, DEFAULT_MANIFEST_KEY,
    DEFAULT_ORIGINAL_BUCKET, DEFAULT_PUBLIC_BUCKET,
};
