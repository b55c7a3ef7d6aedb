//! In-memory portal and storage fakes shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use rusty_transfer_portal::{
    AuditRecord, BatchSize, MetadataRecord, PortalClient, PortalError, QueryFilter,
};
use rusty_transfer_storage::{CannedAcl, ObjectLocation, StorageClient, StorageError, TagSet};

/// Storage operation recorded by `InMemoryStorage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Head(ObjectLocation),
    Copy(ObjectLocation, ObjectLocation),
    Delete(ObjectLocation),
    Tag(ObjectLocation),
    Upload(String, ObjectLocation, CannedAcl),
}

/// Bucket contents held in memory.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<ObjectLocation, u64>>,
    tags: Mutex<HashMap<ObjectLocation, TagSet>>,
    uploads: Mutex<HashMap<ObjectLocation, Vec<u8>>>,
    ops: Mutex<Vec<StorageOp>>,
    fail_copy: Mutex<bool>,
    fail_head: Mutex<bool>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, bucket: &str, key: &str) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(ObjectLocation::new(bucket, key), 100);
        self
    }

    pub fn failing_copies(self) -> Self {
        *self.fail_copy.lock().unwrap() = true;
        self
    }

    /// Every existence check fails with a non-retryable error.
    pub fn failing_heads(self) -> Self {
        *self.fail_head.lock().unwrap() = true;
        self
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&ObjectLocation::new(bucket, key))
    }

    pub fn tags_of(&self, bucket: &str, key: &str) -> Option<TagSet> {
        self.tags
            .lock()
            .unwrap()
            .get(&ObjectLocation::new(bucket, key))
            .cloned()
    }

    pub fn uploaded(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.uploads
            .lock()
            .unwrap()
            .get(&ObjectLocation::new(bucket, key))
            .cloned()
    }

    /// Recorded operations other than existence checks.
    pub fn mutations(&self) -> Vec<StorageOp> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| !matches!(op, StorageOp::Head(_)))
            .cloned()
            .collect()
    }

    pub fn heads(&self) -> usize {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| matches!(op, StorageOp::Head(_)))
            .count()
    }

    fn record(&self, op: StorageOp) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl StorageClient for InMemoryStorage {
    async fn head_object(&self, location: &ObjectLocation) -> Result<Option<u64>, StorageError> {
        self.record(StorageOp::Head(location.clone()));
        if *self.fail_head.lock().unwrap() {
            return Err(StorageError::NetworkError {
                message: "403".into(),
                retryable: false,
            });
        }
        Ok(self.objects.lock().unwrap().get(location).copied())
    }

    async fn copy_object(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
    ) -> Result<(), StorageError> {
        self.record(StorageOp::Copy(source.clone(), destination.clone()));
        if *self.fail_copy.lock().unwrap() {
            return Err(StorageError::NetworkError {
                message: "copy failed".into(),
                retryable: true,
            });
        }
        let mut objects = self.objects.lock().unwrap();
        let size: u64 = *objects.get(source).ok_or_else(|| StorageError::NotFound {
            bucket: source.bucket.clone(),
            key: source.key.clone(),
        })?;
        objects.insert(destination.clone(), size);
        Ok(())
    }

    async fn delete_object(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        self.record(StorageOp::Delete(location.clone()));
        self.objects.lock().unwrap().remove(location);
        Ok(())
    }

    async fn put_object_tagging(
        &self,
        location: &ObjectLocation,
        tags: &TagSet,
    ) -> Result<(), StorageError> {
        self.record(StorageOp::Tag(location.clone()));
        self.tags
            .lock()
            .unwrap()
            .insert(location.clone(), tags.clone());
        Ok(())
    }

    async fn upload_file(
        &self,
        file_path: &str,
        destination: &ObjectLocation,
        acl: CannedAcl,
    ) -> Result<(), StorageError> {
        self.record(StorageOp::Upload(
            file_path.to_string(),
            destination.clone(),
            acl,
        ));
        let data: Vec<u8> = std::fs::read(file_path).map_err(|e| StorageError::IoError {
            path: file_path.to_string(),
            message: e.to_string(),
        })?;
        self.uploads
            .lock()
            .unwrap()
            .insert(destination.clone(), data);
        Ok(())
    }
}

/// Portal returning canned audits and metadata.
pub struct FakePortal {
    audits: Vec<AuditRecord>,
    metadata: Vec<MetadataRecord>,
    fields: Vec<String>,
    indexing: Mutex<VecDeque<bool>>,
    polls: Mutex<usize>,
    audit_queries: Mutex<Vec<(Option<BatchSize>, Option<QueryFilter>)>>,
    patches: Mutex<Vec<(String, String)>>,
    fail_patch: bool,
}

impl FakePortal {
    pub fn new() -> Self {
        Self {
            audits: Vec::new(),
            metadata: Vec::new(),
            fields: Vec::new(),
            indexing: Mutex::new(VecDeque::new()),
            polls: Mutex::new(0),
            audit_queries: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
            fail_patch: false,
        }
    }

    pub fn with_audit(mut self, accession: &str, detail: &str) -> Self {
        self.audits.push(AuditRecord::new(accession, detail));
        self
    }

    pub fn with_metadata(mut self, fields: &[&str], records: Vec<Value>) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self.metadata = records
            .into_iter()
            .map(|r| match r {
                Value::Object(map) => map,
                _ => MetadataRecord::new(),
            })
            .collect();
        self
    }

    /// Answers for successive `is_indexing` polls; idle once exhausted.
    pub fn with_indexing(self, answers: &[bool]) -> Self {
        *self.indexing.lock().unwrap() = answers.iter().copied().collect();
        self
    }

    pub fn failing_patches(mut self) -> Self {
        self.fail_patch = true;
        self
    }

    pub fn polls(&self) -> usize {
        *self.polls.lock().unwrap()
    }

    pub fn audit_queries(&self) -> usize {
        self.audit_queries.lock().unwrap().len()
    }

    pub fn last_audit_query(&self) -> Option<(Option<BatchSize>, Option<QueryFilter>)> {
        self.audit_queries.lock().unwrap().last().cloned()
    }

    pub fn patches(&self) -> Vec<(String, String)> {
        self.patches.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortalClient for FakePortal {
    async fn query_audit_flagged_files(
        &self,
        batch_size: Option<BatchSize>,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<AuditRecord>, PortalError> {
        self.audit_queries
            .lock()
            .unwrap()
            .push((batch_size, filter.cloned()));
        Ok(self.audits.clone())
    }

    async fn query_file_metadata(&self) -> Result<Vec<MetadataRecord>, PortalError> {
        Ok(self.metadata.clone())
    }

    async fn patch_bucket(&self, accession: &str, new_bucket: &str) -> Result<Value, PortalError> {
        if self.fail_patch {
            return Err(PortalError::BadResponse {
                status: 403,
                url: format!("{}/@@update_bucket", accession),
                body: "Access denied".into(),
            });
        }
        self.patches
            .lock()
            .unwrap()
            .push((accession.to_string(), new_bucket.to_string()));
        Ok(json!({"status": "success"}))
    }

    async fn is_indexing(&self) -> Result<bool, PortalError> {
        *self.polls.lock().unwrap() += 1;
        Ok(self.indexing.lock().unwrap().pop_front().unwrap_or(false))
    }

    fn metadata_fields(&self) -> &[String] {
        &self.fields
    }
}
