//! Configuration for transfer runs.

use std::time::Duration;

use serde::Deserialize;

/// Bucket holding every file's original upload. Never deleted from.
pub const DEFAULT_ORIGINAL_BUCKET: &str = "igvf-files";

/// Bucket serving public files and the manifest.
pub const DEFAULT_PUBLIC_BUCKET: &str = "igvf-public";

/// Key of the published manifest.
pub const DEFAULT_MANIFEST_KEY: &str = "igvf_file_manifest.tsv";

/// Seconds to wait before each indexer poll.
pub const DEFAULT_INDEXER_SCHEDULE_SECS: &[u64] = &[0, 120, 240];

/// Configuration settings for sync and export runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// The canonical original bucket.
    pub original_bucket: String,
    /// Public bucket for initial-transfer lookups and the manifest.
    pub public_bucket: String,
    /// Key the manifest is published under.
    pub manifest_key: String,
    /// Local path the manifest is written to before upload.
    pub local_manifest_path: String,
    /// Delays before each indexer poll, in seconds.
    pub indexer_schedule_secs: Vec<u64>,
    /// Treat the public bucket as a candidate source before resolution.
    pub initial_transfer: bool,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            original_bucket: DEFAULT_ORIGINAL_BUCKET.to_string(),
            public_bucket: DEFAULT_PUBLIC_BUCKET.to_string(),
            manifest_key: DEFAULT_MANIFEST_KEY.to_string(),
            local_manifest_path: DEFAULT_MANIFEST_KEY.to_string(),
            indexer_schedule_secs: DEFAULT_INDEXER_SCHEDULE_SECS.to_vec(),
            initial_transfer: false,
        }
    }
}

impl TransferSettings {
    /// Set the canonical original bucket.
    pub fn with_original_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.original_bucket = bucket.into();
        self
    }

    /// Set the public bucket.
    pub fn with_public_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.public_bucket = bucket.into();
        self
    }

    /// Set the indexer poll schedule.
    ///
    /// # Arguments
    /// * `secs` - Delay before each poll, in seconds
    pub fn with_indexer_schedule_secs(mut self, secs: impl Into<Vec<u64>>) -> Self {
        self.indexer_schedule_secs = secs.into();
        self
    }

    /// Enable or disable initial transfer mode.
    pub fn with_initial_transfer(mut self, enabled: bool) -> Self {
        self.initial_transfer = enabled;
        self
    }

    /// Set the local manifest path.
    pub fn with_local_manifest_path(mut self, path: impl Into<String>) -> Self {
        self.local_manifest_path = path.into();
        self
    }

    /// The indexer poll schedule as durations.
    pub fn indexer_schedule(&self) -> Vec<Duration> {
        self.indexer_schedule_secs
            .iter()
            .map(|s| Duration::from_secs(*s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let settings = TransferSettings::default();
        assert_eq!(
            settings.indexer_schedule(),
            vec![
                Duration::from_secs(0),
                Duration::from_secs(120),
                Duration::from_secs(240)
            ]
        );
        assert!(!settings.initial_transfer);
    }

    #[test]
    fn test_deserialize_overrides() {
        let settings: TransferSettings = serde_json::from_str(
            r#"{"original_bucket": "encode-files", "indexer_schedule_secs": [0, 5]}"#,
        )
        .unwrap();
        assert_eq!(settings.original_bucket, "encode-files");
        assert_eq!(settings.public_bucket, DEFAULT_PUBLIC_BUCKET);
        assert_eq!(settings.indexer_schedule_secs, vec![0, 5]);
    }
}
