//! Shared data structures for portal operations.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::PortalError;

/// Default portal server.
pub const DEFAULT_SERVER: &str = "https://api.data.igvf.org";

/// Audit bucket holding internal-action audits.
pub const AUDIT_TYPE: &str = "INTERNAL_ACTION";

/// Audit category flagging a file stored in the wrong bucket.
pub const AUDIT_CATEGORY: &str = "incorrect file bucket";

/// Fields requested for the public file manifest, in column order.
pub const DEFAULT_METADATA_FIELDS: &[&str] = &[
    "@id",
    "href",
    "accession",
    "file_format",
    "file_format_type",
    "content_type",
    "summary",
    "file_set.accession",
    "file_set.file_set_type",
    "assay_titles",
    "preferred_assay_titles",
    "file_set.donors.accession",
    "file_set.samples.accession",
    "file_set.samples.sample_terms.term_name",
    "file_set.samples.summary",
    "cell_type_annotation.term_name",
    "creation_timestamp",
    "file_size",
    "file_set.lab.title",
    "s3_uri",
    "assembly",
    "transcriptome_annotation",
    "controlled_access",
    "md5sum",
    "derived_from",
    "status",
    "upload_status",
    "flowcell_id",
    "lane",
    "sequencing_run",
    "illumina_read_type",
    "mean_read_length",
    "seqspecs",
    "seqspec_document",
    "sequencing_kit",
    "sequencing_platform.term_name",
    "workflows.accession",
];

/// File statuses included in the manifest.
pub const DEFAULT_METADATA_STATUSES: &[&str] = &["released", "archived"];

/// Upload statuses included in the manifest.
pub const DEFAULT_METADATA_UPLOAD_STATUSES: &[&str] = &["validated", "validation exempted"];

/// Portal access key pair, sent as HTTP basic auth.
#[derive(Clone)]
pub struct PortalCredentials {
    pub key: String,
    pub secret: String,
}

impl PortalCredentials {
    /// Create a credential pair.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for PortalCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Number of search results to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum BatchSize {
    /// Ask the portal for every matching result (`limit=all`).
    All,
    /// Ask for at most this many results.
    Limit(u64),
}

impl BatchSize {
    /// Value of the `limit` search parameter. A zero limit sends none.
    pub fn limit(&self) -> Option<String> {
        match self {
            BatchSize::All => Some("all".to_string()),
            BatchSize::Limit(0) => None,
            BatchSize::Limit(n) => Some(n.to_string()),
        }
    }
}

impl FromStr for BatchSize {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed: &str = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(BatchSize::All);
        }
        trimmed
            .parse::<u64>()
            .map(BatchSize::Limit)
            .map_err(|_| PortalError::InvalidBatchSize {
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for BatchSize {
    type Error = PortalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchSize::All => write!(f, "all"),
            BatchSize::Limit(n) => write!(f, "{}", n),
        }
    }
}

/// Extra search terms appended to the audit query.
///
/// Terms keep their insertion order. A multi-valued term expands to one
/// query parameter per value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct QueryFilter {
    terms: Vec<(String, Vec<String>)>,
}

impl QueryFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single-valued term.
    pub fn with_term(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push((key.into(), vec![value.into()]));
        self
    }

    /// Append a multi-valued term.
    pub fn with_terms<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms
            .push((key.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Parse a filter from a JSON object such as `{"accession": ["A", "B"]}`.
    pub fn from_json_str(s: &str) -> Result<Self, PortalError> {
        let value: Value = serde_json::from_str(s).map_err(|e| PortalError::InvalidFilter {
            message: e.to_string(),
        })?;
        Self::try_from(value)
    }

    /// Flatten to `(key, value)` pairs, one per value.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}

impl TryFrom<Value> for QueryFilter {
    type Error = PortalError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err(PortalError::InvalidFilter {
                message: "expected a JSON object".into(),
            });
        };

        let mut filter = QueryFilter::new();
        for (key, value) in map {
            let values: Vec<String> = match value {
                Value::Array(items) => items
                    .iter()
                    .map(filter_scalar)
                    .collect::<Result<Vec<String>, PortalError>>()?,
                other => vec![filter_scalar(&other)?],
            };
            filter.terms.push((key, values));
        }
        Ok(filter)
    }
}

fn filter_scalar(value: &Value) -> Result<String, PortalError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(PortalError::InvalidFilter {
            message: format!("unsupported filter value {}", other),
        }),
    }
}

/// Configuration for the portal client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    /// Portal base URL (scheme and host are used for searches).
    pub server: String,
    /// Field allowlist for the metadata search, in manifest column order.
    pub fields: Vec<String>,
    /// File statuses included in the metadata search.
    pub statuses: Vec<String>,
    /// Upload statuses included in the metadata search.
    pub upload_statuses: Vec<String>,
    /// Result limit applied to searches, unless a call passes its own.
    pub batch_size: Option<BatchSize>,
    /// Extra terms for the audit search, unless a call passes its own.
    pub query_filter: Option<QueryFilter>,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            fields: to_strings(DEFAULT_METADATA_FIELDS),
            statuses: to_strings(DEFAULT_METADATA_STATUSES),
            upload_statuses: to_strings(DEFAULT_METADATA_UPLOAD_STATUSES),
            batch_size: None,
            query_filter: None,
        }
    }
}

impl PortalSettings {
    /// Set the portal server.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set the search result limit.
    pub fn with_batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set the audit search filter.
    pub fn with_query_filter(mut self, query_filter: QueryFilter) -> Self {
        self.query_filter = Some(query_filter);
        self
    }

    /// Replace the metadata field allowlist.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_parse() {
        assert_eq!("all".parse::<BatchSize>().unwrap(), BatchSize::All);
        assert_eq!("25".parse::<BatchSize>().unwrap(), BatchSize::Limit(25));
        assert!("ten".parse::<BatchSize>().is_err());
        assert_eq!(BatchSize::All.to_string(), "all");
    }

    #[test]
    fn test_batch_size_limit() {
        assert_eq!(BatchSize::All.limit().as_deref(), Some("all"));
        assert_eq!(BatchSize::Limit(10).limit().as_deref(), Some("10"));
        assert_eq!(BatchSize::Limit(0).limit(), None);
    }

    #[test]
    fn test_query_filter_from_json_keeps_order() {
        let filter = QueryFilter::from_json_str(
            r#"{"status": "in progress", "accession": ["ENCFF000123", "ENCFF000456"]}"#,
        )
        .unwrap();
        let pairs: Vec<(&str, &str)> = filter.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                ("status", "in progress"),
                ("accession", "ENCFF000123"),
                ("accession", "ENCFF000456"),
            ]
        );
    }

    #[test]
    fn test_query_filter_rejects_non_object() {
        assert!(QueryFilter::from_json_str(r#"["a"]"#).is_err());
        assert!(QueryFilter::from_json_str(r#"{"a": {"b": 1}}"#).is_err());
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: PortalSettings =
            serde_json::from_str(r#"{"server": "https://portal.test", "batch_size": "10"}"#)
                .unwrap();
        assert_eq!(settings.server, "https://portal.test");
        assert_eq!(settings.batch_size, Some(BatchSize::Limit(10)));
        assert_eq!(settings.statuses, vec!["released", "archived"]);
    }
}
