//! Audit annotations and search response shapes.

use serde_json::Value;

use crate::types::{AUDIT_CATEGORY, AUDIT_TYPE};

/// Notification text the portal sends with an empty search.
pub const NO_RESULTS_NOTIFICATION: &str = "No results found";

/// One incorrect-bucket audit attached to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Portal resource identifier of the file (its `@id`).
    pub accession: String,
    /// Human-readable audit message describing the expected move.
    pub detail: String,
}

impl AuditRecord {
    pub fn new(accession: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            accession: accession.into(),
            detail: detail.into(),
        }
    }
}

/// Extract incorrect-bucket audits from search results.
///
/// The file's `@id` is used as the accession so replaced and reference files,
/// which have no accession of their own, are still addressable. A file with
/// several matching audits yields one record per audit; results without an
/// `@id` are ignored.
///
/// # Arguments
/// * `graph` - The `@graph` array of a search response
pub fn parse_audits(graph: &[Value]) -> Vec<AuditRecord> {
    let mut records: Vec<AuditRecord> = Vec::new();
    for result in graph {
        let Some(accession) = result.get("@id").and_then(Value::as_str) else {
            continue;
        };
        let audits: &[Value] = result
            .get("audit")
            .and_then(|a| a.get(AUDIT_TYPE))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for audit in audits {
            if audit.get("category").and_then(Value::as_str) != Some(AUDIT_CATEGORY) {
                continue;
            }
            let detail: &str = audit.get("detail").and_then(Value::as_str).unwrap_or_default();
            records.push(AuditRecord::new(accession, detail));
        }
    }
    records
}

/// Whether a 404 response is really an empty search.
///
/// The portal reports "no results" as a 404 whose body still carries the
/// normal search envelope. Every marker must be present.
pub fn is_zero_results(status: u16, body: &Value) -> bool {
    if status != 404 {
        return false;
    }
    let graph_empty: bool = body
        .get("@graph")
        .and_then(Value::as_array)
        .is_some_and(|g| g.is_empty());
    let total_zero: bool = body.get("total").and_then(Value::as_u64) == Some(0);
    let notified: bool =
        body.get("notification").and_then(Value::as_str) == Some(NO_RESULTS_NOTIFICATION);
    graph_empty && total_zero && notified
}

/// The `@graph` array of a search response, or empty when absent.
pub fn graph(body: &Value) -> &[Value] {
    body.get("@graph")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
