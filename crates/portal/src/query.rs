//! Search URL construction.
//!
//! Pure functions producing the exact URLs sent to the portal. Values are
//! form-encoded the way the portal's own links are (`+` for spaces, `!` as
//! `%21`).

use url::form_urlencoded;
use url::Url;

use crate::error::PortalError;
use crate::types::{BatchSize, QueryFilter, AUDIT_CATEGORY, AUDIT_TYPE};

/// Path of the search endpoint.
pub const SEARCH_PATH: &str = "/search/";

/// Path of the indexer status endpoint.
pub const INDEXER_PATH: &str = "indexer-info";

/// Build the search query for files carrying the incorrect-bucket audit.
///
/// # Arguments
/// * `server` - Portal base URL; only scheme, host and port are used
/// * `batch_size` - Optional result limit
/// * `filter` - Optional extra search terms
pub fn audit_query_url(
    server: &str,
    batch_size: Option<BatchSize>,
    filter: Option<&QueryFilter>,
) -> Result<String, PortalError> {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("type", "File");
    query.append_pair(&format!("audit.{}.category", AUDIT_TYPE), AUDIT_CATEGORY);
    if let Some(limit) = batch_size.and_then(|b| b.limit()) {
        query.append_pair("limit", &limit);
    }
    if let Some(filter) = filter {
        for (key, value) in filter.pairs() {
            query.append_pair(key, value);
        }
    }
    search_url(server, &query.finish())
}

/// Build the search query for manifest metadata.
///
/// Selects files in the given statuses and upload statuses, excluding
/// controlled-access, externally hosted and incorrect-bucket files, and asks
/// only for the listed fields.
///
/// # Arguments
/// * `server` - Portal base URL
/// * `batch_size` - Optional result limit
/// * `fields` - Field allowlist, one `field=` parameter each
/// * `statuses` - File statuses, one `status=` parameter each
/// * `upload_statuses` - Upload statuses, one `upload_status=` parameter each
pub fn metadata_query_url(
    server: &str,
    batch_size: Option<BatchSize>,
    fields: &[String],
    statuses: &[String],
    upload_statuses: &[String],
) -> Result<String, PortalError> {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("type", "File");
    if let Some(limit) = batch_size.and_then(|b| b.limit()) {
        query.append_pair("limit", &limit);
    }
    for field in fields {
        query.append_pair("field", field);
    }
    for status in statuses {
        query.append_pair("status", status);
    }
    for upload_status in upload_statuses {
        query.append_pair("upload_status", upload_status);
    }
    query.append_pair("controlled_access!", "true");
    query.append_pair("externally_hosted!", "true");
    query.append_pair(&format!("audit.{}.category!", AUDIT_TYPE), AUDIT_CATEGORY);
    search_url(server, &query.finish())
}

/// `PATCH` target updating the bucket of one file.
///
/// Surrounding slashes on `accession` are ignored, so both `IGVFFI0001` and
/// `/files/IGVFFI0001/` work.
pub fn bucket_update_url(server: &str, accession: &str) -> Result<String, PortalError> {
    let path: String = format!("/{}/@@update_bucket", accession.trim_matches('/'));
    join(server, &path)
}

/// Indexer status endpoint.
pub fn indexer_url(server: &str) -> Result<String, PortalError> {
    join(server, INDEXER_PATH)
}

fn search_url(server: &str, query: &str) -> Result<String, PortalError> {
    let mut url: Url = parse_server(server)?;
    url.set_path(SEARCH_PATH);
    url.set_query(Some(query));
    url.set_fragment(None);
    Ok(url.to_string())
}

fn join(server: &str, path: &str) -> Result<String, PortalError> {
    let mut base: Url = parse_server(server)?;
    if !base.path().ends_with('/') {
        let with_slash: String = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map(|u| u.to_string())
        .map_err(|e| PortalError::InvalidUrl {
            url: format!("{}{}", server, path),
            message: e.to_string(),
        })
}

fn parse_server(server: &str) -> Result<Url, PortalError> {
    Url::parse(server).map_err(|e| PortalError::InvalidUrl {
        url: server.to_string(),
        message: e.to_string(),
    })
}
