//! Portal client trait and its HTTP implementation.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::audit::{graph, is_zero_results, parse_audits, AuditRecord};
use crate::error::PortalError;
use crate::flatten::{flatten_record, FieldPath, MetadataRecord};
use crate::query::{audit_query_url, bucket_update_url, indexer_url, metadata_query_url};
use crate::types::{BatchSize, PortalCredentials, PortalSettings, QueryFilter};

/// Operations the transfer engine needs from the metadata portal.
#[async_trait]
pub trait PortalClient: Send + Sync {
    /// Files carrying the incorrect-bucket audit.
    ///
    /// # Arguments
    /// * `batch_size` - Optional result limit; `None` falls back to the client's settings
    /// * `filter` - Optional extra search terms; `None` falls back to the client's settings
    async fn query_audit_flagged_files(
        &self,
        batch_size: Option<BatchSize>,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<AuditRecord>, PortalError>;

    /// Released, validated, publicly hosted files, flattened over the field allowlist.
    async fn query_file_metadata(&self) -> Result<Vec<MetadataRecord>, PortalError>;

    /// Point one file at a new bucket.
    ///
    /// # Returns
    /// The portal's JSON response body.
    async fn patch_bucket(&self, accession: &str, new_bucket: &str) -> Result<Value, PortalError>;

    /// Whether the search indexer is still catching up with recent writes.
    async fn is_indexing(&self) -> Result<bool, PortalError>;

    /// Field allowlist used by `query_file_metadata`, in column order.
    fn metadata_fields(&self) -> &[String];
}

/// `PortalClient` over HTTP with basic auth.
pub struct HttpPortalClient {
    http: Client,
    settings: PortalSettings,
    credentials: Option<PortalCredentials>,
    field_paths: Vec<FieldPath>,
}

impl HttpPortalClient {
    /// Create a new portal client.
    ///
    /// # Arguments
    /// * `settings` - Server, field allowlist and search options
    /// * `credentials` - Access key pair; `None` for anonymous access
    pub fn new(settings: PortalSettings, credentials: Option<PortalCredentials>) -> Self {
        Self::with_http_client(Client::new(), settings, credentials)
    }

    /// Create a client around an existing reqwest client.
    pub fn with_http_client(
        http: Client,
        settings: PortalSettings,
        credentials: Option<PortalCredentials>,
    ) -> Self {
        let field_paths: Vec<FieldPath> = settings
            .fields
            .iter()
            .map(|f| FieldPath::parse(f))
            .collect();
        Self {
            http,
            settings,
            credentials,
            field_paths,
        }
    }

    /// The settings this client was built with.
    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(creds) => request.basic_auth(&creds.key, Some(&creds.secret)),
            None => request,
        }
    }

    /// GET a JSON document, accepting the empty-search 404.
    async fn get_json(&self, url: &str) -> Result<Value, PortalError> {
        info!("Getting {}", url);
        let request = self.authorize(self.http.get(url).header(ACCEPT, "application/json"));
        let response: Response = request.send().await.map_err(|source| {
            warn!("URL not found. Does {} exist?", url);
            PortalError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

        let status: u16 = response.status().as_u16();
        let text: String = response.text().await.map_err(|source| PortalError::Transport {
            url: url.to_string(),
            source,
        })?;

        if status == 200 {
            return decode(url, &text);
        }

        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        if is_zero_results(status, &body) {
            return Ok(body);
        }

        warn!("Status code {} for {}: {}", status, url, text);
        Err(PortalError::BadResponse {
            status,
            url: url.to_string(),
            body: text,
        })
    }
}

fn decode(url: &str, text: &str) -> Result<Value, PortalError> {
    serde_json::from_str(text).map_err(|e| PortalError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl PortalClient for HttpPortalClient {
    async fn query_audit_flagged_files(
        &self,
        batch_size: Option<BatchSize>,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<AuditRecord>, PortalError> {
        let batch_size: Option<BatchSize> = batch_size.or(self.settings.batch_size);
        let filter: Option<&QueryFilter> = filter.or(self.settings.query_filter.as_ref());
        let url: String = audit_query_url(&self.settings.server, batch_size, filter)?;
        let body: Value = self.get_json(&url).await?;
        Ok(parse_audits(graph(&body)))
    }

    async fn query_file_metadata(&self) -> Result<Vec<MetadataRecord>, PortalError> {
        let url: String = metadata_query_url(
            &self.settings.server,
            self.settings.batch_size,
            &self.settings.fields,
            &self.settings.statuses,
            &self.settings.upload_statuses,
        )?;
        let body: Value = self.get_json(&url).await?;
        let records: Vec<MetadataRecord> = graph(&body)
            .iter()
            .map(|result| flatten_record(result, &self.field_paths))
            .collect();
        info!("Got {} files for metadata", records.len());
        Ok(records)
    }

    async fn patch_bucket(&self, accession: &str, new_bucket: &str) -> Result<Value, PortalError> {
        let url: String = bucket_update_url(&self.settings.server, accession)?;
        let payload: Value = json!({ "new_bucket": new_bucket });
        info!("Patching {} with {}", url, payload);

        let request = self.authorize(
            self.http
                .patch(&url)
                .header(ACCEPT, "application/json")
                .json(&payload),
        );
        let response: Response = request.send().await.map_err(|source| {
            warn!("URL not found. Does {} exist?", url);
            PortalError::Transport {
                url: url.clone(),
                source,
            }
        })?;

        let status: u16 = response.status().as_u16();
        let text: String = response.text().await.map_err(|source| PortalError::Transport {
            url: url.clone(),
            source,
        })?;

        if status != 200 {
            warn!("Status code {} for {}: {}", status, url, text);
            return Err(PortalError::BadResponse {
                status,
                url,
                body: text,
            });
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    async fn is_indexing(&self) -> Result<bool, PortalError> {
        let url: String = indexer_url(&self.settings.server)?;
        let body: Value = self.get_json(&url).await?;
        Ok(body.get("is_indexing").and_then(Value::as_bool) == Some(true))
    }

    fn metadata_fields(&self) -> &[String] {
        &self.settings.fields
    }
}
