//! Error types for portal operations.

use thiserror::Error;

/// Errors that can occur while talking to the metadata portal.
#[derive(Error, Debug)]
pub enum PortalError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The portal answered with an unexpected status.
    #[error("Bad response code {status} for {url}: {body}")]
    BadResponse {
        status: u16,
        url: String,
        body: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The configured server or a derived URL could not be parsed.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// A query filter was not an object of strings or string lists.
    #[error("Invalid query filter: {message}")]
    InvalidFilter { message: String },

    /// A batch size was neither `all` nor a non-negative integer.
    #[error("Invalid batch size: {value}")]
    InvalidBatchSize { value: String },
}

impl PortalError {
    /// Status code of a `BadResponse`, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            PortalError::BadResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}
