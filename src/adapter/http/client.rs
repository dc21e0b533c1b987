//! Recording API Client
//!
//! クライアントの抽象化とreqwest実装

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

#[cfg(test)]
use mockall::automock;

use super::models::{truncate, BlobUploadRequest, StartRecordingRequest};
use super::retry::error_chain_to_string;
use crate::domain::error::TransportError;

pub const START_RECORDING_PATH: &str = "start-recording";
pub const UPLOAD_BLOB_PATH: &str = "upload-blob";

/// Trait for the two recording endpoints.
/// Implementations return the raw response body of a 2xx response.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordingApi: Send + Sync {
    /// `POST {base}/start-recording/`
    async fn start_recording(&self, username: &str) -> Result<String, TransportError>;

    /// `POST {base}/upload-blob/`
    async fn upload_blob(&self, request: &BlobUploadRequest) -> Result<String, TransportError>;
}

/// Joins a base URL and an endpoint path without doubling slashes.
///
/// ```
/// use blobsync::adapter::http::client::endpoint_url;
///
/// assert_eq!(
///     endpoint_url("http://127.0.0.1:8000/srce/api/", "start-recording"),
///     "http://127.0.0.1:8000/srce/api/start-recording/"
/// );
/// ```
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}/",
        base_url.trim_end_matches('/'),
        path.trim_matches('/')
    )
}

/// Map a reqwest failure onto the transport taxonomy used for retries.
pub fn classify_reqwest_error(e: &reqwest::Error) -> TransportError {
    let msg = error_chain_to_string(e);
    if e.is_timeout() {
        TransportError::Timeout(msg)
    } else if e.is_builder() {
        TransportError::InvalidRequest(msg)
    } else if e.is_decode() {
        TransportError::InvalidResponse(msg)
    } else {
        // connect / request / body errors: the connection went away
        TransportError::Connection(msg)
    }
}

/// reqwest-backed recording API
pub struct ReqwestRecordingApi {
    client: Client,
    start_url: String,
    upload_url: String,
}

impl ReqwestRecordingApi {
    /// `timeout` bounds every request end to end.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            start_url: endpoint_url(base_url, START_RECORDING_PATH),
            upload_url: endpoint_url(base_url, UPLOAD_BLOB_PATH),
        })
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl RecordingApi for ReqwestRecordingApi {
    async fn start_recording(&self, username: &str) -> Result<String, TransportError> {
        // The reference server binds `username` from the query string; the body
        // form is kept for servers that read JSON.
        let request = self
            .client
            .post(&self.start_url)
            .query(&[("username", username)])
            .json(&StartRecordingRequest { username });

        self.send(request).await
    }

    async fn upload_blob(&self, request: &BlobUploadRequest) -> Result<String, TransportError> {
        self.send(self.client.post(&self.upload_url).json(request))
            .await
    }
}
