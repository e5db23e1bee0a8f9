//! Client for the third-party DNI lookup API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("lookup service answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamUrls {
    #[serde(rename = "IMAGE", default)]
    pub image: Option<String>,
}

/// Response body of `GET <upstream>?dni=<id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamPayload {
    pub status: String,
    /// Record text when found, a reason otherwise.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub urls: Option<UpstreamUrls>,
}

impl UpstreamPayload {
    pub fn is_found(&self) -> bool {
        self.status == "ok"
    }

    pub fn photo_url(&self) -> Option<String> {
        self.urls.as_ref().and_then(|urls| urls.image.clone())
    }
}

#[async_trait]
pub trait RecordLookup {
    async fn lookup(&self, dni: &str) -> Result<UpstreamPayload, UpstreamError>;
}

pub struct HttpRecordLookup {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordLookup {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RecordLookup for HttpRecordLookup {
    async fn lookup(&self, dni: &str) -> Result<UpstreamPayload, UpstreamError> {
        log::debug!("Querying {} for DNI {}", self.base_url, dni);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("dni", dni)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }
        Ok(response.json().await?)
    }
}
