use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::FetchError;

/// Source of the raw visitor count body, one fetch per poll cycle.
#[async_trait]
pub trait CountSource: Send + Sync {
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Unauthenticated GET against the configured counter endpoint. Timeout is
/// whatever the client is built with; the pipeline adds no cancellation of
/// its own.
pub struct HttpCountSource {
    client: HttpClient,
    url: String,
}

impl HttpCountSource {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            url: config.endpoint_url.clone(),
        })
    }
}

#[async_trait]
impl CountSource for HttpCountSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        debug!(bytes = body.len(), "Fetched visitor count");
        Ok(body)
    }
}
