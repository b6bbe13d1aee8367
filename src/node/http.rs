//! HTTP implementation of [`NodeClient`].

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::header::ACCEPT;

use crate::config::AggregatorConfig;
use crate::error::{ERROR_ON_NODE, PhalanxError, Result};
use crate::model::{ErrorResponse, HitsResults};
use crate::node::client::{HitsRequest, NodeClient, NodeReply};

/// Sends hits requests to nodes over HTTP, expecting JSON responses.
#[derive(Debug, Clone)]
pub struct HttpNodeClient {
    client: Client,
}

impl HttpNodeClient {
    /// Create a client using the configured request timeout.
    pub fn new(config: &AggregatorConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PhalanxError::transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn fetch_hits(&self, request: HitsRequest) -> Result<NodeReply> {
        debug!(
            "GET {} first={} number={}",
            request.url(),
            request.first,
            request.number
        );

        let response = self
            .client
            .get(request.url())
            .query(&request.query_params())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PhalanxError::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PhalanxError::transport(e.to_string()))?;

        if status.is_success() {
            let results: HitsResults = serde_json::from_slice(&body)?;
            return Ok(NodeReply::Page(results));
        }

        // Nodes normally send an error object; fall back to the raw body
        let error = serde_json::from_slice::<ErrorResponse>(&body).unwrap_or_else(|_| {
            ErrorResponse::new(ERROR_ON_NODE, String::from_utf8_lossy(&body).into_owned())
        });
        Ok(NodeReply::Error {
            status: status.as_u16(),
            error,
        })
    }
}
