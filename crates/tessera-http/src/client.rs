//! [`HttpGateway`], a [`StorageGateway`] over HTTP.

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use tessera_store::{GatewayError, StorageGateway};
use tessera_types::{ChunkId, GatewayConfig};
use tracing::debug;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Storage gateway that talks to a remote chunk server.
///
/// The endpoint is fixed at construction from a [`GatewayConfig`].
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Build a client for the configured endpoint.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chunk_url(&self, id: &ChunkId) -> String {
        format!("{}/chunks/{id}", self.base_url)
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

#[async_trait::async_trait]
impl StorageGateway for HttpGateway {
    async fn put(&self, id: ChunkId, data: Bytes) -> Result<(), GatewayError> {
        let size = data.len();
        let resp = self
            .client
            .put(self.chunk_url(&id))
            .body(data)
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            s if s.is_success() => {
                debug!(%id, size, "chunk stored remotely");
                Ok(())
            }
            StatusCode::CONFLICT => Err(GatewayError::IntegrityConflict(id)),
            s => Err(GatewayError::Status {
                id,
                status: s.as_u16(),
            }),
        }
    }

    async fn get(&self, id: ChunkId) -> Result<Bytes, GatewayError> {
        let resp = self
            .client
            .get(self.chunk_url(&id))
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            s if s.is_success() => resp.bytes().await.map_err(transport),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound(id)),
            s => Err(GatewayError::Status {
                id,
                status: s.as_u16(),
            }),
        }
    }

    async fn contains(&self, id: ChunkId) -> Result<bool, GatewayError> {
        let resp = self
            .client
            .head(self.chunk_url(&id))
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(GatewayError::Status {
                id,
                status: s.as_u16(),
            }),
        }
    }
}
