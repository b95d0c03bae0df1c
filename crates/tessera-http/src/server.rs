//! Axum front for a [`StorageGateway`].

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::routing::put;
use tessera_store::StorageGateway;
use tessera_types::{ChunkId, MAX_PART_SIZE};
use tracing::{debug, info, warn};

use crate::error::ServerError;

/// Largest request body accepted for a single chunk.
const MAX_CHUNK_BYTES: usize = MAX_PART_SIZE as usize;

type SharedGateway = Arc<dyn StorageGateway>;

/// HTTP server exposing a [`StorageGateway`] under `/chunks/{id}`.
pub struct ChunkServer {
    router: Router,
}

impl ChunkServer {
    /// Create a server backed by the given gateway.
    pub fn new(gateway: Arc<dyn StorageGateway>) -> Self {
        let router = Router::new()
            .route(
                "/chunks/{id}",
                put(put_chunk).get(get_chunk).head(head_chunk),
            )
            .layer(DefaultBodyLimit::max(MAX_CHUNK_BYTES))
            .with_state(gateway);
        Self { router }
    }

    /// Return the inner [`Router`] (useful for testing with `tower::ServiceExt`).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on an already bound listener until `shutdown` completes.
    pub async fn serve_with_shutdown(
        self,
        listener: tokio::net::TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "chunk server listening");
        }
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

async fn put_chunk(
    State(gateway): State<SharedGateway>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ServerError> {
    let id: ChunkId = id.parse()?;
    let actual = ChunkId::from_data(&body);
    if actual != id {
        warn!(expected = %id, %actual, "rejecting chunk with mismatched digest");
        return Err(ServerError::DigestMismatch {
            expected: id,
            actual,
        });
    }

    debug!(%id, size = body.len(), "PUT chunk");
    gateway.put(id, body).await?;
    Ok(StatusCode::CREATED)
}

async fn get_chunk(
    State(gateway): State<SharedGateway>,
    Path(id): Path<String>,
) -> Result<Bytes, ServerError> {
    let id: ChunkId = id.parse()?;
    let data = gateway.get(id).await?;
    debug!(%id, size = data.len(), "GET chunk");
    Ok(data)
}

async fn head_chunk(
    State(gateway): State<SharedGateway>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let id: ChunkId = id.parse()?;
    if gateway.contains(id).await? {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}
