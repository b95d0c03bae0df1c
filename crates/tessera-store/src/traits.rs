//! Core trait for content-addressable chunk storage.

use bytes::Bytes;
use tessera_types::ChunkId;

use crate::error::GatewayError;

/// The put/get boundary to a content-addressable backend.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Data is passed as [`Bytes`] to enable zero-copy transfers through the pipeline.
///
/// Callers issue puts and gets for different IDs concurrently and must not
/// rely on completion order across IDs.
#[async_trait::async_trait]
pub trait StorageGateway: Send + Sync {
    /// Store a chunk under its content address.
    ///
    /// Storing the same bytes twice is a no-op. Storing different bytes under
    /// an existing ID fails with [`GatewayError::IntegrityConflict`].
    async fn put(&self, id: ChunkId, data: Bytes) -> Result<(), GatewayError>;

    /// Retrieve a chunk. Fails with [`GatewayError::NotFound`] if absent.
    async fn get(&self, id: ChunkId) -> Result<Bytes, GatewayError>;

    /// Check whether a chunk is stored.
    async fn contains(&self, id: ChunkId) -> Result<bool, GatewayError>;
}
