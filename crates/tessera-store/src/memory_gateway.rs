//! In-memory storage gateway.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tessera_types::ChunkId;
use tracing::debug;

use crate::error::GatewayError;
use crate::traits::StorageGateway;

/// In-memory chunk store backed by a `RwLock<HashMap>`.
///
/// Useful for testing and for short-lived pipelines that reassemble in the
/// same process.
#[derive(Default)]
pub struct MemoryGateway {
    chunks: RwLock<HashMap<ChunkId, Bytes>>,
}

impl MemoryGateway {
    /// Create an empty in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct chunks stored.
    pub fn len(&self) -> usize {
        self.chunks.read().expect("lock poisoned").len()
    }

    /// Whether no chunks are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the bytes stored under `id` without any integrity check.
    ///
    /// Intended for fault injection in tests: it lets a caller simulate a
    /// backend that returns corrupted data.
    pub fn overwrite(&self, id: ChunkId, data: Bytes) {
        self.chunks.write().expect("lock poisoned").insert(id, data);
    }

    /// Drop a chunk, simulating a backend that lost it.
    pub fn remove(&self, id: &ChunkId) -> Option<Bytes> {
        self.chunks.write().expect("lock poisoned").remove(id)
    }
}

#[async_trait::async_trait]
impl StorageGateway for MemoryGateway {
    async fn put(&self, id: ChunkId, data: Bytes) -> Result<(), GatewayError> {
        let mut map = self.chunks.write().expect("lock poisoned");
        if let Some(existing) = map.get(&id) {
            if *existing != data {
                return Err(GatewayError::IntegrityConflict(id));
            }
            debug!(%id, "chunk already stored in memory");
            return Ok(());
        }

        debug!(%id, size = data.len(), "storing chunk in memory");
        map.insert(id, data);
        Ok(())
    }

    async fn get(&self, id: ChunkId) -> Result<Bytes, GatewayError> {
        let map = self.chunks.read().expect("lock poisoned");
        map.get(&id).cloned().ok_or(GatewayError::NotFound(id))
    }

    async fn contains(&self, id: ChunkId) -> Result<bool, GatewayError> {
        let map = self.chunks.read().expect("lock poisoned");
        Ok(map.contains_key(&id))
    }
}
