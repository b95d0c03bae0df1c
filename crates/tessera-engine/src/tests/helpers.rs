//! Shared test utilities for tessera-engine tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use tessera_store::{GatewayError, MemoryGateway, StorageGateway};
use tessera_types::ChunkId;

use crate::{File, Reassembler, Uploader};

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// A binary file of `size` deterministic bytes.
pub fn test_file(name: &str, size: usize) -> File {
    File::new(name, test_data(size))
}

/// Uploader and reassembler sharing one gateway.
pub fn pipeline(
    gateway: Arc<dyn StorageGateway>,
    part_size: u32,
    max_in_flight: usize,
) -> (Uploader, Reassembler) {
    (
        Uploader::new(gateway.clone(), part_size, max_in_flight).unwrap(),
        Reassembler::new(gateway, max_in_flight).unwrap(),
    )
}

/// Memory-backed pipeline.
pub fn memory_pipeline(part_size: u32) -> (Arc<MemoryGateway>, Uploader, Reassembler) {
    let gateway = Arc::new(MemoryGateway::new());
    let (up, down) = pipeline(gateway.clone(), part_size, 4);
    (gateway, up, down)
}

/// Gateway wrapper that counts calls and tracks peak concurrency.
pub struct CountingGateway {
    inner: MemoryGateway,
    pub puts: AtomicUsize,
    pub gets: AtomicUsize,
    active: AtomicUsize,
    pub peak: AtomicUsize,
}

impl CountingGateway {
    pub fn new() -> Self {
        Self {
            inner: MemoryGateway::new(),
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Number of distinct chunks held.
    pub fn stored(&self) -> usize {
        self.inner.len()
    }

    async fn tracked<T>(&self, fut: impl Future<Output = T>) -> T {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // Yield so that other tasks get a chance to overlap.
        tokio::task::yield_now().await;
        let out = fut.await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        out
    }
}

#[async_trait::async_trait]
impl StorageGateway for CountingGateway {
    async fn put(&self, id: ChunkId, data: Bytes) -> Result<(), GatewayError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.tracked(self.inner.put(id, data)).await
    }

    async fn get(&self, id: ChunkId) -> Result<Bytes, GatewayError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.tracked(self.inner.get(id)).await
    }

    async fn contains(&self, id: ChunkId) -> Result<bool, GatewayError> {
        self.inner.contains(id).await
    }
}

/// Gateway that fails every call with a transport error.
pub struct UnreachableGateway;

#[async_trait::async_trait]
impl StorageGateway for UnreachableGateway {
    async fn put(&self, _id: ChunkId, _data: Bytes) -> Result<(), GatewayError> {
        Err(GatewayError::Transport("connection refused".to_string()))
    }

    async fn get(&self, _id: ChunkId) -> Result<Bytes, GatewayError> {
        Err(GatewayError::Transport("connection refused".to_string()))
    }

    async fn contains(&self, _id: ChunkId) -> Result<bool, GatewayError> {
        Err(GatewayError::Transport("connection refused".to_string()))
    }
}
