//! Latency injection for ordering and cancellation tests.

use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_types::ChunkId;

use crate::error::GatewayError;
use crate::traits::StorageGateway;

/// Delays every call to an inner gateway by a random number of milliseconds.
///
/// With several calls in flight the delays make completions arrive out of
/// issue order. The generator is seeded, so a given seed always produces the
/// same sequence of delays.
pub struct SlowGateway {
    inner: Arc<dyn StorageGateway>,
    latency_ms: RangeInclusive<u64>,
    rng: Mutex<StdRng>,
}

impl SlowGateway {
    /// Wrap `inner`, sleeping for a delay drawn from `latency_ms` before each call.
    pub fn new(inner: Arc<dyn StorageGateway>, latency_ms: RangeInclusive<u64>, seed: u64) -> Self {
        Self {
            inner,
            latency_ms,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    async fn pause(&self) {
        if self.latency_ms.is_empty() {
            return;
        }
        let ms = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .random_range(self.latency_ms.clone());
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait::async_trait]
impl StorageGateway for SlowGateway {
    async fn put(&self, id: ChunkId, data: Bytes) -> Result<(), GatewayError> {
        self.pause().await;
        self.inner.put(id, data).await
    }

    async fn get(&self, id: ChunkId) -> Result<Bytes, GatewayError> {
        self.pause().await;
        self.inner.get(id).await
    }

    async fn contains(&self, id: ChunkId) -> Result<bool, GatewayError> {
        self.pause().await;
        self.inner.contains(id).await
    }
}
