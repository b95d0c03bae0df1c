//! Read path: fetch → verify → concatenate.
//!
//! Chunks are fetched concurrently and may complete in any order. Each one
//! lands in the slot for its manifest index, and the file is only assembled
//! once every slot holds verified bytes.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tessera_cas::{validate_manifest, verify};
use tessera_store::{GatewayError, StorageGateway};
use tessera_types::{ChunkId, Manifest};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::file::File;
use crate::tasks::drain;

/// Lifecycle of one chunk during reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// Not yet scheduled.
    Pending,
    /// A fetch has been scheduled and has not finished.
    Fetching,
    /// Fetched and hashed to its manifest ID.
    Validated,
    /// Fetched, but the bytes hash to a different ID.
    Corrupt,
    /// The gateway does not hold the chunk.
    NotFound,
}

/// Index-keyed collection of fetched chunks.
#[derive(Debug)]
struct Slots {
    states: Vec<ChunkState>,
    data: Vec<Option<Bytes>>,
}

impl Slots {
    fn new(count: usize) -> Self {
        Self {
            states: vec![ChunkState::Pending; count],
            data: vec![None; count],
        }
    }

    fn start(&mut self, index: usize) {
        self.states[index] = ChunkState::Fetching;
    }

    fn fill(&mut self, index: usize, data: Bytes) {
        self.states[index] = ChunkState::Validated;
        self.data[index] = Some(data);
    }

    /// Record the outcome of a failed fetch.
    fn fail(&mut self, err: &EngineError) {
        let state = match err {
            EngineError::CorruptChunk { .. } => ChunkState::Corrupt,
            EngineError::ChunkNotFound { .. } => ChunkState::NotFound,
            _ => return,
        };
        if let Some(index) = err.chunk_index() {
            self.states[index as usize] = state;
        }
    }

    fn count(&self, state: ChunkState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }

    fn is_complete(&self) -> bool {
        self.states.iter().all(|s| *s == ChunkState::Validated)
    }

    /// Concatenate every slot in index order.
    ///
    /// Must only be called once [`Slots::is_complete`] holds.
    fn assemble(self, expected: u64) -> Result<Bytes, EngineError> {
        let actual: u64 = self
            .data
            .iter()
            .map(|d| d.as_ref().map_or(0, |b| b.len() as u64))
            .sum();
        if actual != expected {
            return Err(EngineError::SizeMismatch { expected, actual });
        }

        let mut buf = BytesMut::with_capacity(actual as usize);
        for chunk in self.data.into_iter().flatten() {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

/// Rebuilds files from manifests by fetching their chunks from a gateway.
pub struct Reassembler {
    gateway: Arc<dyn StorageGateway>,
    max_in_flight: usize,
}

impl Reassembler {
    /// Create a reassembler issuing at most `max_in_flight` concurrent gets.
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        max_in_flight: usize,
    ) -> Result<Self, EngineError> {
        if max_in_flight == 0 {
            return Err(EngineError::InvalidConfig(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            gateway,
            max_in_flight,
        })
    }

    /// Fetch a single chunk and check that it hashes to `id`.
    pub async fn fetch_chunk(&self, index: u32, id: ChunkId) -> Result<Bytes, EngineError> {
        fetch_verified(self.gateway.as_ref(), index, id).await
    }

    /// Rebuild the file described by `manifest`.
    ///
    /// The first failing chunk aborts every outstanding fetch. No partial
    /// output is returned on error or cancellation.
    pub async fn reassemble(
        &self,
        manifest: &Manifest,
        cancel: &CancellationToken,
    ) -> Result<File, EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        validate_manifest(manifest)?;

        info!(
            name = %manifest.name,
            chunks = manifest.chunk_count,
            total_size = manifest.total_size,
            "reassemble: starting"
        );

        let mut slots = Slots::new(manifest.chunks.len());
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();

        for (index, id) in manifest.chunks.iter().copied().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let semaphore = Arc::clone(&semaphore);
            slots.start(index);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| EngineError::Cancelled)?;
                let data = fetch_verified(gateway.as_ref(), index as u32, id).await?;
                Ok::<_, EngineError>((index, data))
            });
        }

        let drained = drain(&mut tasks, cancel, |(index, data)| {
            slots.fill(index, data);
            Ok(())
        })
        .await;

        if let Err(e) = drained {
            slots.fail(&e);
            warn!(
                name = %manifest.name,
                validated = slots.count(ChunkState::Validated),
                outstanding = slots.count(ChunkState::Fetching),
                error = %e,
                "reassemble: aborted"
            );
            return Err(e);
        }
        debug_assert!(slots.is_complete());

        let data = slots.assemble(manifest.total_size)?;
        info!(name = %manifest.name, size = data.len(), "reassemble: complete");

        Ok(File {
            data,
            name: manifest.name.clone(),
            content_type: manifest.content_type.clone(),
        })
    }
}

async fn fetch_verified(
    gateway: &dyn StorageGateway,
    index: u32,
    id: ChunkId,
) -> Result<Bytes, EngineError> {
    let data = gateway.get(id).await.map_err(|source| match source {
        GatewayError::NotFound(_) => EngineError::ChunkNotFound { index, id },
        source => EngineError::ChunkFetch { index, id, source },
    })?;

    verify(&id, &data).map_err(|actual| {
        warn!(index, expected = %id, %actual, "chunk failed verification");
        EngineError::CorruptChunk {
            index,
            expected: id,
            actual,
        }
    })?;

    debug!(index, %id, size = data.len(), "chunk validated");
    Ok(data)
}
