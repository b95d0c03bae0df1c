//! Store path: split → address → put → build manifest.

use std::collections::HashSet;
use std::sync::Arc;

use tessera_cas::{Chunker, build_manifest};
use tessera_store::StorageGateway;
use tessera_types::Manifest;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::file::File;
use crate::tasks::drain;

/// Writes files into a [`StorageGateway`] chunk by chunk.
pub struct Uploader {
    gateway: Arc<dyn StorageGateway>,
    chunker: Chunker,
    max_in_flight: usize,
}

impl Uploader {
    /// Create an uploader.
    ///
    /// `part_size` must be non-zero and `max_in_flight` at least one.
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        part_size: u32,
        max_in_flight: usize,
    ) -> Result<Self, EngineError> {
        if max_in_flight == 0 {
            return Err(EngineError::InvalidConfig(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            gateway,
            chunker: Chunker::new(part_size)?,
            max_in_flight,
        })
    }

    /// Chunk size used for splitting.
    pub fn part_size(&self) -> u32 {
        self.chunker.part_size()
    }

    /// Store every chunk of `file` and return its manifest.
    ///
    /// Every distinct chunk is put, so bytes already held under the same ID
    /// are checked by the gateway and a conflict fails the store. A chunk
    /// repeated within the file is put once. Puts may complete in any order.
    /// The manifest is only built after every put has succeeded.
    pub async fn store_file(
        &self,
        file: &File,
        cancel: &CancellationToken,
    ) -> Result<Manifest, EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        info!(
            name = %file.name,
            size = file.len(),
            part_size = self.part_size(),
            "store_file: starting"
        );

        // Splitting hashes every byte; keep it off the async workers.
        let chunker = self.chunker;
        let data = file.data.clone();
        let split = tokio::task::spawn_blocking(move || chunker.split(&data));
        let chunks = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            joined = split => joined.map_err(|e| EngineError::Computation(e.to_string()))?,
        };
        debug!(num_chunks = chunks.len(), "file split");

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();
        let mut seen = HashSet::with_capacity(chunks.len());

        for chunk in &chunks {
            if !seen.insert(chunk.id) {
                continue;
            }

            let gateway = Arc::clone(&self.gateway);
            let semaphore = Arc::clone(&semaphore);
            let (index, id, data) = (chunk.index, chunk.id, chunk.data.clone());

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| EngineError::Cancelled)?;

                gateway
                    .put(id, data)
                    .await
                    .map_err(|source| EngineError::ChunkStore { index, id, source })?;
                debug!(index, %id, "chunk stored");
                Ok::<_, EngineError>(())
            });
        }

        drain(&mut tasks, cancel, |()| Ok(())).await?;

        let ids: Vec<_> = chunks.iter().map(|c| c.id).collect();
        let manifest = build_manifest(&file.meta(self.part_size()), &ids)?;

        info!(
            name = %manifest.name,
            chunks = manifest.chunk_count,
            distinct = seen.len(),
            "store_file: complete"
        );
        Ok(manifest)
    }
}
