//! File-based storage gateway.
//!
//! Stores one file per chunk with a 2-level fan-out directory structure:
//! `{base_dir}/{hex[0..2]}/{hex[2..4]}/{hex}`.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tessera_types::ChunkId;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::traits::StorageGateway;

/// File-based chunk store with 2-level fan-out directory layout.
///
/// Writes are atomic: data is written to a uniquely named temporary file
/// first, then renamed into place, so a concurrent reader never sees a
/// half-written chunk. Integrity checking is left to the reader.
pub struct FileGateway {
    base_dir: PathBuf,
}

impl FileGateway {
    /// Create a new file gateway rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Root directory of the store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Compute the full file path for a chunk ID.
    pub fn chunk_path(&self, id: &ChunkId) -> PathBuf {
        let hex = id.to_string();
        self.base_dir.join(&hex[0..2]).join(&hex[2..4]).join(&hex)
    }

    async fn read_existing(&self, path: &Path) -> Result<Option<Vec<u8>>, GatewayError> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GatewayError::Io(e)),
        }
    }
}

#[async_trait::async_trait]
impl StorageGateway for FileGateway {
    async fn put(&self, id: ChunkId, data: Bytes) -> Result<(), GatewayError> {
        let path = self.chunk_path(&id);

        if let Some(existing) = self.read_existing(&path).await? {
            if existing != data {
                warn!(%id, "refusing to overwrite chunk with different content");
                return Err(GatewayError::IntegrityConflict(id));
            }
            debug!(%id, "chunk already on disk");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = path.with_extension(format!("{:016x}.tmp", rand::random::<u64>()));
        tokio::fs::write(&tmp_path, &data).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(GatewayError::Io(e));
        }

        debug!(%id, path = %path.display(), size = data.len(), "stored chunk to file");
        Ok(())
    }

    async fn get(&self, id: ChunkId) -> Result<Bytes, GatewayError> {
        let path = self.chunk_path(&id);
        self.read_existing(&path)
            .await?
            .map(Bytes::from)
            .ok_or(GatewayError::NotFound(id))
    }

    async fn contains(&self, id: ChunkId) -> Result<bool, GatewayError> {
        let path = self.chunk_path(&id);
        match tokio::fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GatewayError::Io(e)),
        }
    }
}
