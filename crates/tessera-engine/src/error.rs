//! Error types for the engine.

use std::path::PathBuf;

use tessera_store::GatewayError;
use tessera_types::ChunkId;

/// Errors that can occur during engine operations.
///
/// Every variant names the file path or chunk index it concerns.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The source file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Reading the source file failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the output file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Offloaded chunking or hashing did not complete.
    #[error("computation failed: {0}")]
    Computation(String),

    /// Content addressing / chunking / manifest error.
    #[error("cas error: {0}")]
    Cas(#[from] tessera_cas::CasError),

    /// Storing a chunk failed.
    #[error("failed to store chunk {index} ({id}): {source}")]
    ChunkStore {
        /// Sequence index of the chunk.
        index: u32,
        /// Its content address.
        id: ChunkId,
        /// Gateway failure.
        source: GatewayError,
    },

    /// A chunk listed in the manifest is missing from the backend.
    #[error("chunk {index} ({id}) not found")]
    ChunkNotFound {
        /// Sequence index of the chunk.
        index: u32,
        /// Its content address.
        id: ChunkId,
    },

    /// Fetching a chunk failed for a reason other than absence.
    #[error("failed to fetch chunk {index} ({id}): {source}")]
    ChunkFetch {
        /// Sequence index of the chunk.
        index: u32,
        /// Its content address.
        id: ChunkId,
        /// Gateway failure.
        source: GatewayError,
    },

    /// A fetched chunk does not hash to its declared ID.
    #[error("corrupt chunk {index}: expected {expected}, data hashes to {actual}")]
    CorruptChunk {
        /// Sequence index of the chunk.
        index: u32,
        /// ID recorded in the manifest.
        expected: ChunkId,
        /// ID computed from the fetched bytes.
        actual: ChunkId,
    },

    /// The reassembled length differs from the manifest's total size.
    #[error("size mismatch: manifest says {expected} bytes, reassembled {actual}")]
    SizeMismatch {
        /// Size recorded in the manifest.
        expected: u64,
        /// Size actually produced.
        actual: u64,
    },

    /// Pipeline settings are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operation was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    /// Whether the caller may reasonably retry the whole operation.
    ///
    /// Missing chunks and transient gateway failures qualify. Corruption,
    /// size mismatches and structural errors need investigation instead.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::ChunkNotFound { .. } => true,
            Self::ChunkFetch { source, .. } | Self::ChunkStore { source, .. } => {
                source.is_retriable()
            }
            _ => false,
        }
    }

    /// Sequence index of the chunk this error concerns, if any.
    pub fn chunk_index(&self) -> Option<u32> {
        match self {
            Self::ChunkStore { index, .. }
            | Self::ChunkNotFound { index, .. }
            | Self::ChunkFetch { index, .. }
            | Self::CorruptChunk { index, .. } => Some(*index),
            _ => None,
        }
    }
}
