//! Error types for storage gateway operations.

use tessera_types::ChunkId;

/// Errors that can occur during storage gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The requested chunk was not found.
    #[error("chunk not found: {0}")]
    NotFound(ChunkId),

    /// A chunk with this ID is already stored with different bytes.
    #[error("integrity conflict: chunk {0} already stored with different content")]
    IntegrityConflict(ChunkId),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend could not be reached or the exchange failed mid-way.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with an unexpected status.
    #[error("unexpected status {status} for chunk {id}")]
    Status {
        /// Chunk the request was about.
        id: ChunkId,
        /// Status code returned by the backend.
        status: u16,
    },
}

impl GatewayError {
    /// Whether retrying the same call may succeed.
    ///
    /// Integrity conflicts and client-side status errors are permanent.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Io(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::IntegrityConflict(_) => false,
        }
    }
}
