//! Error types for content addressing operations.

/// Errors that can occur during CAS operations.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    /// Chunk size must be at least one byte.
    #[error("invalid part size: must be greater than zero")]
    InvalidPartSize,

    /// Manifest fields are inconsistent with each other.
    #[error("invalid manifest: {reason}")]
    InvalidManifest {
        /// What was inconsistent.
        reason: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Manifest has an unsupported version.
    #[error("unsupported manifest version {found}, this build supports version {supported}")]
    UnsupportedVersion {
        /// Version found in the manifest.
        found: u8,
        /// Version this build supports.
        supported: u8,
    },
}
