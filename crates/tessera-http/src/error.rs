//! Chunk server error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tessera_store::GatewayError;
use tessera_types::{ChunkId, ParseIdError};

/// Errors returned by chunk server handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The path segment is not a valid chunk ID.
    #[error("invalid chunk id: {0}")]
    InvalidId(#[from] ParseIdError),

    /// The uploaded bytes do not hash to the ID in the path.
    #[error("digest mismatch: path says {expected}, body hashes to {actual}")]
    DigestMismatch {
        /// ID from the request path.
        expected: ChunkId,
        /// ID computed from the body.
        actual: ChunkId,
    },

    /// An error from the backing gateway.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl ServerError {
    /// Map to an HTTP status code.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::DigestMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Gateway(e) => match e {
                GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
                GatewayError::IntegrityConflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
