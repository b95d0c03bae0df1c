//! Shared types and identifiers for Tessera.
//!
//! This crate defines the core types used across the Tessera workspace:
//! identifiers ([`ChunkId`], [`ManifestId`]), the [`Manifest`] record that
//! describes a chunked file, the [`FileMeta`] it is built from, and the
//! storage gateway configuration ([`GatewayConfig`], [`TransportProtocol`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Current manifest envelope version.
pub const MANIFEST_VERSION: u8 = 1;

/// Default chunk size in bytes (256 KB).
pub const DEFAULT_PART_SIZE: u32 = 262_144;

/// Largest part size accepted by configuration and by the chunk server (64 MiB).
pub const MAX_PART_SIZE: u32 = 64 * 1024 * 1024;

/// Default number of concurrent gateway calls per operation.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Media type recorded when detection finds nothing more specific.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// ID types
// ---------------------------------------------------------------------------

/// Error returned when parsing a hex-encoded identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdError {
    /// The string was not exactly 64 characters long.
    #[error("expected 64 hex characters, got {0}")]
    Length(usize),

    /// The string contained a non-hex character.
    #[error("invalid hex character {0:?}")]
    Character(char),
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Create an ID by hashing arbitrary data with BLAKE3.
            pub fn from_data(data: &[u8]) -> Self {
                Self(blake3::hash(data).into())
            }

            /// Return the raw 32-byte representation.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for byte in &self.0 {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex32(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Content-addressed identifier for a chunk: `blake3(chunk_data)`.
    ///
    /// Used both as the storage key and as the integrity check on retrieval.
    ChunkId
);

define_id!(
    /// Identifier for a manifest: `blake3(serialized_manifest)`.
    ManifestId
);

fn parse_hex32(s: &str) -> Result<[u8; 32], ParseIdError> {
    if s.len() != 64 {
        return Err(ParseIdError::Length(s.len()));
    }
    let mut bytes = [0u8; 32];
    let raw = s.as_bytes();
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = (hex_nibble(raw[i * 2])? << 4) | hex_nibble(raw[i * 2 + 1])?;
    }
    Ok(bytes)
}

fn hex_nibble(c: u8) -> Result<u8, ParseIdError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(ParseIdError::Character(c as char)),
    }
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// Number of chunks a file of `total_size` bytes splits into.
///
/// Returns `None` when `part_size` is zero.
pub fn expected_chunk_count(total_size: u64, part_size: u32) -> Option<u64> {
    if part_size == 0 {
        return None;
    }
    Some(total_size.div_ceil(u64::from(part_size)))
}

/// Descriptive metadata of a loaded file, the input to manifest building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Base name of the file.
    pub name: String,
    /// Detected media type.
    pub content_type: String,
    /// Total size in bytes.
    pub total_size: u64,
    /// Chunk size the file was split with.
    pub part_size: u32,
}

/// Ordered record mapping a file to its chunk identifiers.
///
/// Owns no chunk bytes. A manifest is the only handle needed to fetch,
/// verify, and reassemble the original file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Envelope format version.
    pub version: u8,
    /// Base name of the original file.
    pub name: String,
    /// Media type of the original file.
    pub content_type: String,
    /// Total size of the original file in bytes.
    pub total_size: u64,
    /// Size of each chunk (last chunk may be smaller).
    pub part_size: u32,
    /// Number of chunks.
    pub chunk_count: u32,
    /// Chunk identifiers in sequence order.
    pub chunks: Vec<ChunkId>,
}

impl Manifest {
    /// Expected length of the chunk at `index`, or `None` if out of range.
    pub fn chunk_len(&self, index: usize) -> Option<u64> {
        let count = self.chunks.len();
        if index >= count || self.part_size == 0 {
            return None;
        }
        let part = u64::from(self.part_size);
        if index + 1 < count {
            Some(part)
        } else {
            Some(self.total_size.saturating_sub(part * (count as u64 - 1)))
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Transport scheme used to reach an HTTP storage gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Https => f.write_str("https"),
        }
    }
}

impl FromStr for TransportProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("unknown transport protocol: {other}")),
        }
    }
}

/// Endpoint of a remote content-addressable backend.
///
/// Built once at startup and handed to the gateway constructor; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host name or IP address.
    pub endpoint_host: String,
    /// TCP port.
    pub endpoint_port: u16,
    /// `http` or `https`.
    pub protocol: TransportProtocol,
}

impl GatewayConfig {
    /// Base URL, e.g. `http://127.0.0.1:4830`.
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.protocol, self.endpoint_host, self.endpoint_port
        )
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint_host: "127.0.0.1".to_string(),
            endpoint_port: 4830,
            protocol: TransportProtocol::Http,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
