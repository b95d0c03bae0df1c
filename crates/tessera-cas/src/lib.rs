//! Content addressing, chunking, and manifest building.
//!
//! This crate provides:
//! - [`Chunker`] — splits data into fixed-size chunks, each identified by its BLAKE3 hash.
//! - [`address_of`] / [`verify`] — the content digest used as storage key and integrity check.
//! - [`build_manifest`] — constructs a [`Manifest`](tessera_types::Manifest) from file
//!   metadata and the ordered chunk identifiers.
//!
//! Manifests are serialized with postcard; the encoding round-trips byte for byte.

mod address;
mod chunker;
mod error;
mod manifest;

pub use address::{address_of, verify};
pub use chunker::{Chunk, Chunker};
pub use error::CasError;
pub use manifest::{
    build_manifest, deserialize_manifest, manifest_id, serialize_manifest, validate_manifest,
};
