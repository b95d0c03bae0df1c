//! Manifest building and serialization.
//!
//! A [`Manifest`] records the ordered chunk identifiers of a file together
//! with its name, media type, and sizes. It is persisted as postcard bytes.
//! Its [`ManifestId`] is `blake3(postcard_bytes)`.

use tessera_types::{
    ChunkId, FileMeta, MANIFEST_VERSION, Manifest, ManifestId, expected_chunk_count,
};

use tracing::debug;

use crate::error::CasError;

/// Build a [`Manifest`] from file metadata and the ordered chunk IDs.
///
/// Fails with [`CasError::InvalidManifest`] when the number of IDs does not
/// match `ceil(total_size / part_size)`.
pub fn build_manifest(meta: &FileMeta, chunks: &[ChunkId]) -> Result<Manifest, CasError> {
    check_counts(meta.total_size, meta.part_size, chunks.len())?;
    debug!(name = %meta.name, chunks = chunks.len(), "building manifest");

    Ok(Manifest {
        version: MANIFEST_VERSION,
        name: meta.name.clone(),
        content_type: meta.content_type.clone(),
        total_size: meta.total_size,
        part_size: meta.part_size,
        chunk_count: chunks.len() as u32,
        chunks: chunks.to_vec(),
    })
}

/// Check that a manifest's fields are consistent with each other.
pub fn validate_manifest(manifest: &Manifest) -> Result<(), CasError> {
    if manifest.chunk_count as usize != manifest.chunks.len() {
        return Err(CasError::InvalidManifest {
            reason: format!(
                "chunk_count is {} but {} identifiers are listed",
                manifest.chunk_count,
                manifest.chunks.len()
            ),
        });
    }
    check_counts(manifest.total_size, manifest.part_size, manifest.chunks.len())
}

fn check_counts(total_size: u64, part_size: u32, actual: usize) -> Result<(), CasError> {
    let expected = expected_chunk_count(total_size, part_size).ok_or_else(|| {
        CasError::InvalidManifest {
            reason: "part_size must be greater than zero".to_string(),
        }
    })?;

    if expected > u64::from(u32::MAX) {
        return Err(CasError::InvalidManifest {
            reason: format!("{expected} chunks exceed the u32 chunk count limit"),
        });
    }

    if expected != actual as u64 {
        return Err(CasError::InvalidManifest {
            reason: format!(
                "{total_size} bytes at part size {part_size} need {expected} chunks, got {actual}"
            ),
        });
    }
    Ok(())
}

/// Serialize a manifest to postcard bytes.
pub fn serialize_manifest(manifest: &Manifest) -> Result<Vec<u8>, CasError> {
    postcard::to_allocvec(manifest).map_err(|e| CasError::Serialization(e.to_string()))
}

/// Deserialize a manifest from postcard bytes.
///
/// `bytes` must hold exactly one encoded manifest. Rejects trailing data,
/// unknown version numbers, and chunk counts that disagree with the sizes.
pub fn deserialize_manifest(bytes: &[u8]) -> Result<Manifest, CasError> {
    let (manifest, rest): (Manifest, _) =
        postcard::take_from_bytes(bytes).map_err(|e| CasError::Serialization(e.to_string()))?;
    if !rest.is_empty() {
        return Err(CasError::Serialization(format!(
            "{} trailing bytes after manifest",
            rest.len()
        )));
    }
    if manifest.version != MANIFEST_VERSION {
        return Err(CasError::UnsupportedVersion {
            found: manifest.version,
            supported: MANIFEST_VERSION,
        });
    }
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Content address of a manifest: `blake3(serialize_manifest(manifest))`.
pub fn manifest_id(manifest: &Manifest) -> Result<ManifestId, CasError> {
    Ok(ManifestId::from_data(&serialize_manifest(manifest)?))
}
