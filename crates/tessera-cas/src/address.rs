//! Content digests for chunks.

use tessera_types::ChunkId;

/// Compute the content address of a chunk: `blake3(data)`.
pub fn address_of(data: &[u8]) -> ChunkId {
    ChunkId::from_data(data)
}

/// Check `data` against its expected address.
///
/// On mismatch returns the address the data actually hashes to.
pub fn verify(expected: &ChunkId, data: &[u8]) -> Result<(), ChunkId> {
    let actual = address_of(data);
    if actual == *expected {
        Ok(())
    } else {
        Err(actual)
    }
}
