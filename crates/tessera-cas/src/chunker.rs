//! Fixed-size chunker for splitting data into content-addressed chunks.

use bytes::Bytes;
use tessera_types::ChunkId;

use crate::address::address_of;
use crate::error::CasError;

/// A single chunk of data with its content-addressed ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the reassembly order, starting at 0.
    pub index: u32,
    /// Byte offset within the original file.
    pub offset: u64,
    /// Content-addressed identifier: `blake3(data)`.
    pub id: ChunkId,
    /// The chunk bytes. Shares the source buffer when produced by [`Chunker::split`].
    pub data: Bytes,
}

/// Fixed-size chunker that splits data into chunks of a configured size.
///
/// The last chunk may be smaller than `part_size`.
/// Empty data produces zero chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    part_size: u32,
}

impl Chunker {
    /// Create a new chunker with the given part size in bytes.
    pub fn new(part_size: u32) -> Result<Self, CasError> {
        if part_size == 0 {
            return Err(CasError::InvalidPartSize);
        }
        Ok(Self { part_size })
    }

    /// The configured part size in bytes.
    pub fn part_size(&self) -> u32 {
        self.part_size
    }

    /// Split data into fixed-size chunks.
    ///
    /// Chunks are zero-copy views into `data`. Each chunk's ID is the BLAKE3
    /// hash of its bytes. Returns an empty vec for empty input.
    pub fn split(&self, data: &Bytes) -> Vec<Chunk> {
        if data.is_empty() {
            return Vec::new();
        }

        let part_size = self.part_size as usize;
        let mut chunks = Vec::with_capacity(data.len().div_ceil(part_size));
        let mut offset = 0usize;

        while offset < data.len() {
            let end = (offset + part_size).min(data.len());
            let slice = data.slice(offset..end);
            chunks.push(Chunk {
                index: chunks.len() as u32,
                offset: offset as u64,
                id: address_of(&slice),
                data: slice,
            });
            offset = end;
        }

        chunks
    }
}
