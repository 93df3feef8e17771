use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::{CHUNK_SIZE, TransferError};

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// ChunkPlan
// ---------------------------------------------------------------------------

/// Chunk layout of a file of known size.
///
/// Computed once per upload; `total_chunks` never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    total_size: u64,
    chunk_size: u64,
    total_chunks: u32,
}

/// Byte range of one chunk within the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub index: u32,
    pub offset: u64,
    pub len: u64,
}

impl ChunkPlan {
    /// Plans a file of `total_size` bytes using the fixed [`CHUNK_SIZE`].
    pub fn new(total_size: u64) -> Result<Self, TransferError> {
        Self::with_chunk_size(total_size, CHUNK_SIZE)
    }

    pub(crate) fn with_chunk_size(total_size: u64, chunk_size: u64) -> Result<Self, TransferError> {
        let chunk_size = if chunk_size == 0 { CHUNK_SIZE } else { chunk_size };
        let total_chunks = u32::try_from(total_size.div_ceil(chunk_size))
            .map_err(|_| TransferError::TooLarge(total_size))?;
        Ok(Self {
            total_size,
            chunk_size,
            total_chunks,
        })
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    /// Returns the range of chunk `index`, or `None` past the last chunk.
    pub fn range(&self, index: u32) -> Option<ChunkRange> {
        if index >= self.total_chunks {
            return None;
        }
        let offset = u64::from(index) * self.chunk_size;
        let len = self.chunk_size.min(self.total_size - offset);
        Some(ChunkRange { index, offset, len })
    }

    /// Lazily yields every chunk range in index order.
    pub fn ranges(&self) -> ChunkRanges {
        ChunkRanges {
            plan: *self,
            next: 0,
        }
    }
}

/// Iterator over the ranges of a [`ChunkPlan`].
#[derive(Debug, Clone)]
pub struct ChunkRanges {
    plan: ChunkPlan,
    next: u32,
}

impl Iterator for ChunkRanges {
    type Item = ChunkRange;

    fn next(&mut self) -> Option<ChunkRange> {
        let range = self.plan.range(self.next)?;
        self.next += 1;
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.plan.total_chunks.saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ChunkRanges {}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Content of one chunk, read on demand.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: u32,
    /// Raw chunk data.
    pub data: Vec<u8>,
    /// SHA-256 hex checksum of `data`.
    pub checksum: String,
}

/// Reads individual chunk ranges from a file.
///
/// Only the requested range is held in memory.
pub struct ChunkReader {
    file: std::fs::File,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    pub fn open(path: &Path) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        Ok(Self { file })
    }

    /// Reads exactly the bytes of `range`.
    ///
    /// Fails with `UnexpectedEof` if the file shrank since it was planned.
    pub fn read_chunk(&mut self, range: &ChunkRange) -> Result<Chunk, TransferError> {
        self.file.seek(SeekFrom::Start(range.offset))?;
        let mut data = vec![0u8; range.len as usize];
        self.file.read_exact(&mut data)?;

        let checksum = checksum_bytes(&data);
        Ok(Chunk {
            index: range.index,
            data,
            checksum,
        })
    }
}
