//! CRC-32 chunk checksums.

use super::ChunkHasher;
use crate::error::DigestError;

/// Computes 4-byte IEEE CRC-32 checksums, stored little-endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Hasher;

impl Crc32Hasher {
    /// The size of the checksum in bytes.
    pub const SIZE: usize = 4;
}

impl ChunkHasher for Crc32Hasher {
    fn name(&self) -> &'static str {
        "crc32"
    }

    fn digest_size(&self) -> usize {
        Self::SIZE
    }

    fn compute(&self, data: &[u8], out: &mut [u8]) -> Result<(), DigestError> {
        out.copy_from_slice(&crc32fast::hash(data).to_le_bytes());
        Ok(())
    }
}
