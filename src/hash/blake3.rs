//! BLAKE3-based chunk hashing implementation.

use super::ChunkHasher;
use crate::error::DigestError;

/// A hasher that computes 32-byte BLAKE3 hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl Blake3Hasher {
    /// The size of the hash in bytes.
    pub const SIZE: usize = blake3::OUT_LEN;
}

impl ChunkHasher for Blake3Hasher {
    fn name(&self) -> &'static str {
        "blake3"
    }

    fn digest_size(&self) -> usize {
        Self::SIZE
    }

    fn compute(&self, data: &[u8], out: &mut [u8]) -> Result<(), DigestError> {
        // One-shot hashing builds a fresh state per call
        out.copy_from_slice(blake3::hash(data).as_bytes());
        Ok(())
    }
}
