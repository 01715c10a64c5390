//! MD5 chunk hashing.

use md5::{Digest, Md5};

use super::ChunkHasher;
use crate::error::DigestError;

/// Computes 16-byte MD5 digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Hasher;

impl Md5Hasher {
    /// The size of the digest in bytes.
    pub const SIZE: usize = 16;
}

impl ChunkHasher for Md5Hasher {
    fn name(&self) -> &'static str {
        "md5"
    }

    fn digest_size(&self) -> usize {
        Self::SIZE
    }

    fn compute(&self, data: &[u8], out: &mut [u8]) -> Result<(), DigestError> {
        out.copy_from_slice(&Md5::digest(data));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc1321_vectors() {
        let hasher = Md5Hasher;
        assert_eq!(
            hasher.digest(b"").unwrap(),
            [
                0xd4, 0x1d, 0x8c, 0xd9, 0x8f, 0x00, 0xb2, 0x04, 0xe9, 0x80, 0x09, 0x98, 0xec,
                0xf8, 0x42, 0x7e
            ]
        );
        assert_eq!(
            hasher.digest(b"abc").unwrap(),
            [
                0x90, 0x01, 0x50, 0x98, 0x3c, 0xd2, 0x4f, 0xb0, 0xd6, 0x96, 0x3f, 0x7d, 0x28,
                0xe1, 0x7f, 0x72
            ]
        );
    }
}
