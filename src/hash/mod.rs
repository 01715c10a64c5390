//! Per-chunk digest algorithms.
//!
//! Every algorithm implements [`ChunkHasher`]: a stateless, thread-safe
//! `compute(bytes) -> fixed-size digest` capability. [`HashAlgorithm`]
//! resolves the built-in variants by name:
//!
//! - [`Md5Hasher`] - `md5`, 16-byte RFC 1321 digest
//! - [`Crc32Hasher`] - `crc32`, 4-byte IEEE CRC-32, little-endian
//! - [`Blake3Hasher`] - `blake3`, 32-byte BLAKE3 hash (requires `hash-blake3` feature)
//!
//! Custom hashers can be handed to [`Pipeline::with_hasher`](crate::Pipeline::with_hasher).

#[cfg(feature = "hash-blake3")]
mod blake3;
mod crc32;
mod md5;

use std::fmt;
use std::str::FromStr;

use crate::error::DigestError;

#[cfg(feature = "hash-blake3")]
pub use self::blake3::Blake3Hasher;
pub use self::crc32::Crc32Hasher;
pub use self::md5::Md5Hasher;

/// A digest algorithm applied independently to every chunk.
///
/// Implementations must build fresh algorithm state on every call to
/// [`compute`](ChunkHasher::compute); one instance is shared by all workers.
pub trait ChunkHasher: Send + Sync {
    /// Short lowercase algorithm name.
    fn name(&self) -> &'static str;

    /// Size in bytes of every digest produced by [`compute`](ChunkHasher::compute).
    fn digest_size(&self) -> usize;

    /// Hashes `data` into `out`.
    ///
    /// `out` is exactly [`digest_size`](ChunkHasher::digest_size) bytes long.
    fn compute(&self, data: &[u8], out: &mut [u8]) -> Result<(), DigestError>;

    /// Convenience method returning the digest of `data` as a new vector.
    fn digest(&self, data: &[u8]) -> Result<Vec<u8>, DigestError> {
        let mut out = vec![0u8; self.digest_size()];
        self.compute(data, &mut out)?;
        Ok(out)
    }
}

/// Built-in digest algorithms, selectable by name.
///
/// # Example
///
/// ```
/// use chunksig::HashAlgorithm;
///
/// let algorithm: HashAlgorithm = "MD5".parse()?;
/// assert_eq!(algorithm, HashAlgorithm::Md5);
/// assert_eq!(algorithm.digest_size(), 16);
///
/// assert!("sha3".parse::<HashAlgorithm>().is_err());
/// # Ok::<(), chunksig::DigestError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5 (RFC 1321).
    Md5,
    /// CRC-32 (IEEE 802.3 polynomial).
    Crc32,
    /// BLAKE3.
    #[cfg(feature = "hash-blake3")]
    Blake3,
}

impl HashAlgorithm {
    /// All algorithms compiled into this build.
    #[cfg(feature = "hash-blake3")]
    pub const ALL: &'static [HashAlgorithm] = &[
        HashAlgorithm::Md5,
        HashAlgorithm::Crc32,
        HashAlgorithm::Blake3,
    ];

    /// All algorithms compiled into this build.
    #[cfg(not(feature = "hash-blake3"))]
    pub const ALL: &'static [HashAlgorithm] = &[HashAlgorithm::Md5, HashAlgorithm::Crc32];

    /// Returns the canonical algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Crc32 => "crc32",
            #[cfg(feature = "hash-blake3")]
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    /// Returns the digest size in bytes.
    pub const fn digest_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => Md5Hasher::SIZE,
            HashAlgorithm::Crc32 => Crc32Hasher::SIZE,
            #[cfg(feature = "hash-blake3")]
            HashAlgorithm::Blake3 => Blake3Hasher::SIZE,
        }
    }

    /// Creates a hasher for this algorithm.
    pub fn hasher(self) -> Box<dyn ChunkHasher> {
        match self {
            HashAlgorithm::Md5 => Box::new(Md5Hasher),
            HashAlgorithm::Crc32 => Box::new(Crc32Hasher),
            #[cfg(feature = "hash-blake3")]
            HashAlgorithm::Blake3 => Box::new(Blake3Hasher),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = DigestError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| DigestError::UnsupportedAlgorithm {
                name: name.to_owned(),
            })
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
