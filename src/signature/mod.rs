//! The assembled per-chunk digest stream.

use std::fmt;
use std::slice::ChunksExact;

use bytes::Bytes;

/// Digests of every chunk of a source, in chunk order.
///
/// The byte layout is the on-disk signature format: one `digest_size`-byte
/// record per chunk, no header, padding or separators.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use chunksig::PipelineConfig;
///
/// let config = PipelineConfig::default().with_chunk_size(4).with_worker_count(2);
/// let signature = chunksig::run(Cursor::new(b"abcdefghij".to_vec()), "crc32", &config)?;
///
/// assert_eq!(signature.len(), 3);
/// assert_eq!(signature.as_bytes().len(), 3 * 4);
/// assert_eq!(signature.get(2), Some(&crc32fast::hash(b"ij").to_le_bytes()[..]));
/// # Ok::<(), chunksig::DigestError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    algorithm: &'static str,
    digest_size: usize,
    digests: Bytes,
}

impl Signature {
    pub(crate) fn new(algorithm: &'static str, digest_size: usize, digests: impl Into<Bytes>) -> Self {
        let digests = digests.into();
        debug_assert!(digest_size > 0 && digests.len() % digest_size == 0);

        Self {
            algorithm,
            digest_size,
            digests,
        }
    }

    /// Name of the algorithm that produced the digests.
    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    /// Size of each digest record in bytes.
    pub fn digest_size(&self) -> usize {
        self.digest_size
    }

    /// Number of chunks (and records).
    pub fn len(&self) -> usize {
        self.digests.len() / self.digest_size
    }

    /// Returns true if the signature holds no records.
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Returns the digest of chunk `index`.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.digest_size)?;
        let end = start.checked_add(self.digest_size)?;
        self.digests.get(start..end)
    }

    /// Iterates over the records in chunk order.
    pub fn iter(&self) -> ChunksExact<'_, u8> {
        self.digests.chunks_exact(self.digest_size)
    }

    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.digests
    }

    /// Consumes the signature and returns the raw bytes.
    pub fn into_bytes(self) -> Bytes {
        self.digests
    }

    /// Returns the digest of chunk `index` as a lowercase hex string.
    pub fn to_hex(&self, index: usize) -> Option<String> {
        self.get(index).map(hex)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.digests
    }
}

impl<'a> IntoIterator for &'a Signature {
    type Item = &'a [u8];
    type IntoIter = ChunksExact<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One hex record per line.
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in self {
            for byte in record {
                write!(f, "{:02x}", byte)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut result = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        result.push(HEX[(byte >> 4) as usize] as char);
        result.push(HEX[(byte & 0xf) as usize] as char);
    }
    result
}
