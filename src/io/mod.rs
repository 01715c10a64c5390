//! Sequential input and output for the pipeline.
//!
//! - [`ChunkSource`] - Declares its total size and fills chunk buffers in order
//! - [`DigestSink`] - Receives the assembled signature in one write
//!
//! Any [`Read`] becomes a source through [`ReaderSource`]; in-memory cursors
//! are sources directly. Every [`Write`] is a sink.

use std::fs::File;
use std::io::{self, Cursor, ErrorKind, Read, Write};
use std::path::Path;

/// A sequential byte source split into chunks by the pipeline.
///
/// Only the producer thread calls into a source, one chunk at a time.
pub trait ChunkSource {
    /// Total number of bytes the source will yield.
    fn total_size(&self) -> io::Result<u64>;

    /// Fills `buf` with the next bytes of the source.
    ///
    /// Returns fewer than `buf.len()` bytes only when the source ends, and
    /// `0` once it is exhausted.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn total_size(&self) -> io::Result<u64> {
        (**self).total_size()
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_chunk(buf)
    }
}

/// Destination for the assembled digest stream.
pub trait DigestSink {
    /// Writes the complete signature.
    fn write_digests(&mut self, digests: &[u8]) -> io::Result<()>;
}

impl<W: Write> DigestSink for W {
    fn write_digests(&mut self, digests: &[u8]) -> io::Result<()> {
        self.write_all(digests)?;
        self.flush()
    }
}

/// Adapts any [`Read`] with a known length into a [`ChunkSource`].
///
/// # Example
///
/// ```no_run
/// use chunksig::{ChunkSource, FileSource};
///
/// let source = FileSource::open("data.bin")?;
/// println!("{} bytes to hash", source.total_size()?);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    total_size: u64,
}

/// A file read front to back.
pub type FileSource = ReaderSource<File>;

impl<R: Read> ReaderSource<R> {
    /// Wraps `reader`, which must yield exactly `total_size` bytes.
    pub fn new(reader: R, total_size: u64) -> Self {
        Self { reader, total_size }
    }

    /// Consumes the source and returns the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl ReaderSource<File> {
    /// Opens `path` for reading, taking its size from the file metadata.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let total_size = file.metadata()?.len();
        Ok(Self::new(file, total_size))
    }
}

impl<R: Read> ChunkSource for ReaderSource<R> {
    fn total_size(&self) -> io::Result<u64> {
        Ok(self.total_size)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        fill(&mut self.reader, buf)
    }
}

impl<T: AsRef<[u8]>> ChunkSource for Cursor<T> {
    fn total_size(&self) -> io::Result<u64> {
        let len = self.get_ref().as_ref().len() as u64;
        Ok(len.saturating_sub(self.position()))
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        fill(self, buf)
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields at most `step` bytes per read and interrupts every other call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(ErrorKind::Interrupted.into());
            }
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_fill_across_short_reads() {
        let data: Vec<u8> = (0..100).collect();
        let mut source = ReaderSource::new(
            Trickle {
                data: &data,
                step: 7,
                interrupt: false,
            },
            100,
        );

        let mut buf = [0u8; 40];
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 40);
        assert_eq!(&buf[..], &data[..40]);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 40);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 20);
        assert_eq!(&buf[..20], &data[80..]);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_cursor_source() {
        let mut cursor = Cursor::new(vec![1u8; 10]);
        assert_eq!(cursor.total_size().unwrap(), 10);

        let mut buf = [0u8; 4];
        assert_eq!(cursor.read_chunk(&mut buf).unwrap(), 4);
        assert_eq!(cursor.total_size().unwrap(), 6);
    }

    #[test]
    fn test_read_error_propagates() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("device unplugged"))
            }
        }

        let mut source = ReaderSource::new(Broken, 1);
        let err = source.read_chunk(&mut [0u8; 1]).unwrap_err();
        assert_eq!(err.to_string(), "device unplugged");
    }

    #[test]
    fn test_borrowed_source_advances_owner() {
        fn drain(mut source: impl ChunkSource) -> (u64, usize) {
            let total = source.total_size().unwrap();
            (total, source.read_chunk(&mut [0u8; 4]).unwrap())
        }

        let mut cursor = Cursor::new(vec![5u8; 10]);
        assert_eq!(drain(&mut cursor), (10, 4));
        assert_eq!(drain(&mut cursor), (6, 4));
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_writer_sink() {
        let mut sink = Vec::new();
        sink.write_digests(b"abc").unwrap();
        assert_eq!(sink, b"abc");
    }
}
