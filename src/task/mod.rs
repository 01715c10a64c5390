//! Reusable hashing tasks.
//!
//! A [`Task`] owns one chunk-sized input buffer for its whole life and is
//! recycled through the [`TaskPool`]. Between acquisitions it goes through:
//!
//! ```text
//!   Free ──bind──▶ Bound ──dispatch──▶ Executing ──release──▶ Free
//! ```
//!
//! While bound, the task holds an exclusive borrow of its chunk's slot in the
//! output buffer, so two tasks can never write the same digest record.

mod pool;

use std::collections::TryReserveError;

use crate::error::DigestError;
use crate::hash::ChunkHasher;

pub(crate) use pool::{PooledTask, TaskPool};

/// A chunk buffer bound to the output slot its digest will be written to.
#[derive(Debug)]
pub(crate) struct Task<'out> {
    buffer: Vec<u8>,
    len: usize,
    chunk: u64,
    destination: Option<&'out mut [u8]>,
}

impl<'out> Task<'out> {
    /// Allocates a free task able to hold `chunk_size` bytes.
    pub(crate) fn with_capacity(chunk_size: usize) -> Result<Self, TryReserveError> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(chunk_size)?;
        buffer.resize(chunk_size, 0);

        Ok(Self {
            buffer,
            ..Self::empty()
        })
    }

    /// A task without a buffer. Does not allocate.
    pub(crate) const fn empty() -> Self {
        Self {
            buffer: Vec::new(),
            len: 0,
            chunk: 0,
            destination: None,
        }
    }

    /// The whole input buffer, for the reader to fill.
    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Sequence number of the bound chunk.
    pub(crate) fn chunk(&self) -> u64 {
        self.chunk
    }

    /// Number of valid bytes in the buffer.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.destination.is_some()
    }

    /// Binds the first `len` buffered bytes of chunk `chunk` to its output slot.
    pub(crate) fn bind(&mut self, chunk: u64, len: usize, destination: &'out mut [u8]) {
        debug_assert!(len <= self.capacity());

        self.chunk = chunk;
        self.len = len;
        self.destination = Some(destination);
    }

    /// Hashes the valid part of the buffer into the bound slot.
    pub(crate) fn execute(&mut self, hasher: &dyn ChunkHasher) -> Result<(), DigestError> {
        let Some(destination) = self.destination.as_deref_mut() else {
            return Err(DigestError::invalid_config("task executed before being bound"));
        };

        hasher.compute(&self.buffer[..self.len], destination)
    }

    /// Returns the task to the free state, keeping its buffer.
    pub(crate) fn reset(&mut self) {
        self.len = 0;
        self.chunk = 0;
        self.destination = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Crc32Hasher, Md5Hasher};

    #[test]
    fn test_with_capacity() {
        let task = Task::with_capacity(64).unwrap();
        assert_eq!(task.capacity(), 64);
        assert_eq!(task.len(), 0);
        assert!(!task.is_bound());
    }

    #[test]
    fn test_empty_does_not_allocate() {
        let task = Task::empty();
        assert_eq!(task.buffer.capacity(), 0);
    }

    #[test]
    fn test_execute_hashes_only_valid_bytes() {
        let mut output = [0u8; Crc32Hasher::SIZE];
        let mut task = Task::with_capacity(16).unwrap();

        task.buffer_mut()[..5].copy_from_slice(b"hello");
        task.buffer_mut()[5..].fill(0xEE);
        task.bind(7, 5, &mut output);
        assert!(task.is_bound());
        assert_eq!(task.chunk(), 7);

        task.execute(&Crc32Hasher).unwrap();
        drop(task);

        assert_eq!(output, crc32fast::hash(b"hello").to_le_bytes());
    }

    #[test]
    fn test_execute_unbound_fails() {
        let mut task = Task::with_capacity(8).unwrap();
        assert!(task.execute(&Md5Hasher).is_err());
    }

    #[test]
    fn test_reset_unbinds() {
        let mut output = [0u8; Md5Hasher::SIZE];
        let mut task = Task::with_capacity(8).unwrap();
        task.bind(3, 8, &mut output);

        task.reset();
        assert!(!task.is_bound());
        assert_eq!(task.len(), 0);
        assert_eq!(task.capacity(), 8);
    }
}
