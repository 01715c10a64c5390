//! Configuration for the signature pipeline.
//!
//! [`PipelineConfig`] controls how the input is split and how much work may
//! be in flight at once:
//!
//! - `chunk_size` - Bytes per chunk; every chunk but the last has this size
//! - `worker_count` - Number of hashing threads
//! - `max_task_count` - Upper bound on pooled tasks (in-flight chunks)
//! - `max_task_memory` - Upper bound on the bytes held by pooled task buffers
//! - `reserve_memory` - Safety margin held back while the pool is allocated
//!
//! # Example
//!
//! ```
//! use chunksig::PipelineConfig;
//!
//! // 4 MiB chunks on 8 workers
//! let config = PipelineConfig::default()
//!     .with_chunk_size(4 * 1024 * 1024)
//!     .with_worker_count(8);
//! config.validate()?;
//!
//! # Ok::<(), chunksig::DigestError>(())
//! ```

use std::num::NonZeroUsize;
use std::thread;

use crate::error::DigestError;

/// Default chunk size (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Default upper bound on pooled tasks.
pub const DEFAULT_MAX_TASK_COUNT: usize = 10_000;

/// Default upper bound on memory held by pooled task buffers (2 GiB).
pub const DEFAULT_MAX_TASK_MEMORY: u64 = 2 * 1024 * 1024 * 1024;

/// Default memory margin left to the rest of the process (50 MiB).
pub const DEFAULT_RESERVE_MEMORY: usize = 50 * 1024 * 1024;

/// Largest accepted worker count.
pub const MAX_WORKER_COUNT: usize = 4096;

/// Configuration for a signature run.
///
/// # Constraints
///
/// - `chunk_size`, `worker_count` and `max_task_count` are non-zero
/// - `worker_count <= MAX_WORKER_COUNT`
/// - `max_task_memory` fits at least one chunk
///
/// # Example
///
/// ```
/// use chunksig::PipelineConfig;
///
/// let config = PipelineConfig::new(64 * 1024, 4, 32, 2 * 1024 * 1024)?;
/// assert_eq!(config.chunk_size(), 64 * 1024);
/// assert_eq!(config.worker_count(), 4);
///
/// // Memory budget below a single chunk is rejected
/// assert!(PipelineConfig::new(64 * 1024, 4, 32, 1024).is_err());
/// # Ok::<(), chunksig::DigestError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineConfig {
    /// Size of every chunk except possibly the last one.
    chunk_size: usize,

    /// Number of worker threads.
    worker_count: usize,

    /// Maximum number of pooled tasks.
    max_task_count: usize,

    /// Maximum bytes of task buffers.
    max_task_memory: u64,

    /// Bytes held back while allocating the pool.
    reserve_memory: usize,
}

impl PipelineConfig {
    /// Creates a new configuration with the default reserve margin.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::InvalidConfig`] if any constraint is violated.
    pub fn new(
        chunk_size: usize,
        worker_count: usize,
        max_task_count: usize,
        max_task_memory: u64,
    ) -> Result<Self, DigestError> {
        let config = Self {
            chunk_size,
            worker_count,
            max_task_count,
            max_task_memory,
            reserve_memory: DEFAULT_RESERVE_MEMORY,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the chunk size in bytes.
    ///
    /// Note: This does not validate the configuration. Use
    /// [`PipelineConfig::validate`] to check it.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the number of worker threads.
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Sets the maximum number of pooled tasks.
    pub fn with_max_task_count(mut self, count: usize) -> Self {
        self.max_task_count = count;
        self
    }

    /// Sets the maximum number of bytes held by pooled task buffers.
    pub fn with_max_task_memory(mut self, bytes: u64) -> Self {
        self.max_task_memory = bytes;
        self
    }

    /// Sets the reserve margin held while the pool is allocated.
    ///
    /// A zero margin disables the reservation.
    pub fn with_reserve_memory(mut self, bytes: usize) -> Self {
        self.reserve_memory = bytes;
        self
    }

    /// Returns the chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Returns the maximum number of pooled tasks.
    pub fn max_task_count(&self) -> usize {
        self.max_task_count
    }

    /// Returns the task memory budget in bytes.
    pub fn max_task_memory(&self) -> u64 {
        self.max_task_memory
    }

    /// Returns the reserve margin in bytes.
    pub fn reserve_memory(&self) -> usize {
        self.reserve_memory
    }

    /// Validates the current configuration.
    ///
    /// ```
    /// use chunksig::PipelineConfig;
    ///
    /// let config = PipelineConfig::default().with_worker_count(0);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), DigestError> {
        if self.chunk_size == 0 {
            return Err(DigestError::invalid_config("chunk size must be non-zero"));
        }

        if self.worker_count == 0 {
            return Err(DigestError::invalid_config("worker count must be non-zero"));
        }

        if self.worker_count > MAX_WORKER_COUNT {
            return Err(DigestError::invalid_config(
                "worker count exceeds MAX_WORKER_COUNT",
            ));
        }

        if self.max_task_count == 0 {
            return Err(DigestError::invalid_config(
                "max task count must be non-zero",
            ));
        }

        if self.max_task_memory < self.chunk_size as u64 {
            return Err(DigestError::invalid_config(
                "max task memory must fit at least one chunk",
            ));
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            worker_count: default_worker_count(),
            max_task_count: DEFAULT_MAX_TASK_COUNT,
            max_task_memory: DEFAULT_MAX_TASK_MEMORY,
            reserve_memory: DEFAULT_RESERVE_MEMORY,
        }
    }
}

/// Worker count derived from the available hardware parallelism.
///
/// Falls back to a single worker when the platform cannot tell.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .min(MAX_WORKER_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(config.max_task_count(), DEFAULT_MAX_TASK_COUNT);
        assert_eq!(config.max_task_memory(), DEFAULT_MAX_TASK_MEMORY);
        assert_eq!(config.reserve_memory(), DEFAULT_RESERVE_MEMORY);
        assert!(config.worker_count() >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipelineConfig::default()
            .with_chunk_size(4096)
            .with_worker_count(3)
            .with_max_task_count(7)
            .with_max_task_memory(1 << 20)
            .with_reserve_memory(0);

        assert_eq!(config.chunk_size(), 4096);
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.max_task_count(), 7);
        assert_eq!(config.max_task_memory(), 1 << 20);
        assert_eq!(config.reserve_memory(), 0);
    }

    #[test]
    fn test_invalid_config_zero_values() {
        assert!(PipelineConfig::new(0, 1, 1, 1024).is_err());
        assert!(PipelineConfig::new(16, 0, 1, 1024).is_err());
        assert!(PipelineConfig::new(16, 1, 0, 1024).is_err());
        assert!(PipelineConfig::new(16, 1, 1, 0).is_err());
    }

    #[test]
    fn test_invalid_config_memory_below_chunk() {
        let err = PipelineConfig::new(4096, 1, 1, 4095).unwrap_err();
        assert!(matches!(err, DigestError::InvalidConfig { .. }));
        assert!(PipelineConfig::new(4096, 1, 1, 4096).is_ok());
    }

    #[test]
    fn test_invalid_config_too_many_workers() {
        assert!(PipelineConfig::new(16, MAX_WORKER_COUNT, 1, 16).is_ok());
        assert!(PipelineConfig::new(16, MAX_WORKER_COUNT + 1, 1, 16).is_err());
    }

    #[test]
    fn test_default_worker_count_in_range() {
        let count = default_worker_count();
        assert!((1..=MAX_WORKER_COUNT).contains(&count));
    }
}
