//! Error types for chunksig.

use thiserror::Error;

/// Errors that can occur while computing a chunk signature.
#[derive(Debug, Error)]
pub enum DigestError {
    /// Invalid configuration parameter or unusable input.
    ///
    /// Always raised before any worker thread is started.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// No hash algorithm is registered under the requested name.
    #[error("unsupported hash algorithm: {name:?}")]
    UnsupportedAlgorithm {
        /// The name that failed to resolve.
        name: String,
    },

    /// An I/O error occurred while reading the source or writing the signature.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The task pool could not allocate even a single chunk buffer.
    #[error("unable to allocate a task buffer of {chunk_size} bytes")]
    Allocation {
        /// The chunk size that could not be allocated.
        chunk_size: usize,
    },

    /// A digest computation failed or panicked inside a worker.
    #[error("worker {worker} failed on chunk {chunk}: {message}")]
    Worker {
        /// Index of the worker that recorded the fault.
        worker: usize,
        /// Sequence number of the chunk being hashed.
        chunk: u64,
        /// Description of the failure.
        message: String,
    },
}

impl DigestError {
    pub(crate) fn invalid_config(message: &'static str) -> Self {
        Self::InvalidConfig { message }
    }
}
