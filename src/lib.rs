//! chunksig
//!
//! Parallel fixed-size chunk signatures for Rust.
//!
//! `chunksig` splits a byte source into fixed-size chunks, digests every
//! chunk on a pool of worker threads and returns the digests concatenated in
//! chunk order. The result is a compact signature of the input for:
//!
//! - integrity checking
//! - delta synchronization
//! - deduplication indexes
//!
//! The crate intentionally:
//! - reads the source sequentially, on the calling thread
//! - bounds memory with a fixed pool of chunk buffers
//! - stops at the first failure and returns it
//! - never returns a partial signature
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use chunksig::{DigestError, FileSource, HashAlgorithm, Pipeline, PipelineConfig};
//!
//! fn main() -> Result<(), DigestError> {
//!     let pipeline = Pipeline::new(PipelineConfig::default(), HashAlgorithm::Md5)?;
//!     let mut hashfile = File::create("data.sig")?;
//!
//!     let signature = pipeline.run_to(FileSource::open("data.bin")?, &mut hashfile)?;
//!     println!("{} chunks", signature.len());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod hash;
mod io;
mod pipeline;
mod signature;

mod fault; // internal first-failure latch
mod queue; // internal per-worker dispatch queues
mod task; // internal pooled chunk buffers

//
// Public surface
//

pub use config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_TASK_COUNT, DEFAULT_MAX_TASK_MEMORY, DEFAULT_RESERVE_MEMORY,
    MAX_WORKER_COUNT, PipelineConfig, default_worker_count,
};
pub use error::DigestError;
#[cfg(feature = "hash-blake3")]
pub use hash::Blake3Hasher;
pub use hash::{ChunkHasher, Crc32Hasher, HashAlgorithm, Md5Hasher};
pub use io::{ChunkSource, DigestSink, FileSource, ReaderSource};
pub use pipeline::{Pipeline, run};
pub use signature::Signature;
