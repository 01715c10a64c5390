//! The producer side of a run.
//!
//! The calling thread reads the source chunk by chunk into pooled tasks and
//! routes each task to a worker. Workers write their digests straight into
//! disjoint slots of the output buffer, so the signature is in chunk order
//! without any reassembly step.

mod worker;

use std::fmt;
use std::io::{self, ErrorKind};
use std::thread;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::error::DigestError;
use crate::fault::FaultTracker;
use crate::hash::{ChunkHasher, HashAlgorithm};
use crate::io::{ChunkSource, DigestSink};
use crate::signature::Signature;
use crate::task::TaskPool;

use self::worker::WorkerPool;

/// Computes a signature of `source` with the algorithm named `algorithm`.
///
/// Shorthand for [`Pipeline::new`] followed by [`Pipeline::run`].
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use chunksig::PipelineConfig;
///
/// let config = PipelineConfig::default().with_chunk_size(1024);
/// let signature = chunksig::run(Cursor::new(vec![7u8; 4000]), "md5", &config)?;
///
/// assert_eq!(signature.len(), 4);
/// assert_eq!(signature.digest_size(), 16);
/// # Ok::<(), chunksig::DigestError>(())
/// ```
pub fn run<S: ChunkSource>(
    source: S,
    algorithm: &str,
    config: &PipelineConfig,
) -> Result<Signature, DigestError> {
    let algorithm: HashAlgorithm = algorithm.parse()?;
    Pipeline::new(*config, algorithm)?.run(source)
}

/// A configured chunk-digest pipeline.
///
/// A pipeline holds no threads or buffers between runs; every call to
/// [`run`](Self::run) builds its own task pool and workers and tears them
/// down before returning.
pub struct Pipeline {
    config: PipelineConfig,
    hasher: Box<dyn ChunkHasher>,
}

impl Pipeline {
    /// Creates a pipeline for one of the built-in algorithms.
    pub fn new(config: PipelineConfig, algorithm: HashAlgorithm) -> Result<Self, DigestError> {
        Self::with_hasher(config, algorithm.hasher())
    }

    /// Creates a pipeline around a caller-supplied digest function.
    pub fn with_hasher(
        config: PipelineConfig,
        hasher: Box<dyn ChunkHasher>,
    ) -> Result<Self, DigestError> {
        config.validate()?;
        if hasher.digest_size() == 0 {
            return Err(DigestError::invalid_config("digest size must be > 0"));
        }

        Ok(Self { config, hasher })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the digest function.
    pub fn hasher(&self) -> &dyn ChunkHasher {
        self.hasher.as_ref()
    }

    /// Splits `source` into chunks and digests them in parallel.
    ///
    /// Returns the first failure recorded by the producer or any worker.
    /// No partial signature is returned on failure.
    pub fn run<S: ChunkSource>(&self, mut source: S) -> Result<Signature, DigestError> {
        let started = Instant::now();
        let mut state = PipelineState::Idle;

        let chunk_size = self.config.chunk_size();
        let digest_size = self.hasher.digest_size();

        let total_size = source.total_size()?;
        if total_size == 0 {
            return Err(DigestError::invalid_config("source is empty"));
        }

        let num_chunks = total_size.div_ceil(chunk_size as u64);
        let (num_chunks_usize, output_len) = usize::try_from(num_chunks)
            .ok()
            .and_then(|n| Some((n, n.checked_mul(digest_size)?)))
            .ok_or(DigestError::invalid_config("signature does not fit in memory"))?;

        let mut output = vec![0u8; output_len];
        let faults = FaultTracker::new();

        let (progress, pool_capacity) = {
            let pool = TaskPool::preallocate(
                chunk_size,
                self.config.max_task_count().min(num_chunks_usize),
                self.config.max_task_memory(),
                self.config.reserve_memory(),
            );
            if pool.capacity() == 0 {
                return Err(DigestError::Allocation { chunk_size });
            }

            let mut slots = output.chunks_exact_mut(digest_size);

            let progress = thread::scope(|scope| -> Result<Progress, DigestError> {
                let workers = WorkerPool::start(
                    scope,
                    self.config.worker_count(),
                    self.hasher.as_ref(),
                    &faults,
                )?;
                tracing::debug!(
                    workers = workers.len(),
                    tasks = pool.capacity(),
                    "workers started"
                );
                state.advance(PipelineState::Running);

                let mut progress = Progress::default();
                while !faults.is_faulted() {
                    let mut task = pool.acquire();
                    if faults.is_faulted() {
                        break;
                    }

                    let read = match source.read_chunk(task.buffer_mut()) {
                        Ok(read) => read,
                        Err(error) => {
                            faults.set_fault(error.into());
                            break;
                        }
                    };
                    if read == 0 {
                        break;
                    }

                    if progress.short_read {
                        faults.set_fault(invalid_data("source returned data after a short read"));
                        break;
                    }
                    let Some(slot) = slots.next() else {
                        faults.set_fault(invalid_data("source is longer than its declared size"));
                        break;
                    };

                    let chunk = progress.chunks;
                    task.bind(chunk, read, slot);
                    tracing::trace!(chunk, bytes = read, "chunk dispatched");
                    workers.dispatch(task);

                    progress.chunks += 1;
                    progress.bytes += read as u64;
                    progress.short_read = read < chunk_size;
                }

                state.advance(PipelineState::Draining);
                workers.join();
                state.advance(PipelineState::Joined);

                Ok(progress)
            })?;

            debug_assert_eq!(pool.available(), pool.capacity(), "tasks leaked past join");
            tracing::debug!(free = pool.available(), "task pool drained");

            (progress, pool.capacity())
        };

        faults.raise_if_faulted()?;

        if progress.chunks != num_chunks || progress.bytes != total_size {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "source ended after {} of {} declared bytes",
                    progress.bytes, total_size
                ),
            )
            .into());
        }

        let elapsed = started.elapsed();
        tracing::info!(
            algorithm = self.hasher.name(),
            chunks = progress.chunks,
            bytes = progress.bytes,
            workers = self.config.worker_count(),
            tasks = pool_capacity,
            elapsed = ?elapsed,
            "signature computed"
        );

        Ok(Signature::new(self.hasher.name(), digest_size, output))
    }

    /// Runs the pipeline and writes the signature to `sink` in one call.
    ///
    /// Nothing is written if the run fails.
    pub fn run_to<S, W>(&self, source: S, sink: &mut W) -> Result<Signature, DigestError>
    where
        S: ChunkSource,
        W: DigestSink,
    {
        let signature = self.run(source)?;
        sink.write_digests(signature.as_bytes())?;
        Ok(signature)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("hasher", &self.hasher.name())
            .finish()
    }
}

#[derive(Debug, Default)]
struct Progress {
    chunks: u64,
    bytes: u64,
    short_read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Idle,
    Running,
    Draining,
    Joined,
}

impl PipelineState {
    fn advance(&mut self, next: Self) {
        debug_assert_eq!(next as u8, *self as u8 + 1, "pipeline states only move forward");
        tracing::debug!(from = ?*self, to = ?next, "pipeline state");
        *self = next;
    }
}

fn invalid_data(message: &'static str) -> DigestError {
    io::Error::new(ErrorKind::InvalidData, message).into()
}
