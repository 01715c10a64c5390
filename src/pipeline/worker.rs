//! Hashing threads, one dispatch queue each.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, Scope, ScopedJoinHandle};

use crate::error::DigestError;
use crate::fault::FaultTracker;
use crate::hash::ChunkHasher;
use crate::queue::{self, Message, QueueReceiver, QueueSender};
use crate::task::PooledTask;

/// A fixed set of scoped worker threads.
///
/// Chunk `i` always goes to worker `i mod N`.
#[derive(Debug)]
pub(crate) struct WorkerPool<'scope, 'p, 'out> {
    workers: Vec<Worker<'scope, 'p, 'out>>,
}

#[derive(Debug)]
struct Worker<'scope, 'p, 'out> {
    id: usize,
    queue: QueueSender<'p, 'out>,
    handle: ScopedJoinHandle<'scope, usize>,
}

impl<'scope, 'p: 'scope, 'out: 'scope> WorkerPool<'scope, 'p, 'out> {
    /// Spawns `count` workers inside `scope`.
    ///
    /// If a spawn fails, the workers already started see their queues close
    /// and exit on their own.
    pub(crate) fn start(
        scope: &'scope Scope<'scope, '_>,
        count: usize,
        hasher: &'scope dyn ChunkHasher,
        faults: &'scope FaultTracker,
    ) -> io::Result<Self> {
        let mut workers = Vec::with_capacity(count);

        for id in 0..count {
            let (sender, receiver) = queue::dispatch_queue();
            let handle = thread::Builder::new()
                .name(format!("chunksig-worker-{id}"))
                .spawn_scoped(scope, move || run_worker(id, receiver, hasher, faults))?;

            workers.push(Worker {
                id,
                queue: sender,
                handle,
            });
        }

        Ok(Self { workers })
    }

    /// Hands a bound task to the worker owning its chunk.
    pub(crate) fn dispatch(&self, task: PooledTask<'p, 'out>) {
        debug_assert!(task.is_bound());
        let index = (task.chunk() % self.workers.len() as u64) as usize;
        let worker = &self.workers[index];

        if let Err(message) = worker.queue.enqueue(Message::Work(task)) {
            tracing::trace!(worker = worker.id, "worker already stopped, releasing task");
            drop(message);
            return;
        }

        tracing::trace!(worker = worker.id, depth = worker.queue.len(), "task queued");
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.len()
    }

    /// Sends the shutdown message to every worker and waits for all of them.
    pub(crate) fn join(self) {
        for worker in &self.workers {
            // A worker that stopped on a fault no longer reads its queue
            let _ = worker.queue.enqueue(Message::Shutdown);
        }

        for Worker { id, queue, handle } in self.workers {
            match handle.join() {
                Ok(executed) => {
                    tracing::debug!(worker = id, executed, "worker joined");
                }
                Err(payload) => panic::resume_unwind(payload),
            }
            drop(queue);
        }
    }
}

fn run_worker(
    id: usize,
    queue: QueueReceiver<'_, '_>,
    hasher: &dyn ChunkHasher,
    faults: &FaultTracker,
) -> usize {
    tracing::debug!(worker = id, "worker started");
    let mut executed = 0;

    loop {
        if faults.is_faulted() {
            tracing::debug!(worker = id, "fault observed, worker stopping");
            break;
        }

        let mut task = match queue.dequeue() {
            Message::Work(task) => task,
            Message::Shutdown => break,
        };

        let chunk = task.chunk();
        match execute(&mut task, hasher) {
            Ok(()) => {
                executed += 1;
                tracing::trace!(worker = id, chunk, bytes = task.len(), "chunk hashed");
            }
            Err(message) => {
                faults.set_fault(DigestError::Worker {
                    worker: id,
                    chunk,
                    message,
                });
                break;
            }
        }
    }

    let discarded = queue.discard_pending();
    if discarded > 0 {
        tracing::debug!(worker = id, discarded, "released queued tasks");
    }

    executed
}

/// Runs the digest, turning both errors and panics into a fault message.
fn execute(task: &mut PooledTask<'_, '_>, hasher: &dyn ChunkHasher) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(|| task.execute(hasher))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(error.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_owned()
    }
}
