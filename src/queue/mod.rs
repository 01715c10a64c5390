//! Blocking FIFO queues handing tasks from the producer to a worker.
//!
//! Each worker owns one queue. Shutdown is an explicit [`Message::Shutdown`]
//! rather than a null task, and a queue whose producer side is gone reads as
//! shutdown too.

use crossbeam_channel::{Receiver, Sender};

use crate::task::PooledTask;

/// An element of a dispatch queue.
#[derive(Debug)]
pub(crate) enum Message<'p, 'out> {
    /// A bound task to hash.
    Work(PooledTask<'p, 'out>),
    /// Orderly end of the worker loop.
    Shutdown,
}

/// Creates a connected queue pair.
pub(crate) fn dispatch_queue<'p, 'out>() -> (QueueSender<'p, 'out>, QueueReceiver<'p, 'out>) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (QueueSender { sender }, QueueReceiver { receiver })
}

/// Producer side of a dispatch queue.
#[derive(Debug)]
pub(crate) struct QueueSender<'p, 'out> {
    sender: Sender<Message<'p, 'out>>,
}

impl<'p, 'out> QueueSender<'p, 'out> {
    /// Appends a message without blocking.
    ///
    /// Hands the message back if the worker has already stopped.
    pub(crate) fn enqueue(&self, message: Message<'p, 'out>) -> Result<(), Message<'p, 'out>> {
        self.sender.send(message).map_err(|error| error.into_inner())
    }

    /// Number of messages waiting.
    pub(crate) fn len(&self) -> usize {
        self.sender.len()
    }
}

/// Worker side of a dispatch queue.
///
/// Messages still queued when the receiver is dropped are dropped with it,
/// which returns their tasks to the pool.
#[derive(Debug)]
pub(crate) struct QueueReceiver<'p, 'out> {
    receiver: Receiver<Message<'p, 'out>>,
}

impl<'p, 'out> QueueReceiver<'p, 'out> {
    /// Removes the oldest message, blocking while the queue is empty.
    pub(crate) fn dequeue(&self) -> Message<'p, 'out> {
        self.receiver.recv().unwrap_or(Message::Shutdown)
    }

    /// Drops every message queued right now.
    ///
    /// Returns the number of tasks released.
    pub(crate) fn discard_pending(&self) -> usize {
        self.receiver
            .try_iter()
            .filter(|message| matches!(message, Message::Work(_)))
            .count()
    }
}
