//! Bounded pool of reusable tasks.
//!
//! The pool is filled once, up front, and never grows. Acquiring blocks until
//! a task is free, which caps the number of chunks in flight and with it the
//! peak memory of a run.

use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::Task;

/// A bounded set of free tasks with a count and a memory budget.
#[derive(Debug)]
pub(crate) struct TaskPool<'out> {
    free: Mutex<Vec<Task<'out>>>,
    available: Condvar,
    capacity: usize,
}

impl<'out> TaskPool<'out> {
    /// Allocates as many tasks as the budgets allow.
    ///
    /// Stops at `max_count` tasks, at `max_memory` bytes of buffers, or at the
    /// first failed allocation, whichever comes first. An allocation failure
    /// only shrinks the pool. `reserve` bytes are held while allocating so the
    /// pool cannot take the memory the rest of the process needs.
    pub(crate) fn preallocate(
        chunk_size: usize,
        max_count: usize,
        max_memory: u64,
        reserve: usize,
    ) -> Self {
        let by_memory = usize::try_from(max_memory / chunk_size.max(1) as u64).unwrap_or(usize::MAX);
        let target = max_count.min(by_memory);

        let margin = reserve_margin(reserve);
        let mut tasks = Vec::new();

        while tasks.len() < target {
            match Task::with_capacity(chunk_size) {
                Ok(task) => tasks.push(task),
                Err(error) => {
                    tracing::warn!(
                        allocated = tasks.len(),
                        requested = target,
                        %error,
                        "task pool allocation fell short"
                    );
                    break;
                }
            }
        }

        drop(margin);

        tracing::debug!(
            tasks = tasks.len(),
            chunk_size,
            bytes = tasks.len() as u64 * chunk_size as u64,
            "task pool allocated"
        );

        Self {
            capacity: tasks.len(),
            free: Mutex::new(tasks),
            available: Condvar::new(),
        }
    }

    /// Takes a free task, blocking until one is released.
    ///
    /// The task returns to the pool when the lease is dropped.
    pub(crate) fn acquire(&self) -> PooledTask<'_, 'out> {
        debug_assert!(self.capacity > 0, "acquire on an empty pool never returns");

        let mut free = self.lock();
        let task = loop {
            if let Some(task) = free.pop() {
                break task;
            }
            free = self
                .available
                .wait(free)
                .unwrap_or_else(PoisonError::into_inner);
        };

        PooledTask { pool: self, task }
    }

    /// Returns a task to the pool and wakes one waiting acquirer.
    pub(crate) fn release(&self, mut task: Task<'out>) {
        task.reset();

        let mut free = self.lock();
        debug_assert!(free.len() < self.capacity, "more tasks released than allocated");
        free.push(task);
        drop(free);

        self.available.notify_one();
    }

    /// Number of tasks owned by the pool.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tasks currently free.
    pub(crate) fn available(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Task<'out>>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn reserve_margin(bytes: usize) -> Option<Vec<u8>> {
    if bytes == 0 {
        return None;
    }

    let mut margin = Vec::new();
    match margin.try_reserve_exact(bytes) {
        Ok(()) => Some(margin),
        Err(error) => {
            tracing::warn!(bytes, %error, "unable to hold the reserve margin");
            None
        }
    }
}

/// A task on loan from a [`TaskPool`].
///
/// Dropping the lease releases the task, on every path.
#[derive(Debug)]
pub(crate) struct PooledTask<'p, 'out> {
    pool: &'p TaskPool<'out>,
    task: Task<'out>,
}

impl<'out> Deref for PooledTask<'_, 'out> {
    type Target = Task<'out>;

    fn deref(&self) -> &Self::Target {
        &self.task
    }
}

impl DerefMut for PooledTask<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.task
    }
}

impl Drop for PooledTask<'_, '_> {
    fn drop(&mut self) {
        let task = mem::replace(&mut self.task, Task::empty());
        self.pool.release(task);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_count_budget() {
        let pool = TaskPool::preallocate(16, 3, 1 << 20, 0);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn test_memory_budget() {
        // 100 bytes fit six 16-byte buffers
        let pool = TaskPool::preallocate(16, 1000, 100, 0);
        assert_eq!(pool.capacity(), 6);
        assert!(pool.capacity() as u64 * 16 <= 100);
    }

    #[test]
    fn test_allocation_failure_is_absorbed() {
        // Larger than isize::MAX: every reservation fails without touching memory
        let huge = isize::MAX as usize + 1;
        let pool = TaskPool::preallocate(huge, 4, u64::MAX, 0);
        assert_eq!(pool.capacity(), 0);
    }

    #[test]
    fn test_acquire_and_drop_returns_task() {
        let pool = TaskPool::preallocate(8, 2, 1024, 0);

        let first = pool.acquire();
        let second = pool.acquire();
        assert_eq!(pool.available(), 0);
        assert_eq!(first.capacity(), 8);

        drop(first);
        assert_eq!(pool.available(), 1);
        drop(second);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_release_resets_binding() {
        let mut output = [0u8; 4];
        let pool = TaskPool::preallocate(8, 1, 1024, 0);

        {
            let mut task = pool.acquire();
            task.bind(9, 8, &mut output);
            assert!(task.is_bound());
        }

        let task = pool.acquire();
        assert!(!task.is_bound());
        assert_eq!(task.capacity(), 8);
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let pool = TaskPool::preallocate(8, 1, 1024, 0);
        let held = pool.acquire();

        thread::scope(|scope| {
            let waiter = scope.spawn(|| {
                let task = pool.acquire();
                task.capacity()
            });

            thread::sleep(Duration::from_millis(50));
            assert!(!waiter.is_finished(), "acquire returned without a free task");

            drop(held);
            assert_eq!(waiter.join().unwrap(), 8);
        });

        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_leases_move_across_threads() {
        let pool = TaskPool::preallocate(8, 4, 1024, 0);

        thread::scope(|scope| {
            for _ in 0..16 {
                let task = pool.acquire();
                scope.spawn(move || drop(task));
            }
        });

        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn test_reserve_margin() {
        assert!(reserve_margin(0).is_none());
        assert!(reserve_margin(1024).is_some_and(|m| m.capacity() >= 1024));
    }
}
