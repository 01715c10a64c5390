//! First-failure-wins fault tracking shared by the producer and all workers.
//!
//! The tracker is a signaling device: workers and the producer poll
//! [`FaultTracker::is_faulted`] to stop early, and the first recorded error
//! is handed back to the caller once every worker has been joined.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::DigestError;

/// Write-once fault cell.
#[derive(Debug, Default)]
pub(crate) struct FaultTracker {
    faulted: AtomicBool,
    first: Mutex<Option<DigestError>>,
}

impl FaultTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records `error` unless a fault was already recorded.
    ///
    /// Returns `true` if this call recorded the fault.
    pub(crate) fn set_fault(&self, error: DigestError) -> bool {
        let mut first = self.first.lock().unwrap_or_else(PoisonError::into_inner);

        if first.is_some() {
            tracing::debug!(%error, "discarding fault, another one was recorded first");
            return false;
        }

        tracing::debug!(%error, "fault recorded");
        *first = Some(error);
        self.faulted.store(true, Ordering::Release);
        true
    }

    pub(crate) fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    /// Returns the first recorded fault, if any.
    ///
    /// Consumes the tracker: call once, after every worker has been joined.
    pub(crate) fn raise_if_faulted(self) -> Result<(), DigestError> {
        match self
            .first
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
