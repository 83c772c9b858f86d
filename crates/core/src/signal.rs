//! Cancellation signals observed by the event stream.
//!
//! A signal is read, never reset: once it reports aborted it must keep doing so.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// External, monotonic "stop" flag checked once per iteration step.
pub trait AbortSignal: Send + Sync {
    fn is_aborted(&self) -> bool;
}

/// Signal that never fires; used when no signal is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverAbort;

impl AbortSignal for NeverAbort {
    fn is_aborted(&self) -> bool {
        false
    }
}

impl AbortSignal for CancellationToken {
    fn is_aborted(&self) -> bool {
        self.is_cancelled()
    }
}

impl AbortSignal for AtomicBool {
    fn is_aborted(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: AbortSignal + ?Sized> AbortSignal for Arc<T> {
    fn is_aborted(&self) -> bool {
        (**self).is_aborted()
    }
}
