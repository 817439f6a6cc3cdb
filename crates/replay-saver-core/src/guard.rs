//! Single-flight gate shared by every trigger source.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::trace;

/// Process-wide gate allowing at most one replay save at a time.
///
/// Rejected callers are not queued. Share it with `Arc` between every
/// trigger source.
#[derive(Debug, Default)]
pub struct InvocationGuard {
    in_progress: AtomicBool,
}

impl InvocationGuard {
    /// Create an idle guard.
    pub fn new() -> Self {
        Self {
            in_progress: AtomicBool::new(false),
        }
    }

    /// Atomically claim the guard.
    ///
    /// Returns `None` when an operation is already in progress. The returned
    /// permit releases the guard when dropped.
    pub fn try_acquire(self: &Arc<Self>) -> Option<InvocationPermit> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        trace!("Invocation guard acquired");

        Some(InvocationPermit {
            guard: Arc::clone(self),
        })
    }

    /// Whether an operation currently holds the guard.
    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    fn release(&self) {
        self.in_progress.store(false, Ordering::Release);
        trace!("Invocation guard released");
    }
}

/// RAII proof of a successful [`InvocationGuard::try_acquire`].
///
/// Releases the guard exactly once, on drop, whichever way the guarded
/// operation ends (including unwinding).
#[derive(Debug)]
#[must_use = "dropping the permit releases the guard immediately"]
pub struct InvocationPermit {
    guard: Arc<InvocationGuard>,
}

impl Drop for InvocationPermit {
    fn drop(&mut self) {
        self.guard.release();
    }
}
