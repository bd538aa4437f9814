//! Small synchronization helpers shared across the crate.

use std::sync::{Mutex, MutexGuard};

/// Acquire a mutex, recovering the guard if a panicking thread poisoned it.
/// Pool bookkeeping must stay usable after a task panic.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
