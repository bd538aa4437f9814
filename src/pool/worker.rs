//! Worker thread loop.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::core::Shared;

/// One worker bound to the shared queue.
///
/// Runs until told to stop, or until an idle timeout the coordinator
/// approves as a shrink. Every exit path reports back through
/// `worker_exited` exactly once.
pub(crate) struct Worker {
    id: usize,
    shared: Arc<Shared>,
    live: Arc<AtomicBool>,
    keep_alive: Duration,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        shared: Arc<Shared>,
        live: Arc<AtomicBool>,
        keep_alive: Duration,
    ) -> Self {
        Self {
            id,
            shared,
            live,
            keep_alive,
        }
    }

    pub(crate) fn run(self) {
        tracing::debug!(worker = self.id, "worker started");

        while self.live.load(Ordering::SeqCst) {
            match self.shared.queue.take_timeout(self.keep_alive) {
                Some(task) => {
                    // Body failures resolve the task's own handle; this
                    // net only catches a panic escaping the wrapper, so
                    // no task can take the worker down.
                    let seq = task.seq();
                    if catch_unwind(AssertUnwindSafe(move || task.run())).is_err() {
                        tracing::warn!(worker = self.id, task = seq, "task panicked past its handle");
                    }
                    self.shared.task_completed();
                }
                None => {
                    if self.shared.queue.is_closed() {
                        break;
                    }
                    // Idle timeout: volunteer to shrink.
                    if self.shared.try_shrink(self.id) {
                        tracing::debug!(worker = self.id, "idle worker shrinking");
                        break;
                    }
                }
            }
        }

        self.shared.worker_exited(self.id);
        tracing::debug!(worker = self.id, "worker stopped");
    }
}
