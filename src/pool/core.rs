//! Pool coordinator: submission, elastic sizing, shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::backpressure::{BackpressureController, Decision};
use crate::config::PoolConfig;
use crate::handle::{wrap_task, ResultHandle};
use crate::queue::TaskQueue;
use crate::sync::lock_or_recover;

use super::error::PoolError;
use super::worker::Worker;
use super::PoolStats;

/// How long a throttled submission is held before returning.
const THROTTLE_DELAY: Duration = Duration::from_millis(50);

struct WorkerEntry {
    live: Arc<AtomicBool>,
}

struct Registry {
    workers: HashMap<usize, WorkerEntry>,
    next_id: usize,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    rejected: AtomicU64,
    throttled: AtomicU64,
    completed: AtomicU64,
}

/// State shared between the pool front end and its workers.
///
/// The registry mutex is the single mutual-exclusion domain for every
/// pool-mutating operation (spawn, shrink, exit, shutdown), so the
/// registry membership and the active counter always move together.
pub(crate) struct Shared {
    pub(crate) queue: TaskQueue,
    controller: BackpressureController,
    config: PoolConfig,
    running: AtomicBool,
    active: AtomicUsize,
    registry: Mutex<Registry>,
    // Interruptible timed waits for throttled submitters: shutdown
    // flips the flag and wakes them early.
    stopped: Mutex<bool>,
    stop_signal: Condvar,
    counters: Counters,
}

impl Shared {
    /// Spawn one worker. Caller holds the registry lock.
    fn spawn_worker(this: &Arc<Shared>, registry: &mut Registry) -> bool {
        if !this.running.load(Ordering::SeqCst) {
            return false;
        }
        if registry.workers.len() >= this.config.max_threads {
            return false;
        }

        let id = registry.next_id;
        registry.next_id += 1;

        let live = Arc::new(AtomicBool::new(true));
        registry.workers.insert(id, WorkerEntry { live: Arc::clone(&live) });
        this.active.fetch_add(1, Ordering::SeqCst);

        let worker = Worker::new(id, Arc::clone(this), live, this.config.keep_alive);
        let spawned = thread::Builder::new()
            .name(format!("surgepool-worker-{}", id))
            .spawn(move || worker.run());

        match spawned {
            Ok(_) => {
                tracing::debug!(worker = id, active = registry.workers.len(), "worker spawned");
                true
            }
            Err(e) => {
                // OS refused the thread: roll the bookkeeping back.
                registry.workers.remove(&id);
                this.active.fetch_sub(1, Ordering::SeqCst);
                tracing::warn!(worker = id, error = %e, "failed to spawn worker thread");
                false
            }
        }
    }

    /// Grow by one worker when the backlog outpaces the active count.
    /// Deliberately coarse; it reacts to queue depth, not utilization.
    fn maybe_grow(this: &Arc<Shared>) {
        if this.active.load(Ordering::SeqCst) >= this.config.max_threads {
            return;
        }
        let mut registry = lock_or_recover(&this.registry);
        let active = registry.workers.len();
        if active < this.config.max_threads && this.queue.len() > active {
            Shared::spawn_worker(this, &mut registry);
        }
    }

    /// A worker timed out waiting for work and asks to exit.
    ///
    /// Approved only while more than `min_threads` workers remain, or
    /// unconditionally during shutdown so the pool can drain out.
    pub(crate) fn try_shrink(&self, id: usize) -> bool {
        let mut registry = lock_or_recover(&self.registry);
        let shutting_down = !self.running.load(Ordering::SeqCst);
        if !shutting_down && registry.workers.len() <= self.config.min_threads {
            return false;
        }
        if let Some(entry) = registry.workers.remove(&id) {
            entry.live.store(false, Ordering::SeqCst);
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
        true
    }

    /// Final exit report from a worker thread. Idempotent: the count
    /// only drops when the registry entry was still present.
    pub(crate) fn worker_exited(&self, id: usize) {
        let mut registry = lock_or_recover(&self.registry);
        if registry.workers.remove(&id).is_some() {
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn task_completed(&self) {
        self.counters.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return; // already shut down
        }
        tracing::info!("shutting down thread pool");

        {
            let mut registry = lock_or_recover(&self.registry);
            for entry in registry.workers.values() {
                entry.live.store(false, Ordering::SeqCst);
            }
            registry.workers.clear();
            self.active.store(0, Ordering::SeqCst);
        }

        // Wake workers blocked on the queue. Tasks still queued are
        // abandoned: their handles stay pending.
        self.queue.close();

        // Release throttled submitters.
        let mut stopped = lock_or_recover(&self.stopped);
        *stopped = true;
        self.stop_signal.notify_all();
    }

    /// Hold a throttled submitter for `delay`, waking early on shutdown.
    fn throttle_wait(&self, delay: Duration) {
        let deadline = Instant::now() + delay;
        let mut stopped = lock_or_recover(&self.stopped);
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (guard, _) = self
                .stop_signal
                .wait_timeout(stopped, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            stopped = guard;
        }
    }
}

/// Elastic priority thread pool with backpressure admission control.
///
/// Spawns `min_threads` workers eagerly, grows up to `max_threads`
/// under backlog, and shrinks back when workers sit idle past the
/// keep-alive. Dropping the pool shuts it down.
pub struct ThreadPool {
    shared: Arc<Shared>,
}

impl ThreadPool {
    pub fn new(config: PoolConfig) -> Self {
        let shared = Arc::new(Shared {
            queue: TaskQueue::new(),
            controller: BackpressureController::new(config.max_queue_size),
            running: AtomicBool::new(true),
            active: AtomicUsize::new(0),
            registry: Mutex::new(Registry {
                workers: HashMap::new(),
                next_id: 0,
            }),
            stopped: Mutex::new(false),
            stop_signal: Condvar::new(),
            counters: Counters::default(),
            config,
        });

        {
            let mut registry = lock_or_recover(&shared.registry);
            for _ in 0..shared.config.min_threads {
                Shared::spawn_worker(&shared, &mut registry);
            }
        }

        tracing::info!(
            min_threads = shared.config.min_threads,
            max_threads = shared.config.max_threads,
            queue_capacity = shared.config.max_queue_size,
            keep_alive_ms = shared.config.keep_alive.as_millis() as u64,
            "thread pool started"
        );

        Self { shared }
    }

    /// Submit a unit of work at the given priority (higher runs first).
    ///
    /// Returns immediately with a handle that resolves when the work
    /// completes. A pool that is shut down, or a submission refused by
    /// backpressure, yields an already-failed handle; a throttled
    /// submission blocks the calling thread for up to 50ms before
    /// returning a pending handle.
    pub fn submit<T, F>(&self, priority: i32, work: F) -> ResultHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, String> + Send + 'static,
    {
        let shared = &self.shared;

        if !shared.running.load(Ordering::SeqCst) {
            return ResultHandle::failed(PoolError::Shutdown);
        }

        let depth = shared.queue.len();
        let decision = shared.controller.evaluate(
            depth,
            shared.active.load(Ordering::SeqCst),
            shared.config.max_threads,
        );

        if decision == Decision::Reject {
            shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                depth,
                capacity = shared.config.max_queue_size,
                "submission rejected by backpressure"
            );
            return ResultHandle::failed(PoolError::Rejected {
                depth,
                capacity: shared.config.max_queue_size,
            });
        }

        let (task, handle) = wrap_task(priority, work);
        if !shared.queue.insert(task) {
            // Shutdown raced the running check above.
            return ResultHandle::failed(PoolError::Shutdown);
        }
        shared.counters.submitted.fetch_add(1, Ordering::Relaxed);

        Shared::maybe_grow(shared);

        if decision == Decision::Throttle {
            shared.counters.throttled.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(depth, "submission throttled");
            shared.throttle_wait(THROTTLE_DELAY);
        }

        handle
    }

    /// Stop accepting work and signal every worker to exit.
    ///
    /// Idempotent; later calls are no-ops. Returns without waiting for
    /// in-flight task bodies, which run to completion on their workers.
    /// Tasks still queued are abandoned and their handles never
    /// resolve; await them with a timeout.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }

    /// Current live worker count.
    pub fn active_workers(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Current queue depth. Best-effort: racy by design.
    pub fn queue_depth(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Point-in-time snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        let counters = &self.shared.counters;
        PoolStats {
            submitted: counters.submitted.load(Ordering::Relaxed),
            rejected: counters.rejected.load(Ordering::Relaxed),
            throttled: counters.throttled.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            active_workers: self.active_workers(),
            queue_depth: self.queue_depth(),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}
