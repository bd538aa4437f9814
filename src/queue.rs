//! Thread-safe priority-ordered blocking task queue.

use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::sync::lock_or_recover;
use crate::task::PriorityTask;

struct Inner {
    heap: BinaryHeap<PriorityTask>,
    closed: bool,
}

/// Unbounded blocking container of [`PriorityTask`]s.
///
/// Tasks dequeue highest-priority first, FIFO within equal priority.
/// Each task is delivered to exactly one taker: the pop happens under
/// the queue mutex. Closing the queue wakes every blocked taker; a
/// closed queue delivers nothing, even if tasks remain (they are
/// abandoned by pool shutdown).
pub struct TaskQueue {
    inner: Mutex<Inner>,
    available: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Insert a task and wake one waiting taker.
    ///
    /// Non-blocking; bounded only by memory. Returns `false` if the
    /// queue is already closed, in which case the task is dropped.
    pub fn insert(&self, task: PriorityTask) -> bool {
        let mut inner = lock_or_recover(&self.inner);
        if inner.closed {
            return false;
        }
        inner.heap.push(task);
        self.available.notify_one();
        true
    }

    /// Block until a task is available or the queue is closed.
    pub fn take_blocking(&self) -> Option<PriorityTask> {
        let mut inner = lock_or_recover(&self.inner);
        loop {
            if inner.closed {
                return None;
            }
            if let Some(task) = inner.heap.pop() {
                return Some(task);
            }
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// As [`take_blocking`](Self::take_blocking), but give up after
    /// `timeout`. Workers use the timeout to detect idleness.
    pub fn take_timeout(&self, timeout: Duration) -> Option<PriorityTask> {
        let deadline = Instant::now() + timeout;
        let mut inner = lock_or_recover(&self.inner);
        loop {
            if inner.closed {
                return None;
            }
            if let Some(task) = inner.heap.pop() {
                return Some(task);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .available
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            inner = guard;
        }
    }

    /// Instantaneous task count. Racy by design: callers use it only
    /// as a heuristic for scaling and admission control.
    pub fn len(&self) -> usize {
        lock_or_recover(&self.inner).heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        lock_or_recover(&self.inner).closed
    }

    /// Close the queue and wake every blocked taker.
    pub fn close(&self) {
        let mut inner = lock_or_recover(&self.inner);
        inner.closed = true;
        self.available.notify_all();
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_then_take() {
        let queue = TaskQueue::new();
        assert!(queue.insert(PriorityTask::new(1, || {})));
        assert_eq!(queue.len(), 1);

        let task = queue.take_blocking().unwrap();
        assert_eq!(task.priority(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_take_in_priority_order() {
        let queue = TaskQueue::new();
        for priority in [1, 4, 2, 3, 0] {
            queue.insert(PriorityTask::new(priority, || {}));
        }

        let order: Vec<i32> = (0..5)
            .map(|_| queue.take_blocking().unwrap().priority())
            .collect();
        assert_eq!(order, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_take_timeout_expires_empty() {
        let queue = TaskQueue::new();
        let start = Instant::now();
        assert!(queue.take_timeout(Duration::from_millis(50)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_take_blocking_wakes_on_insert() {
        let queue = Arc::new(TaskQueue::new());
        let taker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.take_blocking().map(|t| t.priority()))
        };

        thread::sleep(Duration::from_millis(20));
        queue.insert(PriorityTask::new(7, || {}));
        assert_eq!(taker.join().unwrap(), Some(7));
    }

    #[test]
    fn test_close_wakes_blocked_takers() {
        let queue = Arc::new(TaskQueue::new());
        let taker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.take_blocking())
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert!(taker.join().unwrap().is_none());
    }

    #[test]
    fn test_closed_queue_abandons_remaining_tasks() {
        let queue = TaskQueue::new();
        queue.insert(PriorityTask::new(1, || {}));
        queue.close();

        // Remaining tasks are never delivered after close.
        assert!(queue.take_timeout(Duration::from_millis(10)).is_none());
        assert!(!queue.insert(PriorityTask::new(2, || {})));
    }

    #[test]
    fn test_concurrent_takers_get_each_task_once() {
        let queue = Arc::new(TaskQueue::new());
        let executed = Arc::new(AtomicUsize::new(0));
        let n = 100;

        for _ in 0..n {
            let executed = Arc::clone(&executed);
            queue.insert(PriorityTask::new(0, move || {
                executed.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    while let Some(task) = queue.take_timeout(Duration::from_millis(50)) {
                        task.run();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(executed.load(Ordering::SeqCst), n);
    }
}
