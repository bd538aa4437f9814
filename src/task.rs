//! Prioritized units of work.

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as MemOrdering};

/// Process-wide sequence counter for FIFO tie-breaking.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A schedulable unit of work ranked by an integer priority.
///
/// Higher priority runs first. Tasks with equal priority run in
/// submission order: each task is stamped with a monotonically
/// increasing sequence number at creation, used as the secondary
/// sort key.
pub struct PriorityTask {
    priority: i32,
    seq: u64,
    body: Box<dyn FnOnce() + Send>,
}

impl PriorityTask {
    /// Create a task with the given priority and body.
    pub fn new<F>(priority: i32, body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            priority,
            seq: NEXT_SEQ.fetch_add(1, MemOrdering::Relaxed),
            body: Box::new(body),
        }
    }

    /// Task priority; higher values dequeue first.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Submission sequence number (unique, monotonically increasing).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Execute the task body, consuming the task.
    pub fn run(self) {
        (self.body)();
    }
}

impl fmt::Debug for PriorityTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityTask")
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .finish()
    }
}

impl PartialEq for PriorityTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for PriorityTask {}

impl PartialOrd for PriorityTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityTask {
    /// Ordered for a max-heap: higher priority is greater; among equal
    /// priorities the older task (smaller sequence) is greater, so the
    /// heap pops FIFO within a priority band.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
