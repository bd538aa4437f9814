//! Elastic worker pool with backpressure admission control.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      ThreadPool                            │
//! ├────────────────────────────────────────────────────────────┤
//! │   submit(priority, work)                                   │
//! │        │                                                   │
//! │  ┌─────▼──────────────┐   Reject → failed ResultHandle     │
//! │  │ Backpressure check │   Throttle → enqueue + 50ms hold   │
//! │  └─────┬──────────────┘   Accept → enqueue                 │
//! │        │                                                   │
//! │  ┌─────▼─────────┐                                         │
//! │  │   TaskQueue   │  (priority desc, FIFO within priority)  │
//! │  └─────┬─────────┘                                         │
//! │        │                                                   │
//! │  ┌─────▼───┐    ┌─────────┐    ┌─────────┐                 │
//! │  │ Worker0 │    │ Worker1 │    │ Worker2 │  ...            │
//! │  └─────────┘    └─────────┘    └─────────┘                 │
//! │   min_threads eager, grows to max_threads under backlog,   │
//! │   shrinks back after the keep-alive idle timeout           │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod core;
mod error;
mod worker;

pub use self::core::ThreadPool;
pub use self::error::{PoolError, PoolResult};

/// Point-in-time pool counters.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Tasks accepted into the queue.
    pub submitted: u64,
    /// Submissions refused by admission control.
    pub rejected: u64,
    /// Submissions accepted but delayed.
    pub throttled: u64,
    /// Task bodies executed to completion (success or failure).
    pub completed: u64,
    /// Live workers at snapshot time.
    pub active_workers: usize,
    /// Queued tasks at snapshot time (racy by design).
    pub queue_depth: usize,
}
