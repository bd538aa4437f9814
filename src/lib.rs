//! surgepool - Elastic priority thread pool with backpressure admission control.
//!
//! This crate provides a bounded pool of worker threads executing
//! prioritized units of work from a shared queue. Submissions pass
//! through an admission-control layer that accepts, throttles, or
//! rejects work based on queue depth, growth rate, and worker
//! saturation; the pool grows and shrinks between `min_threads` and
//! `max_threads` based on backlog.
//!
//! # Features
//!
//! - **Priority scheduling**: higher priority runs first, FIFO within
//!   equal priority
//! - **Backpressure**: overloaded pools throttle or reject new work
//!   instead of degrading
//! - **Elastic sizing**: workers spawn under backlog and exit after an
//!   idle keep-alive
//! - **Result handles**: every submission returns a one-shot handle
//!   supporting blocking waits, continuations, and `.await`
//!
//! # Example
//!
//! ```rust,ignore
//! use surgepool::{PoolConfig, ThreadPool};
//!
//! let pool = ThreadPool::new(PoolConfig::new(2, 6, 30, 1000)?);
//! let handle = pool.submit(5, || Ok::<_, String>(21 * 2));
//! assert_eq!(handle.wait()?, 42);
//! pool.shutdown();
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod backpressure;
pub mod config;
pub mod handle;
pub mod logging;
pub mod pool;
pub mod queue;
mod sync;
pub mod task;

// Re-exports for convenience
pub use config::{ConfigError, PoolConfig};
pub use handle::ResultHandle;
pub use pool::{PoolError, PoolResult, PoolStats, ThreadPool};
