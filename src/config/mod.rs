//! Pool configuration.
//!
//! Configuration comes either from explicit values or from environment
//! variables:
//!
//! ```rust,ignore
//! use surgepool::PoolConfig;
//!
//! let config = PoolConfig::new(2, 6, 30, 1000)?;
//! // or
//! let config = PoolConfig::from_env()?;
//! ```

mod error;
mod parse;

pub use self::error::ConfigError;

use std::time::Duration;

use self::parse::env_parse;

/// Lower bound applied to the keep-alive so idle polling stays cheap.
const MIN_KEEP_ALIVE: Duration = Duration::from_millis(100);

/// Pool sizing configuration.
///
/// Values are clamped at construction so the pool invariants hold:
/// `min_threads >= 1`, `max_threads >= min_threads`, and
/// `keep_alive >= 100ms`. A zero queue capacity is rejected outright.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Workers kept alive even when idle.
    pub min_threads: usize,
    /// Hard ceiling on concurrent workers.
    pub max_threads: usize,
    /// Queue depth beyond which submissions are rejected.
    pub max_queue_size: usize,
    /// Idle time after which a worker volunteers to exit.
    pub keep_alive: Duration,
}

impl PoolConfig {
    /// Build a configuration from explicit values, clamping as needed.
    pub fn new(
        min_threads: usize,
        max_threads: usize,
        max_queue_size: usize,
        keep_alive_ms: u64,
    ) -> Result<Self, ConfigError> {
        if max_queue_size == 0 {
            return Err(ConfigError::Invalid {
                key: "max_queue_size".into(),
                message: "queue capacity cannot be zero".into(),
            });
        }

        let min_threads = min_threads.max(1);
        let max_threads = max_threads.max(min_threads);
        let keep_alive = Duration::from_millis(keep_alive_ms).max(MIN_KEEP_ALIVE);

        Ok(Self {
            min_threads,
            max_threads,
            max_queue_size,
            keep_alive,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// `POOL_MIN_THREADS` (0 = CPU count), `POOL_MAX_THREADS`
    /// (default: twice the minimum), `POOL_QUEUE_CAPACITY`
    /// (0 = 100 per worker), `POOL_KEEP_ALIVE_MS` (default: 1000).
    pub fn from_env() -> Result<Self, ConfigError> {
        let min_threads = match env_parse("POOL_MIN_THREADS", 0usize)? {
            0 => num_cpus::get(),
            n => n,
        };
        let max_threads = env_parse("POOL_MAX_THREADS", min_threads * 2)?;
        let max_queue_size = match env_parse("POOL_QUEUE_CAPACITY", 0usize)? {
            0 => max_threads.max(min_threads) * 100,
            n => n,
        };
        let keep_alive_ms = env_parse("POOL_KEEP_ALIVE_MS", 1000u64)?;

        Self::new(min_threads, max_threads, max_queue_size, keep_alive_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values() {
        let config = PoolConfig::new(2, 6, 30, 1000).unwrap();
        assert_eq!(config.min_threads, 2);
        assert_eq!(config.max_threads, 6);
        assert_eq!(config.max_queue_size, 30);
        assert_eq!(config.keep_alive, Duration::from_millis(1000));
    }

    #[test]
    fn test_clamps() {
        let config = PoolConfig::new(0, 0, 10, 10).unwrap();
        assert_eq!(config.min_threads, 1);
        assert_eq!(config.max_threads, 1);
        assert_eq!(config.keep_alive, Duration::from_millis(100));

        // max below min is raised to min.
        let config = PoolConfig::new(4, 2, 10, 1000).unwrap();
        assert_eq!(config.max_threads, 4);
    }

    #[test]
    fn test_zero_queue_rejected() {
        let err = PoolConfig::new(1, 2, 0, 1000).unwrap_err();
        assert!(err.to_string().contains("max_queue_size"));
    }
}
