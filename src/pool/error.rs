//! Pool error types.

use std::fmt;
use std::time::Duration;

/// Errors surfaced through result handles and pool operations.
#[derive(Debug, Clone)]
pub enum PoolError {
    /// Submission refused by admission control.
    Rejected {
        /// Queue depth observed at submission time.
        depth: usize,
        /// Maximum queue capacity.
        capacity: usize,
    },

    /// The pool is not running.
    Shutdown,

    /// The task body returned an error.
    Execution(String),

    /// The task body panicked.
    WorkerPanic(String),

    /// Waiting on a result handle timed out.
    WaitTimeout(Duration),
}

impl PoolError {
    /// Check if this is an admission-control rejection.
    pub fn is_rejected(&self) -> bool {
        matches!(self, PoolError::Rejected { .. })
    }

    /// Check if this is a shutdown error.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, PoolError::Shutdown)
    }

    /// Check if this is a wait timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PoolError::WaitTimeout(_))
    }

    /// Check if this is a task-body failure (error or panic).
    pub fn is_execution(&self) -> bool {
        matches!(self, PoolError::Execution(_) | PoolError::WorkerPanic(_))
    }

    /// Get the error message for logging.
    pub fn message(&self) -> &str {
        match self {
            PoolError::Rejected { .. } => "Rejected by backpressure",
            PoolError::Shutdown => "Pool shut down",
            PoolError::Execution(msg) => msg,
            PoolError::WorkerPanic(_) => "Task panicked",
            PoolError::WaitTimeout(_) => "Wait timeout",
        }
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Rejected { depth, capacity } => {
                write!(f, "rejected by backpressure: {}/{} tasks queued", depth, capacity)
            }
            PoolError::Shutdown => {
                write!(f, "pool is not running")
            }
            PoolError::Execution(msg) => {
                write!(f, "task failed: {}", msg)
            }
            PoolError::WorkerPanic(msg) => {
                write!(f, "task panicked: {}", msg)
            }
            PoolError::WaitTimeout(duration) => {
                write!(f, "result not ready after {}ms", duration.as_millis())
            }
        }
    }
}

impl std::error::Error for PoolError {}

impl From<String> for PoolError {
    fn from(msg: String) -> Self {
        PoolError::Execution(msg)
    }
}

impl From<&str> for PoolError {
    fn from(msg: &str) -> Self {
        PoolError::Execution(msg.to_string())
    }
}

/// Result type alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
