//! Admission control for task submission.
//!
//! The controller looks at three load signals, in a fixed order:
//!
//! - queue overflow (hard reject)
//! - queue growth rate within a sampling window
//! - worker saturation and raw queue pressure
//!
//! Later rules only escalate toward rejection, never relax an earlier
//! decision.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::sync::lock_or_recover;

/// Minimum interval between growth-rate samples.
pub const SAMPLE_WINDOW: Duration = Duration::from_millis(50);

/// Queue growth within one window that counts as a burst, as a
/// fraction of capacity.
const GROWTH_FRACTION: f64 = 0.20;

/// Queue fill fraction that throttles when every worker is busy.
const SATURATION_FRACTION: f64 = 0.50;

/// Queue fill fraction that throttles unconditionally.
const PRESSURE_FRACTION: f64 = 0.75;

/// Outcome of an admission-control check. Computed fresh per submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Enqueue the task.
    Accept,
    /// Enqueue the task, but delay the submitting thread.
    Throttle,
    /// Refuse the task outright.
    Reject,
}

struct Sample {
    queue_size: usize,
    at: Instant,
}

/// Stateful admission-control policy shared by all submitting threads.
///
/// The growth-rate sample advances at most once per [`SAMPLE_WINDOW`];
/// the sample state sits behind its own small mutex so concurrent
/// `evaluate` calls cannot corrupt it. A missed sample under contention
/// only costs an occasional missed throttle.
pub struct BackpressureController {
    max_queue_size: usize,
    sample: Mutex<Sample>,
}

impl BackpressureController {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            max_queue_size: max_queue_size.max(1),
            sample: Mutex::new(Sample {
                queue_size: 0,
                at: Instant::now(),
            }),
        }
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    /// Decide whether a submission is accepted, throttled, or rejected.
    pub fn evaluate(
        &self,
        queue_size: usize,
        active_threads: usize,
        max_threads: usize,
    ) -> Decision {
        // 1. Hard overflow guard; no sampling side effect.
        if queue_size > self.max_queue_size {
            return Decision::Reject;
        }

        let capacity = self.max_queue_size as f64;
        let mut decision = Decision::Accept;

        // 2. Growth rate: fast queue growth within one window throttles.
        //    The sample advances on every window boundary, whether or
        //    not the threshold tripped.
        {
            let mut sample = lock_or_recover(&self.sample);
            let now = Instant::now();
            if now.duration_since(sample.at) >= SAMPLE_WINDOW {
                let growth = queue_size as i64 - sample.queue_size as i64;
                if growth as f64 > capacity * GROWTH_FRACTION {
                    decision = Decision::Throttle;
                }
                sample.queue_size = queue_size;
                sample.at = now;
            }
        }

        // 3. Worker saturation with a half-full queue.
        if active_threads >= max_threads && queue_size as f64 > capacity * SATURATION_FRACTION {
            decision = Decision::Throttle;
        }

        // 4. Raw queue pressure.
        if queue_size as f64 > capacity * PRESSURE_FRACTION {
            decision = Decision::Throttle;
        }

        decision
    }
}
