//! One-shot result handles for submitted tasks.
//!
//! A [`ResultHandle`] is the asynchronous half of a submission: it
//! transitions exactly once from pending to a value or a failure, and
//! any number of observers may block on it, poll it as a `Future`, or
//! attach continuations.

use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use crate::pool::{PoolError, PoolResult};
use crate::sync::lock_or_recover;
use crate::task::PriorityTask;

type Callback<T> = Box<dyn FnOnce(&PoolResult<T>) + Send>;

enum State<T> {
    Pending {
        wakers: Vec<Waker>,
        callbacks: Vec<Callback<T>>,
    },
    Done(PoolResult<T>),
}

struct Inner<T> {
    state: Mutex<State<T>>,
    resolved: Condvar,
}

/// Asynchronous one-shot container for a task outcome.
///
/// Cheap to clone; clones observe the same resolution. Blocking waits
/// require `T: Clone` so every observer can take an owned copy.
pub struct ResultHandle<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ResultHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> ResultHandle<T> {
    /// Create a pending handle and the completer that resolves it.
    pub(crate) fn pending() -> (Self, Completer<T>) {
        let inner = Arc::new(Inner {
            state: Mutex::new(State::Pending {
                wakers: Vec::new(),
                callbacks: Vec::new(),
            }),
            resolved: Condvar::new(),
        });
        (
            Self {
                inner: Arc::clone(&inner),
            },
            Completer { inner },
        )
    }

    /// A handle already resolved with `value`.
    pub fn ready(value: T) -> Self {
        Self::resolved(Ok(value))
    }

    /// A handle already resolved with `error`.
    pub fn failed(error: PoolError) -> Self {
        Self::resolved(Err(error))
    }

    fn resolved(result: PoolResult<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Done(result)),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Whether the handle has transitioned out of pending.
    pub fn is_resolved(&self) -> bool {
        matches!(&*lock_or_recover(&self.inner.state), State::Done(_))
    }

    /// Attach a continuation invoked with the outcome once resolved.
    ///
    /// Runs immediately on the calling thread if already resolved,
    /// otherwise on the worker thread that completes the task. The
    /// continuation runs with the handle's internal lock held and must
    /// not block on this handle.
    pub fn on_complete<F>(&self, f: F)
    where
        F: FnOnce(&PoolResult<T>) + Send + 'static,
    {
        let mut state = lock_or_recover(&self.inner.state);
        match &mut *state {
            State::Pending { callbacks, .. } => callbacks.push(Box::new(f)),
            State::Done(result) => f(result),
        }
    }
}

impl<T: Clone + Send + 'static> ResultHandle<T> {
    /// The outcome, if resolved.
    pub fn try_result(&self) -> Option<PoolResult<T>> {
        match &*lock_or_recover(&self.inner.state) {
            State::Done(result) => Some(result.clone()),
            State::Pending { .. } => None,
        }
    }

    /// Block until the handle resolves.
    pub fn wait(&self) -> PoolResult<T> {
        let mut state = lock_or_recover(&self.inner.state);
        loop {
            if let State::Done(result) = &*state {
                return result.clone();
            }
            state = self
                .inner
                .resolved
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Block until the handle resolves or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> PoolResult<T> {
        let deadline = Instant::now() + timeout;
        let mut state = lock_or_recover(&self.inner.state);
        loop {
            if let State::Done(result) = &*state {
                return result.clone();
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(PoolError::WaitTimeout(timeout));
            }
            let (guard, _) = self
                .inner
                .resolved
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state = guard;
        }
    }
}

impl<T: Clone + Send + 'static> Future for ResultHandle<T> {
    type Output = PoolResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = lock_or_recover(&self.inner.state);
        match &mut *state {
            State::Done(result) => Poll::Ready(result.clone()),
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// Write half of a handle. Held only by the wrapped task body; consumed
/// by the single `complete` call.
pub(crate) struct Completer<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Completer<T> {
    /// Resolve the handle. A second resolution is a logic error and is
    /// ignored outside debug builds.
    pub(crate) fn complete(self, result: PoolResult<T>) {
        let wakers = {
            let mut state = lock_or_recover(&self.inner.state);
            let (wakers, callbacks) =
                match std::mem::replace(&mut *state, State::Done(result)) {
                    State::Pending { wakers, callbacks } => (wakers, callbacks),
                    done @ State::Done(_) => {
                        // Keep the first resolution.
                        *state = done;
                        debug_assert!(false, "result handle completed twice");
                        return;
                    }
                };
            if let State::Done(result) = &*state {
                for callback in callbacks {
                    callback(result);
                }
            }
            wakers
        };

        self.inner.resolved.notify_all();
        for waker in wakers {
            waker.wake();
        }
    }
}

/// Adapt a value-producing unit of work into a queueable task plus the
/// handle that resolves with its outcome.
///
/// The task body runs `work` under `catch_unwind`: a returned error
/// resolves the handle with [`PoolError::Execution`], a panic with
/// [`PoolError::WorkerPanic`]. Failures are logged at the worker level
/// and never escape into the worker loop.
pub(crate) fn wrap_task<T, F>(priority: i32, work: F) -> (PriorityTask, ResultHandle<T>)
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    let (handle, completer) = ResultHandle::pending();
    let task = PriorityTask::new(priority, move || {
        let outcome = match catch_unwind(AssertUnwindSafe(work)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(msg)) => {
                tracing::warn!(error = %msg, "task returned an error");
                Err(PoolError::Execution(msg))
            }
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                tracing::warn!(error = %msg, "task panicked");
                Err(PoolError::WorkerPanic(msg))
            }
        };
        completer.complete(outcome);
    });
    (task, handle)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
