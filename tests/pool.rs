//! End-to-end pool behavior: ordering, admission control, elasticity,
//! shutdown, and result handles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use surgepool::{PoolConfig, PoolError, ThreadPool};

fn pool(min: usize, max: usize, queue: usize, keep_alive_ms: u64) -> ThreadPool {
    ThreadPool::new(PoolConfig::new(min, max, queue, keep_alive_ms).unwrap())
}

/// Park the single worker on a task that waits for `release`, so
/// everything submitted afterwards stacks up in the queue.
fn block_worker(pool: &ThreadPool) -> mpsc::Sender<()> {
    let (release, gate) = mpsc::channel::<()>();
    pool.submit(i32::MAX, move || {
        let _ = gate.recv_timeout(Duration::from_secs(10));
        Ok::<_, String>(())
    });
    // Give the worker time to pick the blocker up.
    thread::sleep(Duration::from_millis(50));
    release
}

#[test]
fn priority_order_with_single_worker() {
    let pool = pool(1, 1, 50, 500);
    let release = block_worker(&pool);

    let executed = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<_> = [(0, 1), (1, 4), (2, 2), (3, 3), (4, 0)]
        .into_iter()
        .map(|(id, priority)| {
            let executed = Arc::clone(&executed);
            pool.submit(priority, move || {
                executed.lock().unwrap().push(id);
                Ok::<_, String>(())
            })
        })
        .collect();

    release.send(()).unwrap();
    for handle in &handles {
        handle.wait_timeout(Duration::from_secs(5)).unwrap();
    }

    assert_eq!(*executed.lock().unwrap(), vec![1, 3, 2, 0, 4]);
    pool.shutdown();
}

#[test]
fn fifo_within_equal_priority() {
    let pool = pool(1, 1, 50, 500);
    let release = block_worker(&pool);

    let executed = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<_> = (0..8)
        .map(|id| {
            let executed = Arc::clone(&executed);
            pool.submit(3, move || {
                executed.lock().unwrap().push(id);
                Ok::<_, String>(())
            })
        })
        .collect();

    release.send(()).unwrap();
    for handle in &handles {
        handle.wait_timeout(Duration::from_secs(5)).unwrap();
    }

    assert_eq!(*executed.lock().unwrap(), (0..8).collect::<Vec<_>>());
    pool.shutdown();
}

#[test]
fn rejects_once_queue_overflows() {
    let pool = pool(1, 1, 4, 500);
    let _release = block_worker(&pool);

    // Depths observed at submission: 0..=4, all admissible.
    for i in 0..5 {
        let handle = pool.submit(0, move || Ok::<_, String>(i));
        assert!(
            handle.try_result().is_none() || handle.try_result().unwrap().is_ok(),
            "filler {} should not be rejected",
            i
        );
    }
    assert_eq!(pool.queue_depth(), 5);

    // Queue now deeper than its capacity: hard reject, nothing enqueued.
    let handle = pool.submit(0, || Ok::<_, String>(99));
    let err = handle.try_result().expect("rejection is immediate").unwrap_err();
    assert!(err.is_rejected(), "expected backpressure reject, got {err}");
    assert_eq!(pool.queue_depth(), 5);

    pool.shutdown();
}

#[test]
fn throttled_submission_is_delayed_but_pending() {
    let pool = pool(1, 1, 10, 500);
    let _release = block_worker(&pool);

    // Push depth past 75% of capacity.
    for i in 0..8 {
        pool.submit(0, move || Ok::<_, String>(i));
    }

    let start = Instant::now();
    let handle = pool.submit(0, || Ok::<_, String>(42));
    let elapsed = start.elapsed();

    assert!(
        elapsed >= Duration::from_millis(45),
        "throttle returned after {:?}",
        elapsed
    );
    // Throttled, not rejected: the handle is still pending.
    assert!(handle.try_result().is_none());

    pool.shutdown();
}

#[test]
fn worker_count_stays_within_bounds() {
    let pool = Arc::new(pool(2, 4, 1000, 200));
    assert_eq!(pool.active_workers(), 2);

    let submitters: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..50 {
                    pool.submit(0, || {
                        thread::sleep(Duration::from_millis(2));
                        Ok::<_, String>(())
                    });
                }
            })
        })
        .collect();

    // Sample the worker count while the load runs.
    for _ in 0..50 {
        let active = pool.active_workers();
        assert!((2..=4).contains(&active), "active workers {active} out of bounds");
        thread::sleep(Duration::from_millis(5));
    }
    for submitter in submitters {
        submitter.join().unwrap();
    }

    pool.shutdown();
    assert_eq!(pool.active_workers(), 0);
}

#[test]
fn grows_under_backlog_and_shrinks_when_idle() {
    let pool = pool(1, 3, 1000, 150);

    let handles: Vec<_> = (0..60)
        .map(|i| {
            pool.submit(0, move || {
                thread::sleep(Duration::from_millis(10));
                Ok::<_, String>(i)
            })
        })
        .collect();

    // Backlog should pull in extra workers.
    let mut grew = false;
    for _ in 0..100 {
        if pool.active_workers() > 1 {
            grew = true;
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(grew, "pool never grew past min_threads under backlog");

    for handle in &handles {
        handle.wait_timeout(Duration::from_secs(10)).unwrap();
    }

    // Idle workers should drain back down to min_threads.
    let mut shrank = false;
    for _ in 0..100 {
        if pool.active_workers() == 1 {
            shrank = true;
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    assert!(shrank, "pool never shrank back to min_threads");

    pool.shutdown();
}

#[test]
fn each_task_executes_exactly_once() {
    let pool = pool(2, 4, 1000, 200);
    let executions = Arc::new(AtomicUsize::new(0));

    let n = 200;
    let handles: Vec<_> = (0..n)
        .map(|i| {
            let executions = Arc::clone(&executions);
            pool.submit((i % 7) as i32, move || {
                executions.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(i)
            })
        })
        .collect();

    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(handle.wait_timeout(Duration::from_secs(10)).unwrap(), i);
    }
    assert_eq!(executions.load(Ordering::SeqCst), n);

    pool.shutdown();
}

#[test]
fn shutdown_is_terminal() {
    let pool = pool(2, 4, 50, 500);
    pool.shutdown();

    assert!(!pool.is_running());
    assert_eq!(pool.active_workers(), 0);

    let handle = pool.submit(0, || Ok::<_, String>(1));
    let err = handle.try_result().expect("failure is immediate").unwrap_err();
    assert!(err.is_shutdown());

    // Repeat shutdown is a no-op.
    pool.shutdown();
    assert_eq!(pool.active_workers(), 0);
}

#[test]
fn queued_tasks_are_abandoned_on_shutdown() {
    let pool = pool(1, 1, 50, 500);
    let _release = block_worker(&pool);

    let queued = pool.submit(0, || Ok::<_, String>(7));
    pool.shutdown();

    // The abandoned handle never resolves; waiters see a timeout.
    let err = queued.wait_timeout(Duration::from_millis(100)).unwrap_err();
    assert!(err.is_timeout());
}

#[test]
fn handle_carries_value_and_failure() {
    let pool = pool(1, 2, 50, 500);

    let ok = pool.submit(0, || Ok::<_, String>(21 * 2));
    assert_eq!(ok.wait_timeout(Duration::from_secs(5)).unwrap(), 42);

    let err = pool
        .submit(0, || Err::<i32, _>("bad input".to_string()))
        .wait_timeout(Duration::from_secs(5))
        .unwrap_err();
    assert!(matches!(err, PoolError::Execution(_)));
    assert!(err.to_string().contains("bad input"));

    let panicked = pool
        .submit(0, || -> Result<i32, String> { panic!("kaboom") })
        .wait_timeout(Duration::from_secs(5))
        .unwrap_err();
    assert!(matches!(panicked, PoolError::WorkerPanic(_)));

    // Failures never take the worker down.
    let after = pool.submit(0, || Ok::<_, String>(7));
    assert_eq!(after.wait_timeout(Duration::from_secs(5)).unwrap(), 7);

    pool.shutdown();
}

#[test]
fn continuations_fire_on_completion() {
    let pool = pool(1, 2, 50, 500);
    let (notify, notified) = mpsc::channel();

    let handle = pool.submit(0, || Ok::<_, String>(10));
    handle.on_complete(move |result| {
        notify.send(*result.as_ref().unwrap()).unwrap();
    });

    assert_eq!(notified.recv_timeout(Duration::from_secs(5)).unwrap(), 10);
    pool.shutdown();
}

#[tokio::test]
async fn handles_are_awaitable() {
    let pool = pool(2, 4, 1000, 500);

    let handles: Vec<_> = (0..10)
        .map(|i| pool.submit(0, move || Ok::<_, String>(i + 1)))
        .collect();

    let results: Vec<_> = futures_util::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results, (1..=10).collect::<Vec<_>>());
    pool.shutdown();
}
