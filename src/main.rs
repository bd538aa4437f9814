//! Demo driver: submit a batch of prioritized tasks and print results.

use std::time::Duration;

use tracing::info;

use surgepool::{PoolConfig, ThreadPool};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    surgepool::logging::init();

    let config = PoolConfig::from_env()?;
    info!(
        version = surgepool::PKG_VERSION,
        min_threads = config.min_threads,
        max_threads = config.max_threads,
        queue_capacity = config.max_queue_size,
        "starting surgepool demo"
    );

    let pool = ThreadPool::new(config);

    for i in 0..20i64 {
        let handle = pool.submit((i % 5) as i32, move || {
            info!(
                task = i,
                thread = std::thread::current().name().unwrap_or("?"),
                "running task"
            );
            Ok::<_, String>(i * 10)
        });

        handle.on_complete(move |result| match result {
            Ok(value) => info!(task = i, value = *value, "task completed"),
            Err(e) => info!(task = i, error = %e, "task failed"),
        });
    }

    // Let the batch drain, then stop.
    std::thread::sleep(Duration::from_secs(2));

    let stats = pool.stats();
    info!(
        submitted = stats.submitted,
        completed = stats.completed,
        rejected = stats.rejected,
        throttled = stats.throttled,
        "demo finished"
    );

    pool.shutdown();
    Ok(())
}
