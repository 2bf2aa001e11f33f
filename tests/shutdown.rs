use corrente::{RuntimeBuilder, Task};

use std::time::{Duration, Instant};

#[test]
fn block_on_returns_after_top_level_completes() {
    let rt = RuntimeBuilder::new().worker_threads(4).build();

    let start = Instant::now();
    let result = rt.block_on(async { 42 });

    assert_eq!(result, 42);
    // Workers and the reactor thread have been joined by now; the whole
    // sequence must finish promptly.
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn shutdown_does_not_wait_for_detached_stragglers() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();

    // A detached task that yields forever; shutdown must not wait for it.
    rt.fire_and_forget(Task::new(async {
        loop {
            corrente::yield_now().await;
        }
    }));

    let start = Instant::now();
    let result = rt.block_on(async { 7 });

    assert_eq!(result, 7);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
#[should_panic(expected = "runtime shut down before the top-level task produced a value")]
fn early_shutdown_aborts_block_on() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();
    let shutdown = rt.shutdown_handle();

    rt.block_on(async move {
        shutdown.shutdown();
        loop {
            corrente::yield_now().await;
        }
    });
}

#[test]
fn dropping_unused_runtime_joins_reactor() {
    let rt = RuntimeBuilder::new().worker_threads(1).build();
    drop(rt);
}
