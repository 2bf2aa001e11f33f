use corrente::{RuntimeBuilder, Task, task, yield_now};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[test]
fn awaited_task_result_is_delivered() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();

    let result = rt.block_on(async {
        let b = task::spawn(Task::new(async {
            let a = task::spawn(Task::new(async { 7 }));
            a.await + 1
        }));

        b.await
    });

    assert_eq!(result, 8);
}

#[test]
fn awaiting_unspawned_task_schedules_it() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();

    let result = rt.block_on(async {
        let child = Task::new(async { 41 });
        child.await + 1
    });

    assert_eq!(result, 42);
}

#[test]
fn statements_order_around_await() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();
    let log = Arc::new(Mutex::new(Vec::new()));

    let log_in = log.clone();
    rt.block_on(async move {
        log_in.lock().unwrap().push("before");

        let log_child = log_in.clone();
        // Unspawned: the child runs only once awaited, so the order is
        // deterministic.
        Task::new(async move {
            log_child.lock().unwrap().push("child");
        })
        .await;

        log_in.lock().unwrap().push("after");
    });

    assert_eq!(*log.lock().unwrap(), vec!["before", "child", "after"]);
}

#[test]
fn already_complete_child_yields_result_immediately() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();

    let result = rt.block_on(async {
        let finished = Arc::new(AtomicBool::new(false));

        let flag = finished.clone();
        let child = task::spawn(Task::new(async move {
            flag.store(true, Ordering::SeqCst);
            9
        }));

        // Let the child complete before the await links any parent.
        let start = Instant::now();
        while !finished.load(Ordering::SeqCst) {
            assert!(start.elapsed() < Duration::from_secs(5), "child never ran");
            yield_now().await;
        }

        child.await
    });

    assert_eq!(result, 9);
}
