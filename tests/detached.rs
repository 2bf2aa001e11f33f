use corrente::{RuntimeBuilder, Task, task, yield_now};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counts how many times its owner is dropped.
struct DropProbe(Arc<AtomicUsize>);

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn detached_task_is_reclaimed_exactly_once() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();
    let drops = Arc::new(AtomicUsize::new(0));

    let probe = DropProbe(drops.clone());
    let drops_in = drops.clone();

    rt.block_on(async move {
        task::fire_and_forget(Task::new(async move {
            let _probe = probe;
        }));

        let start = Instant::now();
        while drops_in.load(Ordering::SeqCst) == 0 {
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "detached task never reclaimed"
            );
            yield_now().await;
        }
    });

    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_detached_task_does_not_kill_workers() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();

    let result = rt.block_on(async {
        task::fire_and_forget(Task::new(async {
            panic!("boom");
        }));

        // The panic is swallowed; the runtime keeps scheduling.
        task::spawn(Task::new(async { 3 })).await
    });

    assert_eq!(result, 3);
}

#[test]
fn awaited_task_state_is_reclaimed_exactly_once() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();
    let drops = Arc::new(AtomicUsize::new(0));

    let probe = DropProbe(drops.clone());

    let value = rt.block_on(async move {
        let child = task::spawn(Task::new(async move {
            let _probe = probe;
            5
        }));

        child.await
    });

    assert_eq!(value, 5);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}
