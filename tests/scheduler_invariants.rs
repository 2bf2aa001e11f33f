use corrente::{RuntimeBuilder, Task, task};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

/// Future that trips an assertion if two workers ever poll it concurrently.
///
/// Each `Pending` return is a cooperative yield, so the task is re-queued
/// and resumed many times, giving overlapping resumptions a chance to
/// manifest if the scheduler ever double-enqueued the task.
struct ResumeGuard {
    busy: Arc<AtomicBool>,
    polls: Arc<AtomicUsize>,
    yields_left: u32,
}

impl Future for ResumeGuard {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        assert!(
            !this.busy.swap(true, Ordering::SeqCst),
            "task resumed by two workers at once"
        );

        // Linger briefly to widen the overlap window.
        std::thread::sleep(Duration::from_micros(50));

        this.polls.fetch_add(1, Ordering::SeqCst);
        this.busy.store(false, Ordering::SeqCst);

        if this.yields_left == 0 {
            Poll::Ready(())
        } else {
            this.yields_left -= 1;
            Poll::Pending
        }
    }
}

#[test]
fn no_concurrent_resumes_of_one_task() {
    let rt = RuntimeBuilder::new().worker_threads(4).build();
    let polls = Arc::new(AtomicUsize::new(0));

    const TASKS: u32 = 16;
    const YIELDS: u32 = 32;

    let polls_in = polls.clone();
    rt.block_on(async move {
        let handles: Vec<_> = (0..TASKS)
            .map(|_| {
                let guard = ResumeGuard {
                    busy: Arc::new(AtomicBool::new(false)),
                    polls: polls_in.clone(),
                    yields_left: YIELDS,
                };
                task::spawn(Task::new(async move { guard.await }))
            })
            .collect();

        for handle in handles {
            handle.await;
        }
    });

    // Every yield plus the completing poll happened, each serialized.
    assert_eq!(polls.load(Ordering::SeqCst), (TASKS * (YIELDS + 1)) as usize);
}
