use crate::runtime::task::core::TaskRef;

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// A concurrent FIFO queue of task references.
///
/// Used as the per-worker local queue. Pushes and pops may come from any
/// thread (the reactor re-queues I/O waiters onto the scheduler), so the
/// deque sits behind a mutex.
pub(crate) struct TaskQueue {
    inner: Mutex<VecDeque<TaskRef>>,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, task: TaskRef) {
        self.inner.lock().unwrap().push_back(task);
    }

    pub(crate) fn try_pop(&self) -> Option<TaskRef> {
        self.inner.lock().unwrap().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

/// The global queue shared by all workers.
///
/// Besides FIFO push/pop it coordinates worker parking: a worker that finds
/// both its local queue and this queue empty blocks on the condition
/// variable with a bounded timeout instead of spinning. Pushes and shutdown
/// wake the sleepers.
pub(crate) struct GlobalQueue {
    inner: Mutex<VecDeque<TaskRef>>,
    condvar: Condvar,
}

impl GlobalQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
        }
    }

    pub(crate) fn push(&self, task: TaskRef) {
        self.inner.lock().unwrap().push_back(task);
        self.condvar.notify_all();
    }

    pub(crate) fn try_pop(&self) -> Option<TaskRef> {
        self.inner.lock().unwrap().pop_front()
    }

    /// Blocks the calling worker until a push, a wake-up, or the timeout.
    ///
    /// Returns immediately when the queue is non-empty.
    pub(crate) fn park(&self, timeout: Duration) {
        let guard = self.inner.lock().unwrap();

        if !guard.is_empty() {
            return;
        }

        let _ = self.condvar.wait_timeout(guard, timeout).unwrap();
    }

    /// Wakes every parked worker. Used on shutdown.
    pub(crate) fn unpark_all(&self) {
        self.condvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::task::Task;
    use std::sync::Arc;
    use std::thread;

    fn dummy_task() -> TaskRef {
        Task::new(async {}).task_ref()
    }

    #[test]
    fn fifo_order() {
        let queue = TaskQueue::new();
        let first = dummy_task();
        let second = dummy_task();

        queue.push(first.clone());
        queue.push(second.clone());

        assert!(Arc::ptr_eq(&queue.try_pop().unwrap(), &first));
        assert!(Arc::ptr_eq(&queue.try_pop().unwrap(), &second));
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn concurrent_push_loses_nothing() {
        let queue = Arc::new(GlobalQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        queue.push(dummy_task());
                    }
                })
            })
            .collect();

        for p in producers {
            p.join().unwrap();
        }

        let mut popped = 0;
        while queue.try_pop().is_some() {
            popped += 1;
        }
        assert_eq!(popped, 400);
    }

    #[test]
    fn park_returns_on_timeout() {
        let queue = GlobalQueue::new();
        queue.park(Duration::from_millis(1));
    }

    #[test]
    fn park_skipped_when_nonempty() {
        let queue = GlobalQueue::new();
        queue.push(dummy_task());
        // Must not block: the queue has work.
        queue.park(Duration::from_secs(60));
        assert!(queue.try_pop().is_some());
    }
}
