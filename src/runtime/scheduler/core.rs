use crate::reactor::ReactorHandle;
use crate::runtime::context;
use crate::runtime::queue::{GlobalQueue, TaskQueue};
use crate::runtime::scheduler::worker::Worker;
use crate::runtime::task::Task;
use crate::runtime::task::core::{Resumable, TaskRef};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Multi-worker task scheduler.
///
/// The scheduler owns the global queue and one local queue per worker and
/// drives tasks through their state transitions:
///
/// - a ready task is resumed by exactly one worker,
/// - a task awaiting a child is linked as that child's parent and re-queued
///   when the child completes,
/// - a task blocked on I/O is handed to the reactor, which re-queues it on
///   readiness,
/// - a completed task wakes its parent, or is reclaimed when detached.
///
/// [`start`](Self::start) blocks the calling thread until
/// [`stop`](Self::stop); this is the application's run loop.
pub struct Scheduler {
    /// Global queue; the sole cross-worker balancing mechanism.
    pub(crate) global: GlobalQueue,

    /// Per-worker local queues.
    pub(crate) locals: Vec<Arc<TaskQueue>>,

    /// Cap on local queue residency before pushes overflow to the global
    /// queue.
    max_local_tasks: usize,

    /// Cleared by [`stop`](Self::stop); workers exit at their next
    /// empty-queue check.
    running: AtomicBool,
}

impl Scheduler {
    pub(crate) fn new(num_workers: usize, max_local_tasks: usize) -> Self {
        let locals = (0..num_workers).map(|_| Arc::new(TaskQueue::new())).collect();

        Self {
            global: GlobalQueue::new(),
            locals,
            max_local_tasks,
            running: AtomicBool::new(false),
        }
    }

    pub(crate) fn num_workers(&self) -> usize {
        self.locals.len()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Registers `task` with the scheduler and returns the handle for a
    /// later await.
    ///
    /// The caller must either eventually await the returned handle (to
    /// consume the result) or use [`fire_and_forget`](Self::fire_and_forget)
    /// instead.
    pub(crate) fn spawn_task<T: Send + 'static>(&self, task: Task<T>) -> Task<T> {
        let reference = task.task_ref();
        reference.header().set_enqueued();
        self.global.push(reference);
        task
    }

    /// Registers `task` as detached: no caller will await it, so the
    /// runtime drops its last reference on completion.
    pub(crate) fn fire_and_forget<T: Send + 'static>(&self, task: Task<T>) {
        task.task_ref().header().set_detached();
        self.spawn_task(task);
    }

    /// Spins up the workers and blocks until [`stop`](Self::stop) has been
    /// called and every worker has exited.
    pub(crate) fn start(self: &Arc<Self>, reactor: ReactorHandle) {
        self.running.store(true, Ordering::Release);

        let mut handles = Vec::with_capacity(self.num_workers());

        for id in 0..self.num_workers() {
            let worker = Worker::new(id, self.locals[id].clone());
            let scheduler = self.clone();
            let reactor = reactor.clone();

            let handle = thread::Builder::new()
                .name(format!("corrente-worker-{id}"))
                .spawn(move || {
                    context::enter_context(scheduler.clone(), reactor.clone(), || {
                        worker.run(scheduler, reactor);
                    });
                })
                .expect("failed to spawn worker thread");

            handles.push(handle);
        }

        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Requests termination. Idempotent; wakes parked workers so they
    /// observe the flag promptly. Tasks still queued are dropped with the
    /// queues.
    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.global.unpark_all();
    }

    /// Queues a task for resumption.
    ///
    /// Pushes from a worker land on that worker's local queue while it is
    /// below `max_local_tasks`; everything else (overflow, reactor
    /// callbacks, external threads) goes to the global queue.
    pub(crate) fn schedule(&self, task: TaskRef) {
        task.header().set_enqueued();

        match context::current_worker_id() {
            Some(id) if self.locals[id].len() < self.max_local_tasks => {
                self.locals[id].push(task);
            }
            _ => self.global.push(task),
        }
    }
}
