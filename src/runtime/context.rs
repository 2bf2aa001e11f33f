use crate::reactor::ReactorHandle;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::task::core::TaskRef;

use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// Thread-local handle to the scheduler of the current runtime.
    ///
    /// Installed on worker threads for the lifetime of the worker loop so
    /// that [`spawn`](crate::task::spawn) and friends work without passing
    /// handles through every API.
    pub(crate) static CURRENT_SCHEDULER: RefCell<Option<Arc<Scheduler>>> =
        const { RefCell::new(None) };

    /// Thread-local handle to the reactor of the current runtime.
    ///
    /// Used by I/O futures and socket construction to reach the reactor.
    pub(crate) static CURRENT_REACTOR: RefCell<Option<ReactorHandle>> =
        const { RefCell::new(None) };

    /// The task currently being resumed on this worker thread.
    ///
    /// Suspension points (awaiting a task, awaiting I/O readiness) record
    /// their child or waiter into this task's header.
    pub(crate) static CURRENT_TASK: RefCell<Option<TaskRef>> =
        const { RefCell::new(None) };

    /// Identifier of the current worker thread, when on one.
    ///
    /// Consulted by the queue placement policy: pushes from a worker may
    /// land on that worker's local queue, everything else goes global.
    pub(crate) static CURRENT_WORKER_ID: RefCell<Option<usize>> =
        const { RefCell::new(None) };
}

/// Installs the runtime execution context for the duration of `f`.
///
/// The previous context is restored afterwards, so nested runtimes on the
/// same thread (as in tests) do not clobber each other.
pub(crate) fn enter_context<R>(
    scheduler: Arc<Scheduler>,
    reactor: ReactorHandle,
    f: impl FnOnce() -> R,
) -> R {
    CURRENT_SCHEDULER.with(|s| {
        CURRENT_REACTOR.with(|r| {
            let prev_s = s.replace(Some(scheduler));
            let prev_r = r.replace(Some(reactor));

            let out = f();

            r.replace(prev_r);
            s.replace(prev_s);

            out
        })
    })
}

/// Marks `task` as the task being resumed while `f` runs.
pub(crate) fn enter_task<R>(task: TaskRef, f: impl FnOnce() -> R) -> R {
    CURRENT_TASK.with(|cell| {
        let prev = cell.replace(Some(task));
        let out = f();
        cell.replace(prev);
        out
    })
}

/// Returns the worker id of the current thread, if it is a worker.
pub(crate) fn current_worker_id() -> Option<usize> {
    CURRENT_WORKER_ID.with(|cell| *cell.borrow())
}

/// Returns the reactor handle of the current runtime.
///
/// # Panics
///
/// Panics when called outside a running runtime.
pub(crate) fn current_reactor() -> ReactorHandle {
    CURRENT_REACTOR.with(|cell| {
        cell.borrow()
            .as_ref()
            .expect("no reactor in context; not inside a runtime")
            .clone()
    })
}

/// Non-panicking variant of [`current_reactor`], for drop paths that may
/// run after the runtime context is gone.
pub(crate) fn try_current_reactor() -> Option<ReactorHandle> {
    CURRENT_REACTOR.with(|cell| cell.borrow().clone())
}
