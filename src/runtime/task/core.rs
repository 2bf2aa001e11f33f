use super::state::TaskState;
use super::waker::resume_waker;
use crate::reactor::waiter::IoWaiter;
use crate::runtime::context::CURRENT_SCHEDULER;
use crate::runtime::task::handle::Task;

use std::cell::UnsafeCell;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

/// Type-erased reference to a task, as seen by the scheduler and the reactor.
pub(crate) type TaskRef = Arc<dyn Resumable>;

/// A resumable unit of work.
///
/// The trait erases the task's result type so the scheduler can manage a
/// heterogeneous collection of tasks through `Arc<dyn Resumable>`. It is
/// deliberately slim: everything the scheduler dispatches on lives in the
/// shared [`Header`], not behind virtual calls.
pub(crate) trait Resumable: Send + Sync {
    /// The scheduler-visible linkage and state fields of the task.
    fn header(&self) -> &Header;

    /// Runs the task body until its next suspension point or completion and
    /// returns the resulting state.
    fn resume(self: Arc<Self>) -> TaskState;
}

/// Scheduler-visible portion of a task.
///
/// The header carries everything the worker loop and the reactor need to
/// route a task: its state, the parent to re-queue on completion, the child
/// or I/O waiter of the current suspension, and the enqueued/detached flags.
pub(crate) struct Header {
    /// Current [`TaskState`], stored as its `u8` discriminant.
    state: AtomicU8,

    /// Task to re-queue when this task completes. Installed by the worker
    /// that dispatches the parent's suspension; consumed exactly once.
    parent: Mutex<Option<TaskRef>>,

    /// Task this task is currently suspended on. Written by the awaiting
    /// future, read by the worker after the resumption that recorded it.
    child: Mutex<Option<TaskRef>>,

    /// I/O subscription of the current suspension when the state is
    /// `BlockedOnIo`.
    io_waiter: Mutex<Option<IoWaiter>>,

    /// Set whenever the task is handed to a scheduler queue or the reactor.
    enqueued: AtomicBool,

    /// Set for fire-and-forget tasks; no parent will ever adopt them and the
    /// runtime drops its last reference on completion.
    detached: AtomicBool,
}

impl Header {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(TaskState::Awaiting as u8),
            parent: Mutex::new(None),
            child: Mutex::new(None),
            io_waiter: Mutex::new(None),
            enqueued: AtomicBool::new(false),
            detached: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn set_parent(&self, parent: TaskRef) {
        *self.parent.lock().unwrap() = Some(parent);
    }

    pub(crate) fn take_parent(&self) -> Option<TaskRef> {
        self.parent.lock().unwrap().take()
    }

    pub(crate) fn set_child(&self, child: TaskRef) {
        *self.child.lock().unwrap() = Some(child);
    }

    pub(crate) fn take_child(&self) -> Option<TaskRef> {
        self.child.lock().unwrap().take()
    }

    pub(crate) fn child(&self) -> Option<TaskRef> {
        self.child.lock().unwrap().clone()
    }

    pub(crate) fn set_io_waiter(&self, waiter: IoWaiter) {
        *self.io_waiter.lock().unwrap() = Some(waiter);
    }

    pub(crate) fn take_io_waiter(&self) -> Option<IoWaiter> {
        self.io_waiter.lock().unwrap().take()
    }

    pub(crate) fn io_waiter(&self) -> Option<IoWaiter> {
        *self.io_waiter.lock().unwrap()
    }

    pub(crate) fn is_enqueued(&self) -> bool {
        self.enqueued.load(Ordering::Acquire)
    }

    pub(crate) fn set_enqueued(&self) {
        self.enqueued.store(true, Ordering::Release);
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    pub(crate) fn set_detached(&self) {
        self.detached.store(true, Ordering::Release);
    }
}

/// Typed core of a task: the suspended body plus the result slot.
///
/// The future and result cells are `UnsafeCell` rather than mutex-guarded:
/// exclusive access is guaranteed by the scheduling protocol, which resumes
/// a task from at most one worker at a time and extracts the result only
/// after observing `Complete` through an acquire load.
pub(crate) struct TaskCore<T> {
    header: Header,

    /// The body. Dropped eagerly on completion so the coroutine frame and
    /// everything it owns die before the result is consumed.
    future: UnsafeCell<Option<Pin<Box<dyn Future<Output = T> + Send>>>>,

    /// Written exactly once, by the resumption that completes the body.
    /// Stays empty when the body panics.
    result: UnsafeCell<Option<T>>,
}

unsafe impl<T: Send> Send for TaskCore<T> {}
unsafe impl<T: Send> Sync for TaskCore<T> {}

impl<T: Send + 'static> TaskCore<T> {
    pub(crate) fn new<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            header: Header::new(),
            future: UnsafeCell::new(Some(Box::pin(future))),
            result: UnsafeCell::new(None),
        }
    }

    /// Takes the completed result out of the slot.
    ///
    /// # Safety
    ///
    /// The caller must have observed `Complete` via [`Header::state`]; the
    /// acquire load pairs with the release store in [`resume`](Self::resume)
    /// and makes the result write visible. Only the single awaiting parent
    /// may call this.
    pub(crate) unsafe fn take_result(&self) -> Option<T> {
        unsafe { (*self.result.get()).take() }
    }
}

impl<T: Send + 'static> Resumable for TaskCore<T> {
    fn header(&self) -> &Header {
        &self.header
    }

    fn resume(self: Arc<Self>) -> TaskState {
        // Safety: the single-resumer protocol guarantees no other thread
        // touches the future cell while this task is being resumed.
        let slot = unsafe { &mut *self.future.get() };

        let Some(future) = slot.as_mut() else {
            // Already completed; nothing left to run.
            return self.header.state();
        };

        let waker = resume_waker();
        let mut cx = Context::from_waker(&waker);

        match catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx))) {
            Ok(Poll::Ready(value)) => {
                // Safety: same exclusivity as the future cell; the write
                // happens before the release store of `Complete` below.
                unsafe { *self.result.get() = Some(value) };
                *slot = None;
                self.header.set_state(TaskState::Complete);
                TaskState::Complete
            }
            Ok(Poll::Pending) => {
                // The suspension point recorded its child or I/O waiter in
                // the header and set the state accordingly.
                self.header.state()
            }
            Err(_panic) => {
                tracing::warn!("task body panicked; completing with an empty result");
                *slot = None;
                self.header.set_state(TaskState::Complete);
                TaskState::Complete
            }
        }
    }
}

/// Submits a task to the scheduler of the current runtime and returns its
/// handle for a later await.
///
/// # Panics
///
/// Panics if called outside a running runtime.
pub fn spawn<T: Send + 'static>(task: Task<T>) -> Task<T> {
    with_current_scheduler(|scheduler| scheduler.spawn_task(task))
}

/// Submits a task the caller will never await. The runtime reclaims it on
/// completion.
///
/// # Panics
///
/// Panics if called outside a running runtime.
pub fn fire_and_forget<T: Send + 'static>(task: Task<T>) {
    with_current_scheduler(|scheduler| scheduler.fire_and_forget(task));
}

fn with_current_scheduler<R>(f: impl FnOnce(&crate::runtime::scheduler::Scheduler) -> R) -> R {
    CURRENT_SCHEDULER.with(|cell| {
        let binding = cell.borrow();
        let scheduler = binding
            .as_ref()
            .expect("spawn must be called within the context of a runtime");
        f(scheduler)
    })
}
