use crate::runtime::context::CURRENT_TASK;
use crate::runtime::task::core::{Resumable, TaskCore, TaskRef};
use crate::runtime::task::state::TaskState;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A suspendable computation producing a value of type `T`.
///
/// A `Task` is created suspended: the body does not run until the scheduler
/// resumes it, either because it was [`spawn`](crate::task::spawn)ed or
/// because another task awaited it.
///
/// `Task` implements [`Future`], so awaiting one from inside the runtime
/// suspends the current task until the child completes and then yields the
/// child's result:
///
/// ```rust,ignore
/// let child = spawn(Task::new(async { 7 }));
/// let value = child.await + 1;
/// ```
///
/// # Panics
///
/// Awaiting a task whose body panicked, or whose result was already
/// consumed, panics in the awaiting task.
pub struct Task<T> {
    pub(crate) core: Arc<TaskCore<T>>,
}

impl<T: Send + 'static> Task<T> {
    /// Wraps a future as a runtime task. The future is not polled until a
    /// worker resumes the task.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            core: Arc::new(TaskCore::new(future)),
        }
    }

    pub(crate) fn task_ref(&self) -> TaskRef {
        self.core.clone()
    }
}

impl<T: Send + 'static> Future for Task<T> {
    type Output = T;

    /// Either takes the child's result or records this await in the current
    /// task's header.
    ///
    /// When the child is not yet complete, the current task's `child` slot
    /// is set and `Pending` is returned; the worker that observes the
    /// resulting `Awaiting` state links the parent and schedules the child
    /// if nothing else holds it. A child that completes concurrently is
    /// caught by the worker's post-link state re-check, so no wake-up is
    /// lost.
    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.core.header().state() == TaskState::Complete {
            // Safety: `Complete` was observed with an acquire load, so the
            // completing write to the result slot is visible, and this
            // handle is the single consumer.
            let value = unsafe { this.core.take_result() };
            return Poll::Ready(value.expect(
                "awaited task completed without a result (panicked body or result already consumed)",
            ));
        }

        CURRENT_TASK.with(|cell| {
            let binding = cell.borrow();
            let current = binding
                .as_ref()
                .expect("a Task must be awaited from within the runtime");
            current.header().set_child(this.task_ref());
        });

        Poll::Pending
    }
}
