use std::task::{RawWaker, RawWakerVTable, Waker};

/// Vtable for the inert waker handed to task bodies.
///
/// Scheduling decisions in this runtime flow through the task header
/// (state, child slot, I/O waiter slot) inspected by the worker after each
/// resumption, never through `Waker` notifications. A future that returns
/// `Pending` without recording a suspension is simply re-queued by the
/// worker, so waking is a no-op.
static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, noop, noop, noop);

fn clone_raw(data: *const ()) -> RawWaker {
    RawWaker::new(data, &VTABLE)
}

fn noop(_data: *const ()) {}

/// Creates the waker passed to every `poll` call issued by a worker.
pub(crate) fn resume_waker() -> Waker {
    unsafe { Waker::from_raw(RawWaker::new(std::ptr::null(), &VTABLE)) }
}
