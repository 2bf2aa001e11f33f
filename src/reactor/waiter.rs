use crate::reactor::poller::platform::sys_poll_ready;
use crate::runtime::context::CURRENT_TASK;
use crate::runtime::task::core::Resumable;
use crate::runtime::task::state::TaskState;

use std::fmt;
use std::future::Future;
use std::os::fd::RawFd;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Direction of an I/O readiness subscription.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("read"),
            Direction::Write => f.write_str("write"),
        }
    }
}

/// A pending I/O subscription: one file descriptor, one direction.
///
/// Ephemeral: recorded in the task header when a task suspends on I/O and
/// consumed when the scheduler arms the corresponding one-shot reactor
/// callback.
#[derive(Clone, Copy, Debug)]
pub(crate) struct IoWaiter {
    pub(crate) fd: RawFd,
    pub(crate) direction: Direction,
}

/// Suspends the current task until `fd` is readable.
///
/// Performs a non-blocking readiness pre-check first; if data is already
/// available the task does not suspend and no reactor round-trip happens.
pub struct WaitForRead {
    fd: RawFd,
}

impl WaitForRead {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl Future for WaitForRead {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        poll_direction(self.fd, Direction::Read)
    }
}

/// Suspends the current task until `fd` is writable.
///
/// Performs a non-blocking readiness pre-check first; if buffer space is
/// already available the task does not suspend.
pub struct WaitForWrite {
    fd: RawFd,
}

impl WaitForWrite {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl Future for WaitForWrite {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        poll_direction(self.fd, Direction::Write)
    }
}

fn poll_direction(fd: RawFd, direction: Direction) -> Poll<()> {
    match sys_poll_ready(fd, direction) {
        Ok(true) => return Poll::Ready(()),
        Ok(false) => {}
        Err(err) => {
            tracing::warn!(fd, %direction, error = %err, "readiness pre-check failed");
        }
    }

    // Not ready: record the subscription in the current task's header. The
    // worker observing `BlockedOnIo` hands the waiter to the reactor.
    CURRENT_TASK.with(|cell| {
        let binding = cell.borrow();
        let current = binding
            .as_ref()
            .expect("I/O readiness must be awaited from within the runtime");

        current.header().set_state(TaskState::BlockedOnIo);
        current.header().set_io_waiter(IoWaiter { fd, direction });
    });

    Poll::Pending
}
