//! Linux `epoll`-based poller.
//!
//! Responsibilities:
//! - Arm file descriptors for level-triggered read/write readiness
//! - Block waiting for readiness, up to a bounded timeout
//! - Wake the reactor loop promptly on shutdown
//!
//! Registration happens from worker threads through [`Registrar`] while the
//! reactor thread blocks in [`EpollPoller::poll`]; `epoll_ctl` and
//! `epoll_wait` on the same instance are safe to use concurrently.

use crate::reactor::event::Event;

use libc::{
    EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLLERR, EPOLLHUP, EPOLLIN, EPOLLOUT,
    epoll_create1, epoll_ctl, epoll_event, epoll_wait,
};
use std::io;
use std::os::fd::RawFd;
use std::sync::Arc;
use std::time::Duration;

/// Reserved token for the internal wake-up eventfd.
///
/// File descriptors are used as their own tokens; `u64::MAX` can never
/// collide with one.
const WAKE_TOKEN: u64 = u64::MAX;

/// Wakes a blocked `epoll_wait` by writing to the poller's eventfd.
///
/// Owns the eventfd: reactor handles keep the waker alive past the poller,
/// so the descriptor must not be closed while any of them could still wake.
pub(crate) struct PollWaker(RawFd);

unsafe impl Send for PollWaker {}
unsafe impl Sync for PollWaker {}

impl PollWaker {
    pub(crate) fn wake(&self) {
        let buf: u64 = 1;
        unsafe {
            libc::write(self.0, &buf as *const _ as *const _, 8);
        }
    }
}

impl Drop for PollWaker {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.0);
        }
    }
}

/// Shareable registration side of the poller.
///
/// Held by the reactor handle so worker threads can arm and disarm
/// descriptors without going through the reactor thread.
#[derive(Clone, Copy)]
pub(crate) struct Registrar {
    epoll: RawFd,
}

impl Registrar {
    /// Arms `fd` for level-triggered readable and writable notifications.
    pub(crate) fn add(&self, fd: RawFd) -> io::Result<()> {
        let mut event = epoll_event {
            events: (EPOLLIN | EPOLLOUT) as u32,
            u64: fd as u64,
        };

        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_ADD, fd, &mut event) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    /// Removes `fd` from the poller. Errors are ignored; the descriptor may
    /// already be closed.
    pub(crate) fn delete(&self, fd: RawFd) {
        unsafe {
            epoll_ctl(self.epoll, EPOLL_CTL_DEL, fd, std::ptr::null_mut());
        }
    }
}

/// The epoll instance driven by the reactor thread.
///
/// Owns:
/// - the epoll file descriptor (close-on-exec),
/// - a non-blocking eventfd registered as a persistent wake source,
/// - a reusable buffer of raw epoll events.
pub(crate) struct EpollPoller {
    epoll: RawFd,
    events: Vec<epoll_event>,
    waker: Arc<PollWaker>,
}

unsafe impl Send for EpollPoller {}

impl EpollPoller {
    pub(crate) fn new(capacity: usize) -> Self {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        assert!(epoll >= 0, "epoll_create1 failed");

        let eventfd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        assert!(eventfd >= 0, "eventfd failed");

        let mut event = epoll_event {
            events: EPOLLIN as u32,
            u64: WAKE_TOKEN,
        };

        let rc = unsafe { epoll_ctl(epoll, EPOLL_CTL_ADD, eventfd, &mut event) };
        assert!(rc == 0, "failed to register wake eventfd");

        Self {
            epoll,
            events: Vec::with_capacity(capacity),
            waker: Arc::new(PollWaker(eventfd)),
        }
    }

    pub(crate) fn waker(&self) -> Arc<PollWaker> {
        self.waker.clone()
    }

    pub(crate) fn registrar(&self) -> Registrar {
        Registrar { epoll: self.epoll }
    }

    /// Polls for readiness events, blocking up to `timeout`.
    ///
    /// A return with an empty `events` vector means the timeout expired (or
    /// only the wake event fired); the caller loops to re-check its running
    /// flag.
    pub(crate) fn poll(&mut self, events: &mut Vec<Event>, timeout: Duration) -> io::Result<()> {
        let timeout_ms = timeout.as_millis() as i32;

        unsafe {
            self.events.set_len(self.events.capacity());
        }

        let n = unsafe {
            epoll_wait(
                self.epoll,
                self.events.as_mut_ptr(),
                self.events.capacity() as i32,
                timeout_ms,
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                unsafe { self.events.set_len(0) };
                events.clear();
                return Ok(());
            }
            return Err(err);
        }

        unsafe {
            self.events.set_len(n as usize);
        }

        events.clear();

        for ev in &self.events {
            if ev.u64 == WAKE_TOKEN {
                let mut buf = 0u64;
                unsafe {
                    libc::read(self.waker.0, &mut buf as *mut _ as *mut _, 8);
                }
                continue;
            }

            let fd = ev.u64 as RawFd;

            // Error and hang-up conditions are surfaced as readability so a
            // blocked reader wakes up and observes EOF from the syscall.
            let readable = ev.events & ((EPOLLIN | EPOLLERR | EPOLLHUP) as u32) != 0;
            let writable = ev.events & (EPOLLOUT as u32) != 0;

            events.push(Event {
                fd,
                readable,
                writable,
            });
        }

        Ok(())
    }
}

impl Drop for EpollPoller {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.epoll);
        }
    }
}
