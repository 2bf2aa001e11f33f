use crate::reactor::error::RegisterError;
use crate::reactor::event::Event;
use crate::reactor::poller::{EpollPoller, PollWaker, Registrar};
use crate::reactor::waiter::Direction;

use std::collections::{HashMap, HashSet};
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Upper bound on events drained per poll.
const MAX_EVENTS: usize = 64;

/// Poll timeout; bounds how long shutdown and liveness checks can lag.
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// A one-shot resumption callback armed for a (fd, direction) pair.
///
/// Callbacks only push a task back onto a scheduler queue; they run on the
/// reactor thread and must never block.
pub(crate) type Callback = Box<dyn FnOnce() + Send>;

/// Registration tables shared between the reactor thread and the workers.
///
/// One mutex over all three tables suffices: traffic is one lock per task
/// suspension and per readiness event.
struct Registrations {
    /// Descriptors currently armed with the poller.
    registered: HashSet<RawFd>,

    /// Pending one-shot read callbacks, keyed by descriptor.
    read_callbacks: HashMap<RawFd, Callback>,

    /// Pending one-shot write callbacks, keyed by descriptor.
    write_callbacks: HashMap<RawFd, Callback>,
}

impl Registrations {
    fn callbacks(&mut self, direction: Direction) -> &mut HashMap<RawFd, Callback> {
        match direction {
            Direction::Read => &mut self.read_callbacks,
            Direction::Write => &mut self.write_callbacks,
        }
    }
}

struct Shared {
    tables: Mutex<Registrations>,

    /// Count of rejected duplicate waiter registrations; observable so
    /// callers can assert on the documented one-waiter-per-direction limit.
    conflicts: AtomicU64,

    running: AtomicBool,
}

/// The I/O reactor.
///
/// Runs a level-triggered readiness loop on its own thread: descriptors are
/// armed for both directions at registration, and each poll round fires and
/// removes the pending one-shot callbacks of every ready descriptor.
pub(crate) struct Reactor {
    poller: EpollPoller,
    shared: Arc<Shared>,
}

impl Reactor {
    /// Starts the reactor thread and returns a handle to it plus the join
    /// handle for shutdown.
    pub(crate) fn start() -> (ReactorHandle, JoinHandle<()>) {
        let poller = EpollPoller::new(MAX_EVENTS);
        let registrar = poller.registrar();
        let waker = poller.waker();

        let shared = Arc::new(Shared {
            tables: Mutex::new(Registrations {
                registered: HashSet::new(),
                read_callbacks: HashMap::new(),
                write_callbacks: HashMap::new(),
            }),
            conflicts: AtomicU64::new(0),
            running: AtomicBool::new(true),
        });

        let handle = ReactorHandle {
            shared: shared.clone(),
            registrar,
            waker,
        };

        let thread = thread::Builder::new()
            .name("corrente-reactor".into())
            .spawn(move || {
                Reactor { poller, shared }.run();
            })
            .expect("failed to spawn reactor thread");

        (handle, thread)
    }

    /// The event loop. Returns when stopped, or on a kernel poll failure
    /// (crash-equivalent: subsequent I/O suspensions would stall).
    fn run(&mut self) {
        let mut events: Vec<Event> = Vec::with_capacity(MAX_EVENTS);

        while self.shared.running.load(Ordering::Acquire) {
            if let Err(err) = self.poller.poll(&mut events, POLL_TIMEOUT) {
                tracing::error!(error = %err, "kernel poll failed; reactor loop terminating");
                return;
            }

            // Timeout with no events: loop for liveness of the running flag.
            for event in events.drain(..) {
                let (read_cb, write_cb) = {
                    let mut tables = self.shared.tables.lock().unwrap();

                    let read_cb = if event.readable {
                        tables.read_callbacks.remove(&event.fd)
                    } else {
                        None
                    };
                    let write_cb = if event.writable {
                        tables.write_callbacks.remove(&event.fd)
                    } else {
                        None
                    };

                    (read_cb, write_cb)
                };

                // Fired outside the lock: callbacks take scheduler locks.
                if let Some(callback) = read_cb {
                    callback();
                }
                if let Some(callback) = write_cb {
                    callback();
                }
            }
        }
    }
}

/// Handle used by workers and the I/O façade to talk to the reactor.
#[derive(Clone)]
pub struct ReactorHandle {
    shared: Arc<Shared>,
    registrar: Registrar,
    waker: Arc<PollWaker>,
}

impl ReactorHandle {
    /// Arms `fd` with the poller for level-triggered readable and writable
    /// notifications. Idempotent: registering an already-registered
    /// descriptor is a no-op.
    ///
    /// On failure the descriptor is not recorded as registered and the
    /// error is returned to the caller.
    pub fn register_fd(&self, fd: RawFd) -> std::io::Result<()> {
        let mut tables = self.shared.tables.lock().unwrap();

        if tables.registered.contains(&fd) {
            tracing::debug!(fd, "descriptor already registered");
            return Ok(());
        }

        if let Err(err) = self.registrar.add(fd) {
            tracing::error!(fd, error = %err, "failed to arm descriptor with the poller");
            return Err(err);
        }

        tables.registered.insert(fd);
        Ok(())
    }

    /// Removes `fd` from the poller and drops any pending callbacks for it.
    pub fn unregister_fd(&self, fd: RawFd) {
        let mut tables = self.shared.tables.lock().unwrap();

        if !tables.registered.remove(&fd) {
            tracing::debug!(fd, "descriptor was not registered");
            return;
        }

        self.registrar.delete(fd);
        tables.read_callbacks.remove(&fd);
        tables.write_callbacks.remove(&fd);
    }

    /// Arms a one-shot callback fired when `fd` becomes readable.
    ///
    /// At most one waiter per (fd, direction) may be armed; a second
    /// registration is rejected and counted.
    pub(crate) fn register_read_callback(
        &self,
        fd: RawFd,
        callback: Callback,
    ) -> Result<(), RegisterError> {
        self.register_callback(fd, Direction::Read, callback)
    }

    /// Arms a one-shot callback fired when `fd` becomes writable.
    pub(crate) fn register_write_callback(
        &self,
        fd: RawFd,
        callback: Callback,
    ) -> Result<(), RegisterError> {
        self.register_callback(fd, Direction::Write, callback)
    }

    fn register_callback(
        &self,
        fd: RawFd,
        direction: Direction,
        callback: Callback,
    ) -> Result<(), RegisterError> {
        use std::collections::hash_map::Entry;

        let mut tables = self.shared.tables.lock().unwrap();

        match tables.callbacks(direction).entry(fd) {
            Entry::Occupied(_) => {
                self.shared.conflicts.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(fd, %direction, "descriptor already has a waiter");
                Err(RegisterError::WaiterExists { fd, direction })
            }
            Entry::Vacant(slot) => {
                slot.insert(callback);
                Ok(())
            }
        }
    }

    /// Number of rejected duplicate waiter registrations so far.
    pub fn registration_conflicts(&self) -> u64 {
        self.shared.conflicts.load(Ordering::Relaxed)
    }

    /// Requests termination of the event loop and wakes it so the request
    /// is observed promptly. Idempotent.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        self.waker.wake();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> (ReactorHandle, JoinHandle<()>) {
        Reactor::start()
    }

    fn pipe_fds() -> (RawFd, RawFd) {
        let mut fds = [0 as RawFd; 2];
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(rc, 0);
        (fds[0], fds[1])
    }

    #[test]
    fn register_fd_is_idempotent() {
        let (handle, thread) = started();
        let (r, w) = pipe_fds();

        handle.register_fd(r).unwrap();
        handle.register_fd(r).unwrap();

        handle.unregister_fd(r);
        handle.stop();
        thread.join().unwrap();
        unsafe {
            libc::close(r);
            libc::close(w);
        }
    }

    #[test]
    fn second_waiter_per_direction_is_rejected() {
        let (handle, thread) = started();
        let (r, w) = pipe_fds();

        handle.register_fd(r).unwrap();
        handle.register_read_callback(r, Box::new(|| {})).unwrap();

        let err = handle.register_read_callback(r, Box::new(|| {}));
        assert!(matches!(
            err,
            Err(RegisterError::WaiterExists {
                direction: Direction::Read,
                ..
            })
        ));
        assert_eq!(handle.registration_conflicts(), 1);

        // The write direction is independent.
        handle.register_write_callback(r, Box::new(|| {})).unwrap();

        handle.unregister_fd(r);
        handle.stop();
        thread.join().unwrap();
        unsafe {
            libc::close(r);
            libc::close(w);
        }
    }

    #[test]
    fn unregister_drops_pending_callbacks() {
        let (handle, thread) = started();
        let (r, w) = pipe_fds();

        handle.register_fd(r).unwrap();
        handle.register_read_callback(r, Box::new(|| {})).unwrap();
        handle.unregister_fd(r);

        // The slot is free again after unregistration.
        handle.register_fd(r).unwrap();
        handle.register_read_callback(r, Box::new(|| {})).unwrap();

        handle.unregister_fd(r);
        handle.stop();
        thread.join().unwrap();
        unsafe {
            libc::close(r);
            libc::close(w);
        }
    }
}
