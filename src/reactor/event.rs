use std::os::fd::RawFd;

/// An I/O readiness event reported by the poller.
///
/// Produced by the poller and consumed by the reactor loop, which fires the
/// pending one-shot callbacks for the descriptor.
pub(crate) struct Event {
    /// The ready file descriptor.
    pub(crate) fd: RawFd,

    /// The descriptor is readable (or in an error/hang-up condition, which
    /// readers must observe to see EOF).
    pub(crate) readable: bool,

    /// The descriptor is writable.
    pub(crate) writable: bool,
}
