//! I/O poller and raw syscall layer.
//!
//! The poller wraps the kernel readiness facility used by the reactor;
//! [`unix`] collects the thin syscall wrappers shared by the poller, the
//! I/O futures, and the socket façade.

mod epoll;

pub(crate) mod unix;

pub(crate) use epoll::{EpollPoller, PollWaker, Registrar};

pub(crate) use unix as platform;
