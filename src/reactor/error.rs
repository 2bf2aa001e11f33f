use crate::reactor::waiter::Direction;

use std::os::fd::RawFd;
use thiserror::Error;

/// Errors produced when arming a one-shot readiness callback.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// A waiter for this descriptor and direction is already armed. At most
    /// one waiter per (fd, direction) is supported; a second registration
    /// is a programming error in the caller.
    #[error("fd {fd} already has a {direction} waiter")]
    WaiterExists { fd: RawFd, direction: Direction },
}
