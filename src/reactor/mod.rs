//! The I/O reactor.
//!
//! A single dedicated thread observes level-triggered readiness on
//! registered file descriptors and fires one-shot callbacks that re-queue
//! blocked tasks with the scheduler. Workers arm callbacks directly through
//! the [`ReactorHandle`]; the registration tables sit behind one mutex.

mod core;
mod event;

pub(crate) mod error;
pub(crate) mod poller;
pub(crate) mod waiter;

pub(crate) use self::core::Reactor;

pub use self::core::ReactorHandle;
pub use error::RegisterError;
pub use waiter::{Direction, WaitForRead, WaitForWrite};
