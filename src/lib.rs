//! # Corrente
//!
//! **Corrente** is a cooperative task runtime for readiness-based network
//! I/O on Linux. Application logic is written as suspendable tasks wrapping
//! `async` blocks; a fixed pool of worker threads multiplexes the tasks
//! while a dedicated reactor thread watches file descriptors through a
//! level-triggered epoll loop and re-queues waiters as they become ready.
//!
//! The runtime offers:
//!
//! - a **multi-worker scheduler** with a global queue, per-worker local
//!   queues, and explicit parent/child resumption on task completion
//! - an **I/O reactor** delivering one-shot readiness callbacks per file
//!   descriptor and direction
//! - **suspendable socket I/O** (`read`, `write`, `accept`) that performs
//!   each syscall exactly once after readiness
//! - a small bootstrap: [`RuntimeBuilder`], [`Runtime::block_on`], and a
//!   cloneable [`ShutdownHandle`] for graceful termination
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use corrente::{RuntimeBuilder, Task, task};
//!
//! fn main() {
//!     let runtime = RuntimeBuilder::new().worker_threads(4).build();
//!
//!     let result = runtime.block_on(async {
//!         let seven = task::spawn(Task::new(async { 7 }));
//!         seven.await + 1
//!     });
//!
//!     assert_eq!(result, 8);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`net`] — the socket façade (listen, accept, read, write)
//! - [`task`] — task construction, `spawn`, and `fire_and_forget`

mod reactor;
mod runtime;

pub mod net;

pub use reactor::{Direction, ReactorHandle, RegisterError, WaitForRead, WaitForWrite};
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task::{self, Task};
pub use runtime::yield_now::yield_now;
pub use runtime::{Runtime, ShutdownHandle};
