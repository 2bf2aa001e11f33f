/// Lifecycle state of a task.
///
/// Every task starts in [`Awaiting`](TaskState::Awaiting) and ends in
/// [`Complete`](TaskState::Complete). The scheduler dispatches on the state
/// returned by each resumption:
///
/// - `Awaiting`: runnable, or suspended on the child task recorded in the
///   header's `child` slot.
/// - `BlockedOnIo`: suspended on the I/O waiter recorded in the header's
///   `io_waiter` slot; the scheduler hands that waiter to the reactor.
/// - `Complete`: the body has returned and the result slot holds the value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub(crate) enum TaskState {
    Awaiting = 0,
    BlockedOnIo = 1,
    Complete = 2,
}

impl TaskState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => TaskState::Awaiting,
            1 => TaskState::BlockedOnIo,
            2 => TaskState::Complete,
            _ => unreachable!("invalid task state {value}"),
        }
    }
}
