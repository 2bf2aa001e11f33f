use crate::reactor::ReactorHandle;
use crate::reactor::waiter::Direction;
use crate::runtime::context::{self, CURRENT_WORKER_ID};
use crate::runtime::queue::TaskQueue;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::task::core::{Resumable, TaskRef};
use crate::runtime::task::state::TaskState;

use std::sync::Arc;
use std::time::Duration;

/// How long an idle worker sleeps on the global queue before re-checking
/// the running flag.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// A worker thread of the scheduler.
///
/// Each worker owns one local queue and repeatedly:
/// 1. pops a task from its local queue, falling back to the global queue,
/// 2. resumes it,
/// 3. dispatches on the state the resumption produced.
pub(crate) struct Worker {
    id: usize,
    local: Arc<TaskQueue>,
}

impl Worker {
    pub(crate) fn new(id: usize, local: Arc<TaskQueue>) -> Self {
        Self { id, local }
    }

    /// Runs the worker loop until the scheduler stops.
    pub(crate) fn run(&self, scheduler: Arc<Scheduler>, reactor: ReactorHandle) {
        CURRENT_WORKER_ID.with(|id| *id.borrow_mut() = Some(self.id));

        while scheduler.is_running() {
            let task = self
                .local
                .try_pop()
                .or_else(|| scheduler.global.try_pop());

            let Some(task) = task else {
                scheduler.global.park(PARK_TIMEOUT);
                continue;
            };

            self.step(task, &scheduler, &reactor);
        }
    }

    /// Resumes one task and routes it according to its new state.
    fn step(&self, task: TaskRef, scheduler: &Arc<Scheduler>, reactor: &ReactorHandle) {
        let mut state = task.header().state();

        // The child and I/O waiter of the task's previous suspension are
        // consumed by this resumption. They must stay alive until after
        // `resume` has installed the next suspension's slots, so they are
        // held here and dropped at the end of the step.
        let mut _prior_child = None;
        let mut _prior_waiter = None;

        if state != TaskState::Complete {
            _prior_child = task.header().take_child();
            _prior_waiter = task.header().take_io_waiter();

            state = context::enter_task(task.clone(), || task.clone().resume());
        }

        match state {
            TaskState::Awaiting => match task.header().child() {
                Some(child) => {
                    child.header().set_parent(task.clone());

                    if child.header().state() == TaskState::Complete {
                        // The child finished before (or while) we linked the
                        // parent. Whoever takes the parent slot re-queues it;
                        // the take is the linearization point, so the parent
                        // is pushed exactly once.
                        if let Some(parent) = child.header().take_parent() {
                            scheduler.schedule(parent);
                        }
                    } else if !child.header().is_enqueued() {
                        scheduler.schedule(child);
                    }
                }
                // Pending without a recorded suspension: a cooperative
                // yield. Re-queue so other tasks get a turn.
                None => scheduler.schedule(task.clone()),
            },

            TaskState::BlockedOnIo => match task.header().io_waiter() {
                Some(waiter) => {
                    let resumed = task.clone();
                    let sched = scheduler.clone();
                    let callback = Box::new(move || {
                        resumed.header().set_state(TaskState::Awaiting);
                        sched.schedule(resumed);
                    });

                    let armed = match waiter.direction {
                        Direction::Read => reactor.register_read_callback(waiter.fd, callback),
                        Direction::Write => reactor.register_write_callback(waiter.fd, callback),
                    };

                    if let Err(err) = armed {
                        // A second waiter per (fd, direction) is a
                        // programming error; the task is abandoned.
                        tracing::warn!(error = %err, "dropping task blocked on a contested descriptor");
                    }
                }
                None => {
                    tracing::warn!("task blocked on I/O without a waiter; re-queueing");
                    task.header().set_state(TaskState::Awaiting);
                    scheduler.schedule(task.clone());
                }
            },

            TaskState::Complete => {
                if let Some(parent) = task.header().take_parent() {
                    // The parent observes the result on its next resumption.
                    scheduler.schedule(parent);
                } else if !task.header().is_detached() {
                    // No parent yet: the task stays parked until one awaits
                    // its handle (see the Awaiting dispatch above). Detached
                    // tasks are freed when this step's reference drops.
                    tracing::trace!("task completed without a parent; parked for adoption");
                }
            }
        }
    }
}
