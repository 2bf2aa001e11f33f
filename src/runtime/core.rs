use crate::reactor::{Reactor, ReactorHandle};
use crate::runtime::scheduler::Scheduler;
use crate::runtime::task::Task;

use std::future::Future;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

/// The runtime: a scheduler plus a reactor thread.
///
/// The reactor thread starts when the runtime is built. The scheduler
/// workers run inside [`block_on`](Self::block_on), which is the process
/// bootstrap: it submits the given future as a detached top-level task,
/// drives the workers until that task triggers shutdown, joins the reactor
/// thread, and returns the task's value.
pub struct Runtime {
    scheduler: Arc<Scheduler>,
    reactor: ReactorHandle,
    reactor_thread: Option<JoinHandle<()>>,
}

/// Stops the scheduler and the reactor when dropped.
///
/// Guards the top-level task in [`Runtime::block_on`]: shutdown must fire
/// even when the task body panics, otherwise the workers would run forever.
struct ShutdownOnDrop(ShutdownHandle);

impl Drop for ShutdownOnDrop {
    fn drop(&mut self) {
        self.0.shutdown();
    }
}

impl Runtime {
    pub(crate) fn new(worker_threads: usize, max_local_tasks: usize) -> Self {
        let (reactor, reactor_thread) = Reactor::start();
        let scheduler = Arc::new(Scheduler::new(worker_threads, max_local_tasks));

        Self {
            scheduler,
            reactor,
            reactor_thread: Some(reactor_thread),
        }
    }

    /// Registers a task before the workers are running. It executes once
    /// [`block_on`](Self::block_on) starts the scheduler.
    pub fn spawn<T: Send + 'static>(&self, task: Task<T>) -> Task<T> {
        self.scheduler.spawn_task(task)
    }

    /// Registers a detached task; the runtime reclaims it on completion.
    pub fn fire_and_forget<T: Send + 'static>(&self, task: Task<T>) {
        self.scheduler.fire_and_forget(task);
    }

    /// Returns a handle that can trigger graceful shutdown from anywhere:
    /// a task, another thread, or a signal path routed through user code.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            scheduler: self.scheduler.clone(),
            reactor: self.reactor.clone(),
        }
    }

    /// Returns a handle to the runtime's reactor.
    pub fn reactor_handle(&self) -> ReactorHandle {
        self.reactor.clone()
    }

    /// Runs `future` as the top-level task and blocks until it completes.
    ///
    /// The future is submitted fire-and-forget wrapped so that its
    /// completion stops the scheduler and the reactor; the calling thread
    /// then joins the reactor thread and returns the result.
    ///
    /// # Panics
    ///
    /// Panics if the top-level task dies without producing a value (for
    /// example because its body panicked).
    pub fn block_on<F>(mut self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (transmitter, receiver) = mpsc::channel();
        let shutdown = self.shutdown_handle();

        self.scheduler.fire_and_forget(Task::new(async move {
            let guard = ShutdownOnDrop(shutdown);

            let result = future.await;
            let _ = transmitter.send(result);

            drop(guard);
        }));

        // Blocks until the top-level task (or anyone else) calls shutdown.
        self.scheduler.start(self.reactor.clone());

        self.reactor.stop();
        if let Some(thread) = self.reactor_thread.take() {
            let _ = thread.join();
        }

        receiver
            .recv()
            .expect("runtime shut down before the top-level task produced a value")
    }
}

impl Drop for Runtime {
    /// Stops the reactor and joins its thread if [`block_on`](Self::block_on)
    /// never ran.
    fn drop(&mut self) {
        self.scheduler.stop();
        self.reactor.stop();

        if let Some(thread) = self.reactor_thread.take() {
            let _ = thread.join();
        }
    }
}

/// Cloneable handle performing the graceful shutdown sequence: stop the
/// scheduler, then stop the reactor. The reactor thread is joined by
/// [`Runtime::block_on`] once the workers have exited.
#[derive(Clone)]
pub struct ShutdownHandle {
    scheduler: Arc<Scheduler>,
    reactor: ReactorHandle,
}

impl ShutdownHandle {
    /// Requests termination of the workers and the reactor loop.
    /// Idempotent.
    pub fn shutdown(&self) {
        self.scheduler.stop();
        self.reactor.stop();
    }
}
