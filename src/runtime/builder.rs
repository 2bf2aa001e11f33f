use super::core::Runtime;

use std::thread;

/// Default cap on per-worker local queue residency.
const DEFAULT_MAX_LOCAL_TASKS: usize = 256;

/// Builder for configuring and creating a [`Runtime`].
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .worker_threads(4)
///     .build();
/// ```
pub struct RuntimeBuilder {
    /// Number of scheduler worker threads.
    worker_threads: usize,

    /// Local queue cap before pushes overflow to the global queue.
    max_local_tasks: usize,
}

impl RuntimeBuilder {
    /// Creates a builder with default configuration: one worker per logical
    /// CPU (falling back to 1) and a local queue cap of 256.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            max_local_tasks: DEFAULT_MAX_LOCAL_TASKS,
        }
    }

    /// Sets the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets the per-worker local queue cap.
    pub fn max_local_tasks(mut self, n: usize) -> Self {
        self.max_local_tasks = n;
        self
    }

    /// Builds the runtime. This starts the reactor thread; the scheduler
    /// workers start when the runtime is driven.
    pub fn build(self) -> Runtime {
        Runtime::new(self.worker_threads, self.max_local_tasks)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
