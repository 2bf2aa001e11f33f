use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that yields execution back to the scheduler exactly once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    /// On the first poll the future returns `Pending` without recording a
    /// child or an I/O waiter; the worker treats that as a cooperative
    /// yield and re-queues the task. The second poll completes.
    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.0 {
            self.0 = true;
            return Poll::Pending;
        }

        Poll::Ready(())
    }
}

/// Yields execution back to the scheduler, letting other tasks run before
/// the current task continues.
pub async fn yield_now() {
    YieldOnce(false).await
}
