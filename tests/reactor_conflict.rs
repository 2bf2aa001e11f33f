use corrente::{RuntimeBuilder, Task, WaitForRead, task, yield_now};

use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[test]
fn second_waiter_is_rejected_and_first_still_completes() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();
    let reactor = rt.reactor_handle();

    let (reader, mut writer) = UnixStream::pair().unwrap();
    reader.set_nonblocking(true).unwrap();
    let fd = reader.as_raw_fd();

    // Registration is idempotent: the second call is a no-op.
    reactor.register_fd(fd).unwrap();
    reactor.register_fd(fd).unwrap();

    let resumed = Arc::new(AtomicUsize::new(0));

    let reactor_in = reactor.clone();
    let resumed_in = resumed.clone();
    rt.block_on(async move {
        for _ in 0..2 {
            let resumed = resumed_in.clone();
            task::fire_and_forget(Task::new(async move {
                WaitForRead::new(fd).await;
                resumed.fetch_add(1, Ordering::SeqCst);
            }));
        }

        // Both tasks suspend on the same (fd, read) pair; exactly one
        // registration must be rejected.
        let start = Instant::now();
        while reactor_in.registration_conflicts() == 0 {
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "no registration conflict observed"
            );
            yield_now().await;
        }

        writer.write_all(b"x").unwrap();

        while resumed_in.load(Ordering::SeqCst) == 0 {
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "armed waiter never resumed"
            );
            yield_now().await;
        }
    });

    // Only the armed waiter observed readiness.
    assert_eq!(resumed.load(Ordering::SeqCst), 1);
    assert_eq!(reactor.registration_conflicts(), 1);
}
