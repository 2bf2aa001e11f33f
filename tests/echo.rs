use corrente::net::{self, Socket};
use corrente::{RuntimeBuilder, Task, task, yield_now};

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

async fn echo(client: Socket) {
    let mut buffer = [0u8; 1024];

    loop {
        let n = match client.read(&mut buffer).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(_) => break,
        };

        let mut written = 0;
        while written < n {
            match client.write(&buffer[written..n]).await {
                Ok(m) => written += m,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(_) => return,
            }
        }
    }
}

#[test]
fn echo_loop_single_client() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();

    let handler_done = Arc::new(AtomicBool::new(false));
    let (addr_tx, addr_rx) = mpsc::channel::<SocketAddr>();

    let client = thread::spawn(move || {
        let addr = addr_rx.recv().unwrap();
        let mut stream = TcpStream::connect(addr).unwrap();

        stream.write_all(b"hello").unwrap();
        stream.shutdown(Shutdown::Write).unwrap();

        let mut echoed = Vec::new();
        stream.read_to_end(&mut echoed).unwrap();
        echoed
    });

    let done = handler_done.clone();
    rt.block_on(async move {
        let listener = net::listen("127.0.0.1:0").unwrap();
        addr_tx.send(listener.local_addr().unwrap()).unwrap();

        let done_in = done.clone();
        task::fire_and_forget(Task::new(async move {
            loop {
                let Ok((connection, _peer)) = listener.accept().await else {
                    continue;
                };

                let done = done_in.clone();
                task::fire_and_forget(Task::new(async move {
                    echo(connection).await;
                    done.store(true, Ordering::SeqCst);
                }));
            }
        }));

        let start = Instant::now();
        while !done.load(Ordering::SeqCst) {
            assert!(
                start.elapsed() < Duration::from_secs(10),
                "echo handler never completed"
            );
            yield_now().await;
        }
    });

    assert!(handler_done.load(Ordering::SeqCst));
    assert_eq!(client.join().unwrap(), b"hello");
}
