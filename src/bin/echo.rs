//! Example: TCP echo server.
//!
//! Accepts connections on 127.0.0.1:9000 and echoes every received chunk
//! back to the client until it half-closes.

use corrente::net::{self, Socket};
use corrente::{RuntimeBuilder, Task, task};

fn main() {
    let runtime = RuntimeBuilder::new().build();

    runtime.block_on(async {
        let listener = net::listen("127.0.0.1:9000").expect("failed to bind listener");
        println!("Echo server listening on 127.0.0.1:9000");

        loop {
            match listener.accept().await {
                Ok((client, addr)) => {
                    println!("Accepted connection from {addr}");
                    task::fire_and_forget(Task::new(handle_client(client)));
                }
                Err(err) => {
                    eprintln!("accept failed: {err}");
                }
            }
        }
    });
}

// Echo handler: reads chunks and writes them back until EOF or error.
async fn handle_client(client: Socket) {
    let mut buffer = [0u8; 1024];

    loop {
        let n = match client.read(&mut buffer).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        let mut written = 0;
        while written < n {
            match client.write(&buffer[written..n]).await {
                Ok(m) => written += m,
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(_) => return,
            }
        }
    }
}
