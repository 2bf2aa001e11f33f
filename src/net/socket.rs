use crate::reactor::poller::platform::{
    sys_accept, sys_bind, sys_close, sys_listen, sys_parse_sockaddr, sys_read, sys_set_nonblocking,
    sys_set_reuseaddr, sys_socket, sys_sockname, sys_write,
};
use crate::reactor::waiter::{WaitForRead, WaitForWrite};
use crate::runtime::context;

use std::io;
use std::net::SocketAddr;
use std::os::fd::RawFd;

/// A non-blocking socket integrated with the reactor.
///
/// Construction puts the descriptor into non-blocking mode and registers it
/// with the reactor for level-triggered readiness; dropping the socket
/// unregisters and closes it.
///
/// The I/O methods follow one pattern: await readiness for the appropriate
/// direction, then perform the underlying syscall exactly once and return
/// its result. Short reads and writes are reported as-is; the runtime does
/// not loop on behalf of the caller.
///
/// A `Socket` must be created and used inside a running runtime.
pub struct Socket {
    fd: RawFd,
}

impl Socket {
    /// Takes ownership of `fd`, marks it non-blocking, and registers it
    /// with the reactor.
    pub fn new(fd: RawFd) -> io::Result<Self> {
        if let Err(err) = sys_set_nonblocking(fd) {
            sys_close(fd);
            return Err(err);
        }

        if let Err(err) = context::current_reactor().register_fd(fd) {
            sys_close(fd);
            return Err(err);
        }

        Ok(Self { fd })
    }

    /// Returns the underlying file descriptor.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Returns the local address of the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        sys_sockname(self.fd)
    }

    /// Reads into `buffer` once the socket is readable.
    ///
    /// Returns the raw byte count from the syscall; `Ok(0)` means the peer
    /// closed its write half.
    pub async fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
        WaitForRead::new(self.fd).await;

        match sys_read(self.fd, buffer) {
            n if n >= 0 => Ok(n as usize),
            _ => Err(io::Error::last_os_error()),
        }
    }

    /// Writes from `buffer` once the socket is writable.
    ///
    /// Returns the raw byte count from the syscall, which may be short.
    pub async fn write(&self, buffer: &[u8]) -> io::Result<usize> {
        WaitForWrite::new(self.fd).await;

        match sys_write(self.fd, buffer) {
            n if n >= 0 => Ok(n as usize),
            _ => Err(io::Error::last_os_error()),
        }
    }

    /// Accepts one incoming connection once the listening socket is
    /// readable. The accepted socket is registered with the reactor.
    pub async fn accept(&self) -> io::Result<(Socket, SocketAddr)> {
        WaitForRead::new(self.fd).await;

        let (fd, addr) = sys_accept(self.fd)?;
        let socket = Socket::new(fd)?;

        Ok((socket, addr))
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        // The drop may run outside the runtime (e.g. when queued tasks are
        // discarded at shutdown); unregistration is then moot.
        if let Some(reactor) = context::try_current_reactor() {
            reactor.unregister_fd(self.fd);
        }
        sys_close(self.fd);
    }
}

/// Creates a listening socket bound to `address` (e.g. `"127.0.0.1:9000"`),
/// registered with the reactor and ready for [`Socket::accept`].
pub fn listen(address: &str) -> io::Result<Socket> {
    let (storage, len) = sys_parse_sockaddr(address)?;
    let domain = storage.ss_family as i32;

    let fd = sys_socket(domain)?;

    if let Err(err) = sys_set_reuseaddr(fd)
        .and_then(|_| sys_bind(fd, &storage, len))
        .and_then(|_| sys_listen(fd))
    {
        sys_close(fd);
        return Err(err);
    }

    Socket::new(fd)
}
