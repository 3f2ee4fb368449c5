use crate::addr::Address;
use crate::error::{SocketError, errno};
use crate::signals::retry_eintr;
use super::{Stream, bound::BoundSocket, cloexec, options};
use super::stream::ConnectedStream;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

/// A listening socket ready to accept connections.
///
/// Only exists for Stream sockets; datagrams cannot listen.
#[derive(Debug)]
pub struct Listener {
    fd: OwnedFd,
}

impl Listener {
    /// Called by BoundSocket::listen()
    pub(crate) fn from_fd(fd: OwnedFd) -> Self {
        Self { fd }
    }

    /// Accepts an incoming connection **using blocking semantics**.
    ///
    /// The I/O signals are unblocked while waiting and EINTR restarts the
    /// call. The new socket is close-on-exec.
    pub fn accept(&self) -> std::io::Result<ConnectedStream> {
        match self.accept_raw(None)? {
            Some(stream) => Ok(stream),
            None => Err(SocketError::Accept { errno: libc::EAGAIN }.into()),
        }
    }

    /// Accepts a connection, returning the client's address.
    pub fn accept_with_addr(&self) -> std::io::Result<(ConnectedStream, Address)> {
        let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
        let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

        let stream = self
            .accept_raw(Some((&mut storage, &mut len)))?
            .ok_or(SocketError::Accept { errno: libc::EAGAIN })?;

        let len = len.min(std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t);
        let addr = unsafe { Address::from_native(&storage as *const _ as *const libc::sockaddr, len) }?;
        Ok((stream, addr))
    }

    /// Attempts to accept a connection **without blocking**.
    ///
    /// The listener must already be non-blocking. No pending connection is
    /// reported as `AcceptResult::WouldBlock`, not as an error.
    ///
    /// The accepted socket is always in blocking mode. Linux never lets
    /// `O_NONBLOCK` be inherited from the listener; other systems may, so
    /// there it is cleared explicitly.
    pub fn accept_nonblocking(&self) -> std::io::Result<AcceptResult> {
        let Some(stream) = self.accept_raw(None)? else {
            return Ok(AcceptResult::WouldBlock);
        };

        #[cfg(not(target_os = "linux"))]
        options::set_nonblocking(&stream, false)?;

        Ok(AcceptResult::Connection(stream))
    }

    /// Shared accept path. `Ok(None)` means EAGAIN/EWOULDBLOCK.
    fn accept_raw(
        &self,
        peer: Option<(&mut libc::sockaddr_storage, &mut libc::socklen_t)>,
    ) -> std::io::Result<Option<ConnectedStream>> {
        let (addr, len) = match peer {
            Some((storage, len)) => (storage as *mut _ as *mut libc::sockaddr, len as *mut _),
            None => (std::ptr::null_mut(), std::ptr::null_mut()),
        };
        let listener = self.fd.as_raw_fd();
        let fd = retry_eintr(|| unsafe { cloexec::accept(listener, addr, len) });

        if fd == -1 {
            let err = errno();
            if err == libc::EAGAIN || err == libc::EWOULDBLOCK {
                return Ok(None);
            }
            return Err(SocketError::Accept { errno: err }.into());
        }

        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        cloexec::finish(&fd)?;
        tracing::debug!(listener, fd = fd.as_raw_fd(), "accepted connection");
        Ok(Some(ConnectedStream::from_fd(fd)))
    }

    /// Sets or clears the `O_NONBLOCK` flag on the listener socket.
    pub fn set_nonblocking(&self, nonblocking: bool) -> std::io::Result<()> {
        options::set_nonblocking(self, nonblocking)
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<Address> {
        super::socket_name(self.fd.as_raw_fd(), false)
    }
}

impl std::os::fd::AsRawFd for Listener {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        self.fd.as_raw_fd()
    }
}

impl std::os::fd::AsFd for Listener {
    fn as_fd(&self) -> std::os::fd::BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl std::os::fd::IntoRawFd for Listener {
    fn into_raw_fd(self) -> std::os::fd::RawFd {
        self.fd.into_raw_fd()
    }
}

impl BoundSocket<Stream> {
    /// Transitions to a listening socket.
    ///
    /// `backlog`: maximum pending connections queue size.
    pub fn listen(self, backlog: i32) -> std::io::Result<Listener> {
        let result = unsafe { libc::listen(self.as_raw_fd(), backlog) };

        if result == -1 {
            return Err(SocketError::Listen { errno: errno(), backlog }.into());
        }

        Ok(Listener::from_fd(self.into_fd()))
    }
}

/// Result of a non-blocking accept attempt.
///
/// This is the outcome of a syscall probe, not a socket state; the listener
/// is unchanged either way.
#[derive(Debug)]
pub enum AcceptResult {
    /// A connection was accepted.
    Connection(ConnectedStream),

    /// No connection is ready at this time.
    WouldBlock,
}
