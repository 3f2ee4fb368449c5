use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::marker::PhantomData;
use crate::addr::{Address, Family, ToSockAddr};
use crate::error::{SocketError, errno};
use crate::signals::retry_eintr;
use super::{SockType, Stream, cloexec, options};
use super::bound::BoundSocket;
use super::stream::ConnectedStream;

/// A socket that has been created but not yet bound or connected.
///
/// This is the starting point for all socket operations.
/// Use `.bind()` to become a listener or datagram socket.
/// Use `.connect()` to become a connected stream.
pub struct RawSocket<T: SockType> {
	fd: OwnedFd,
	family: Family,
	_marker: PhantomData<T>,
}

impl<T: SockType> RawSocket<T> {
	/// Creates a new close-on-exec socket with the default protocol.
	pub fn new(family: Family) -> std::io::Result<Self> {
		Self::with_protocol(family, 0)
	}

	/// Creates a new close-on-exec socket.
	pub fn with_protocol(family: Family, protocol: libc::c_int) -> std::io::Result<Self> {
		let fd = unsafe {
			libc::socket(family.raw(), cloexec::socket_type(T::raw()), protocol)
		};
		if fd == -1 {
			return Err(SocketError::Create { errno: errno() }.into());
		}
		// Owned before anything else can fail, so every error path closes it.
		let fd = unsafe { OwnedFd::from_raw_fd(fd) };
		cloexec::finish(&fd)?;

		tracing::debug!(fd = fd.as_raw_fd(), family = %family.name(), "socket created");
		Ok(Self {
			fd,
			family,
			_marker: PhantomData,
		})
	}

	pub fn family(&self) -> Family {
		self.family
	}

	/// Sets the socket to non-blocking mode.
	pub fn set_nonblocking(&self, nonblocking: bool) -> std::io::Result<()> {
		options::set_nonblocking(self, nonblocking)
	}

	/// Binds the socket to an address.
	///
	/// Consumes self, returns BoundSocket.
	pub fn bind(self, addr: &Address) -> std::io::Result<BoundSocket<T>> {
		let result = addr.with_raw(|ptr, len| unsafe {
			libc::bind(self.as_raw_fd(), ptr, len)
		});
		if result == -1 {
			return Err(SocketError::Bind {
				errno: errno(),
				addr: addr.describe(),
			}.into());
		}
		Ok(BoundSocket::from_fd(self.into_fd()))
	}

	pub(crate) fn into_fd(self) -> OwnedFd {
		self.fd
	}
}

impl RawSocket<Stream> {
	/// Connects to a remote address.
	///
	/// Blocks with the I/O signals unblocked; EINTR restarts the call.
	pub fn connect(self, addr: &Address) -> std::io::Result<ConnectedStream> {
		let fd = self.as_raw_fd();
		let result = retry_eintr(|| {
			addr.with_raw(|ptr, len| unsafe { libc::connect(fd, ptr, len) })
		});
		if result == -1 {
			return Err(SocketError::Connect {
				errno: errno(),
				addr: addr.describe(),
			}.into());
		}
		tracing::debug!(fd, addr = %addr, "connected");
		Ok(ConnectedStream::from_fd(self.into_fd()))
	}
}

impl<T: SockType> AsRawFd for RawSocket<T> {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl<T: SockType> std::os::fd::AsFd for RawSocket<T> {
	fn as_fd(&self) -> std::os::fd::BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl<T: SockType> IntoRawFd for RawSocket<T> {
	fn into_raw_fd(self) -> RawFd {
		self.fd.into_raw_fd()
	}
}
