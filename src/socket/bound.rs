use std::os::fd::OwnedFd;
use std::marker::PhantomData;
use crate::addr::Address;
use super::SockType;

/// A socket that has been bound to an address but not yet listening.
///
/// For Stream sockets: call `.listen()` to become a Listener.
pub struct BoundSocket<T: SockType> {
	fd: OwnedFd,
	_marker: PhantomData<T>,
}

impl<T: SockType> BoundSocket<T> {
	/// Internal use only - called by RawSocket::bind()
	pub(crate) fn from_fd(fd: OwnedFd) -> Self {
		Self {
			fd,
			_marker: PhantomData,
		}
	}

	/// The address actually bound, with any wildcard port resolved.
	pub fn local_addr(&self) -> std::io::Result<Address> {
		use std::os::fd::AsRawFd;
		super::socket_name(self.fd.as_raw_fd(), false)
	}

	/// Extracts the owned file descriptor, consuming self.
	pub(crate) fn into_fd(self) -> OwnedFd {
		self.fd
	}
}

impl<T: SockType> std::os::fd::AsRawFd for BoundSocket<T> {
	fn as_raw_fd(&self) -> std::os::fd::RawFd {
		self.fd.as_raw_fd()
	}
}

impl<T: SockType> std::os::fd::AsFd for BoundSocket<T> {
	fn as_fd(&self) -> std::os::fd::BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl<T: SockType> std::os::fd::IntoRawFd for BoundSocket<T> {
	fn into_raw_fd(self) -> std::os::fd::RawFd {
		self.fd.into_raw_fd()
	}
}
