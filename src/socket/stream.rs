use std::io::IoSlice;
use std::io::IoSliceMut;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use crate::addr::Address;
use crate::error::{SocketError, IoError, errno};
use crate::signals::retry_eintr;
use super::options;

/// A connected stream socket.
///
/// Created by Listener::accept() (server), RawSocket::connect() (client)
/// or stream_pair().
#[derive(Debug)]
pub struct ConnectedStream {
	fd: OwnedFd,
}

impl ConnectedStream {
	pub(crate) fn from_fd(fd: OwnedFd) -> Self {
		Self { fd }
	}

	pub fn read(&self, buf: &mut [u8]) -> std::io::Result<usize> {
		let fd = self.as_raw_fd();
		let n = retry_eintr(|| unsafe {
			libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len())
		});

		if n == -1 {
			Err(IoError::Read { errno: errno() }.into())
		} else {
			Ok(n as usize)
		}
	}

	pub fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
		let fd = self.as_raw_fd();
		let n = retry_eintr(|| unsafe {
			libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len())
		});

		if n == -1 {
			Err(IoError::Write { errno: errno() }.into())
		} else {
			Ok(n as usize)
		}
	}

	pub fn readv(&self, bufs: &mut [IoSliceMut<'_>]) -> std::io::Result<usize> {
		let fd = self.as_raw_fd();
		let n = retry_eintr(|| unsafe {
			libc::readv(fd, bufs.as_ptr() as *const libc::iovec, bufs.len() as libc::c_int)
		});

		if n == -1 {
			Err(IoError::Read { errno: errno() }.into())
		} else {
			Ok(n as usize)
		}
	}

	pub fn writev(&self, bufs: &[IoSlice<'_>]) -> std::io::Result<usize> {
		let fd = self.as_raw_fd();
		let n = retry_eintr(|| unsafe {
			libc::writev(fd, bufs.as_ptr() as *const libc::iovec, bufs.len() as libc::c_int)
		});

		if n == -1 {
			Err(IoError::Write { errno: errno() }.into())
		} else {
			Ok(n as usize)
		}
	}

	pub fn set_nonblocking(&self, nonblocking: bool) -> std::io::Result<()> {
		options::set_nonblocking(self, nonblocking)
	}

	/// Returns the remote address of this connection.
	pub fn peer_addr(&self) -> std::io::Result<Address> {
		super::socket_name(self.as_raw_fd(), true)
	}

	/// Returns the local address of this connection.
	pub fn local_addr(&self) -> std::io::Result<Address> {
		super::socket_name(self.as_raw_fd(), false)
	}

	pub fn shutdown(&self, how: Shutdown) -> std::io::Result<()> {
		let how = match how {
			Shutdown::Read => libc::SHUT_RD,
			Shutdown::Write => libc::SHUT_WR,
			Shutdown::ReadWrite => libc::SHUT_RDWR,
		};
		let fd = self.as_raw_fd();

		if unsafe { libc::shutdown(fd, how) } == -1 {
			Err(SocketError::Shutdown { errno: errno(), fd, how }.into())
		} else {
			Ok(())
		}
	}

	/// Credentials of the process on the other end of a UNIX socket.
	#[cfg(any(target_os = "linux", target_os = "android"))]
	pub fn peer_credentials(&self) -> std::io::Result<PeerCredentials> {
		let mut cred: libc::ucred = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::ucred>() as libc::socklen_t;

		let result = unsafe {
			libc::getsockopt(
				self.as_raw_fd(),
				libc::SOL_SOCKET,
				libc::SO_PEERCRED,
				&mut cred as *mut _ as *mut libc::c_void,
				&mut len,
			)
		};
		if result == -1 {
			return Err(SocketError::GetOption { errno: errno(), option: "SO_PEERCRED" }.into());
		}
		if len as usize != std::mem::size_of::<libc::ucred>() {
			return Err(SocketError::Protocol { reason: "bad length from SO_PEERCRED" }.into());
		}

		Ok(PeerCredentials { pid: cred.pid, uid: cred.uid, gid: cred.gid })
	}
}

/// Process identity reported by `SO_PEERCRED`.
#[cfg(any(target_os = "linux", target_os = "android"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerCredentials {
	pub pid: libc::pid_t,
	pub uid: libc::uid_t,
	pub gid: libc::gid_t,
}

impl AsRawFd for ConnectedStream {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl std::os::fd::AsFd for ConnectedStream {
	fn as_fd(&self) -> std::os::fd::BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl std::io::Read for ConnectedStream {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		ConnectedStream::read(self, buf)
	}
}

impl std::io::Write for ConnectedStream {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		ConnectedStream::write(self, buf)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

impl FromRawFd for ConnectedStream {
	unsafe fn from_raw_fd(fd: RawFd) -> Self {
		unsafe { Self::from_fd(OwnedFd::from_raw_fd(fd)) }
	}
}

impl IntoRawFd for ConnectedStream {
	fn into_raw_fd(self) -> RawFd {
		self.fd.into_raw_fd()
	}
}

impl From<ConnectedStream> for OwnedFd {
	fn from(stream: ConnectedStream) -> Self {
		stream.fd
	}
}

/// Which direction [`ConnectedStream::shutdown`] closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
	/// `SHUT_RD`: further reads return end of input.
	Read,
	/// `SHUT_WR`: the peer sees end of input.
	Write,
	/// `SHUT_RDWR`
	ReadWrite,
}
