use std::os::fd::{FromRawFd, OwnedFd};
use crate::addr::Family;
use crate::error::{SocketError, errno};
use super::{SockType, Stream, cloexec};
use super::stream::ConnectedStream;

/// Creates a connected pair of close-on-exec sockets.
///
/// Both descriptors are owned as soon as the kernel returns them, so a
/// failure while fixing up either one closes both.
pub fn socketpair<T: SockType>(family: Family) -> std::io::Result<(OwnedFd, OwnedFd)> {
	let mut fds = [-1 as libc::c_int; 2];
	let result = unsafe {
		libc::socketpair(family.raw(), cloexec::socket_type(T::raw()), 0, fds.as_mut_ptr())
	};
	if result == -1 {
		return Err(SocketError::Socketpair { errno: errno() }.into());
	}

	let first = unsafe { OwnedFd::from_raw_fd(fds[0]) };
	let second = unsafe { OwnedFd::from_raw_fd(fds[1]) };
	cloexec::finish(&first)?;
	cloexec::finish(&second)?;

	tracing::debug!(fd0 = fds[0], fd1 = fds[1], family = %family.name(), "socketpair created");
	Ok((first, second))
}

/// A connected pair of stream sockets, usually `Family::Unix`.
pub fn stream_pair(family: Family) -> std::io::Result<(ConnectedStream, ConnectedStream)> {
	let (first, second) = socketpair::<Stream>(family)?;
	Ok((ConnectedStream::from_fd(first), ConnectedStream::from_fd(second)))
}
