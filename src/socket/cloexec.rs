//! Close-on-exec hygiene for every descriptor the factory hands out.
//!
//! Where the platform takes `SOCK_CLOEXEC` (and has `accept4`) the flag is set
//! atomically with creation, so a concurrent fork+exec can never inherit the
//! descriptor. Elsewhere the flag is merged in right after creation. Either
//! way the end state is asserted.

use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use crate::error::{SocketError, errno};

#[cfg(any(
	target_os = "linux",
	target_os = "android",
	target_os = "freebsd",
	target_os = "netbsd",
	target_os = "openbsd",
	target_os = "dragonfly"
))]
const SOCK_CLOEXEC: libc::c_int = libc::SOCK_CLOEXEC;

#[cfg(not(any(
	target_os = "linux",
	target_os = "android",
	target_os = "freebsd",
	target_os = "netbsd",
	target_os = "openbsd",
	target_os = "dragonfly"
)))]
const SOCK_CLOEXEC: libc::c_int = 0;

/// True when creation calls set close-on-exec themselves.
pub(crate) const ATOMIC_CLOEXEC: bool = SOCK_CLOEXEC != 0;

/// Adds the atomic close-on-exec flag to a socket type, if there is one.
#[inline]
pub(crate) fn socket_type(ty: libc::c_int) -> libc::c_int {
	ty | SOCK_CLOEXEC
}

/// Sets `FD_CLOEXEC`, keeping the other descriptor flags.
pub fn merge_cloexec(fd: RawFd) -> std::io::Result<()> {
	let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFD" }.into());
	}
	if flags & libc::FD_CLOEXEC != 0 {
		return Ok(());
	}
	if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } == -1 {
		return Err(SocketError::SetOption { errno: errno(), option: "FD_CLOEXEC" }.into());
	}
	Ok(())
}

/// Reports whether `fd` is marked close-on-exec.
pub fn is_cloexec(fd: RawFd) -> std::io::Result<bool> {
	let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFD" }.into());
	}
	Ok(flags & libc::FD_CLOEXEC != 0)
}

/// Completes close-on-exec setup for a freshly created descriptor.
///
/// The descriptor is already owned, so an error here closes it on the way out.
pub(crate) fn finish(fd: &OwnedFd) -> std::io::Result<()> {
	if !ATOMIC_CLOEXEC {
		merge_cloexec(fd.as_raw_fd())?;
		tracing::debug!(fd = fd.as_raw_fd(), "close-on-exec merged after creation");
	}
	assert_cloexec(fd.as_raw_fd());
	Ok(())
}

/// Panics unless `fd` is close-on-exec.
pub(crate) fn assert_cloexec(fd: RawFd) {
	assert!(
		matches!(is_cloexec(fd), Ok(true)),
		"descriptor {} is not close-on-exec",
		fd
	);
}

/// `accept` that sets close-on-exec atomically where `accept4` exists.
///
/// # Safety
/// `addr`/`len` must be null or describe writable storage.
#[cfg(any(
	target_os = "linux",
	target_os = "android",
	target_os = "freebsd",
	target_os = "netbsd",
	target_os = "openbsd",
	target_os = "dragonfly"
))]
pub(crate) unsafe fn accept(
	listener: RawFd,
	addr: *mut libc::sockaddr,
	len: *mut libc::socklen_t,
) -> libc::c_int {
	unsafe { libc::accept4(listener, addr, len, libc::SOCK_CLOEXEC) }
}

/// # Safety
/// `addr`/`len` must be null or describe writable storage.
#[cfg(not(any(
	target_os = "linux",
	target_os = "android",
	target_os = "freebsd",
	target_os = "netbsd",
	target_os = "openbsd",
	target_os = "dragonfly"
)))]
pub(crate) unsafe fn accept(
	listener: RawFd,
	addr: *mut libc::sockaddr,
	len: *mut libc::socklen_t,
) -> libc::c_int {
	unsafe { libc::accept(listener, addr, len) }
}
