//! Socket and descriptor flags the factory relies on.

use std::os::fd::AsRawFd;
use crate::error::{SocketError, errno};

/// Sets any plain-data socket option. `option` names it in the error.
///
/// `T` must be the exact type the kernel expects for `level`/`name`.
pub fn set_option<S: AsRawFd, T: Copy>(
	socket: &S,
	level: libc::c_int,
	name: libc::c_int,
	value: &T,
	option: &'static str,
) -> std::io::Result<()> {
	let rc = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			level,
			name,
			value as *const T as *const libc::c_void,
			std::mem::size_of::<T>() as libc::socklen_t,
		)
	};
	if rc == -1 {
		return Err(SocketError::SetOption { errno: errno(), option }.into());
	}
	Ok(())
}

fn get_flag<S: AsRawFd>(
	socket: &S,
	level: libc::c_int,
	name: libc::c_int,
	option: &'static str,
) -> std::io::Result<bool> {
	let mut value: libc::c_int = 0;
	let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
	let rc = unsafe {
		libc::getsockopt(
			socket.as_raw_fd(),
			level,
			name,
			&mut value as *mut libc::c_int as *mut libc::c_void,
			&mut len,
		)
	};
	if rc == -1 {
		return Err(SocketError::GetOption { errno: errno(), option }.into());
	}
	Ok(value != 0)
}

/// SO_REUSEADDR, so a restarted listener can rebind through TIME_WAIT.
pub fn set_reuse_addr<S: AsRawFd>(socket: &S, enable: bool) -> std::io::Result<()> {
	set_option(socket, libc::SOL_SOCKET, libc::SO_REUSEADDR, &(enable as libc::c_int), "SO_REUSEADDR")
}

pub fn set_tcp_nodelay<S: AsRawFd>(socket: &S, enable: bool) -> std::io::Result<()> {
	set_option(socket, libc::IPPROTO_TCP, libc::TCP_NODELAY, &(enable as libc::c_int), "TCP_NODELAY")
}

pub fn get_tcp_nodelay<S: AsRawFd>(socket: &S) -> std::io::Result<bool> {
	get_flag(socket, libc::IPPROTO_TCP, libc::TCP_NODELAY, "TCP_NODELAY")
}

/// Turns off Nagle's algorithm so small writes leave immediately.
pub fn disable_tcp_nagle<S: AsRawFd>(socket: &S) -> std::io::Result<()> {
	set_tcp_nodelay(socket, true)
}

fn status_flags<S: AsRawFd>(socket: &S) -> std::io::Result<libc::c_int> {
	let flags = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_GETFL) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFL" }.into());
	}
	Ok(flags)
}

/// Sets or clears `O_NONBLOCK`, keeping the other status flags.
pub fn set_nonblocking<S: AsRawFd>(socket: &S, nonblocking: bool) -> std::io::Result<()> {
	let flags = status_flags(socket)?;
	let wanted = if nonblocking {
		flags | libc::O_NONBLOCK
	} else {
		flags & !libc::O_NONBLOCK
	};
	if wanted != flags && unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_SETFL, wanted) } == -1 {
		return Err(SocketError::SetOption { errno: errno(), option: "O_NONBLOCK" }.into());
	}
	Ok(())
}

pub fn is_nonblocking<S: AsRawFd>(socket: &S) -> std::io::Result<bool> {
	Ok(status_flags(socket)? & libc::O_NONBLOCK != 0)
}
