//! Socket factory.
//!
//! Sockets move through typestates, each owning its descriptor:
//! `RawSocket` → `BoundSocket` → `Listener` → `ConnectedStream`, or
//! `RawSocket` → `ConnectedStream` via connect. Because every state holds an
//! `OwnedFd`, an error at any step closes the descriptor on the way out.

mod listener;
mod raw;
mod stream;
mod options;
mod bound;
mod builder;
mod cloexec;
mod pair;

pub use self::listener::{Listener, AcceptResult};
pub use self::raw::RawSocket;
pub use self::stream::{ConnectedStream, Shutdown};
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use self::stream::PeerCredentials;
pub use self::bound::BoundSocket;
pub use self::pair::{socketpair, stream_pair};
pub use self::cloexec::{is_cloexec, merge_cloexec};
pub use self::options::{set_option, set_reuse_addr, set_tcp_nodelay, get_tcp_nodelay,
						disable_tcp_nagle, set_nonblocking, is_nonblocking};
pub use self::builder::{ListenerBuilder, ConnectorBuilder};

/// Trait for socket type markers.
///
/// - `Stream`: reliable, ordered byte stream (TCP-like)
/// - `Datagram`: unreliable, unordered packets (UDP-like)
pub trait SockType {
	/// Returns the libc constant for this socket type.
	fn raw() -> libc::c_int;
}

/// Stream socket marker.
#[derive(Debug)]
pub struct Stream;

/// Datagram socket marker.
#[derive(Debug)]
pub struct Datagram;

impl SockType for Stream {
	#[inline]
	fn raw() -> libc::c_int {
		libc::SOCK_STREAM
	}
}

impl SockType for Datagram {
	#[inline]
	fn raw() -> libc::c_int {
		libc::SOCK_DGRAM
	}
}

/// Reads the local or peer name of a socket.
pub(crate) fn socket_name(fd: libc::c_int, peer: bool) -> std::io::Result<crate::Address> {
	use crate::error::{SocketError, errno};

	let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
	let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
	let ptr = &mut storage as *mut _ as *mut libc::sockaddr;

	let result = unsafe {
		if peer {
			libc::getpeername(fd, ptr, &mut len)
		} else {
			libc::getsockname(fd, ptr, &mut len)
		}
	};
	if result == -1 {
		let option = if peer { "SO_PEERNAME" } else { "SO_SOCKNAME" };
		return Err(SocketError::GetOption { errno: errno(), option }.into());
	}

	// The kernel reports the full length even when it truncated the copy.
	let len = len.min(std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t);
	unsafe { crate::Address::from_native(ptr, len) }.map_err(Into::into)
}
