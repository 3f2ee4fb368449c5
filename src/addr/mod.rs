//! Socket endpoints and address families.
//!
//! `Address` is the one type callers hand to the socket factory. It is a
//! tagged union over the supported families:
//! - `Inet`: IPv4 (`sockaddr_in`)
//! - `Inet6`: IPv6 (`sockaddr_in6`)
//! - `Unix`: UNIX domain, filesystem path or abstract name (`sockaddr_un`)
//! - `Other`: any family we can carry but not interpret
//!
//! Every constructor validates the native length before reading a field,
//! since lengths reach us from syscalls and from the resolver subprocess.

mod ipv4;
mod ipv6;
mod unix;
pub use self::ipv4::SocketAddrV4;
pub use self::ipv6::SocketAddrV6;
pub use self::unix::{UnixAddr, UnixKind, SUN_PATH_OFFSET};

use std::fmt;
use crate::error::SocketError;

/// Address family of a socket or endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
	Inet,
	Inet6,
	Unix,
	Other(libc::c_int),
}

impl Family {
	/// Returns the libc constant for this address family.
	#[inline]
	pub fn raw(self) -> libc::c_int {
		match self {
			Family::Inet => libc::AF_INET,
			Family::Inet6 => libc::AF_INET6,
			Family::Unix => libc::AF_UNIX,
			Family::Other(raw) => raw,
		}
	}

	pub fn from_raw(raw: libc::c_int) -> Self {
		match raw {
			libc::AF_INET => Family::Inet,
			libc::AF_INET6 => Family::Inet6,
			libc::AF_UNIX => Family::Unix,
			other => Family::Other(other),
		}
	}

	/// Symbolic name, e.g. `AF_INET6`.
	pub fn name(self) -> String {
		match self {
			Family::Inet => "AF_INET".into(),
			Family::Inet6 => "AF_INET6".into(),
			Family::Unix => "AF_UNIX".into(),
			Family::Other(libc::AF_UNSPEC) => "AF_UNSPEC".into(),
			Family::Other(raw) => format!("AF_{}", raw),
		}
	}
}

/// Trait for address types that can be converted to raw sockaddr for syscalls.
pub trait ToSockAddr {
	/// Calls the provided closure with a pointer to the raw sockaddr and its size.
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R;
}

/// Trait for address types that can be created from raw sockaddr.
pub trait FromSockAddr: Sized {
	/// Creates an address from a raw sockaddr of `len` bytes.
	///
	/// # Safety
	/// `addr` must point to at least `len` readable bytes.
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Result<Self, SocketError>;
}

/// An immutable socket endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
	Inet(SocketAddrV4),
	Inet6(SocketAddrV6),
	Unix(UnixAddr),
	/// A family this crate does not interpret; `raw` is the full native structure.
	Other { family: libc::c_int, raw: Vec<u8> },
}

impl Address {
	/// UNIX address naming a filesystem path.
	pub fn from_unix_path<P: AsRef<[u8]>>(path: P) -> Result<Self, SocketError> {
		UnixAddr::new(path).map(Address::Unix)
	}

	/// UNIX address in the abstract namespace (Linux and Android only).
	pub fn from_unix_abstract<P: AsRef<[u8]>>(name: P) -> Result<Self, SocketError> {
		UnixAddr::abstract_socket(name).map(Address::Unix)
	}

	/// Copies a native address structure of `len` bytes.
	///
	/// # Safety
	/// `addr` must point to at least `len` readable bytes.
	pub unsafe fn from_native(addr: *const libc::sockaddr, len: libc::socklen_t) -> Result<Self, SocketError> {
		let len = len as usize;
		if len > std::mem::size_of::<libc::sockaddr_storage>() {
			return Err(SocketError::InvalidAddress { reason: "address too long" });
		}
		let bytes = unsafe { std::slice::from_raw_parts(addr as *const u8, len) };
		Self::from_bytes(bytes)
	}

	/// Parses the bytes of a native address structure.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, SocketError> {
		let storage_len = std::mem::size_of::<libc::sockaddr_storage>();
		if bytes.len() > storage_len {
			return Err(SocketError::InvalidAddress { reason: "address too long" });
		}
		if bytes.len() < std::mem::offset_of!(libc::sockaddr, sa_family) + std::mem::size_of::<libc::sa_family_t>() {
			return Err(SocketError::InvalidAddress { reason: "address too short" });
		}

		// Copy into aligned storage before viewing it as any sockaddr_*.
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		unsafe {
			std::ptr::copy_nonoverlapping(
				bytes.as_ptr(),
				&mut storage as *mut _ as *mut u8,
				bytes.len(),
			);
		}
		let len = bytes.len();

		match storage.ss_family as libc::c_int {
			libc::AF_INET => {
				if len < std::mem::size_of::<libc::sockaddr_in>() {
					return Err(SocketError::InvalidAddress { reason: "truncated AF_INET address" });
				}
				let raw = unsafe { &*(&storage as *const _ as *const libc::sockaddr_in) };
				Ok(Address::Inet(SocketAddrV4::from_raw(raw)))
			}
			libc::AF_INET6 => {
				if len < std::mem::size_of::<libc::sockaddr_in6>() {
					return Err(SocketError::InvalidAddress { reason: "truncated AF_INET6 address" });
				}
				let raw = unsafe { &*(&storage as *const _ as *const libc::sockaddr_in6) };
				Ok(Address::Inet6(SocketAddrV6::from_raw(raw)))
			}
			libc::AF_UNIX => {
				if len < SUN_PATH_OFFSET || len > std::mem::size_of::<libc::sockaddr_un>() {
					return Err(SocketError::InvalidAddress { reason: "illegal AF_UNIX addr" });
				}
				let raw = unsafe { &*(&storage as *const _ as *const libc::sockaddr_un) };
				UnixAddr::from_raw(raw, len).map(Address::Unix)
			}
			family => Ok(Address::Other { family, raw: bytes.to_vec() }),
		}
	}

	pub fn family(&self) -> Family {
		match self {
			Address::Inet(_) => Family::Inet,
			Address::Inet6(_) => Family::Inet6,
			Address::Unix(_) => Family::Unix,
			Address::Other { family, .. } => Family::from_raw(*family),
		}
	}

	/// Declared native length of this address.
	pub fn size(&self) -> libc::socklen_t {
		match self {
			Address::Inet(_) => std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
			Address::Inet6(_) => std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
			Address::Unix(unix) => unix.size(),
			Address::Other { raw, .. } => raw.len() as libc::socklen_t,
		}
	}

	/// The exact native bytes, `size()` long.
	pub fn to_bytes(&self) -> Vec<u8> {
		self.with_raw(|ptr, len| unsafe {
			std::slice::from_raw_parts(ptr as *const u8, len as usize).to_vec()
		})
	}

	/// Human-readable form, e.g. `[127.0.0.1:22]` or `[unixabstract:[name]]`.
	pub fn describe(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Address::Inet(v4) => write!(f, "[{}:{}]", std::net::Ipv4Addr::from(v4.ip()), v4.port()),
			Address::Inet6(v6) => write!(f, "[{}:{}]", std::net::Ipv6Addr::from(v6.ip()), v6.port()),
			Address::Unix(unix) => {
				let kind = match unix.kind() {
					UnixKind::Filesystem => "filesystem",
					UnixKind::Abstract => "abstract",
					UnixKind::Unnamed => "unnamed",
				};
				write!(f, "[unix{}:[{}]]", kind, String::from_utf8_lossy(unix.path()))
			}
			Address::Other { family, .. } => write!(f, "[unknown address family {}]", family),
		}
	}
}

impl ToSockAddr for Address {
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		match self {
			Address::Inet(v4) => v4.with_raw(f),
			Address::Inet6(v6) => v6.with_raw(f),
			Address::Unix(unix) => unix.with_raw(f),
			Address::Other { raw, .. } => {
				let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
				// from_bytes bounds raw by sizeof(sockaddr_storage)
				unsafe {
					std::ptr::copy_nonoverlapping(raw.as_ptr(), &mut storage as *mut _ as *mut u8, raw.len());
				}
				f(&storage as *const _ as *const libc::sockaddr, raw.len() as libc::socklen_t)
			}
		}
	}
}

impl FromSockAddr for Address {
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Result<Self, SocketError> {
		unsafe { Self::from_native(addr, len) }
	}
}

impl From<SocketAddrV4> for Address {
	fn from(addr: SocketAddrV4) -> Self {
		Address::Inet(addr)
	}
}

impl From<SocketAddrV6> for Address {
	fn from(addr: SocketAddrV6) -> Self {
		Address::Inet6(addr)
	}
}

impl From<UnixAddr> for Address {
	fn from(addr: UnixAddr) -> Self {
		Address::Unix(addr)
	}
}

impl From<std::net::SocketAddr> for Address {
	fn from(addr: std::net::SocketAddr) -> Self {
		match addr {
			std::net::SocketAddr::V4(v4) => Address::Inet(v4.into()),
			std::net::SocketAddr::V6(v6) => Address::Inet6(v6.into()),
		}
	}
}
