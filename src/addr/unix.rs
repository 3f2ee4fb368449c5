use crate::addr::ToSockAddr;
use crate::error::SocketError;

/// Offset of `sun_path` within `sockaddr_un`; the fixed header every UNIX
/// address length is measured from.
pub const SUN_PATH_OFFSET: usize = std::mem::offset_of!(libc::sockaddr_un, sun_path);

const SOCKADDR_UN_LEN: usize = std::mem::size_of::<libc::sockaddr_un>();

/// Which UNIX namespace a name lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnixKind {
	Filesystem,
	/// Linux abstract namespace: `sun_path[0] == 0`, name follows.
	Abstract,
	/// No name at all; native length is exactly `SUN_PATH_OFFSET`. The kernel
	/// reports this for socketpair ends and unbound clients.
	Unnamed,
}

/// Unix domain socket address (file path or abstract name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnixAddr {
	name: Vec<u8>,
	kind: UnixKind,
}

impl UnixAddr {
	/// Creates a new Unix address from a filesystem path.
	///
	/// Needs `SUN_PATH_OFFSET + len + 1` bytes of native storage; fails if
	/// that overflows or does not fit in a fixed `sockaddr_un`. Longer paths
	/// could be carried in oversized storage, but the kernel refuses them at
	/// bind and connect anyway, so they are rejected here.
	pub fn new<P: AsRef<[u8]>>(path: P) -> Result<Self, SocketError> {
		let path = path.as_ref();
		if path.contains(&0) {
			return Err(SocketError::InvalidAddress { reason: "socket path contains NUL" });
		}
		checked_len(path.len(), 1)?;
		Ok(Self { name: path.to_vec(), kind: UnixKind::Filesystem })
	}

	/// Creates an abstract socket address.
	///
	/// The name may contain any bytes, NULs included.
	#[cfg(any(target_os = "linux", target_os = "android"))]
	pub fn abstract_socket<P: AsRef<[u8]>>(name: P) -> Result<Self, SocketError> {
		let name = name.as_ref();
		checked_len(name.len(), 1)?;
		Ok(Self { name: name.to_vec(), kind: UnixKind::Abstract })
	}

	#[cfg(not(any(target_os = "linux", target_os = "android")))]
	pub fn abstract_socket<P: AsRef<[u8]>>(_name: P) -> Result<Self, SocketError> {
		Err(SocketError::Unsupported { what: "this system does not support abstract AF_UNIX" })
	}

	/// The address of a socket that was never bound.
	pub fn unnamed() -> Self {
		Self { name: Vec::new(), kind: UnixKind::Unnamed }
	}

	pub fn kind(&self) -> UnixKind {
		self.kind
	}

	/// Returns true if this is an abstract socket.
	pub fn is_abstract(&self) -> bool {
		self.kind == UnixKind::Abstract
	}

	/// Path bytes, or the abstract name without its leading NUL.
	pub fn path(&self) -> &[u8] {
		&self.name
	}

	/// Native length: header, then `path NUL`, `NUL name`, or nothing.
	pub fn size(&self) -> libc::socklen_t {
		let len = match self.kind {
			UnixKind::Unnamed => SUN_PATH_OFFSET,
			UnixKind::Filesystem | UnixKind::Abstract => SUN_PATH_OFFSET + 1 + self.name.len(),
		};
		len as libc::socklen_t
	}

	/// Converts to the raw sockaddr_un for syscalls.
	pub(crate) fn to_raw(&self) -> libc::sockaddr_un {
		let mut addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
		addr.sun_family = libc::AF_UNIX as libc::sa_family_t;
		#[cfg(any(
			target_os = "macos",
			target_os = "ios",
			target_os = "freebsd",
			target_os = "openbsd",
			target_os = "netbsd",
			target_os = "dragonfly"
		))]
		{
			addr.sun_len = self.size() as u8;
		}

		// Constructors guarantee the name fits; sun_path is pre-zeroed so the
		// filesystem NUL and the abstract leading NUL are already in place.
		let start = match self.kind {
			UnixKind::Filesystem | UnixKind::Unnamed => 0,
			UnixKind::Abstract => 1,
		};
		for (slot, &byte) in addr.sun_path[start..].iter_mut().zip(&self.name) {
			*slot = byte as libc::c_char;
		}
		addr
	}

	/// Creates from a raw sockaddr_un whose declared length is `len`.
	///
	/// Caller checks `SUN_PATH_OFFSET <= len <= size_of::<sockaddr_un>()`.
	pub(crate) fn from_raw(raw: &libc::sockaddr_un, len: usize) -> Result<Self, SocketError> {
		let path_len = len - SUN_PATH_OFFSET;
		if path_len == 0 {
			return Ok(Self::unnamed());
		}
		let bytes: Vec<u8> = raw.sun_path[..path_len].iter().map(|&c| c as u8).collect();

		if let Some(0) = bytes.first() {
			return Ok(Self { name: bytes[1..].to_vec(), kind: UnixKind::Abstract });
		}
		let end = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
		// A path filling all of sun_path has no room for our terminator.
		checked_len(end, 1)?;
		Ok(Self { name: bytes[..end].to_vec(), kind: UnixKind::Filesystem })
	}
}

/// Checks `SUN_PATH_OFFSET + name_len + extra` against the native structure.
fn checked_len(name_len: usize, extra: usize) -> Result<usize, SocketError> {
	SUN_PATH_OFFSET
		.checked_add(name_len)
		.and_then(|n| n.checked_add(extra))
		.filter(|&n| n <= SOCKADDR_UN_LEN)
		.ok_or(SocketError::InvalidAddress { reason: "socket name too long" })
}

impl ToSockAddr for UnixAddr {
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = self.to_raw();
		let ptr = &raw as *const _ as *const libc::sockaddr;
		f(ptr, self.size())
	}
}
