use crate::addr::ToSockAddr;

/// IPv6 socket address (IP + port + scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketAddrV6 {
	ip: [u8; 16],
	port: u16,
	flowinfo: u32,
	/// Scope ID for link-local addresses (identifies network interface).
	/// Usually 0 unless using link-local addresses like fe80::.
	scope_id: u32,
}

impl SocketAddrV6 {
	/// Creates a new IPv6 address.
	pub fn new(ip: [u8; 16], port: u16) -> Self {
		Self { ip, port, flowinfo: 0, scope_id: 0 }
	}

	/// Creates with explicit scope ID.
	///
	/// Use for link-local addresses (fe80::) where you need to specify the interface.
	pub fn with_scope(ip: [u8; 16], port: u16, scope_id: u32) -> Self {
		Self { ip, port, flowinfo: 0, scope_id }
	}

	/// Returns the IP bytes.
	pub fn ip(&self) -> [u8; 16] {
		self.ip
	}

	/// Returns the port.
	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn flowinfo(&self) -> u32 {
		self.flowinfo
	}

	/// Returns the scope ID.
	pub fn scope_id(&self) -> u32 {
		self.scope_id
	}

	/// Converts to the raw sockaddr_in6 for syscalls.
	pub(crate) fn to_raw(&self) -> libc::sockaddr_in6 {
		let mut raw: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
		raw.sin6_family = libc::AF_INET6 as libc::sa_family_t;
		raw.sin6_port = self.port.to_be();
		raw.sin6_flowinfo = self.flowinfo;
		raw.sin6_addr.s6_addr = self.ip;
		raw.sin6_scope_id = self.scope_id;
		raw
	}

	/// Creates from raw sockaddr_in6.
	pub(crate) fn from_raw(raw: &libc::sockaddr_in6) -> Self {
		Self {
			ip: raw.sin6_addr.s6_addr,
			port: u16::from_be(raw.sin6_port),
			flowinfo: raw.sin6_flowinfo,
			scope_id: raw.sin6_scope_id,
		}
	}
}

impl ToSockAddr for SocketAddrV6 {
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = self.to_raw();
		let ptr = &raw as *const _ as *const libc::sockaddr;
		let len = std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t;
		f(ptr, len)
	}
}

impl From<std::net::SocketAddrV6> for SocketAddrV6 {
	fn from(addr: std::net::SocketAddrV6) -> Self {
		Self {
			ip: addr.ip().octets(),
			port: addr.port(),
			flowinfo: addr.flowinfo(),
			scope_id: addr.scope_id(),
		}
	}
}

impl From<SocketAddrV6> for std::net::SocketAddrV6 {
	fn from(addr: SocketAddrV6) -> Self {
		std::net::SocketAddrV6::new(addr.ip.into(), addr.port, addr.flowinfo, addr.scope_id)
	}
}
