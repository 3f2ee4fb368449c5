use crate::addr::ToSockAddr;

/// IPv4 socket address (IP + port).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketAddrV4 {
	ip: [u8; 4],
	port: u16,
}

impl SocketAddrV4 {
	/// Creates a new IPv4 address.
	pub fn new(ip: [u8; 4], port: u16) -> Self {
		Self { ip, port }
	}

	/// The loopback address `127.0.0.1` on `port`.
	pub fn localhost(port: u16) -> Self {
		Self { ip: [127, 0, 0, 1], port }
	}

	/// Creates from raw sockaddr_in.
	pub(crate) fn from_raw(raw: &libc::sockaddr_in) -> Self {
		Self {
			ip: raw.sin_addr.s_addr.to_ne_bytes(),
			port: u16::from_be(raw.sin_port),
		}
	}

	/// Returns the IP bytes.
	pub fn ip(&self) -> [u8; 4] {
		self.ip
	}

	/// Returns the port.
	pub fn port(&self) -> u16 {
		self.port
	}

	/// Converts to the raw sockaddr_in for syscalls.
	pub(crate) fn to_raw(&self) -> libc::sockaddr_in {
		let mut raw: libc::sockaddr_in = unsafe { std::mem::zeroed() };
		raw.sin_family = libc::AF_INET as libc::sa_family_t;
		raw.sin_port = self.port.to_be();
		// ip is already in network order; keep the byte layout as is
		raw.sin_addr.s_addr = u32::from_ne_bytes(self.ip);
		raw
	}
}

impl ToSockAddr for SocketAddrV4 {
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = self.to_raw();
		let ptr = &raw as *const _ as *const libc::sockaddr;
		let len = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
		f(ptr, len)
	}
}

impl From<std::net::SocketAddrV4> for SocketAddrV4 {
	fn from(addr: std::net::SocketAddrV4) -> Self {
		Self::new(addr.ip().octets(), addr.port())
	}
}

impl From<SocketAddrV4> for std::net::SocketAddrV4 {
	fn from(addr: SocketAddrV4) -> Self {
		std::net::SocketAddrV4::new(addr.ip.into(), addr.port)
	}
}
