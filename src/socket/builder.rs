//! One-call setup for the two stream endpoints the factory hands out.
//!
//! Both builders only touch TCP options for IP families; UNIX sockets get
//! the same code path with those steps skipped.

use crate::addr::{Address, Family};
use super::{RawSocket, Listener, ConnectedStream, Stream, disable_tcp_nagle, set_reuse_addr};

const DEFAULT_BACKLOG: i32 = 128;

fn is_ip(family: Family) -> bool {
	matches!(family, Family::Inet | Family::Inet6)
}

/// Creates the close-on-exec socket and applies the Nagle setting.
fn stream_socket(family: Family, nodelay: bool) -> std::io::Result<RawSocket<Stream>> {
	let socket = RawSocket::<Stream>::new(family)?;
	if nodelay && is_ip(family) {
		disable_tcp_nagle(&socket)?;
	}
	Ok(socket)
}

/// Creates, binds and starts a stream listener.
///
/// Defaults: backlog 128, `SO_REUSEADDR` on (IP only), Nagle left alone,
/// blocking.
///
/// ```ignore
/// let listener = ListenerBuilder::new()
///     .backlog(16)
///     .bind(&Address::from(SocketAddrV4::localhost(0)))?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ListenerBuilder {
	backlog: i32,
	reuse_addr: bool,
	nodelay: bool,
	nonblocking: bool,
}

impl Default for ListenerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ListenerBuilder {
	pub fn new() -> Self {
		Self {
			backlog: DEFAULT_BACKLOG,
			reuse_addr: true,
			nodelay: false,
			nonblocking: false,
		}
	}

	pub fn backlog(mut self, backlog: i32) -> Self {
		self.backlog = backlog;
		self
	}

	pub fn reuse_addr(mut self, enable: bool) -> Self {
		self.reuse_addr = enable;
		self
	}

	/// Accepted connections inherit this from the listener.
	pub fn nodelay(mut self, enable: bool) -> Self {
		self.nodelay = enable;
		self
	}

	/// Needed for [`Listener::accept_nonblocking`].
	pub fn nonblocking(mut self, enable: bool) -> Self {
		self.nonblocking = enable;
		self
	}

	pub fn bind(self, addr: &Address) -> std::io::Result<Listener> {
		let family = addr.family();
		let socket = stream_socket(family, self.nodelay)?;
		if self.reuse_addr && is_ip(family) {
			set_reuse_addr(&socket, true)?;
		}
		if self.nonblocking {
			socket.set_nonblocking(true)?;
		}

		let listener = socket.bind(addr)?.listen(self.backlog)?;
		tracing::debug!(addr = %addr, backlog = self.backlog, "listening");
		Ok(listener)
	}
}

/// Opens an outgoing stream connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectorBuilder {
	nodelay: bool,
}

impl ConnectorBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodelay(mut self, enable: bool) -> Self {
		self.nodelay = enable;
		self
	}

	pub fn connect(self, addr: &Address) -> std::io::Result<ConnectedStream> {
		stream_socket(addr.family(), self.nodelay)?.connect(addr)
	}
}
