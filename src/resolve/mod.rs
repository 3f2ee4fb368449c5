//! Hostname resolution.
//!
//! `getaddrinfo` cannot be safely interrupted by a signal and is free to
//! trample process state we depend on. [`InterruptibleResolver`] therefore
//! runs it in a throwaway child process and reads the results back over a
//! pipe (see [`wire`] for the framing). Killing the child cancels the lookup.
//! [`SystemResolver`] is the plain in-process call.

mod proxy;
mod system;
pub mod wire;

pub use self::proxy::InterruptibleResolver;
pub use self::system::SystemResolver;

use std::ffi::{CStr, CString};
use crate::addr::{Address, Family};
use crate::error::ResolveError;

/// Anything that can turn a [`Query`] into an ordered candidate list.
pub trait Resolve {
	fn resolve(&self, query: &Query) -> Result<Vec<AddrInfo>, ResolveError>;
}

/// Lookup constraints, mirroring `struct addrinfo` hints. All zero means
/// "anything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddrInfoHints {
	pub flags: libc::c_int,
	pub family: libc::c_int,
	pub socktype: libc::c_int,
	pub protocol: libc::c_int,
}

impl AddrInfoHints {
	pub fn new() -> Self {
		Self::default()
	}

	/// `AI_*` flags, e.g. `libc::AI_NUMERICHOST | libc::AI_CANONNAME`.
	pub fn flags(mut self, flags: libc::c_int) -> Self {
		self.flags = flags;
		self
	}

	pub fn family(mut self, family: Family) -> Self {
		self.family = family.raw();
		self
	}

	pub fn socktype(mut self, socktype: libc::c_int) -> Self {
		self.socktype = socktype;
		self
	}

	pub fn protocol(mut self, protocol: libc::c_int) -> Self {
		self.protocol = protocol;
		self
	}
}

/// A node/service pair plus hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
	node: Option<CString>,
	service: Option<CString>,
	hints: AddrInfoHints,
}

impl Query {
	pub fn new(node: Option<&str>, service: Option<&str>) -> Result<Self, ResolveError> {
		let to_c = |s: &str| {
			CString::new(s).map_err(|_| ResolveError::InvalidQuery { reason: "embedded NUL" })
		};
		Ok(Self {
			node: node.map(to_c).transpose()?,
			service: service.map(to_c).transpose()?,
			hints: AddrInfoHints::default(),
		})
	}

	pub fn with_hints(mut self, hints: AddrInfoHints) -> Self {
		self.hints = hints;
		self
	}

	pub fn node(&self) -> Option<&CStr> {
		self.node.as_deref()
	}

	pub fn service(&self) -> Option<&CStr> {
		self.service.as_deref()
	}

	pub fn hints(&self) -> &AddrInfoHints {
		&self.hints
	}
}

/// One resolution candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrInfo {
	pub flags: libc::c_int,
	pub family: libc::c_int,
	pub socktype: libc::c_int,
	pub protocol: libc::c_int,
	pub address: Address,
	pub canonical_name: Option<CString>,
}
