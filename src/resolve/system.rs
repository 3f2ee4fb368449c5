use std::ffi::CStr;
use crate::addr::Address;
use crate::error::{ResolveError, errno};
use super::{AddrInfo, Query, Resolve};

/// Calls `getaddrinfo` in the current process.
///
/// Blocks, and cannot be interrupted safely; prefer
/// [`InterruptibleResolver`](super::InterruptibleResolver) in processes that
/// rely on signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

/// Owns a native result list; frees it on every exit path.
struct NativeList(*mut libc::addrinfo);

impl Drop for NativeList {
	fn drop(&mut self) {
		if !self.0.is_null() {
			unsafe { libc::freeaddrinfo(self.0) };
		}
	}
}

impl Resolve for SystemResolver {
	fn resolve(&self, query: &Query) -> Result<Vec<AddrInfo>, ResolveError> {
		let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
		hints.ai_flags = query.hints().flags;
		hints.ai_family = query.hints().family;
		hints.ai_socktype = query.hints().socktype;
		hints.ai_protocol = query.hints().protocol;

		let node = query.node().map_or(std::ptr::null(), CStr::as_ptr);
		let service = query.service().map_or(std::ptr::null(), CStr::as_ptr);

		let mut res: *mut libc::addrinfo = std::ptr::null_mut();
		let rc = loop {
			let rc = unsafe { libc::getaddrinfo(node, service, &hints, &mut res) };
			if !(rc == libc::EAI_SYSTEM && errno() == libc::EINTR) {
				break rc;
			}
		};

		if rc == libc::EAI_SYSTEM {
			return Err(ResolveError::System { errno: errno() });
		}
		if rc != 0 {
			let message = unsafe { CStr::from_ptr(libc::gai_strerror(rc)) }
				.to_string_lossy()
				.into_owned();
			return Err(ResolveError::Lookup { code: rc, message });
		}

		let list = NativeList(res);
		let mut out = Vec::new();
		let mut cursor = list.0;
		while !cursor.is_null() {
			let ai = unsafe { &*cursor };
			if ai.ai_addr.is_null() {
				return Err(ResolveError::Protocol { reason: "getaddrinfo entry without address" });
			}
			let address = unsafe { Address::from_native(ai.ai_addr, ai.ai_addrlen) }
				.map_err(|_| ResolveError::Protocol { reason: "unusable address from getaddrinfo" })?;
			let canonical_name = (!ai.ai_canonname.is_null())
				.then(|| unsafe { CStr::from_ptr(ai.ai_canonname) }.to_owned());

			out.push(AddrInfo {
				flags: ai.ai_flags,
				family: ai.ai_family,
				socktype: ai.ai_socktype,
				protocol: ai.ai_protocol,
				address,
				canonical_name,
			});
			cursor = ai.ai_next;
		}
		Ok(out)
	}
}
