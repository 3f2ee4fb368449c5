//! Framing between the resolver child and its parent.
//!
//! The child writes, for each candidate in order:
//!
//! ```text
//! record blob   RECORD_LEN bytes (see below)
//! address blob  exactly `addrlen` bytes of native sockaddr
//! name blob     canonical name plus its NUL, only if `has_canonname`
//! ```
//!
//! Every blob is a native-endian `u64` length followed by that many bytes.
//! The stream ends at end of input. The record is an explicit frame, not a
//! memory image of `struct addrinfo`:
//!
//! ```text
//! flags i32 | family i32 | socktype i32 | protocol i32 | addrlen u32 | has_canonname u32
//! ```
//!
//! Both ends are the same binary, so native byte order is fine. Decoding is
//! strictly bounds-checked; any inconsistency is a protocol error.

use std::ffi::CString;
use crate::addr::Address;
use crate::error::ResolveError;
use super::AddrInfo;

/// Width of every blob length prefix.
pub const BLOB_LEN_SIZE: usize = std::mem::size_of::<u64>();

/// Size of an encoded record.
pub const RECORD_LEN: usize = 24;

const PROTOCOL_ERROR: ResolveError = ResolveError::Protocol { reason: "gai protocol error" };
const TRUNCATED: ResolveError = ResolveError::Protocol { reason: "truncated data" };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Record {
	flags: i32,
	family: i32,
	socktype: i32,
	protocol: i32,
	addrlen: u32,
	has_canonname: bool,
}

impl Record {
	fn encode(&self) -> [u8; RECORD_LEN] {
		let mut out = [0u8; RECORD_LEN];
		out[0..4].copy_from_slice(&self.flags.to_ne_bytes());
		out[4..8].copy_from_slice(&self.family.to_ne_bytes());
		out[8..12].copy_from_slice(&self.socktype.to_ne_bytes());
		out[12..16].copy_from_slice(&self.protocol.to_ne_bytes());
		out[16..20].copy_from_slice(&self.addrlen.to_ne_bytes());
		out[20..24].copy_from_slice(&(self.has_canonname as u32).to_ne_bytes());
		out
	}

	fn decode(blob: &[u8]) -> Result<Self, ResolveError> {
		let Ok(bytes) = <&[u8; RECORD_LEN]>::try_from(blob) else {
			return Err(PROTOCOL_ERROR);
		};
		let word = |at: usize| [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
		let has_canonname = match u32::from_ne_bytes(word(20)) {
			0 => false,
			1 => true,
			_ => return Err(PROTOCOL_ERROR),
		};
		Ok(Self {
			flags: i32::from_ne_bytes(word(0)),
			family: i32::from_ne_bytes(word(4)),
			socktype: i32::from_ne_bytes(word(8)),
			protocol: i32::from_ne_bytes(word(12)),
			addrlen: u32::from_ne_bytes(word(16)),
			has_canonname,
		})
	}
}

fn push_blob(out: &mut Vec<u8>, data: &[u8]) {
	out.extend_from_slice(&(data.len() as u64).to_ne_bytes());
	out.extend_from_slice(data);
}

/// Serializes `list` in order.
pub fn encode(list: &[AddrInfo]) -> Vec<u8> {
	let mut out = Vec::new();
	for ai in list {
		let address = ai.address.to_bytes();
		let record = Record {
			flags: ai.flags,
			family: ai.family,
			socktype: ai.socktype,
			protocol: ai.protocol,
			addrlen: address.len() as u32,
			has_canonname: ai.canonical_name.is_some(),
		};
		push_blob(&mut out, &record.encode());
		push_blob(&mut out, &address);
		if let Some(name) = &ai.canonical_name {
			push_blob(&mut out, name.as_bytes_with_nul());
		}
	}
	out
}

/// Bounds-checked reader over the child's output.
struct Blobs<'a> {
	data: &'a [u8],
}

impl<'a> Blobs<'a> {
	fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	fn next_blob(&mut self) -> Result<&'a [u8], ResolveError> {
		let (len, rest) = self.data.split_first_chunk::<BLOB_LEN_SIZE>().ok_or(TRUNCATED)?;
		let len = usize::try_from(u64::from_ne_bytes(*len)).map_err(|_| TRUNCATED)?;
		if rest.len() < len {
			return Err(TRUNCATED);
		}
		let (blob, rest) = rest.split_at(len);
		self.data = rest;
		Ok(blob)
	}
}

/// Rebuilds the candidate list from the child's complete output.
///
/// Empty input is an empty list.
pub fn decode(data: &[u8]) -> Result<Vec<AddrInfo>, ResolveError> {
	let mut blobs = Blobs { data };
	let mut list = Vec::new();

	while !blobs.is_empty() {
		let record = Record::decode(blobs.next_blob()?)?;

		let address = blobs.next_blob()?;
		if address.len() != record.addrlen as usize {
			return Err(PROTOCOL_ERROR);
		}
		let address = Address::from_bytes(address)
			.map_err(|_| ResolveError::Protocol { reason: "bad address payload" })?;

		let canonical_name = if record.has_canonname {
			let name = blobs.next_blob()?;
			let name = CString::from_vec_with_nul(name.to_vec())
				.map_err(|_| ResolveError::Protocol { reason: "bad canonical name" })?;
			Some(name)
		} else {
			None
		};

		list.push(AddrInfo {
			flags: record.flags,
			family: record.family,
			socktype: record.socktype,
			protocol: record.protocol,
			address,
			canonical_name,
		});
	}
	Ok(list)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::addr::SocketAddrV4;

	fn entry(port: u16, name: Option<&str>) -> AddrInfo {
		AddrInfo {
			flags: 0,
			family: libc::AF_INET,
			socktype: libc::SOCK_STREAM,
			protocol: libc::IPPROTO_TCP,
			address: SocketAddrV4::new([10, 0, 0, 1], port).into(),
			canonical_name: name.map(|n| CString::new(n).unwrap()),
		}
	}

	#[test]
	fn empty_stream_is_empty_list() {
		assert_eq!(decode(&[]).unwrap(), Vec::new());
	}

	#[test]
	fn record_layout_is_fixed() {
		let encoded = encode(&[entry(80, None)]);
		let record_len = u64::from_ne_bytes(encoded[..8].try_into().unwrap());
		assert_eq!(record_len as usize, RECORD_LEN);
	}

	#[test]
	fn length_prefix_past_end_is_truncation() {
		let mut data = Vec::new();
		data.extend_from_slice(&1000u64.to_ne_bytes());
		data.extend_from_slice(&[0u8; 10]);
		assert!(matches!(decode(&data), Err(ResolveError::Protocol { reason: "truncated data" })));
	}

	#[test]
	fn partial_length_prefix_is_truncation() {
		assert!(matches!(decode(&[1, 2, 3]), Err(ResolveError::Protocol { .. })));
	}

	#[test]
	fn huge_length_prefix_does_not_overflow() {
		let data = u64::MAX.to_ne_bytes();
		assert!(matches!(decode(&data), Err(ResolveError::Protocol { .. })));
	}

	#[test]
	fn wrong_record_size_is_rejected() {
		let mut data = Vec::new();
		push_blob(&mut data, &[0u8; RECORD_LEN - 1]);
		assert!(matches!(decode(&data), Err(ResolveError::Protocol { reason: "gai protocol error" })));
	}

	#[test]
	fn address_length_must_match_record() {
		let mut data = encode(&[entry(80, None)]);
		// Drop one trailing address byte and shrink its prefix to match.
		data.pop();
		let at = BLOB_LEN_SIZE + RECORD_LEN;
		let len = u64::from_ne_bytes(data[at..at + 8].try_into().unwrap()) - 1;
		data[at..at + 8].copy_from_slice(&len.to_ne_bytes());
		assert!(matches!(decode(&data), Err(ResolveError::Protocol { reason: "gai protocol error" })));
	}

	#[test]
	fn missing_canonical_name_blob_is_truncation() {
		let mut data = encode(&[entry(80, Some("host.example"))]);
		let name_blob = BLOB_LEN_SIZE + "host.example".len() + 1;
		data.truncate(data.len() - name_blob);
		assert!(matches!(decode(&data), Err(ResolveError::Protocol { reason: "truncated data" })));
	}

	#[test]
	fn canonical_name_needs_terminator() {
		let mut data = Vec::new();
		let address = SocketAddrV4::new([10, 0, 0, 1], 80);
		let address = Address::from(address).to_bytes();
		let record = Record {
			flags: 0,
			family: libc::AF_INET,
			socktype: 0,
			protocol: 0,
			addrlen: address.len() as u32,
			has_canonname: true,
		};
		push_blob(&mut data, &record.encode());
		push_blob(&mut data, &address);
		push_blob(&mut data, b"no-nul");
		assert!(matches!(decode(&data), Err(ResolveError::Protocol { reason: "bad canonical name" })));
	}

	#[test]
	fn canonical_flag_must_be_boolean() {
		let mut data = encode(&[entry(80, None)]);
		data[BLOB_LEN_SIZE + 20] = 2;
		assert!(matches!(decode(&data), Err(ResolveError::Protocol { .. })));
	}
}
