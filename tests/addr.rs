use fdlane::{Address, Family, SocketAddrV4, SocketAddrV6, SocketError, UnixAddr, UnixKind, SUN_PATH_OFFSET};
use proptest::prelude::*;

const SOCKADDR_UN_LEN: usize = std::mem::size_of::<libc::sockaddr_un>();

fn unix_bytes(sun_path: &[u8]) -> Vec<u8> {
	let mut raw: libc::sockaddr_un = unsafe { std::mem::zeroed() };
	raw.sun_family = libc::AF_UNIX as libc::sa_family_t;
	let len = SUN_PATH_OFFSET + sun_path.len();
	let mut bytes = unsafe {
		std::slice::from_raw_parts(&raw as *const _ as *const u8, SOCKADDR_UN_LEN).to_vec()
	};
	bytes[SUN_PATH_OFFSET..len].copy_from_slice(sun_path);
	bytes.truncate(len);
	bytes
}

#[test]
fn describes_inet() {
	let addr = Address::from(SocketAddrV4::new([127, 0, 0, 1], 22));
	assert_eq!(addr.describe(), "[127.0.0.1:22]");
	assert_eq!(addr.family(), Family::Inet);
	assert_eq!(addr.size() as usize, std::mem::size_of::<libc::sockaddr_in>());
}

#[test]
fn describes_inet6() {
	let mut ip = [0u8; 16];
	ip[15] = 1;
	let addr = Address::from(SocketAddrV6::new(ip, 8080));
	assert_eq!(addr.describe(), "[::1:8080]");
	assert_eq!(addr.family(), Family::Inet6);
}

#[test]
fn std_addresses_convert() {
	let std_addr: std::net::SocketAddr = "10.1.2.3:4000".parse().unwrap();
	let addr = Address::from(std_addr);
	assert_eq!(addr, Address::from(SocketAddrV4::new([10, 1, 2, 3], 4000)));
}

#[test]
fn describes_filesystem_unix() {
	let addr = Address::from_unix_path("/tmp/sock").unwrap();
	assert_eq!(addr.describe(), "[unixfilesystem:[/tmp/sock]]");
	assert_eq!(addr.size() as usize, SUN_PATH_OFFSET + "/tmp/sock".len() + 1);
}

#[test]
fn inet_bytes_round_trip() {
	let addr = Address::from(SocketAddrV4::new([192, 168, 1, 9], 443));
	assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr);
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
fn abstract_name_from_native_bytes() {
	let bytes = unix_bytes(&[0x00, 0x61, 0x62]);
	let addr = Address::from_bytes(&bytes).unwrap();

	let Address::Unix(unix) = &addr else { panic!("expected unix address, got {addr:?}") };
	assert_eq!(unix.kind(), UnixKind::Abstract);
	assert_eq!(unix.path(), b"ab");
	assert_eq!(addr.describe(), "[unixabstract:[ab]]");
	assert_eq!(addr.size() as usize, SUN_PATH_OFFSET + 3);
	assert_eq!(addr.to_bytes(), bytes);
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
fn abstract_name_from_constructor() {
	let addr = Address::from_unix_abstract("ab").unwrap();
	assert_eq!(addr.describe(), "[unixabstract:[ab]]");
	assert_eq!(addr, Address::from_bytes(&unix_bytes(&[0, b'a', b'b'])).unwrap());
}

#[test]
fn unix_path_stops_at_first_nul() {
	let addr = Address::from_bytes(&unix_bytes(b"/run/x\0junk")).unwrap();
	assert_eq!(addr, Address::from_unix_path("/run/x").unwrap());
}

#[test]
fn unix_length_outside_structure_is_rejected() {
	let mut bytes = unix_bytes(b"");
	bytes.truncate(SUN_PATH_OFFSET - 1);
	assert!(Address::from_bytes(&bytes).is_err());
}

#[test]
fn unterminated_full_path_is_rejected() {
	let path = vec![b'a'; SOCKADDR_UN_LEN - SUN_PATH_OFFSET];
	let err = Address::from_bytes(&unix_bytes(&path)).unwrap_err();
	assert!(matches!(err, SocketError::InvalidAddress { .. }));
}

#[test]
fn unix_path_nul_is_rejected() {
	assert!(UnixAddr::new("a\0b").is_err());
}

#[test]
fn native_copy_respects_length() {
	let addr = Address::from(SocketAddrV4::new([1, 2, 3, 4], 5));
	let bytes = addr.to_bytes();
	let short = unsafe {
		Address::from_native(bytes.as_ptr() as *const libc::sockaddr, (bytes.len() - 1) as libc::socklen_t)
	};
	assert!(short.is_err());
	let full = unsafe {
		Address::from_native(bytes.as_ptr() as *const libc::sockaddr, bytes.len() as libc::socklen_t)
	};
	assert_eq!(full.unwrap(), addr);
}

#[test]
fn oversized_input_is_rejected() {
	let bytes = vec![0u8; std::mem::size_of::<libc::sockaddr_storage>() + 1];
	assert!(Address::from_bytes(&bytes).is_err());
}

#[test]
fn unknown_family_is_carried() {
	let family = libc::AF_APPLETALK;
	let mut bytes = vec![0u8; 16];
	bytes[..2].copy_from_slice(&(family as libc::sa_family_t).to_ne_bytes());

	let addr = Address::from_bytes(&bytes).unwrap();
	assert_eq!(addr.family(), Family::Other(family));
	assert_eq!(addr.describe(), format!("[unknown address family {}]", family));
	assert_eq!(addr.to_bytes(), bytes);
}

#[test]
fn family_names() {
	assert_eq!(Family::Inet6.name(), "AF_INET6");
	assert_eq!(Family::from_raw(libc::AF_UNSPEC).name(), "AF_UNSPEC");
	assert_eq!(Family::from_raw(libc::AF_UNIX), Family::Unix);
}

proptest! {
	#[test]
	fn filesystem_path_fits_iff_terminator_fits(len in 1usize..200) {
		let path = vec![b'p'; len];
		let fits = SUN_PATH_OFFSET + len + 1 <= SOCKADDR_UN_LEN;
		let result = UnixAddr::new(&path);
		prop_assert_eq!(result.is_ok(), fits);
		if let Ok(unix) = result {
			let addr = Address::from(unix);
			prop_assert_eq!(addr.size() as usize, SUN_PATH_OFFSET + len + 1);
			prop_assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr);
		}
	}
}

#[test]
fn unnamed_socket_address_round_trips() {
	let (left, _right) = fdlane::stream_pair(Family::Unix).unwrap();
	let addr = left.local_addr().unwrap();

	let Address::Unix(unix) = &addr else { panic!("expected unix address, got {addr:?}") };
	assert_eq!(unix.kind(), UnixKind::Unnamed);
	assert_eq!(addr.size() as usize, SUN_PATH_OFFSET);
	assert_eq!(addr.to_bytes().len(), SUN_PATH_OFFSET);
	assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr);
	assert_eq!(addr.describe(), "[unixunnamed:[]]");
	assert_eq!(addr, Address::from(UnixAddr::unnamed()));
}
