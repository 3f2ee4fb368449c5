use std::ffi::CString;
use fdlane::{AddrInfo, AddrInfoHints, Address, Family, InterruptibleResolver, Query, Resolve,
			 ResolveError, SocketAddrV4, SocketAddrV6, SystemResolver};
use fdlane::resolve::wire;

/// Answers every query with a fixed list.
struct Canned(Vec<AddrInfo>);

impl Resolve for Canned {
	fn resolve(&self, _query: &Query) -> Result<Vec<AddrInfo>, ResolveError> {
		Ok(self.0.clone())
	}
}

struct Refuses;

impl Resolve for Refuses {
	fn resolve(&self, _query: &Query) -> Result<Vec<AddrInfo>, ResolveError> {
		Err(ResolveError::Lookup { code: libc::EAI_NONAME, message: "no such host".into() })
	}
}

struct Dies;

impl Resolve for Dies {
	fn resolve(&self, _query: &Query) -> Result<Vec<AddrInfo>, ResolveError> {
		unsafe { libc::raise(libc::SIGKILL) };
		Ok(Vec::new())
	}
}

fn candidates() -> Vec<AddrInfo> {
	let mut v6 = [0u8; 16];
	v6[15] = 1;
	vec![
		AddrInfo {
			flags: libc::AI_CANONNAME,
			family: libc::AF_INET,
			socktype: libc::SOCK_STREAM,
			protocol: libc::IPPROTO_TCP,
			address: SocketAddrV4::new([192, 0, 2, 7], 443).into(),
			canonical_name: Some(CString::new("www.example.test").unwrap()),
		},
		AddrInfo {
			flags: 0,
			family: libc::AF_INET6,
			socktype: libc::SOCK_DGRAM,
			protocol: libc::IPPROTO_UDP,
			address: SocketAddrV6::new(v6, 53).into(),
			canonical_name: None,
		},
		AddrInfo {
			flags: 0,
			family: libc::AF_UNIX,
			socktype: libc::SOCK_STREAM,
			protocol: 0,
			address: Address::from_unix_path("/run/test.sock").unwrap(),
			canonical_name: None,
		},
	]
}

fn query() -> Query {
	Query::new(Some("www.example.test"), Some("https")).unwrap()
}

#[test]
fn wire_preserves_order_and_fields() {
	for n in [0, 1, 3] {
		let list: Vec<_> = candidates().into_iter().take(n).collect();
		assert_eq!(wire::decode(&wire::encode(&list)).unwrap(), list);
	}
}

#[test]
fn helper_returns_child_results() {
	for n in [0, 1, 3] {
		let list: Vec<_> = candidates().into_iter().take(n).collect();
		let resolver = InterruptibleResolver::with_resolver(Canned(list.clone()));
		assert_eq!(resolver.resolve(&query()).unwrap(), list);
	}
}

#[test]
fn helper_reports_child_error_text() {
	let resolver = InterruptibleResolver::with_resolver(Refuses);
	match resolver.resolve(&query()) {
		Err(ResolveError::Failed(message)) => {
			assert_eq!(message, "getaddrinfo failed: no such host");
		}
		other => panic!("unexpected result: {other:?}"),
	}
}

#[test]
fn helper_reports_killing_signal() {
	let resolver = InterruptibleResolver::with_resolver(Dies);
	match resolver.resolve(&query()) {
		Err(err @ ResolveError::Signaled(libc::SIGKILL)) => {
			assert_eq!(err.to_string(), format!("getaddrinfo failed with signal {}", libc::SIGKILL));
		}
		other => panic!("unexpected result: {other:?}"),
	}
}

#[test]
fn helper_is_usable_as_trait_object() {
	let resolvers: Vec<Box<dyn Resolve>> = vec![
		Box::new(InterruptibleResolver::with_resolver(Canned(candidates()))),
		Box::new(Canned(candidates())),
	];
	for resolver in &resolvers {
		assert_eq!(resolver.resolve(&query()).unwrap().len(), 3);
	}
}

fn numeric_loopback() -> Query {
	let hints = AddrInfoHints::new()
		.flags(libc::AI_NUMERICHOST | libc::AI_NUMERICSERV)
		.family(Family::Inet)
		.socktype(libc::SOCK_STREAM);
	Query::new(Some("127.0.0.1"), Some("8080")).unwrap().with_hints(hints)
}

#[test]
fn system_resolver_handles_numeric_host() {
	let list = SystemResolver.resolve(&numeric_loopback()).unwrap();
	assert_eq!(list.len(), 1);
	assert_eq!(list[0].family, libc::AF_INET);
	assert_eq!(list[0].address, Address::from(SocketAddrV4::new([127, 0, 0, 1], 8080)));
	assert_eq!(list[0].address.describe(), "[127.0.0.1:8080]");
}

#[test]
fn interruptible_matches_in_process() {
	let direct = SystemResolver.resolve(&numeric_loopback()).unwrap();
	let proxied = InterruptibleResolver::new().resolve(&numeric_loopback()).unwrap();
	assert_eq!(proxied, direct);
}

#[test]
fn bad_numeric_host_fails_through_helper() {
	let hints = AddrInfoHints::new().flags(libc::AI_NUMERICHOST);
	let query = Query::new(Some("not an address"), None).unwrap().with_hints(hints);
	match InterruptibleResolver::new().resolve(&query) {
		Err(ResolveError::Failed(message)) => assert!(message.starts_with("getaddrinfo failed")),
		other => panic!("unexpected result: {other:?}"),
	}
}

#[test]
fn embedded_nul_is_rejected() {
	assert!(matches!(Query::new(Some("a\0b"), None), Err(ResolveError::InvalidQuery { .. })));
}
