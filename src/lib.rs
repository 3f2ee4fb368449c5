pub mod socket;
pub mod resolve;
pub mod signals;
mod addr;
mod error;
mod ringbuf;

pub use self::error::{IoError, ResolveError, SocketError, errno};
pub use self::addr::{Address, Family, FromSockAddr, ToSockAddr, SocketAddrV4, SocketAddrV6,
					 UnixAddr, UnixKind, SUN_PATH_OFFSET};
pub use self::ringbuf::RingBuffer;
pub use self::resolve::{AddrInfo, AddrInfoHints, InterruptibleResolver, Query, Resolve, SystemResolver};
pub use self::signals::{IoSignalsAllowed, set_io_signals, clear_io_signals};
pub use self::socket::{Shutdown, SockType, Stream, Datagram, RawSocket, BoundSocket,
					   Listener, AcceptResult, ConnectedStream, socketpair, stream_pair,
					   ListenerBuilder, ConnectorBuilder};
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use self::socket::PeerCredentials;
pub use self::socket::{is_cloexec, merge_cloexec, set_option, set_reuse_addr,
					   set_tcp_nodelay, disable_tcp_nagle, get_tcp_nodelay, set_nonblocking, is_nonblocking};
