/// Socket creation/configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("socket() failed: {}", errno_to_str(*.errno))]
    Create { errno: i32 },

    #[error("socketpair() failed: {}", errno_to_str(*.errno))]
    Socketpair { errno: i32 },

    #[error("bind({addr}) failed: {}", errno_to_str(*.errno))]
    Bind { errno: i32, addr: String },

    #[error("listen(backlog={backlog}) failed: {}", errno_to_str(*.errno))]
    Listen { errno: i32, backlog: i32 },

    #[error("connect({addr}) failed: {}", errno_to_str(*.errno))]
    Connect { errno: i32, addr: String },

    #[error("accept() failed: {}", errno_to_str(*.errno))]
    Accept { errno: i32 },

    #[error("shutdown({fd}, {how}) failed: {}", errno_to_str(*.errno))]
    Shutdown { errno: i32, fd: i32, how: i32 },

    #[error("setsockopt({option}) failed: {}", errno_to_str(*.errno))]
    SetOption { errno: i32, option: &'static str },

    #[error("getsockopt({option}) failed: {}", errno_to_str(*.errno))]
    GetOption { errno: i32, option: &'static str },

    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    #[error("unsupported: {what}")]
    Unsupported { what: &'static str },

    #[error("communication error: {reason}")]
    Protocol { reason: &'static str },
}

/// I/O operation errors.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("read() failed: {}", errno_to_str(*.errno))]
    Read { errno: i32 },

    #[error("write() failed: {}", errno_to_str(*.errno))]
    Write { errno: i32 },

    #[error("operation would block")]
    WouldBlock,
}

/// Name resolution errors, in-process and through the helper subprocess.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: &'static str },

    #[error("getaddrinfo failed: {message}")]
    Lookup { code: i32, message: String },

    #[error("getaddrinfo failed: {}", errno_to_str(*.errno))]
    System { errno: i32 },

    #[error("resolver process: {0}")]
    Helper(#[source] std::io::Error),

    #[error("{0}")]
    Failed(String),

    #[error("getaddrinfo failed with signal {0}")]
    Signaled(i32),

    #[error("unknown status from resolver process")]
    UnknownStatus,

    #[error("communication error: {reason}")]
    Protocol { reason: &'static str },
}

/// Returns current errno value.
#[inline]
pub fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Converts errno to human-readable string.
fn errno_to_str(errno: i32) -> String {
    match errno {
        libc::EACCES => "permission denied".into(),
        libc::EADDRINUSE => "address already in use".into(),
        libc::EADDRNOTAVAIL => "address not available".into(),
        libc::EAFNOSUPPORT => "address family not supported".into(),
        libc::EAGAIN => "resource temporarily unavailable".into(),
        libc::EBADF => "bad file descriptor".into(),
        libc::ECONNREFUSED => "connection refused".into(),
        libc::ECONNRESET => "connection reset by peer".into(),
        libc::EINPROGRESS => "operation in progress".into(),
        libc::EINTR => "interrupted by signal".into(),
        libc::EINVAL => "invalid argument".into(),
        libc::EMFILE => "too many open files".into(),
        libc::ENETUNREACH => "network unreachable".into(),
        libc::ENOBUFS => "no buffer space available".into(),
        libc::ENOENT => "no such file or directory".into(),
        libc::ENOTCONN => "not connected".into(),
        libc::EPIPE => "broken pipe".into(),
        libc::ETIMEDOUT => "connection timed out".into(),
        _ => std::io::Error::from_raw_os_error(errno).to_string(),
    }
}

/// Maps errno to std::io::ErrorKind.
fn errno_to_kind(errno: i32) -> std::io::ErrorKind {
    match errno {
        libc::EACCES | libc::EPERM => std::io::ErrorKind::PermissionDenied,
        libc::EADDRINUSE => std::io::ErrorKind::AddrInUse,
        libc::EADDRNOTAVAIL => std::io::ErrorKind::AddrNotAvailable,
        libc::EAGAIN => std::io::ErrorKind::WouldBlock,
        libc::ECONNREFUSED => std::io::ErrorKind::ConnectionRefused,
        libc::ECONNRESET => std::io::ErrorKind::ConnectionReset,
        libc::EINTR => std::io::ErrorKind::Interrupted,
        libc::EINVAL => std::io::ErrorKind::InvalidInput,
        libc::ENOENT => std::io::ErrorKind::NotFound,
        libc::ENOTCONN => std::io::ErrorKind::NotConnected,
        libc::EPIPE => std::io::ErrorKind::BrokenPipe,
        libc::ETIMEDOUT => std::io::ErrorKind::TimedOut,
        _ => std::io::ErrorKind::Other,
    }
}

impl From<SocketError> for std::io::Error {
    fn from(err: SocketError) -> Self {
        let kind = match &err {
            SocketError::Create { errno }
            | SocketError::Socketpair { errno }
            | SocketError::Bind { errno, .. }
            | SocketError::Listen { errno, .. }
            | SocketError::Connect { errno, .. }
            | SocketError::Accept { errno }
            | SocketError::Shutdown { errno, .. }
            | SocketError::SetOption { errno, .. }
            | SocketError::GetOption { errno, .. } => errno_to_kind(*errno),
            SocketError::InvalidAddress { .. } => std::io::ErrorKind::InvalidInput,
            SocketError::Unsupported { .. } => std::io::ErrorKind::Unsupported,
            SocketError::Protocol { .. } => std::io::ErrorKind::InvalidData,
        };
        std::io::Error::new(kind, err)
    }
}

impl From<IoError> for std::io::Error {
    fn from(err: IoError) -> Self {
        let kind = match &err {
            IoError::Read { errno } => errno_to_kind(*errno),
            IoError::Write { errno } => errno_to_kind(*errno),
            IoError::WouldBlock => std::io::ErrorKind::WouldBlock,
        };
        std::io::Error::new(kind, err)
    }
}

impl From<ResolveError> for std::io::Error {
    fn from(err: ResolveError) -> Self {
        let kind = match &err {
            ResolveError::InvalidQuery { .. } => std::io::ErrorKind::InvalidInput,
            ResolveError::System { errno } => errno_to_kind(*errno),
            ResolveError::Helper(inner) => inner.kind(),
            ResolveError::Protocol { .. } => std::io::ErrorKind::InvalidData,
            ResolveError::Lookup { .. }
            | ResolveError::Failed(_)
            | ResolveError::Signaled(_)
            | ResolveError::UnknownStatus => std::io::ErrorKind::NotFound,
        };
        std::io::Error::new(kind, err)
    }
}
