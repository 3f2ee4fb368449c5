use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, Stdio};
use std::sync::Arc;
use crate::error::{ResolveError, errno};
use crate::signals;
use super::{AddrInfo, Query, Resolve, SystemResolver, wire};

/// Program named in the helper's `Command`. It is never executed: the
/// pre-exec hook does the work and exits first.
const HELPER_PROGRAM: &str = "/bin/sh";

/// Runs another resolver inside a disposable child process.
///
/// The calling thread blocks until the child exits. Cancelling means killing
/// the child; whatever state the lookup corrupts dies with it.
///
/// No step is retried. A failed child, a child killed by a signal and a
/// malformed result stream are all terminal errors.
#[derive(Debug, Clone)]
pub struct InterruptibleResolver<R = SystemResolver> {
	inner: Arc<R>,
}

impl InterruptibleResolver<SystemResolver> {
	pub fn new() -> Self {
		Self::with_resolver(SystemResolver)
	}
}

impl Default for InterruptibleResolver<SystemResolver> {
	fn default() -> Self {
		Self::new()
	}
}

impl<R> InterruptibleResolver<R>
where
	R: Resolve + Send + Sync + 'static,
{
	/// Proxies `inner`, which will only ever be called in the child.
	pub fn with_resolver(inner: R) -> Self {
		Self { inner: Arc::new(inner) }
	}

	pub fn resolve(&self, query: &Query) -> Result<Vec<AddrInfo>, ResolveError> {
		let inner = Arc::clone(&self.inner);
		let child_query = query.clone();

		let mut command = Command::new(HELPER_PROGRAM);
		command
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());
		// SAFETY: runs between fork and exec. It touches only the child's
		// copy of memory, writes to its own stdio, and leaves via _exit.
		unsafe {
			command.pre_exec(move || helper_main(&*inner, &child_query));
		}

		let child = command.spawn().map_err(ResolveError::Helper)?;
		tracing::debug!(pid = child.id(), node = ?query.node(), service = ?query.service(), "resolver process started");

		// Drains stdout and stderr together, then reaps the child.
		let output = child.wait_with_output().map_err(ResolveError::Helper)?;
		let status = output.status;

		if !status.success() {
			tracing::debug!(%status, "resolver process failed");
			if status.code().is_some() {
				return Err(ResolveError::Failed(massage_output(&output.stderr)));
			}
			if let Some(signal) = status.signal() {
				return Err(ResolveError::Signaled(signal));
			}
			return Err(ResolveError::UnknownStatus);
		}

		let list = wire::decode(&output.stdout)?;
		tracing::debug!(entries = list.len(), bytes = output.stdout.len(), "resolver results decoded");
		Ok(list)
	}
}

impl<R> Resolve for InterruptibleResolver<R>
where
	R: Resolve + Send + Sync + 'static,
{
	fn resolve(&self, query: &Query) -> Result<Vec<AddrInfo>, ResolveError> {
		InterruptibleResolver::resolve(self, query)
	}
}

/// Child side. Nothing here may log: tracing subscribers can hold locks
/// owned by threads that do not exist after fork.
fn helper_main<R: Resolve>(resolver: &R, query: &Query) -> ! {
	signals::clear_io_signals();
	unsafe {
		let mut empty: libc::sigset_t = std::mem::zeroed();
		libc::sigemptyset(&mut empty);
		libc::pthread_sigmask(libc::SIG_SETMASK, &empty, std::ptr::null_mut());
	}

	let status = match resolver.resolve(query) {
		Ok(list) => match write_all(libc::STDOUT_FILENO, &wire::encode(&list)) {
			Ok(()) => 0,
			Err(err) => {
				report(&format!("writing resolver results: {}", std::io::Error::from_raw_os_error(err)));
				1
			}
		},
		Err(err) => {
			report(&err.to_string());
			1
		}
	};
	unsafe { libc::_exit(status) }
}

/// Writes the failure text for the parent; if even that fails, there is no
/// channel left and the child aborts.
fn report(message: &str) {
	if write_all(libc::STDERR_FILENO, message.as_bytes()).is_err() {
		unsafe { libc::abort() }
	}
}

/// Writes all of `buf`, retrying short writes and EINTR. Err carries errno.
fn write_all(fd: libc::c_int, mut buf: &[u8]) -> Result<(), i32> {
	while !buf.is_empty() {
		let n = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
		if n == -1 {
			let err = errno();
			if err == libc::EINTR {
				continue;
			}
			return Err(err);
		}
		if n == 0 {
			return Err(libc::EPIPE);
		}
		buf = &buf[n as usize..];
	}
	Ok(())
}

/// Captured stderr as a one-line message.
fn massage_output(raw: &[u8]) -> String {
	let text = String::from_utf8_lossy(raw);
	let text = text.trim();
	if text.is_empty() {
		"resolver process failed".into()
	} else {
		text.replace('\n', " ")
	}
}
