//! The I/O signal critical section.
//!
//! A process blocks its "I/O signals" (typically SIGINT, SIGTERM, SIGCHLD
//! and friends) almost all the time and unblocks them only while parked in
//! a blocking syscall. A handler then runs at a point where no in-process
//! state is half-updated, and the interrupted syscall fails with EINTR. Callers
//! retry on EINTR, entering a fresh [`IoSignalsAllowed`] section each time.
//!
//! The set lives in an atomic bitmask rather than behind a lock so a forked
//! child can reset it without risking a lock held by some other thread.

use std::sync::atomic::{AtomicU64, Ordering};

static IO_SIGNALS: AtomicU64 = AtomicU64::new(0);

/// Highest signal number representable in the mask.
const MAX_SIGNAL: libc::c_int = 64;

/// Replaces the set of signals unblocked around blocking I/O.
///
/// Signals outside `1..=64` are ignored.
pub fn set_io_signals(signals: &[libc::c_int]) {
	let mask = signals
		.iter()
		.filter(|&&sig| (1..=MAX_SIGNAL).contains(&sig))
		.fold(0u64, |mask, &sig| mask | (1u64 << (sig - 1)));
	IO_SIGNALS.store(mask, Ordering::SeqCst);
}

/// Empties the I/O signal set; critical sections become no-ops.
pub fn clear_io_signals() {
	IO_SIGNALS.store(0, Ordering::SeqCst);
}

/// Signals currently in the I/O set.
pub fn io_signals() -> Vec<libc::c_int> {
	let mask = IO_SIGNALS.load(Ordering::SeqCst);
	(1..=MAX_SIGNAL).filter(|sig| mask & (1u64 << (sig - 1)) != 0).collect()
}

/// Unblocks the I/O signals for the lifetime of the guard.
///
/// Dropping the guard restores the thread's previous mask.
#[must_use = "signals are re-blocked as soon as the guard is dropped"]
pub struct IoSignalsAllowed {
	saved: Option<libc::sigset_t>,
}

impl IoSignalsAllowed {
	pub fn enter() -> Self {
		let mask = IO_SIGNALS.load(Ordering::SeqCst);
		if mask == 0 {
			return Self { saved: None };
		}

		let mut unblock: libc::sigset_t = unsafe { std::mem::zeroed() };
		let mut saved: libc::sigset_t = unsafe { std::mem::zeroed() };
		unsafe {
			libc::sigemptyset(&mut unblock);
			for sig in 1..=MAX_SIGNAL {
				if mask & (1u64 << (sig - 1)) != 0 {
					// Fails only for numbers the platform does not have.
					libc::sigaddset(&mut unblock, sig);
				}
			}
			if libc::pthread_sigmask(libc::SIG_UNBLOCK, &unblock, &mut saved) != 0 {
				return Self { saved: None };
			}
		}
		Self { saved: Some(saved) }
	}
}

impl Drop for IoSignalsAllowed {
	fn drop(&mut self) {
		if let Some(saved) = self.saved.as_ref() {
			unsafe {
				libc::pthread_sigmask(libc::SIG_SETMASK, saved, std::ptr::null_mut());
			}
		}
	}
}

/// Runs `op` inside a fresh critical section until it stops failing with EINTR.
///
/// `op` returns the raw syscall result; `-1` with errno EINTR means retry.
pub(crate) fn retry_eintr<T, F>(mut op: F) -> T
where
	T: PartialEq + From<i8>,
	F: FnMut() -> T,
{
	loop {
		let (rc, errno) = {
			let _allowed = IoSignalsAllowed::enter();
			let rc = op();
			(rc, crate::error::errno())
		};
		if rc != T::from(-1) || errno != libc::EINTR {
			return rc;
		}
	}
}
