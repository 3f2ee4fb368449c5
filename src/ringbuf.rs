//! Fixed-capacity circular byte buffer.
//!
//! Sits between a raw descriptor and the protocol code that consumes it.
//! Readable bytes start at the read cursor and run for `size` bytes,
//! wrapping at the physical end; the `room` writable bytes follow directly
//! after them. The two regions never overlap and together cover the
//! storage exactly once.
//!
//! Zero-copy callers use the two-phase protocol: borrow a view with
//! [`RingBuffer::readable_iov`] or [`RingBuffer::writable_iov`], do their I/O
//! against it, then commit with [`RingBuffer::note_removed`] or
//! [`RingBuffer::note_added`]. Views do not touch the bookkeeping.
//!
//! Asking for more than `size` or `room` is a caller bug and panics.

use std::io::{IoSlice, IoSliceMut};
use std::os::fd::AsRawFd;
use crate::error::{IoError, errno};
use crate::signals::retry_eintr;

pub struct RingBuffer {
	buf: Box<[u8]>,
	/// Offset of the oldest unread byte.
	start: usize,
	size: usize,
}

impl RingBuffer {
	/// Allocates a buffer holding at most `capacity` bytes.
	///
	/// # Panics
	/// If `capacity` is zero.
	pub fn new(capacity: usize) -> Self {
		assert!(capacity > 0, "ring buffer capacity must be non-zero");
		Self {
			buf: vec![0u8; capacity].into_boxed_slice(),
			start: 0,
			size: 0,
		}
	}

	#[inline]
	pub fn capacity(&self) -> usize {
		self.buf.len()
	}

	/// Bytes currently held.
	#[inline]
	pub fn size(&self) -> usize {
		self.size
	}

	/// Bytes that can still be added.
	#[inline]
	pub fn room(&self) -> usize {
		self.capacity() - self.size
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.size == 0
	}

	#[inline]
	pub fn is_full(&self) -> bool {
		self.size == self.capacity()
	}

	/// Drops everything held.
	pub fn clear(&mut self) {
		self.start = 0;
		self.size = 0;
	}

	/// Offset where the next added byte goes.
	#[inline]
	fn write_pos(&self) -> usize {
		(self.start + self.size) % self.capacity()
	}

	/// The at most two spans holding the next `sz` readable bytes.
	///
	/// The second span is empty unless the bytes wrap past the physical end.
	pub fn readable_iov(&self, sz: usize) -> (&[u8], &[u8]) {
		assert!(sz <= self.size, "readable_iov: {} bytes requested, {} held", sz, self.size);
		let first = sz.min(self.capacity() - self.start);
		(
			&self.buf[self.start..self.start + first],
			&self.buf[..sz - first],
		)
	}

	/// The at most two spans that can receive the next `sz` bytes.
	///
	/// The second span is empty unless the region wraps past the physical end.
	pub fn writable_iov(&mut self, sz: usize) -> (&mut [u8], &mut [u8]) {
		assert!(sz <= self.room(), "writable_iov: {} bytes requested, {} room", sz, self.room());
		let pos = self.write_pos();
		let first = sz.min(self.capacity() - pos);
		// A wrapped tail ends at or before `start <= pos`, so it lies in `head`.
		let (head, tail) = self.buf.split_at_mut(pos);
		(&mut tail[..first], &mut head[..sz - first])
	}

	/// Commits `nr` bytes consumed from the front. Returns the new size.
	pub fn note_removed(&mut self, nr: usize) -> usize {
		assert!(nr <= self.size, "note_removed: {} bytes removed, {} held", nr, self.size);
		self.start = (self.start + nr) % self.capacity();
		self.size -= nr;
		self.size
	}

	/// Commits `nr` bytes written after the readable region. Returns the new room.
	pub fn note_added(&mut self, nr: usize) -> usize {
		assert!(nr <= self.room(), "note_added: {} bytes added, {} room", nr, self.room());
		self.size += nr;
		self.room()
	}

	/// Appends all of `buf`.
	///
	/// # Panics
	/// If `buf` is longer than `room()`.
	pub fn copy_in(&mut self, buf: &[u8]) {
		let (first, second) = self.writable_iov(buf.len());
		let split = first.len();
		first.copy_from_slice(&buf[..split]);
		second.copy_from_slice(&buf[split..]);
		self.note_added(buf.len());
	}

	/// Copies the oldest `buf.len()` bytes out without consuming them.
	///
	/// # Panics
	/// If `buf` is longer than `size()`.
	pub fn peek(&self, buf: &mut [u8]) {
		let (first, second) = self.readable_iov(buf.len());
		buf[..first.len()].copy_from_slice(first);
		buf[first.len()..].copy_from_slice(second);
	}

	/// Moves the oldest `buf.len()` bytes out.
	///
	/// # Panics
	/// If `buf` is longer than `size()`.
	pub fn copy_out(&mut self, buf: &mut [u8]) {
		self.peek(buf);
		self.note_removed(buf.len());
	}

	/// Reads up to `min(max, room())` bytes from `fd` straight into the buffer.
	///
	/// Returns `Ok(0)` at end of input (or when there is nothing to ask for).
	/// A would-block descriptor yields an error of kind `WouldBlock`; any
	/// other failure is an [`IoError::Read`]. EINTR is retried.
	pub fn read_in<F: AsRawFd>(&mut self, fd: &F, max: usize) -> std::io::Result<usize> {
		let want = max.min(self.room());
		if want == 0 {
			return Ok(0);
		}
		let raw = fd.as_raw_fd();

		let n = {
			let (first, second) = self.writable_iov(want);
			let iov = [IoSliceMut::new(first), IoSliceMut::new(second)];
			let count = if iov[1].is_empty() { 1 } else { 2 };
			retry_eintr(|| unsafe {
				libc::readv(raw, iov.as_ptr() as *const libc::iovec, count)
			})
		};

		if n == -1 {
			return Err(transfer_error(errno(), |errno| IoError::Read { errno }));
		}
		let n = n as usize;
		self.note_added(n);
		tracing::trace!(fd = raw, n, size = self.size, "ring buffer read in");
		Ok(n)
	}

	/// Writes up to `min(max, size())` bytes from the buffer to `fd` and
	/// consumes what the kernel accepted.
	pub fn write_out<F: AsRawFd>(&mut self, fd: &F, max: usize) -> std::io::Result<usize> {
		let want = max.min(self.size);
		if want == 0 {
			return Ok(0);
		}
		let raw = fd.as_raw_fd();

		let n = {
			let (first, second) = self.readable_iov(want);
			let iov = [IoSlice::new(first), IoSlice::new(second)];
			let count = if iov[1].is_empty() { 1 } else { 2 };
			retry_eintr(|| unsafe {
				libc::writev(raw, iov.as_ptr() as *const libc::iovec, count)
			})
		};

		if n == -1 {
			return Err(transfer_error(errno(), |errno| IoError::Write { errno }));
		}
		let n = n as usize;
		self.note_removed(n);
		tracing::trace!(fd = raw, n, size = self.size, "ring buffer wrote out");
		Ok(n)
	}
}

fn transfer_error(errno: i32, fatal: impl FnOnce(i32) -> IoError) -> std::io::Error {
	if errno == libc::EAGAIN || errno == libc::EWOULDBLOCK {
		IoError::WouldBlock.into()
	} else {
		fatal(errno).into()
	}
}

impl std::io::Read for RingBuffer {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		let n = buf.len().min(self.size);
		self.copy_out(&mut buf[..n]);
		Ok(n)
	}
}

impl std::io::Write for RingBuffer {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		let n = buf.len().min(self.room());
		self.copy_in(&buf[..n]);
		Ok(n)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

impl std::fmt::Debug for RingBuffer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RingBuffer")
			.field("capacity", &self.capacity())
			.field("size", &self.size)
			.field("start", &self.start)
			.finish()
	}
}
