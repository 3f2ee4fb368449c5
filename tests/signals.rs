use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use fdlane::signals::{IoSignalsAllowed, clear_io_signals, io_signals, set_io_signals};
use fdlane::{Family, stream_pair};

static DELIVERED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_: libc::c_int) {
	DELIVERED.store(true, Ordering::SeqCst);
}

fn is_blocked(sig: libc::c_int) -> bool {
	unsafe {
		let mut current: libc::sigset_t = std::mem::zeroed();
		libc::pthread_sigmask(libc::SIG_SETMASK, std::ptr::null(), &mut current);
		libc::sigismember(&current, sig) == 1
	}
}

fn block(sig: libc::c_int) {
	unsafe {
		let mut set: libc::sigset_t = std::mem::zeroed();
		libc::sigemptyset(&mut set);
		libc::sigaddset(&mut set, sig);
		libc::pthread_sigmask(libc::SIG_BLOCK, &set, std::ptr::null_mut());
	}
}

// One test: the I/O signal set is process-wide.
#[cfg(target_os = "linux")]
#[test]
fn io_signals_interrupt_only_inside_the_section() {
	set_io_signals(&[libc::SIGUSR1, 0, 200]);
	assert_eq!(io_signals(), vec![libc::SIGUSR1]);

	block(libc::SIGUSR1);
	{
		let _allowed = IoSignalsAllowed::enter();
		assert!(!is_blocked(libc::SIGUSR1));
	}
	assert!(is_blocked(libc::SIGUSR1));

	unsafe {
		let mut action: libc::sigaction = std::mem::zeroed();
		action.sa_sigaction = on_signal as usize;
		libc::sigemptyset(&mut action.sa_mask);
		// No SA_RESTART: the blocked read must see EINTR.
		action.sa_flags = 0;
		assert_eq!(libc::sigaction(libc::SIGUSR1, &action, std::ptr::null_mut()), 0);
	}

	let (left, right) = stream_pair(Family::Unix).unwrap();
	let reader = unsafe { libc::pthread_self() };
	let poker = std::thread::spawn(move || {
		std::thread::sleep(Duration::from_millis(50));
		unsafe { libc::pthread_kill(reader, libc::SIGUSR1) };
		std::thread::sleep(Duration::from_millis(50));
		left.write(b"x").unwrap();
	});

	let mut buf = [0u8; 1];
	assert_eq!(right.read(&mut buf).unwrap(), 1);
	assert_eq!(&buf, b"x");
	assert!(DELIVERED.load(Ordering::SeqCst));
	assert!(is_blocked(libc::SIGUSR1));
	poker.join().unwrap();

	clear_io_signals();
	assert!(io_signals().is_empty());
	let _noop = IoSignalsAllowed::enter();
	assert!(is_blocked(libc::SIGUSR1));
}
