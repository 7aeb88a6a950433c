//! # Descriptor wait port.
//!
//! The multiplexer never calls the OS directly: it blocks through a
//! [`DescriptorWait`] implementation, so tests can substitute a deterministic
//! fake for real I/O waits.
//!
//! - [`DescriptorWait::wait`] blocks until one of the descriptors is ready or
//!   the timeout elapses (`None` = no timeout).
//! - [`DescriptorWait::sleep`] is the busy-poll quantum used when some admitted
//!   entry exposes no descriptors.
//!
//! [`PollWaiter`] is the default implementation over `poll(2)`.

use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Blocking primitive used by the multiplexer.
pub trait DescriptorWait {
    /// Blocks until a descriptor is ready or `timeout` elapses.
    ///
    /// Spurious early returns are allowed; the multiplexer rescans afterwards.
    fn wait(
        &mut self,
        readable: &[RawFd],
        writable: &[RawFd],
        timeout: Option<Duration>,
    ) -> io::Result<()>;

    /// Sleeps for one busy-poll quantum.
    fn sleep(&mut self, quantum: Duration) {
        std::thread::sleep(quantum);
    }
}

impl<W: DescriptorWait + ?Sized> DescriptorWait for &mut W {
    fn wait(
        &mut self,
        readable: &[RawFd],
        writable: &[RawFd],
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        (**self).wait(readable, writable, timeout)
    }

    fn sleep(&mut self, quantum: Duration) {
        (**self).sleep(quantum)
    }
}

/// [`DescriptorWait`] over `poll(2)`.
///
/// Readable descriptors are polled for `POLLIN`, writable ones for `POLLOUT`;
/// hang-ups and errors wake the wait as well. `EINTR` is reported as a normal
/// (early) return.
#[derive(Debug, Default, Clone, Copy)]
pub struct PollWaiter;

impl PollWaiter {
    /// Creates a new waiter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Converts a timeout to `poll(2)` milliseconds, rounding up so a sub-millisecond
/// budget still blocks instead of spinning.
fn timeout_ms(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(d) => {
            let mut ms = d.as_millis();
            if Duration::from_millis(ms as u64) < d {
                ms += 1;
            }
            ms.min(libc::c_int::MAX as u128) as libc::c_int
        }
    }
}

impl DescriptorWait for PollWaiter {
    fn wait(
        &mut self,
        readable: &[RawFd],
        writable: &[RawFd],
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        let mut fds: Vec<libc::pollfd> = readable
            .iter()
            .map(|&fd| (fd, libc::POLLIN))
            .chain(writable.iter().map(|&fd| (fd, libc::POLLOUT)))
            .map(|(fd, events)| libc::pollfd {
                fd,
                events,
                revents: 0,
            })
            .collect();

        // SAFETY: `fds` is a valid, exclusively borrowed array of `fds.len()` pollfd structs.
        let rc = unsafe {
            libc::poll(
                fds.as_mut_ptr(),
                fds.len() as libc::nfds_t,
                timeout_ms(timeout),
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }
        Ok(())
    }
}
