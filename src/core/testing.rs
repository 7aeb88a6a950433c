//! Deterministic fakes for multiplexer tests.

use std::cell::Cell;
use std::io;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::Duration;

use crate::core::waiter::DescriptorWait;
use crate::error::OperationError;
use crate::operations::{FailureSlot, Operation};

type Wait = (Vec<RawFd>, Vec<RawFd>, Option<Duration>);

/// Records every call; sleeps for real so interval budgets elapse.
///
/// A wait without timeout returns at once (as if a descriptor fired), a wait
/// with timeout sleeps through it (as if nothing fired).
#[derive(Debug, Default)]
pub(crate) struct FakeWaiter {
    waits: Vec<Wait>,
    sleeps: usize,
    fail: bool,
}

impl FakeWaiter {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn waits(&self) -> usize {
        self.waits.len()
    }

    pub(crate) fn sleeps(&self) -> usize {
        self.sleeps
    }

    pub(crate) fn last_wait(&self) -> Option<Wait> {
        self.waits.last().cloned()
    }
}

impl DescriptorWait for FakeWaiter {
    fn wait(
        &mut self,
        readable: &[RawFd],
        writable: &[RawFd],
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        self.waits
            .push((readable.to_vec(), writable.to_vec(), timeout));
        if self.fail {
            return Err(io::Error::other("poll failed"));
        }
        if let Some(t) = timeout {
            std::thread::sleep(t);
        }
        Ok(())
    }

    fn sleep(&mut self, quantum: Duration) {
        self.sleeps += 1;
        std::thread::sleep(quantum);
    }
}

#[derive(Debug, Clone, Copy)]
enum Script {
    ReadyAfter(u64),
    Never,
    Fail(&'static str),
}

/// Operation following a fixed readiness script.
#[derive(Debug)]
pub(crate) struct Scripted {
    script: Script,
    polls: Rc<Cell<u64>>,
    readable: Vec<RawFd>,
    writable: Vec<RawFd>,
    first_poll_delay: Duration,
    failure: FailureSlot,
}

impl Scripted {
    fn new(script: Script) -> Self {
        Self {
            script,
            polls: Rc::new(Cell::new(0)),
            readable: Vec::new(),
            writable: Vec::new(),
            first_poll_delay: Duration::ZERO,
            failure: FailureSlot::new(),
        }
    }

    /// Ready on every poll.
    pub(crate) fn ready() -> Self {
        Self::new(Script::ReadyAfter(1))
    }

    /// Ready from the `n`-th poll on (1-based).
    pub(crate) fn ready_after(n: u64) -> Self {
        Self::new(Script::ReadyAfter(n))
    }

    /// Never ready, no descriptors.
    pub(crate) fn pending() -> Self {
        Self::new(Script::Never)
    }

    /// Never ready, one readable descriptor.
    pub(crate) fn pending_with_fd(fd: RawFd) -> Self {
        Self::pending().with_fds(&[fd], &[])
    }

    /// Every poll raises `OperationError::Fail`.
    pub(crate) fn failing(msg: &'static str) -> Self {
        Self::new(Script::Fail(msg))
    }

    pub(crate) fn with_fds(mut self, readable: &[RawFd], writable: &[RawFd]) -> Self {
        self.readable = readable.to_vec();
        self.writable = writable.to_vec();
        self
    }

    /// The first poll blocks for `delay`, like an operation spawning its work.
    pub(crate) fn with_slow_first_poll(mut self, delay: Duration) -> Self {
        self.first_poll_delay = delay;
        self
    }

    pub(crate) fn polls(&self) -> u64 {
        self.polls.get()
    }

    /// Shared poll counter, readable after the operation moved into a multiplexer.
    pub(crate) fn poll_counter(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.polls)
    }

    /// The value a caller would fetch: the captured failure, if any.
    pub(crate) fn result(&self) -> Result<(), OperationError> {
        self.failure.check()
    }
}

impl Operation for Scripted {
    fn is_ready(&mut self) -> Result<bool, OperationError> {
        let n = self.polls.get() + 1;
        self.polls.set(n);
        if n == 1 && !self.first_poll_delay.is_zero() {
            std::thread::sleep(self.first_poll_delay);
        }
        match self.script {
            Script::ReadyAfter(k) => Ok(n >= k),
            Script::Never => Ok(false),
            Script::Fail(msg) => Err(OperationError::Fail { error: msg.into() }),
        }
    }

    fn captured_failure(&self) -> Option<&OperationError> {
        self.failure.get()
    }

    fn capture_failure(&mut self, err: OperationError) {
        self.failure.set(err);
    }

    fn readable_descriptors(&self) -> Vec<RawFd> {
        self.readable.clone()
    }

    fn writable_descriptors(&self) -> Vec<RawFd> {
        self.writable.clone()
    }
}
