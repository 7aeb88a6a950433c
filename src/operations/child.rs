//! # Subprocess-backed operation (`ChildOperation`)
//!
//! Spawns a [`Command`] when first polled, captures its stdout through a
//! non-blocking pipe and reports readiness once the pipe reached EOF and the
//! child has been reaped.
//!
//! ## Rules
//! - The process is spawned on the first [`Operation::is_ready`] call, i.e. when
//!   the multiplexer admits the entry.
//! - Stdout is drained on every poll so a chatty child never blocks on a full pipe.
//! - While the pipe is open its read end is the readable descriptor; after EOF
//!   the operation exposes none (the next poll resolves it or busy-polls until
//!   the exit status is available).
//! - A non-zero exit status is reported by [`ChildOperation::result`] as
//!   [`OperationError::Fail`]; a failed spawn is a poll failure.

use std::io::{self, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};

use crate::error::OperationError;

use super::operation::{FailureSlot, Operation};

const READ_CHUNK: usize = 8 * 1024;

/// Output of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildOutput {
    /// Exit status of the process.
    pub status: ExitStatus,
    /// Everything the process wrote to stdout.
    pub stdout: Vec<u8>,
}

enum ChildState {
    Pending,
    Running {
        child: Child,
        pipe: Option<ChildStdout>,
    },
    Exited(ExitStatus),
}

/// Operation backed by a child process.
///
/// # Example
/// ```no_run
/// use std::process::Command;
/// use waitvisor::{ChildOperation, Completions};
///
/// let mut cmd = Command::new("sh");
/// cmd.args(["-c", "echo hello"]);
///
/// let mut done = Completions::new(vec![("hello", ChildOperation::new(cmd))]).unwrap();
/// let (_, op) = done.next_resolved().unwrap();
/// let out = op.result().unwrap().unwrap();
/// assert_eq!(out.stdout, b"hello\n");
/// ```
pub struct ChildOperation {
    command: Command,
    state: ChildState,
    stdout: Vec<u8>,
    failure: FailureSlot,
}

impl ChildOperation {
    /// Creates an operation that will spawn `command` once admitted.
    ///
    /// Stdout is always piped; stdin and stderr are left as configured.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            state: ChildState::Pending,
            stdout: Vec::new(),
            failure: FailureSlot::new(),
        }
    }

    /// Returns `true` once the process has been spawned.
    pub fn is_started(&self) -> bool {
        !matches!(self.state, ChildState::Pending)
    }

    /// OS process id, while the child is running.
    pub fn id(&self) -> Option<u32> {
        match &self.state {
            ChildState::Running { child, .. } => Some(child.id()),
            _ => None,
        }
    }

    /// Stdout collected so far.
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Exit status, once the child has been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self.state {
            ChildState::Exited(status) => Some(status),
            _ => None,
        }
    }

    /// Kills the child if it is running.
    ///
    /// The operation still has to be polled to completion to reap the process.
    pub fn kill(&mut self) -> Result<(), OperationError> {
        if let ChildState::Running { child, .. } = &mut self.state {
            child.kill()?;
        }
        Ok(())
    }

    /// Returns the process outcome.
    ///
    /// - `None` while the child is pending or running;
    /// - `Some(Err(..))` with the captured failure, or [`OperationError::Fail`]
    ///   for a non-zero exit;
    /// - `Some(Ok(output))` otherwise.
    pub fn result(&self) -> Option<Result<ChildOutput, OperationError>> {
        if let Some(err) = self.failure.get() {
            return Some(Err(err.clone()));
        }
        let status = self.exit_status()?;
        if status.success() {
            Some(Ok(ChildOutput {
                status,
                stdout: self.stdout.clone(),
            }))
        } else {
            Some(Err(OperationError::Fail {
                error: format!("{:?} exited with {status}", self.command.get_program()),
            }))
        }
    }

    fn start(&mut self) -> Result<(), OperationError> {
        let mut child = self.command.stdout(Stdio::piped()).spawn()?;
        let pipe = child.stdout.take();
        if let Some(p) = &pipe {
            if let Err(e) = set_nonblocking(p.as_raw_fd()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        }
        self.state = ChildState::Running { child, pipe };
        Ok(())
    }
}

/// Drains everything currently available; returns `true` on EOF.
fn drain(pipe: &mut ChildStdout, out: &mut Vec<u8>) -> io::Result<bool> {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match pipe.read(&mut buf) {
            Ok(0) => return Ok(true),
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    // SAFETY: `fd` is owned by a live `ChildStdout`; F_GETFL/F_SETFL do not touch memory.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl Operation for ChildOperation {
    fn is_ready(&mut self) -> Result<bool, OperationError> {
        if let ChildState::Pending = self.state {
            self.start()?;
        }

        let ChildState::Running { child, pipe } = &mut self.state else {
            return Ok(true);
        };

        if let Some(p) = pipe {
            if drain(p, &mut self.stdout)? {
                *pipe = None;
            } else {
                return Ok(false);
            }
        }

        match child.try_wait()? {
            Some(status) => {
                self.state = ChildState::Exited(status);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn captured_failure(&self) -> Option<&OperationError> {
        self.failure.get()
    }

    fn capture_failure(&mut self, err: OperationError) {
        self.failure.set(err);
    }

    fn readable_descriptors(&self) -> Vec<RawFd> {
        match &self.state {
            ChildState::Running { pipe: Some(p), .. } => vec![p.as_raw_fd()],
            _ => Vec::new(),
        }
    }
}

impl Drop for ChildOperation {
    fn drop(&mut self) {
        if let ChildState::Running { child, .. } = &mut self.state {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl std::fmt::Debug for ChildOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildOperation")
            .field("program", &self.command.get_program())
            .field("pid", &self.id())
            .field("exit_status", &self.exit_status())
            .field("failure", &self.failure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Completions;

    fn sh(script: &str) -> ChildOperation {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        ChildOperation::new(cmd)
    }

    #[test]
    fn children_resolve_in_completion_order() {
        let entries = vec![
            ("slow", sh("sleep 0.4; echo slow")),
            ("fast", sh("echo fast")),
        ];
        let mut done = Completions::new(entries).unwrap();

        let mut seen = Vec::new();
        while let Some((key, op)) = done.next_resolved() {
            let out = op.result().unwrap().unwrap();
            assert_eq!(out.stdout, format!("{key}\n").into_bytes());
            seen.push(*key);
        }
        assert_eq!(seen, vec!["fast", "slow"]);
    }

    #[test]
    fn non_zero_exit_is_a_result_error() {
        let mut done = Completions::new(vec![("f", sh("exit 3"))]).unwrap();
        let (_, op) = done.next_resolved().unwrap();

        assert!(op.captured_failure().is_none());
        assert_eq!(op.exit_status().and_then(|s| s.code()), Some(3));
        assert!(matches!(op.result(), Some(Err(OperationError::Fail { .. }))));
    }

    #[test]
    fn spawn_failure_is_captured_and_yielded() {
        let missing = ChildOperation::new(Command::new("/definitely/not/a/binary"));
        let mut done = Completions::new(vec![("missing", missing), ("ok", sh("true"))]).unwrap();

        let (key, op) = done.next_resolved().unwrap();
        assert_eq!(*key, "missing");
        assert!(matches!(
            op.result(),
            Some(Err(OperationError::Io {
                kind: io::ErrorKind::NotFound,
                ..
            }))
        ));

        let (key, op) = done.next_resolved().unwrap();
        assert_eq!(*key, "ok");
        assert!(op.result().unwrap().is_ok());
        assert!(done.next_resolved().is_none());
    }

    #[test]
    fn limit_defers_spawning_until_admission() {
        let entries = vec![("first", sh("sleep 0.3")), ("second", sh("true"))];
        let mut done = Completions::builder(entries)
            .limit(1)
            .update_interval(Duration::from_millis(50))
            .build()
            .unwrap();

        done.reset();
        assert!(done.timed_out());
        assert!(done.get(&"first").unwrap().is_started());
        assert!(!done.get(&"second").unwrap().is_started());

        while done.timed_out() {
            done.advance();
        }
        assert_eq!(done.current_key(), Some(&"first"));
        // Admitted (and spawned) as soon as "first" left the window.
        assert!(done.get(&"second").unwrap().is_started());

        let (key, _) = done.next_resolved().unwrap();
        assert_eq!(*key, "second");
    }

    #[test]
    fn large_output_does_not_block_the_child() {
        let mut done = Completions::new(vec![("big", sh("head -c 200000 /dev/zero"))]).unwrap();
        let (_, op) = done.next_resolved().unwrap();
        assert_eq!(op.result().unwrap().unwrap().stdout.len(), 200_000);
    }
}
