//! # Task-backed operation (`TaskOperation`)
//!
//! Runs a [`Task`](crate::Task) on a tokio runtime and exposes it to the
//! multiplexer as an [`Operation`].
//!
//! ## Lifecycle
//! ```text
//! new(task, handle)        state = Pending (nothing spawned)
//!   │
//!   ├─► first is_ready()   spawn task.spawn(token) on the runtime,
//!   │                      keep the read half of a socket pair
//!   │                      (the write half lives inside the spawned future)
//!   │
//!   ├─► future finishes    write half dropped ─► read half hits EOF (readable)
//!   │
//!   ├─► is_ready()         EOF but JoinHandle not yet finished ─► drop the
//!   │                      read half, busy-poll until the runtime catches up
//!   │
//!   └─► is_ready()         JoinHandle finished ─► Finished(result) ─► true
//! ```
//!
//! ## Rules
//! - Work starts no sooner than admission: the task is spawned on the first poll.
//! - The readable descriptor lets the multiplexer block in `poll(2)` instead of
//!   busy-polling while the task runs.
//! - A panicking task makes the readiness poll fail with
//!   [`OperationError::Panicked`]; the multiplexer captures it on the entry.
//! - Dropping the operation cancels the task's [`CancellationToken`].

use std::future::Future;
use std::io::{self, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::error::{OperationError, TaskError};
use crate::tasks::{BoxTaskFuture, Task, TaskRef};

use super::operation::{FailureSlot, Operation};

enum TaskState {
    Pending,
    Running {
        join: JoinHandle<Result<(), TaskError>>,
        /// `None` once the write half is gone but the join handle still runs.
        signal: Option<UnixStream>,
    },
    Finished(Result<(), TaskError>),
}

/// Operation running a [`Task`](crate::Task) on a tokio runtime.
///
/// # Example
/// ```no_run
/// use tokio_util::sync::CancellationToken;
/// use waitvisor::{Completions, TaskError, TaskOperation};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let ops = (1..=3).map(|i| {
///     let op = TaskOperation::from_fn(format!("job-{i}"), rt.handle().clone(), move |_ctx: CancellationToken| async move {
///         tokio::time::sleep(std::time::Duration::from_millis(10 * i)).await;
///         Ok::<_, TaskError>(())
///     });
///     (i, op)
/// });
///
/// let mut done = Completions::new(ops).unwrap();
/// while let Some((key, op)) = done.next_resolved() {
///     println!("{key}: {:?}", op.result());
/// }
/// ```
pub struct TaskOperation {
    task: TaskRef,
    runtime: Handle,
    token: CancellationToken,
    state: TaskState,
    failure: FailureSlot,
}

impl TaskOperation {
    /// Creates an operation that will spawn `task` on `runtime` once admitted.
    pub fn new(task: TaskRef, runtime: Handle) -> Self {
        Self {
            task,
            runtime,
            token: CancellationToken::new(),
            state: TaskState::Pending,
            failure: FailureSlot::new(),
        }
    }

    /// Creates an operation running the future made by `f` once admitted.
    ///
    /// `f` is called once, on the first poll, with the operation's
    /// cancellation token.
    pub fn from_fn<F, Fut>(name: impl Into<String>, runtime: Handle, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let task: TaskRef = Arc::new(FnTask {
            name: name.into(),
            make: f,
        });
        Self::new(task, runtime)
    }

    /// Returns the task name.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Returns `true` once the task future has been spawned.
    pub fn is_started(&self) -> bool {
        !matches!(self.state, TaskState::Pending)
    }

    /// Requests cooperative cancellation of the task.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the task outcome.
    ///
    /// - `None` while the task is pending or running;
    /// - `Some(Err(..))` with the captured failure, if polling failed;
    /// - `Some(result)` with the task's own result otherwise.
    pub fn result(&self) -> Option<Result<(), OperationError>> {
        if let Some(err) = self.failure.get() {
            return Some(Err(err.clone()));
        }
        match &self.state {
            TaskState::Finished(res) => Some(res.clone().map_err(OperationError::from)),
            _ => None,
        }
    }

    fn start(&mut self) -> Result<(), OperationError> {
        let (signal, done) = UnixStream::pair()?;
        signal.set_nonblocking(true)?;

        let fut = self.task.spawn(self.token.clone());
        let join = self.runtime.spawn(async move {
            // Dropped on completion, cancellation or panic; the peer then reads EOF.
            let _done = done;
            fut.await
        });

        self.state = TaskState::Running {
            join,
            signal: Some(signal),
        };
        Ok(())
    }
}

/// Closure-backed [`Task`] used by [`TaskOperation::from_fn`].
struct FnTask<F> {
    name: String,
    make: F,
}

impl<F, Fut> Task for FnTask<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
        Box::pin((self.make)(ctx))
    }
}

/// Reports whether the peer of a non-blocking `stream` has closed.
fn signal_closed(stream: &UnixStream) -> io::Result<bool> {
    let mut buf = [0u8; 1];
    let mut reader = stream;
    match reader.read(&mut buf) {
        Ok(0) => Ok(true),
        Ok(_) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
        Err(e) => Err(e),
    }
}

fn join_failure(err: JoinError) -> OperationError {
    if err.is_panic() {
        let payload = err.into_panic();
        let any = &*payload;
        let info = any
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| any.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        OperationError::Panicked { info }
    } else {
        OperationError::Canceled
    }
}

impl Operation for TaskOperation {
    fn is_ready(&mut self) -> Result<bool, OperationError> {
        if let TaskState::Pending = self.state {
            self.start()?;
        }

        let TaskState::Running { join, signal } = &mut self.state else {
            return Ok(true);
        };
        if !join.is_finished() {
            // `_done` drops inside the task before the runtime marks the handle
            // finished. A readable EOF would make poll(2) return at once for
            // that whole gap, so give up the descriptor and busy-poll instead.
            let closed = signal
                .as_ref()
                .is_some_and(|stream| !matches!(signal_closed(stream), Ok(false)));
            if closed {
                *signal = None;
            }
            return Ok(false);
        }

        match join.now_or_never() {
            None => Ok(false),
            Some(Ok(res)) => {
                self.state = TaskState::Finished(res);
                Ok(true)
            }
            Some(Err(err)) => {
                let failure = join_failure(err);
                self.state = TaskState::Finished(Err(TaskError::Fatal {
                    error: failure.as_message(),
                }));
                Err(failure)
            }
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
            TaskState::Running {
                signal: Some(signal),
                ..
            } => vec![signal.as_raw_fd()],
            _ => Vec::new(),
        }
    }
}

impl Drop for TaskOperation {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for TaskOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            TaskState::Pending => "pending",
            TaskState::Running { .. } => "running",
            TaskState::Finished(_) => "finished",
        };
        f.debug_struct("TaskOperation")
            .field("task", &self.task.name())
            .field("state", &state)
            .field("failure", &self.failure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Completions;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .unwrap()
    }

    fn sleeper(rt: &tokio::runtime::Runtime, name: &'static str, ms: u64) -> TaskOperation {
        TaskOperation::from_fn(name, rt.handle().clone(), move |_ctx: CancellationToken| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<_, TaskError>(())
        })
    }

    #[test]
    fn spawns_lazily_on_first_poll() {
        let rt = runtime();
        let mut op = sleeper(&rt, "lazy", 1);
        assert!(!op.is_started());
        assert!(op.readable_descriptors().is_empty());

        let _ = op.is_ready().unwrap();
        assert!(op.is_started());
    }

    #[test]
    fn resolves_in_completion_order() {
        let rt = runtime();
        let entries = vec![
            ("slow", sleeper(&rt, "slow", 400)),
            ("fast", sleeper(&rt, "fast", 5)),
            ("mid", sleeper(&rt, "mid", 150)),
        ];

        let mut done = Completions::new(entries).unwrap();
        let mut order = Vec::new();
        while let Some((key, op)) = done.next_resolved() {
            assert_eq!(op.result(), Some(Ok(())));
            order.push(*key);
        }
        assert_eq!(order, vec!["fast", "mid", "slow"]);
    }

    #[test]
    fn task_error_is_the_result_not_a_poll_failure() {
        let rt = runtime();
        let op = TaskOperation::from_fn("bad", rt.handle().clone(), |_ctx: CancellationToken| async move {
            Err::<(), _>(TaskError::Fail { error: "nope".into() })
        });
        let mut done = Completions::new(vec![(1, op)]).unwrap();

        let (_, op) = done.next_resolved().unwrap();
        assert!(op.captured_failure().is_none());
        assert_eq!(
            op.result(),
            Some(Err(OperationError::Task(TaskError::Fail { error: "nope".into() })))
        );
    }

    #[test]
    fn panic_is_captured_on_the_entry() {
        let rt = runtime();
        let op = TaskOperation::from_fn("boom", rt.handle().clone(), |_ctx: CancellationToken| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<_, TaskError>(())
        });
        let mut done = Completions::new(vec![("boom", op)]).unwrap();

        let (key, op) = done.next_resolved().unwrap();
        assert_eq!(*key, "boom");
        let expected = OperationError::Panicked { info: "kaboom".into() };
        assert_eq!(op.captured_failure(), Some(&expected));
        assert_eq!(op.result(), Some(Err(expected)));
    }

    #[test]
    fn cancel_reaches_the_task() {
        let rt = runtime();
        let mut op = TaskOperation::from_fn("waiter", rt.handle().clone(), |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Canceled)
        });
        assert!(!op.is_ready().unwrap());
        op.cancel();

        let mut done = Completions::new(vec![(0, op)]).unwrap();
        let (_, op) = done.next_resolved().unwrap();
        assert_eq!(op.result(), Some(Err(OperationError::Task(TaskError::Canceled))));
    }

    struct Countdown {
        ticks: u64,
    }

    impl Task for Countdown {
        fn name(&self) -> &str {
            "countdown"
        }

        fn spawn(&self, _ctx: CancellationToken) -> BoxTaskFuture {
            let ticks = self.ticks;
            Box::pin(async move {
                for _ in 0..ticks {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                Ok(())
            })
        }
    }

    #[test]
    fn runs_a_shared_task_implementation() {
        let rt = runtime();
        let task: TaskRef = Arc::new(Countdown { ticks: 3 });
        let entries = vec![
            ("first", TaskOperation::new(Arc::clone(&task), rt.handle().clone())),
            ("second", TaskOperation::new(task, rt.handle().clone())),
        ];
        assert_eq!(entries[0].1.name(), "countdown");

        let mut done = Completions::new(entries).unwrap();
        let mut resolved = 0;
        while let Some((_, op)) = done.next_resolved() {
            assert_eq!(op.result(), Some(Ok(())));
            resolved += 1;
        }
        assert_eq!(resolved, 2);
    }

    #[test]
    fn from_fn_keeps_the_given_name() {
        let rt = runtime();
        let op = sleeper(&rt, "named", 1);
        assert_eq!(op.name(), "named");
        assert!(!op.is_started());
    }

    #[test]
    fn signal_reports_a_closed_peer() {
        let (signal, done) = UnixStream::pair().unwrap();
        signal.set_nonblocking(true).unwrap();
        assert!(!signal_closed(&signal).unwrap());

        drop(done);
        assert!(signal_closed(&signal).unwrap());
    }

    #[test]
    fn closed_signal_falls_back_to_busy_poll() {
        let rt = runtime();
        let (signal, done) = UnixStream::pair().unwrap();
        signal.set_nonblocking(true).unwrap();
        let gate = CancellationToken::new();
        let wait = gate.clone();
        let join = rt.spawn(async move {
            wait.cancelled().await;
            Ok::<_, TaskError>(())
        });

        let mut op = sleeper(&rt, "gap", 1);
        op.state = TaskState::Running {
            join,
            signal: Some(signal),
        };
        assert_eq!(op.readable_descriptors().len(), 1);

        // Write half gone while the join handle is still running.
        drop(done);
        assert!(!op.is_ready().unwrap());
        assert!(op.readable_descriptors().is_empty());

        gate.cancel();
        let mut done = Completions::new(vec![("gap", op)]).unwrap();
        let (_, op) = done.next_resolved().unwrap();
        assert_eq!(op.result(), Some(Ok(())));
    }
}
