//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [started] entries=3
//! [admitted] key="build" window=2
//! [failed] key="lint" err="operation failed: exit 1"
//! [resolved] key="build" step_ms=120
//! [interval] interval_ms=500 pending=1
//! [busy-poll] window=2
//! [exhausted] resolved=3
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn or_unknown(s: &Option<std::sync::Arc<str>>) -> &str {
    s.as_deref().unwrap_or("unknown")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::IterationStarted => {
                println!("[started] entries={:?}", e.count.unwrap_or(0));
            }
            EventKind::IterationExhausted => {
                println!("[exhausted] resolved={:?}", e.count.unwrap_or(0));
            }
            EventKind::EntryAdmitted => {
                println!("[admitted] key={} window={:?}", or_unknown(&e.key), e.count);
            }
            EventKind::EntryResolved => match e.reason.as_deref() {
                Some(err) => println!(
                    "[resolved] key={} step_ms={:?} err={err:?}",
                    or_unknown(&e.key),
                    e.elapsed_ms
                ),
                None => println!("[resolved] key={} step_ms={:?}", or_unknown(&e.key), e.elapsed_ms),
            },
            EventKind::EntryFailed => {
                println!("[failed] key={} err={:?}", or_unknown(&e.key), or_unknown(&e.reason));
            }
            EventKind::IntervalElapsed => {
                println!("[interval] interval_ms={:?} pending={:?}", e.elapsed_ms, e.count);
            }
            EventKind::BusyPollFallback => {
                println!("[busy-poll] window={:?}", e.count);
            }
            EventKind::WaitFailed => {
                println!("[wait-failed] err={:?}", or_unknown(&e.reason));
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={} reason={}",
                    or_unknown(&e.key),
                    or_unknown(&e.reason)
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={} info={}",
                    or_unknown(&e.key),
                    or_unknown(&e.reason),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
