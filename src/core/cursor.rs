//! Iteration cursor: what the last step produced.

/// Public iteration state of a [`Completions`](crate::Completions).
///
/// - Unset before the first step and after exhaustion.
/// - Set exactly once per resolved step.
/// - `timed_out` is set only by interval yields and cleared at every step start.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    current: Option<usize>,
    timed_out: bool,
}

impl Cursor {
    /// Unsets the cursor and clears the timeout flag.
    pub(crate) fn begin_step(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn resolve(&mut self, id: usize) {
        self.current = Some(id);
    }

    pub(crate) fn time_out(&mut self) {
        self.timed_out = true;
    }

    pub(crate) fn current(&self) -> Option<usize> {
        self.current
    }

    pub(crate) fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// More iteration to do: an entry is held or the last step timed out.
    pub(crate) fn is_valid(&self) -> bool {
        self.current.is_some() || self.timed_out
    }
}
