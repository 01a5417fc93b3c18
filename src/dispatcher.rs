//! Foreground dispatcher.
//!
//! Once per loop iteration the dispatcher looks at the [`ChangeBuffer`]. If
//! any flag is raised it re-reads the *current* line values, hands them to
//! the publish callback, and then clears every flag.
//!
//! The values reported are the freshest ones, not the ones seen when the
//! flag was raised, so a line that toggled and came back is still reported
//! (with its present value). Flags are cleared after the publish returns,
//! so an edge raised after the read is lost: it is not in this report and
//! its flag is gone. The line is reported again only on its next edge.

use crate::change::{ChangeBuffer, ChangeSignal};
use crate::lines::LineValues;
use crate::traits::LineInput;

/// A completed dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatch<R> {
    /// Flags that triggered the dispatch.
    pub signal: ChangeSignal,
    /// Values handed to the publisher.
    pub values: LineValues,
    /// What the publisher returned.
    pub outcome: R,
}

/// Change-buffer consumer for the foreground loop.
pub struct Dispatcher<'a, L: LineInput> {
    lines: L,
    changes: &'a ChangeBuffer,
    dispatched: u32,
}

impl<'a, L: LineInput> Dispatcher<'a, L> {
    /// Creates a dispatcher reading `lines` and draining `changes`.
    pub fn new(lines: L, changes: &'a ChangeBuffer) -> Self {
        Self {
            lines,
            changes,
            dispatched: 0,
        }
    }

    /// Run one dispatcher iteration.
    ///
    /// Returns `None` when no flag was raised (the callback is not invoked).
    ///
    /// ```
    /// use rs_linewatch::{ChangeBuffer, Dispatcher, LineId, LineValues};
    /// use rs_linewatch::hal::MockLines;
    ///
    /// let lines = MockLines::new(LineValues::new(true, false));
    /// let changes = ChangeBuffer::new();
    /// let mut dispatcher = Dispatcher::new(&lines, &changes);
    ///
    /// assert!(dispatcher.poll(|_| ()).is_none());
    ///
    /// changes.raise(LineId::A);
    /// let dispatch = dispatcher.poll(|values| values.a).unwrap();
    /// assert!(dispatch.outcome);
    /// assert!(!changes.signal().any());
    /// ```
    pub fn poll<F, R>(&mut self, publish: F) -> Option<Dispatch<R>>
    where
        F: FnOnce(LineValues) -> R,
    {
        let signal = self.changes.signal();
        if !signal.any() {
            return None;
        }

        let values = self.lines.read_all();
        let outcome = publish(values);
        self.changes.clear_all();
        self.dispatched = self.dispatched.wrapping_add(1);

        Some(Dispatch {
            signal,
            values,
            outcome,
        })
    }

    /// Number of dispatches performed.
    pub fn dispatched(&self) -> u32 {
        self.dispatched
    }
}
