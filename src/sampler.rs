//! Periodic edge sampler.
//!
//! The sampler runs in the timer context on a fixed period. Each run reads
//! both lines, compares them with the last recorded value, and raises the
//! line's flag in the shared [`ChangeBuffer`] on a difference. It never
//! clears a flag, never blocks, and never stops itself.
//!
//! The initial reading is taken in [`Sampler::new`], before the periodic
//! task is registered, so the first scheduled run cannot report an edge that
//! did not happen.
//!
//! # Example
//!
//! ```rust
//! use rs_linewatch::{ChangeBuffer, LineId, LineValues, Sampler};
//! use rs_linewatch::hal::MockLines;
//!
//! let lines = MockLines::new(LineValues::new(false, false));
//! let changes = ChangeBuffer::new();
//! let mut sampler = Sampler::new(&lines, &changes);
//!
//! sampler.sample();
//! assert!(!changes.signal().any());
//!
//! lines.set(LineId::A, true);
//! sampler.sample();
//! assert!(changes.is_raised(LineId::A));
//! assert!(!changes.is_raised(LineId::B));
//! ```

use crate::change::{ChangeBuffer, ChangeSignal};
use crate::lines::{LineId, LineState, LineValues};
use crate::traits::LineInput;

/// Edge sampler for the monitored lines.
pub struct Sampler<'a, L: LineInput> {
    lines: L,
    changes: &'a ChangeBuffer,
    last_stable: LineValues,
}

impl<'a, L: LineInput> Sampler<'a, L> {
    /// Creates a sampler, seeding the stable values from the current reading.
    pub fn new(lines: L, changes: &'a ChangeBuffer) -> Self {
        let last_stable = lines.read_all();
        Self {
            lines,
            changes,
            last_stable,
        }
    }

    /// Sample both lines once.
    ///
    /// Returns the lines that changed on *this* run (not the accumulated
    /// buffer state).
    pub fn sample(&mut self) -> ChangeSignal {
        let mut edges = ChangeSignal::default();
        for line in LineId::ALL {
            let current = self.lines.read(line);
            if current != self.last_stable.get(line) {
                self.last_stable.set(line, current);
                self.changes.raise(line);
                match line {
                    LineId::A => edges.a = true,
                    LineId::B => edges.b = true,
                }
            }
        }
        edges
    }

    /// Values recorded at the most recent sample.
    pub fn last_stable(&self) -> LineValues {
        self.last_stable
    }

    /// Combined state of one line: stable value plus its pending flag.
    pub fn line_state(&self, line: LineId) -> LineState {
        LineState {
            last_stable_value: self.last_stable.get(line),
            changed_since_dispatch: self.changes.is_raised(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockLines;

    #[test]
    fn no_spurious_initial_edge() {
        for (a, b) in [(false, false), (true, false), (false, true), (true, true)] {
            let lines = MockLines::new(LineValues::new(a, b));
            let changes = ChangeBuffer::new();
            let mut sampler = Sampler::new(&lines, &changes);

            let edges = sampler.sample();

            assert!(!edges.any());
            assert!(!changes.signal().any());
            assert_eq!(sampler.last_stable(), LineValues::new(a, b));
        }
    }

    #[test]
    fn flag_set_iff_reading_differs() {
        let lines = MockLines::new(LineValues::default());
        let changes = ChangeBuffer::new();
        let mut sampler = Sampler::new(&lines, &changes);

        // (reading of A, reading of B) fed one per sample
        let readings = [
            (false, false),
            (true, false),
            (true, false),
            (true, true),
            (false, true),
            (false, true),
            (false, false),
        ];
        let mut previous = LineValues::default();
        for (a, b) in readings {
            changes.clear_all();
            lines.set_all(LineValues::new(a, b));

            let edges = sampler.sample();

            assert_eq!(edges.a, a != previous.a);
            assert_eq!(edges.b, b != previous.b);
            assert_eq!(changes.signal(), edges);
            assert_eq!(sampler.last_stable(), LineValues::new(a, b));
            previous = LineValues::new(a, b);
        }
    }

    #[test]
    fn sampler_never_clears_a_flag() {
        let lines = MockLines::new(LineValues::default());
        let changes = ChangeBuffer::new();
        let mut sampler = Sampler::new(&lines, &changes);

        lines.set(LineId::A, true);
        sampler.sample();
        assert!(changes.is_raised(LineId::A));

        // Stable readings afterwards leave the flag up
        for _ in 0..10 {
            sampler.sample();
        }
        assert!(changes.is_raised(LineId::A));

        // Returning to the old value is another edge, flag stays up
        lines.set(LineId::A, false);
        let edges = sampler.sample();
        assert!(edges.a);
        assert!(changes.is_raised(LineId::A));
    }

    #[test]
    fn line_state_reflects_buffer() {
        let lines = MockLines::new(LineValues::default());
        let changes = ChangeBuffer::new();
        let mut sampler = Sampler::new(&lines, &changes);

        lines.set(LineId::B, true);
        sampler.sample();

        assert_eq!(
            sampler.line_state(LineId::B),
            LineState {
                last_stable_value: true,
                changed_since_dispatch: true,
            }
        );
        assert_eq!(sampler.line_state(LineId::A), LineState::default());

        changes.clear_all();
        assert!(!sampler.line_state(LineId::B).changed_since_dispatch);
        assert!(sampler.line_state(LineId::B).last_stable_value);
    }
}
