//! Hardware abstraction traits for input lines, status indicators and timers.
//!
//! These are the seams that let the edge-detection pipeline run on ESP32,
//! on a desktop simulation, or against the mocks in [`crate::hal::mock`].
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`LineInput`] | Read the logical value of the monitored lines |
//! | [`StatusIndicator`] | Drive the success / failure / activity lights |
//! | [`PeriodicScheduler`] | Run the sampler on a fixed period |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! # Example
//!
//! ```rust
//! use rs_linewatch::traits::LineInput;
//! use rs_linewatch::hal::MockLines;
//! use rs_linewatch::{LineId, LineValues};
//!
//! let lines = MockLines::new(LineValues::new(false, true));
//! assert!(!lines.read(LineId::A));
//! assert_eq!(lines.read_all(), LineValues::new(false, true));
//! ```

use crate::lines::{LineId, LineValues};

/// Source of logical line values.
///
/// Implementations apply the configured [`Polarity`](crate::Polarity) so
/// that `true` always means "active". Reads take `&self` because the same
/// handle is read from both the sampler context and the foreground loop.
///
/// # Implementation Notes
///
/// - Reading a digital input cannot fail
/// - `read` must be cheap enough to call from the sampler period
pub trait LineInput {
    /// Returns the current logical value of `line`.
    fn read(&self, line: LineId) -> bool;

    /// Reads both lines.
    fn read_all(&self) -> LineValues {
        LineValues {
            a: self.read(LineId::A),
            b: self.read(LineId::B),
        }
    }
}

impl<T: LineInput + ?Sized> LineInput for &T {
    #[inline]
    fn read(&self, line: LineId) -> bool {
        (**self).read(line)
    }
}

#[cfg(feature = "std")]
impl<T: LineInput + ?Sized> LineInput for std::sync::Arc<T> {
    #[inline]
    fn read(&self, line: LineId) -> bool {
        (**self).read(line)
    }
}

/// The logical status lights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Lit while the broker connection is established.
    Success,
    /// Lit after a connection failure.
    Failure,
    /// Pulsed after each accepted publish.
    Activity,
}

/// Status indicator trait.
///
/// Visual feedback only; failures to drive an indicator are logged by the
/// caller and never affect the pipeline.
pub trait StatusIndicator {
    /// Error type for indicator operations.
    type Error;

    /// Turn one indicator on or off.
    fn set(&mut self, indicator: Indicator, on: bool) -> Result<(), Self::Error>;
}

/// Fixed-period task scheduler.
///
/// Used once at startup to register the sampler. Registered tasks are
/// perpetual: they run every `period_us` until the process resets.
///
/// # Implementation Notes
///
/// - The task runs in a context that may preempt the foreground loop
/// - The task must never block or sleep
/// - Registration failure is fatal at startup
pub trait PeriodicScheduler {
    /// Error type for registration.
    type Error: core::fmt::Debug;

    /// Run `task` every `period_us` microseconds.
    fn schedule_every<F>(&mut self, period_us: u32, task: F) -> Result<(), Self::Error>
    where
        F: FnMut() + Send + 'static;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for indicator pulses and the
/// reconnect policy.
///
/// # Example
///
/// ```rust
/// use rs_linewatch::traits::Clock;
/// use rs_linewatch::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLines(LineValues);

    impl LineInput for FixedLines {
        fn read(&self, line: LineId) -> bool {
            self.0.get(line)
        }
    }

    #[test]
    fn read_all_default_impl() {
        let lines = FixedLines(LineValues::new(true, false));
        assert_eq!(lines.read_all(), LineValues::new(true, false));
    }

    #[test]
    fn line_input_through_reference() {
        let lines = FixedLines(LineValues::new(false, true));
        let by_ref = &lines;
        assert!(by_ref.read(LineId::B));
        assert!(!by_ref.read(LineId::A));
    }

    #[test]
    fn line_input_through_arc() {
        let lines = std::sync::Arc::new(FixedLines(LineValues::new(true, true)));
        assert_eq!(lines.read_all(), LineValues::new(true, true));
    }
}
