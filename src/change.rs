//! Change buffer shared between the sampler and the dispatcher.
//!
//! One flag per line. The sampler only ever *raises* a flag; the dispatcher
//! is the only one that clears them. Flags are atomics so the buffer can be
//! shared by `&'static` reference between the timer context and the
//! foreground loop. Only `load` and `store` are used, which keeps the type
//! usable on cores without compare-and-swap.
//!
//! ```
//! use rs_linewatch::{ChangeBuffer, LineId};
//!
//! static CHANGES: ChangeBuffer = ChangeBuffer::new();
//!
//! CHANGES.raise(LineId::A);
//! assert!(CHANGES.signal().any());
//!
//! CHANGES.clear_all();
//! assert!(!CHANGES.signal().any());
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use crate::lines::LineId;

/// Per-line "changed since last dispatch" flags.
#[derive(Debug, Default)]
pub struct ChangeBuffer {
    flags: [AtomicBool; LineId::COUNT],
}

impl ChangeBuffer {
    /// Creates a buffer with no flags raised.
    pub const fn new() -> Self {
        Self {
            flags: [AtomicBool::new(false), AtomicBool::new(false)],
        }
    }

    /// Raises the flag for `line`. Sampler side only.
    #[inline]
    pub fn raise(&self, line: LineId) {
        self.flags[line.index()].store(true, Ordering::Release);
    }

    /// Returns whether the flag for `line` is raised.
    #[inline]
    pub fn is_raised(&self, line: LineId) -> bool {
        self.flags[line.index()].load(Ordering::Acquire)
    }

    /// Snapshot of all flags.
    pub fn signal(&self) -> ChangeSignal {
        ChangeSignal {
            a: self.is_raised(LineId::A),
            b: self.is_raised(LineId::B),
        }
    }

    /// Clears every flag. Dispatcher side only.
    ///
    /// A flag raised between the dispatcher's read and this call is lost;
    /// the next report still carries the latest line values.
    pub fn clear_all(&self) {
        for flag in &self.flags {
            flag.store(false, Ordering::Release);
        }
    }
}

/// Point-in-time view of the change flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeSignal {
    /// Line A changed since the last dispatch.
    pub a: bool,
    /// Line B changed since the last dispatch.
    pub b: bool,
}

impl ChangeSignal {
    /// Returns true if any line changed.
    #[inline]
    pub const fn any(&self) -> bool {
        self.a || self.b
    }

    /// Returns the flag for one line.
    #[inline]
    pub const fn get(&self, line: LineId) -> bool {
        match line {
            LineId::A => self.a,
            LineId::B => self.b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_clear() {
        let buffer = ChangeBuffer::new();
        assert_eq!(buffer.signal(), ChangeSignal::default());
        assert!(!buffer.signal().any());
    }

    #[test]
    fn flags_are_independent() {
        let buffer = ChangeBuffer::new();
        buffer.raise(LineId::B);

        assert!(!buffer.is_raised(LineId::A));
        assert!(buffer.is_raised(LineId::B));
        assert_eq!(buffer.signal(), ChangeSignal { a: false, b: true });
    }

    #[test]
    fn raise_is_idempotent() {
        let buffer = ChangeBuffer::new();
        buffer.raise(LineId::A);
        buffer.raise(LineId::A);
        assert!(buffer.is_raised(LineId::A));
    }

    #[test]
    fn clear_all_clears_every_flag() {
        let buffer = ChangeBuffer::new();
        buffer.raise(LineId::A);
        buffer.raise(LineId::B);

        buffer.clear_all();

        for line in LineId::ALL {
            assert!(!buffer.is_raised(line));
        }
    }

    #[test]
    fn shared_across_threads() {
        use std::sync::Arc;

        let buffer = Arc::new(ChangeBuffer::new());
        let writer = Arc::clone(&buffer);
        std::thread::spawn(move || writer.raise(LineId::A))
            .join()
            .unwrap();

        assert!(buffer.is_raised(LineId::A));
    }
}
