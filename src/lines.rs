//! Monitored input lines and their logical values.
//!
//! The node watches exactly two digital inputs, `lineA` and `lineB`. All
//! core code works with *logical* values: `true` means the line is active.
//! Hardware backends convert raw pin levels using a [`Polarity`].

use core::fmt;

/// Identifies one of the two monitored input lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineId {
    /// First input line.
    A,
    /// Second input line.
    B,
}

impl LineId {
    /// Number of monitored lines.
    pub const COUNT: usize = 2;

    /// All lines in reporting order.
    pub const ALL: [LineId; Self::COUNT] = [LineId::A, LineId::B];

    /// Index of this line into per-line arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            LineId::A => 0,
            LineId::B => 1,
        }
    }

    /// Label used in published payloads.
    ///
    /// ```
    /// use rs_linewatch::LineId;
    ///
    /// assert_eq!(LineId::A.label(), "lineA");
    /// assert_eq!(LineId::B.label(), "lineB");
    /// ```
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            LineId::A => "lineA",
            LineId::B => "lineB",
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current logical value of both lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineValues {
    /// Value of line A (`true` = active).
    pub a: bool,
    /// Value of line B (`true` = active).
    pub b: bool,
}

impl LineValues {
    /// Creates a value tuple.
    pub const fn new(a: bool, b: bool) -> Self {
        Self { a, b }
    }

    /// Returns the value of one line.
    #[inline]
    pub const fn get(&self, line: LineId) -> bool {
        match line {
            LineId::A => self.a,
            LineId::B => self.b,
        }
    }

    /// Sets the value of one line.
    #[inline]
    pub fn set(&mut self, line: LineId, value: bool) {
        match line {
            LineId::A => self.a = value,
            LineId::B => self.b = value,
        }
    }
}

/// Per-line edge-detection state.
///
/// `last_stable_value` is owned by the sampler. `changed_since_dispatch` is
/// raised by the sampler and cleared only by the dispatcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineState {
    /// Value recorded at the most recent sample.
    pub last_stable_value: bool,
    /// Whether an edge has been seen since the last dispatch.
    pub changed_since_dispatch: bool,
}

/// Mapping between raw pin level and logical value.
///
/// Buttons wired to ground with a pull-up read low when pressed, so the
/// default is [`ActiveLow`](Self::ActiveLow): a low pin is reported as
/// `true`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Polarity {
    /// Low level = active (`true`).
    #[default]
    ActiveLow,
    /// High level = active (`true`).
    ActiveHigh,
}

impl Polarity {
    /// Converts a raw pin level to a logical value.
    ///
    /// ```
    /// use rs_linewatch::Polarity;
    ///
    /// assert!(Polarity::ActiveLow.logical(false));
    /// assert!(!Polarity::ActiveLow.logical(true));
    /// assert!(Polarity::ActiveHigh.logical(true));
    /// ```
    #[inline]
    pub const fn logical(self, raw_high: bool) -> bool {
        match self {
            Polarity::ActiveLow => !raw_high,
            Polarity::ActiveHigh => raw_high,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_indices_are_dense() {
        for (i, line) in LineId::ALL.iter().enumerate() {
            assert_eq!(line.index(), i);
        }
    }

    #[test]
    fn line_values_get_set() {
        let mut values = LineValues::default();
        assert!(!values.get(LineId::A));

        values.set(LineId::B, true);
        assert_eq!(values, LineValues::new(false, true));
        assert!(values.get(LineId::B));
    }

    #[test]
    fn line_display_uses_label() {
        assert_eq!(format!("{}", LineId::B), "lineB");
    }

    #[test]
    fn polarity_default_is_active_low() {
        assert_eq!(Polarity::default(), Polarity::ActiveLow);
    }
}
