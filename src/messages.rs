//! Outgoing MQTT message construction.
//!
//! Line reports use a fixed human-readable template:
//!
//! ```text
//! lineA: true, lineB: false
//! ```
//!
//! Messages are built on the stack (`heapless`) for every dispatch and
//! handed straight to the transport.

use core::fmt::Write;

use heapless::String as HString;

use crate::lines::{LineId, LineValues};

/// Capacity of a line report payload.
pub const MAX_PAYLOAD: usize = 48;

/// Line report payload buffer.
pub type Payload = HString<MAX_PAYLOAD>;

/// Format the line report payload for `values`.
///
/// # Examples
///
/// ```
/// use rs_linewatch::messages::format_line_payload;
/// use rs_linewatch::LineValues;
///
/// let payload = format_line_payload(LineValues::new(true, false));
/// assert_eq!(payload.as_str(), "lineA: true, lineB: false");
/// ```
pub fn format_line_payload(values: LineValues) -> Payload {
    let mut payload = Payload::new();
    for (i, line) in LineId::ALL.iter().enumerate() {
        if i > 0 {
            let _ = payload.push_str(", ");
        }
        // Longest report is 26 bytes, well inside MAX_PAYLOAD
        let _ = write!(payload, "{}: {}", line.label(), values.get(*line));
    }
    payload
}

/// A single message ready for the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage<'a> {
    /// Destination topic.
    pub topic: &'a str,
    /// Message body.
    pub payload: Payload,
}

impl<'a> OutgoingMessage<'a> {
    /// Build a line report for `topic`.
    pub fn line_report(topic: &'a str, values: LineValues) -> Self {
        Self {
            topic,
            payload: format_line_payload(values),
        }
    }

    /// Payload as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }

    /// Payload as text.
    pub fn payload_str(&self) -> &str {
        self.payload.as_str()
    }
}
