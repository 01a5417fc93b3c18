//! Foreground loop of an edge node.
//!
//! [`EdgeNode`] ties the [`Dispatcher`] to the [`Publisher`]. The binary
//! calls [`tick`](EdgeNode::tick) once per loop iteration and sleeps in
//! between; nothing in here blocks.
//!
//! # Example
//!
//! ```rust
//! use rs_linewatch::{ChangeBuffer, ConnectionState, ConnectionStatus, EdgeNode, LineId,
//!     LineValues, MqttConfig, Publisher};
//! use rs_linewatch::hal::{MockIndicator, MockLines, MockTransport};
//!
//! let lines = MockLines::new(LineValues::default());
//! let changes = ChangeBuffer::new();
//! let publisher = Publisher::new(
//!     MockTransport::new(),
//!     MockIndicator::new(),
//!     MqttConfig::default().with_host("10.0.0.2"),
//!     500,
//! );
//! let mut node = EdgeNode::new(&lines, &changes, publisher);
//!
//! node.start(0);
//! node.publisher_mut().transport_mut().queue_status(ConnectionStatus::Accepted);
//!
//! lines.set(LineId::A, true);
//! changes.raise(LineId::A);
//! let report = node.tick(1);
//!
//! assert_eq!(report.notifications, 1);
//! assert_eq!(report.dispatched, Some(LineValues::new(true, false)));
//! assert!(report.published);
//! assert_eq!(node.state(), ConnectionState::Connected);
//! ```

use log::info;

use crate::change::ChangeBuffer;
use crate::dispatcher::Dispatcher;
use crate::lines::LineValues;
use crate::publisher::{ConnectionState, Publisher};
use crate::traits::{LineInput, MqttTransport, StatusIndicator};

/// What one loop iteration did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Connection notifications handled.
    pub notifications: usize,
    /// Values handed to the publisher, if a dispatch happened.
    pub dispatched: Option<LineValues>,
    /// Whether the dispatched report was accepted by the transport.
    pub published: bool,
    /// Whether the reconnect policy re-initialized the connection.
    pub reconnect_attempted: bool,
}

/// Dispatcher and publisher driven from the foreground loop.
pub struct EdgeNode<'a, L, T, S>
where
    L: LineInput,
    T: MqttTransport,
    S: StatusIndicator,
{
    dispatcher: Dispatcher<'a, L>,
    publisher: Publisher<T, S>,
    failed_since: Option<u64>,
}

impl<'a, L, T, S> EdgeNode<'a, L, T, S>
where
    L: LineInput,
    T: MqttTransport,
    S: StatusIndicator,
{
    /// Creates a node. The connection is not requested until
    /// [`start`](Self::start).
    pub fn new(lines: L, changes: &'a ChangeBuffer, publisher: Publisher<T, S>) -> Self {
        Self {
            dispatcher: Dispatcher::new(lines, changes),
            publisher,
            failed_since: None,
        }
    }

    /// Request the broker connection.
    ///
    /// A failure here leaves the node running with the MQTT side in
    /// `Failed`; the publisher has already logged it.
    pub fn start(&mut self, now_ms: u64) {
        if self.publisher.initialize().is_err() {
            self.failed_since = Some(now_ms);
        }
    }

    /// Run one foreground loop iteration.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        let mut report = TickReport {
            notifications: self.publisher.process_events(),
            ..TickReport::default()
        };

        let publisher = &mut self.publisher;
        if let Some(dispatch) = self
            .dispatcher
            .poll(|values| publisher.publish(values, now_ms).is_ok())
        {
            report.dispatched = Some(dispatch.values);
            report.published = dispatch.outcome;
        }

        self.publisher.update(now_ms);
        report.reconnect_attempted = self.apply_reconnect_policy(now_ms);
        report
    }

    fn apply_reconnect_policy(&mut self, now_ms: u64) -> bool {
        if self.publisher.state() != ConnectionState::Failed {
            self.failed_since = None;
            return false;
        }
        let since = *self.failed_since.get_or_insert(now_ms);

        let Some(interval) = self.publisher.config().reconnect_interval() else {
            return false;
        };
        if now_ms.saturating_sub(since) < interval as u64 {
            return false;
        }

        info!("[MQTT] Retrying connection after {} ms", interval);
        self.failed_since = None;
        if self.publisher.initialize().is_err() {
            self.failed_since = Some(now_ms);
        }
        true
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.publisher.state()
    }

    /// Number of dispatches performed.
    pub fn dispatched(&self) -> u32 {
        self.dispatcher.dispatched()
    }

    /// Get a reference to the publisher.
    pub fn publisher(&self) -> &Publisher<T, S> {
        &self.publisher
    }

    /// Get a mutable reference to the publisher.
    pub fn publisher_mut(&mut self) -> &mut Publisher<T, S> {
        &mut self.publisher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MqttConfig;
    use crate::hal::{MockIndicator, MockLines, MockTransport};
    use crate::lines::LineId;
    use crate::traits::{ConnectionStatus, Indicator};

    type TestNode<'a> = EdgeNode<'a, &'a MockLines, MockTransport, MockIndicator>;

    fn node<'a>(lines: &'a MockLines, changes: &'a ChangeBuffer, config: MqttConfig) -> TestNode<'a> {
        let publisher = Publisher::new(MockTransport::new(), MockIndicator::new(), config, 500);
        EdgeNode::new(lines, changes, publisher)
    }

    fn config() -> MqttConfig {
        MqttConfig::default().with_host("10.0.0.2")
    }

    #[test]
    fn idle_tick_does_nothing() {
        let lines = MockLines::default();
        let changes = ChangeBuffer::new();
        let mut node = node(&lines, &changes, config());
        node.start(0);

        let report = node.tick(1);
        assert_eq!(report, TickReport::default());
        assert!(node.publisher().transport().published.is_empty());
    }

    #[test]
    fn notifications_handled_before_dispatch() {
        let lines = MockLines::new(LineValues::new(false, true));
        let changes = ChangeBuffer::new();
        let mut node = node(&lines, &changes, config());
        node.start(0);

        node.publisher_mut()
            .transport_mut()
            .queue_status(ConnectionStatus::Accepted);
        changes.raise(LineId::B);
        node.tick(5);

        // Announcement first, then the line report
        let published = &node.publisher().transport().published;
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, "linewatch/announce");
        assert_eq!(published[1].0, "linewatch/lines");
        assert_eq!(published[1].1, b"lineA: false, lineB: true".to_vec());
    }

    #[test]
    fn rejected_dispatch_reported() {
        let lines = MockLines::default();
        let changes = ChangeBuffer::new();
        let mut node = node(&lines, &changes, config());
        node.start(0);
        node.publisher_mut().transport_mut().reject_publish = Some(-1);

        changes.raise(LineId::A);
        let report = node.tick(1);
        assert_eq!(report.dispatched, Some(LineValues::default()));
        assert!(!report.published);
        // Flags are cleared whether or not the publish was accepted
        assert!(!changes.signal().any());
    }

    #[test]
    fn pulse_expires_through_tick() {
        let lines = MockLines::default();
        let changes = ChangeBuffer::new();
        let mut node = node(&lines, &changes, config());
        node.start(0);

        changes.raise(LineId::A);
        node.tick(100);
        assert!(node.publisher().indicator().is_on(Indicator::Activity));

        node.tick(599);
        assert!(node.publisher().indicator().is_on(Indicator::Activity));
        node.tick(600);
        assert!(!node.publisher().indicator().is_on(Indicator::Activity));
    }

    #[test]
    fn no_reconnect_by_default() {
        let lines = MockLines::default();
        let changes = ChangeBuffer::new();
        let mut node = node(&lines, &changes, config());
        node.start(0);
        node.publisher_mut()
            .transport_mut()
            .queue_status(ConnectionStatus::Refused { code: 5 });

        for now in [1, 10_000, 1_000_000] {
            assert!(!node.tick(now).reconnect_attempted);
        }
        assert_eq!(node.state(), ConnectionState::Failed);
        assert_eq!(node.publisher().transport().connects.len(), 1);
    }

    #[test]
    fn reconnect_after_interval() {
        let lines = MockLines::default();
        let changes = ChangeBuffer::new();
        let mut node = node(
            &lines,
            &changes,
            config().with_reconnect_interval_ms(1_000),
        );
        node.start(0);
        node.publisher_mut()
            .transport_mut()
            .queue_status(ConnectionStatus::LinkLost);

        // Failure observed at t=10
        assert!(!node.tick(10).reconnect_attempted);
        assert!(!node.tick(1_009).reconnect_attempted);
        assert_eq!(node.state(), ConnectionState::Failed);

        assert!(node.tick(1_010).reconnect_attempted);
        assert_eq!(node.state(), ConnectionState::Connecting);
        assert_eq!(node.publisher().transport().connects.len(), 2);
    }

    #[test]
    fn stale_accepted_does_not_block_reconnect() {
        let lines = MockLines::default();
        let changes = ChangeBuffer::new();
        let mut node = node(&lines, &changes, config().with_reconnect_interval_ms(100));
        node.start(0);
        node.publisher_mut()
            .transport_mut()
            .queue_status(ConnectionStatus::Refused { code: 5 });
        node.publisher_mut()
            .transport_mut()
            .queue_status(ConnectionStatus::Accepted);

        let report = node.tick(10);
        assert_eq!(report.notifications, 2);
        assert_eq!(node.state(), ConnectionState::Failed);

        assert!(node.tick(110).reconnect_attempted);
        assert_eq!(node.state(), ConnectionState::Connecting);
    }

    #[test]
    fn reconnect_not_attempted_while_connected() {
        let lines = MockLines::default();
        let changes = ChangeBuffer::new();
        let mut node = node(&lines, &changes, config().with_reconnect_interval_ms(10));
        node.start(0);
        node.publisher_mut()
            .transport_mut()
            .queue_status(ConnectionStatus::Accepted);

        for now in [1, 100, 1_000] {
            assert!(!node.tick(now).reconnect_attempted);
        }
        assert_eq!(node.publisher().transport().connects.len(), 1);
    }

    #[test]
    fn failed_start_retries_with_policy() {
        let lines = MockLines::default();
        let changes = ChangeBuffer::new();
        let mut node = node(
            &lines,
            &changes,
            config().with_reconnect_interval_ms(100),
        );
        node.publisher_mut().transport_mut().reject_connect = Some(-2);
        node.start(0);
        assert_eq!(node.state(), ConnectionState::Failed);

        node.publisher_mut().transport_mut().reject_connect = None;
        assert!(!node.tick(50).reconnect_attempted);
        assert!(node.tick(100).reconnect_attempted);
        assert_eq!(node.state(), ConnectionState::Connecting);
    }
}
