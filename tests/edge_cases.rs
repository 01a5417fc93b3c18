//! Edge case and boundary condition tests for the line monitor

use rs_linewatch::hal::{MockIndicator, MockLines, MockTransport};
use rs_linewatch::{
    format_line_payload, BrokerAddress, ChangeBuffer, ConnectionState, ConnectionStatus,
    Dispatcher, EdgeNode, LineId, LineValues, MqttConfig, Publisher, PublisherError,
    Sampler,
};

fn publisher(config: MqttConfig) -> Publisher<MockTransport, MockIndicator> {
    Publisher::new(MockTransport::new(), MockIndicator::new(), config, 500)
}

// ============================================================================
// Broker Address
// ============================================================================

#[test]
fn broker_host_with_whitespace_is_trimmed() {
    let addr = BrokerAddress::resolve("  10.0.0.1 ").unwrap();
    assert_eq!(addr.to_string(), "10.0.0.1");
}

#[test]
fn empty_broker_host_fails_initialize() {
    let mut p = publisher(MqttConfig::default().with_host(""));
    assert!(matches!(
        p.initialize(),
        Err(PublisherError::AddressResolution(_))
    ));
    assert_eq!(p.state(), ConnectionState::Failed);
}

#[test]
fn hostname_broker_accepted() {
    let mut p = publisher(MqttConfig::default().with_host("mqtt.example.com"));
    p.initialize().unwrap();
    assert_eq!(p.transport().connects[0].broker, "mqtt.example.com");
}

#[test]
fn malformed_hostname_rejected() {
    for host in ["bad host", "-leading.dash", "1.2.3"] {
        let mut p = publisher(MqttConfig::default().with_host(host));
        assert!(p.initialize().is_err(), "host {:?} should be rejected", host);
        assert!(p.transport().connects.is_empty());
    }
}

#[test]
fn oversized_broker_host_never_connects() {
    let host = format!("{}.example.com", "a".repeat(60));
    let mut p = publisher(MqttConfig::default().with_host(&host));

    assert!(matches!(p.initialize(), Err(PublisherError::Config(_))));
    assert_eq!(p.state(), ConnectionState::Failed);
    assert!(p.transport().connects.is_empty());
}

// ============================================================================
// Connection state machine boundaries
// ============================================================================

#[test]
fn stale_accepted_after_refusal_keeps_failed() {
    let mut p = publisher(MqttConfig::default().with_announce_topic("hello"));
    p.initialize().unwrap();
    p.on_connection_status(ConnectionStatus::Refused { code: 5 });
    p.on_connection_status(ConnectionStatus::Accepted);

    assert_eq!(p.state(), ConnectionState::Failed);
    assert!(p.transport().published_to("hello").is_empty());
    assert_eq!(p.stats().announcements, 0);
}

#[test]
fn repeated_link_lost_is_idempotent() {
    let mut p = publisher(MqttConfig::default());
    p.initialize().unwrap();
    p.on_connection_status(ConnectionStatus::Accepted);
    p.on_connection_status(ConnectionStatus::LinkLost);
    p.on_connection_status(ConnectionStatus::LinkLost);
    assert_eq!(p.state(), ConnectionState::Failed);
    assert_eq!(p.transport().published.len(), 1);
}

#[test]
fn each_accepted_connection_announces_once() {
    let mut p = publisher(MqttConfig::default().with_announce_topic("hello"));
    for _ in 0..3 {
        p.initialize().unwrap();
        p.on_connection_status(ConnectionStatus::Accepted);
        p.on_connection_status(ConnectionStatus::LinkLost);
    }
    assert_eq!(p.transport().published_to("hello").len(), 3);
    assert_eq!(p.stats().announcements, 3);
    assert_eq!(p.stats().connect_attempts, 3);
}

#[test]
fn rejected_publish_keeps_connection() {
    let mut p = publisher(MqttConfig::default());
    p.initialize().unwrap();
    p.on_connection_status(ConnectionStatus::Accepted);
    p.transport_mut().reject_publish = Some(-1);

    assert!(matches!(
        p.publish(LineValues::new(true, false), 10),
        Err(PublisherError::Publish(_))
    ));
    assert_eq!(p.state(), ConnectionState::Connected);
    assert!(!p.is_pulsing());
    assert_eq!(p.stats().rejected, 1);
}

#[test]
fn activity_pulse_zero_duration() {
    let mut p = Publisher::new(
        MockTransport::new(),
        MockIndicator::new(),
        MqttConfig::default(),
        0,
    );
    p.publish(LineValues::new(true, true), 100).unwrap();
    assert!(p.is_pulsing());
    p.update(100);
    assert!(!p.is_pulsing());
}

#[test]
fn pulse_extended_by_later_publish() {
    let mut p = publisher(MqttConfig::default());
    p.publish(LineValues::default(), 0).unwrap();
    p.publish(LineValues::default(), 400).unwrap();
    p.update(500);
    assert!(p.is_pulsing());
    p.update(900);
    assert!(!p.is_pulsing());
}

#[test]
fn pulse_near_clock_limit_saturates() {
    let mut p = publisher(MqttConfig::default());
    p.publish(LineValues::default(), u64::MAX - 10).unwrap();
    p.update(u64::MAX - 1);
    assert!(p.is_pulsing());
    p.update(u64::MAX);
    assert!(!p.is_pulsing());
}

// ============================================================================
// Lines
// ============================================================================

#[test]
fn both_lines_change_in_same_sample() {
    let lines = MockLines::new(LineValues::default());
    let changes = ChangeBuffer::new();
    let mut sampler = Sampler::new(&lines, &changes);

    lines.set_all(LineValues::new(true, true));
    let edges = sampler.sample();
    assert!(edges.a && edges.b);
    assert!(changes.is_raised(LineId::A) && changes.is_raised(LineId::B));
}

#[test]
fn dispatcher_without_sampler_stays_idle() {
    let lines = MockLines::new(LineValues::new(true, true));
    let changes = ChangeBuffer::new();
    let mut dispatcher = Dispatcher::new(&lines, &changes);
    for _ in 0..10 {
        assert!(dispatcher.poll(|_| ()).is_none());
    }
}

#[test]
fn payload_fits_worst_case() {
    let payload = format_line_payload(LineValues::new(false, false));
    assert_eq!(payload.len(), "lineA: false, lineB: false".len());
}

// ============================================================================
// Node
// ============================================================================

#[test]
fn node_without_start_never_connects() {
    let lines = MockLines::new(LineValues::default());
    let changes = ChangeBuffer::new();
    let mut node = EdgeNode::new(
        &lines,
        &changes,
        publisher(MqttConfig::default().with_reconnect_interval_ms(1)),
    );

    node.publisher_mut()
        .transport_mut()
        .queue_status(ConnectionStatus::Accepted);
    for now in 0..10 {
        node.tick(now);
    }
    assert_eq!(node.state(), ConnectionState::Disconnected);
    assert!(node.publisher().transport().connects.is_empty());
}
