//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without physical hardware.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockLines`] | [`LineInput`] | Settable line levels, shareable across threads |
//! | [`MockIndicator`] | [`StatusIndicator`] | Tracks indicator state and history |
//! | [`MockScheduler`] | [`PeriodicScheduler`] | Stores tasks, fires them on demand |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockTransport`] | [`MqttTransport`] | Captures connects/publishes, queued statuses |
//! | [`MockNetwork`] | [`NetworkBearer`] | Scripted WiFi bring-up |
//!
//! # Example
//!
//! ```rust
//! use rs_linewatch::{ChangeBuffer, Dispatcher, LineId, LineValues, Sampler};
//! use rs_linewatch::hal::MockLines;
//!
//! let lines = MockLines::new(LineValues::default());
//! let changes = ChangeBuffer::new();
//! let mut sampler = Sampler::new(&lines, &changes);
//! let mut dispatcher = Dispatcher::new(&lines, &changes);
//!
//! lines.set(LineId::B, true);
//! sampler.sample();
//!
//! let dispatch = dispatcher.poll(|values| values).unwrap();
//! assert_eq!(dispatch.values, LineValues::new(false, true));
//! ```
//!
//! [`LineInput`]: crate::traits::LineInput
//! [`StatusIndicator`]: crate::traits::StatusIndicator
//! [`PeriodicScheduler`]: crate::traits::PeriodicScheduler
//! [`Clock`]: crate::traits::Clock
//! [`MqttTransport`]: crate::traits::MqttTransport
//! [`NetworkBearer`]: crate::traits::NetworkBearer

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use core::net::Ipv4Addr;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::lines::{LineId, LineValues};
use crate::traits::{
    AssociateError, Clock, ConnectRequest, ConnectionStatus, Indicator, LineInput, MqttTransport,
    NetworkBearer, PeriodicScheduler, StatusIndicator,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock input lines.
///
/// Levels are atomics so a test can change them through a shared reference
/// while a sampler holds the same handle (possibly on another thread).
///
/// # Example
///
/// ```rust
/// use rs_linewatch::hal::MockLines;
/// use rs_linewatch::traits::LineInput;
/// use rs_linewatch::{LineId, LineValues};
///
/// let lines = MockLines::new(LineValues::default());
/// lines.set(LineId::A, true);
/// assert!(lines.read(LineId::A));
///
/// lines.set_all(LineValues::new(false, true));
/// assert_eq!(lines.read_all(), LineValues::new(false, true));
/// ```
#[derive(Debug, Default)]
pub struct MockLines {
    levels: [AtomicBool; LineId::COUNT],
}

impl MockLines {
    /// Creates mock lines with the given initial values.
    pub fn new(values: LineValues) -> Self {
        Self {
            levels: [AtomicBool::new(values.a), AtomicBool::new(values.b)],
        }
    }

    /// Set one line.
    pub fn set(&self, line: LineId, value: bool) {
        self.levels[line.index()].store(value, Ordering::Release);
    }

    /// Set both lines.
    pub fn set_all(&self, values: LineValues) {
        self.set(LineId::A, values.a);
        self.set(LineId::B, values.b);
    }
}

impl LineInput for MockLines {
    fn read(&self, line: LineId) -> bool {
        self.levels[line.index()].load(Ordering::Acquire)
    }
}

/// Mock status indicator.
///
/// Set `fail` to make every call return an error without changing state.
#[derive(Debug, Default)]
pub struct MockIndicator {
    states: [bool; 3],
    /// Every accepted `set` call, in order.
    pub history: Vec<(Indicator, bool)>,
    /// Reject all calls.
    pub fail: bool,
}

impl MockIndicator {
    /// Creates a mock indicator with every light off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `indicator` is currently lit.
    pub fn is_on(&self, indicator: Indicator) -> bool {
        self.states[Self::slot(indicator)]
    }

    fn slot(indicator: Indicator) -> usize {
        match indicator {
            Indicator::Success => 0,
            Indicator::Failure => 1,
            Indicator::Activity => 2,
        }
    }
}

impl StatusIndicator for MockIndicator {
    type Error = ();

    fn set(&mut self, indicator: Indicator, on: bool) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.states[Self::slot(indicator)] = on;
        self.history.push((indicator, on));
        Ok(())
    }
}

type Task = Box<dyn FnMut() + Send>;

/// Mock periodic scheduler.
///
/// Stores registered tasks; [`fire`](Self::fire) runs each of them once,
/// standing in for one timer period.
///
/// # Example
///
/// ```rust
/// use rs_linewatch::hal::MockScheduler;
/// use rs_linewatch::traits::PeriodicScheduler;
///
/// let mut scheduler = MockScheduler::new();
/// scheduler.schedule_every(1_000, || {}).unwrap();
/// assert_eq!(scheduler.periods(), vec![1_000]);
/// assert_eq!(scheduler.fire(), 1);
/// ```
#[derive(Default)]
pub struct MockScheduler {
    tasks: Vec<(u32, Task)>,
    /// Reject registrations.
    pub fail: bool,
}

impl MockScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler that rejects every registration.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Run every registered task once. Returns how many ran.
    pub fn fire(&mut self) -> usize {
        for (_, task) in self.tasks.iter_mut() {
            task();
        }
        self.tasks.len()
    }

    /// Periods of the registered tasks.
    pub fn periods(&self) -> Vec<u32> {
        self.tasks.iter().map(|(period, _)| *period).collect()
    }
}

impl core::fmt::Debug for MockScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MockScheduler")
            .field("periods", &self.periods())
            .field("fail", &self.fail)
            .finish()
    }
}

impl PeriodicScheduler for MockScheduler {
    type Error = ();

    fn schedule_every<F>(&mut self, period_us: u32, task: F) -> Result<(), ()>
    where
        F: FnMut() + Send + 'static,
    {
        if self.fail {
            return Err(());
        }
        self.tasks.push((period_us, Box::new(task)));
        Ok(())
    }
}

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_linewatch::hal::MockClock;
/// use rs_linewatch::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Error returned by the network mocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockError {
    /// Scripted error code.
    pub code: i32,
}

/// Owned copy of a [`ConnectRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedConnect {
    /// Broker address as text.
    pub broker: String,
    /// Broker port.
    pub port: u16,
    /// Client identity.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Username / password pair.
    pub credentials: Option<(String, String)>,
}

impl From<&ConnectRequest<'_>> for RecordedConnect {
    fn from(request: &ConnectRequest<'_>) -> Self {
        Self {
            broker: alloc::format!("{}", request.broker),
            port: request.port,
            client_id: request.client_id.into(),
            keep_alive_secs: request.keep_alive_secs,
            credentials: request
                .credentials
                .map(|(user, pass)| (user.into(), pass.into())),
        }
    }
}

/// Mock MQTT transport for testing.
///
/// Records connection requests and publishes, and hands back queued
/// connection notifications in FIFO order.
///
/// # Example
///
/// ```rust
/// use rs_linewatch::hal::MockTransport;
/// use rs_linewatch::traits::{ConnectionStatus, MqttTransport};
///
/// let mut mqtt = MockTransport::new();
/// mqtt.queue_status(ConnectionStatus::Accepted);
/// assert_eq!(mqtt.try_recv_status(), Some(ConnectionStatus::Accepted));
/// assert_eq!(mqtt.try_recv_status(), None);
///
/// mqtt.publish("bench/lines", b"lineA: true, lineB: true", false).unwrap();
/// assert_eq!(mqtt.published_to("bench/lines").len(), 1);
///
/// mqtt.reject_publish = Some(-1);
/// assert!(mqtt.publish("bench/lines", b"x", false).is_err());
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Accepted publishes (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Connection requests received.
    pub connects: Vec<RecordedConnect>,
    /// Pending notifications returned by `try_recv_status()`.
    pub statuses: VecDeque<ConnectionStatus>,
    /// Reject publishes with this code.
    pub reject_publish: Option<i32>,
    /// Reject connection requests with this code.
    pub reject_connect: Option<i32>,
}

impl MockTransport {
    /// Creates a transport that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a connection notification.
    pub fn queue_status(&mut self, status: ConnectionStatus) {
        self.statuses.push_back(status);
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }
}

impl MqttTransport for MockTransport {
    type Error = MockError;

    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), MockError> {
        if let Some(code) = self.reject_connect {
            return Err(MockError { code });
        }
        self.connects.push(request.into());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MockError> {
        if let Some(code) = self.reject_publish {
            return Err(MockError { code });
        }
        self.published
            .push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn try_recv_status(&mut self) -> Option<ConnectionStatus> {
        self.statuses.pop_front()
    }
}

/// Scripted outcome of [`MockNetwork::associate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MockAssociation {
    /// Join succeeds.
    #[default]
    Joins,
    /// No answer before the timeout.
    TimesOut,
    /// Driver error with this code.
    Fails(i32),
}

/// Mock WiFi bearer.
#[derive(Debug)]
pub struct MockNetwork {
    /// Fail `initialize()` with this code.
    pub init_error: Option<i32>,
    /// Outcome of `associate()`.
    pub association: MockAssociation,
    /// Address reported once associated.
    pub ip: Option<Ipv4Addr>,
    /// Whether `initialize()` succeeded.
    pub initialized: bool,
    /// Whether `associate()` succeeded.
    pub associated: bool,
    /// Arguments of every `associate()` call (ssid, password, timeout).
    pub attempts: Vec<(String, String, u32)>,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self {
            init_error: None,
            association: MockAssociation::Joins,
            ip: Some(Ipv4Addr::new(192, 168, 1, 42)),
            initialized: false,
            associated: false,
            attempts: Vec::new(),
        }
    }
}

impl MockNetwork {
    /// Creates a bearer that joins and reports 192.168.1.42.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NetworkBearer for MockNetwork {
    type Error = MockError;

    fn initialize(&mut self) -> Result<(), MockError> {
        if let Some(code) = self.init_error {
            return Err(MockError { code });
        }
        self.initialized = true;
        Ok(())
    }

    fn associate(
        &mut self,
        ssid: &str,
        password: &str,
        timeout_ms: u32,
    ) -> Result<(), AssociateError<MockError>> {
        self.attempts.push((ssid.into(), password.into(), timeout_ms));
        match self.association {
            MockAssociation::Joins => {
                self.associated = true;
                Ok(())
            }
            MockAssociation::TimesOut => Err(AssociateError::Timeout),
            MockAssociation::Fails(code) => Err(AssociateError::Failed(MockError { code })),
        }
    }

    fn ip_addr(&self) -> Option<Ipv4Addr> {
        if self.associated {
            self.ip
        } else {
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
