//! Mock transport implementation for testing and development.
//!
//! [`MockTransport`] stands in for a serial port or RFCOMM socket. Its
//! [`MockTransportHandle`] plays the device side: it pushes lines, injects
//! failures and inspects what the session sent. [`MockConnector`] hands out
//! prepared transports (or failures) to sessions, one per connection attempt.
//!
//! # Examples
//!
//! ```
//! use sensorlink_hardware::mock::MockTransport;
//! use sensorlink_hardware::Transport;
//!
//! let (mut transport, handle) = MockTransport::new();
//!
//! handle.push_line("Gas:number(300)|");
//! assert_eq!(transport.receive().unwrap().as_deref(), Some("Gas:number(300)|\n"));
//!
//! transport.send(Some("SAFETY")).unwrap();
//! assert_eq!(handle.sent(), vec!["SAFETY".to_string()]);
//! ```

use crate::error::{Result, TransportError};
use crate::transport::{Connector, Endpoint, Transport};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How long `receive` waits before reporting "no data".
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
enum MockEvent {
    Data(String),
    Fail(String),
    Hangup,
}

/// How often each transport method was called.
#[derive(Debug, Default)]
struct CallCounts {
    send: AtomicUsize,
    receive: AtomicUsize,
}

/// Mock device link for tests.
#[derive(Debug)]
pub struct MockTransport {
    events: Receiver<MockEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    calls: Arc<CallCounts>,
    closed: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl MockTransport {
    /// Create a transport and the handle that drives it.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Create a transport whose `receive` waits `poll_interval` for data.
    pub fn with_poll_interval(poll_interval: Duration) -> (Self, MockTransportHandle) {
        let (events_tx, events) = mpsc::channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(CallCounts::default());
        let closed = Arc::new(AtomicBool::new(false));

        let transport = Self {
            events,
            sent: Arc::clone(&sent),
            calls: Arc::clone(&calls),
            closed: Arc::clone(&closed),
            poll_interval,
        };

        let handle = MockTransportHandle {
            events: events_tx,
            sent,
            calls,
            closed,
        };

        (transport, handle)
    }
}

impl Transport for MockTransport {
    fn send(&mut self, message: Option<&str>) -> Result<()> {
        self.calls.send.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.to_string());
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<String>> {
        self.calls.receive.fetch_add(1, Ordering::SeqCst);
        match self.events.recv_timeout(self.poll_interval) {
            Ok(MockEvent::Data(chunk)) => Ok(Some(chunk)),
            Ok(MockEvent::Fail(message)) => Err(TransportError::communication(message)),
            Ok(MockEvent::Hangup) | Err(RecvTimeoutError::Disconnected) => {
                Err(TransportError::disconnected("mock device"))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
        }
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Handle for playing the device side of a [`MockTransport`].
///
/// Dropping every handle makes the transport report a disconnect.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    events: Sender<MockEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    calls: Arc<CallCounts>,
    closed: Arc<AtomicBool>,
}

impl MockTransportHandle {
    /// Deliver one line, terminated with `\n`.
    pub fn push_line(&self, line: &str) {
        self.push_chunk(format!("{line}\n"));
    }

    /// Deliver raw text exactly as given, as one read.
    pub fn push_chunk(&self, chunk: impl Into<String>) {
        // The transport may already be gone; nothing is waiting for data then.
        let _ = self.events.send(MockEvent::Data(chunk.into()));
    }

    /// Make the next read fail with a communication error.
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.events.send(MockEvent::Fail(message.into()));
    }

    /// Make the next read report that the device hung up.
    pub fn hang_up(&self) {
        let _ = self.events.send(MockEvent::Hangup);
    }

    /// Number of `send` calls, empty polls included.
    pub fn send_calls(&self) -> usize {
        self.calls.send.load(Ordering::SeqCst)
    }

    /// Number of `receive` calls, timeouts included.
    pub fn receive_calls(&self) -> usize {
        self.calls.receive.load(Ordering::SeqCst)
    }

    /// Messages the session has written, in order. Empty polls are not
    /// recorded; see [`send_calls`](Self::send_calls).
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the transport has been dropped.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Connector that hands out prepared mock transports in order.
///
/// Every call to `connect` consumes the next prepared outcome; once they run
/// out, connecting fails.
#[derive(Debug, Default)]
pub struct MockConnector {
    outcomes: Mutex<VecDeque<std::result::Result<MockTransport, String>>>,
    endpoints: Mutex<Vec<Endpoint>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transport for the next connection attempt.
    pub fn push_transport(&self, transport: MockTransport) {
        self.lock_outcomes().push_back(Ok(transport));
    }

    /// Queue a failed connection attempt.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_outcomes().push_back(Err(message.into()));
    }

    /// Endpoints of every connection attempt so far, in order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_outcomes(
        &self,
    ) -> std::sync::MutexGuard<'_, VecDeque<std::result::Result<MockTransport, String>>> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connector for MockConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Transport>> {
        self.endpoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(endpoint.clone());

        match self.lock_outcomes().pop_front() {
            Some(Ok(transport)) => Ok(Box::new(transport)),
            Some(Err(message)) => Err(TransportError::open(endpoint, message)),
            None => Err(TransportError::open(endpoint, "no mock transport prepared")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serial_endpoint() -> Endpoint {
        Endpoint::Serial {
            path: "/dev/mock".to_string(),
            baud_rate: 9600,
        }
    }

    #[test]
    fn test_receive_times_out_without_data() {
        let (mut transport, handle) = MockTransport::new();
        assert_eq!(transport.receive().unwrap(), None);
        assert_eq!(handle.receive_calls(), 1);
    }

    #[test]
    fn test_chunk_delivered_verbatim() {
        let (mut transport, handle) = MockTransport::new();
        handle.push_chunk("a:str(x)|\nb:str(y)|");
        assert_eq!(
            transport.receive().unwrap().as_deref(),
            Some("a:str(x)|\nb:str(y)|")
        );
    }

    #[test]
    fn test_fail_and_hang_up() {
        let (mut transport, handle) = MockTransport::new();
        handle.fail("cable pulled");
        handle.hang_up();

        assert!(matches!(
            transport.receive(),
            Err(TransportError::CommunicationError { .. })
        ));
        assert!(matches!(
            transport.receive(),
            Err(TransportError::Disconnected { .. })
        ));
    }

    #[test]
    fn test_dropped_handle_is_disconnect() {
        let (mut transport, handle) = MockTransport::new();
        drop(handle);
        assert!(matches!(
            transport.receive(),
            Err(TransportError::Disconnected { .. })
        ));
    }

    #[test]
    fn test_empty_send_counted_but_not_recorded() {
        let (mut transport, handle) = MockTransport::new();
        transport.send(None).unwrap();
        transport.send(Some("")).unwrap();
        transport.send(Some("SECURITY")).unwrap();
        assert_eq!(handle.sent(), vec!["SECURITY".to_string()]);
        assert_eq!(handle.send_calls(), 3);
    }

    #[test]
    fn test_drop_marks_closed() {
        let (transport, handle) = MockTransport::new();
        assert!(!handle.is_closed());
        drop(transport);
        assert!(handle.is_closed());
    }

    #[test]
    fn test_connector_outcomes_in_order() {
        let connector = MockConnector::new();
        let (transport, _handle) = MockTransport::new();
        connector.push_failure("port busy");
        connector.push_transport(transport);

        assert!(matches!(
            connector.connect(&serial_endpoint()),
            Err(TransportError::OpenFailed { .. })
        ));
        assert!(connector.connect(&serial_endpoint()).is_ok());
        assert!(connector.connect(&serial_endpoint()).is_err());
        assert_eq!(connector.endpoints().len(), 3);
    }
}
