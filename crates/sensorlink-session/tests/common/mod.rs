//! Shared helpers for session integration tests.

#![allow(dead_code)]

use sensorlink_core::TransportMode;
use sensorlink_hardware::mock::{MockConnector, MockTransport, MockTransportHandle};
use sensorlink_session::{ConnectionSession, DeviceDescriptor, SessionError, SessionState};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const WAIT: Duration = Duration::from_secs(5);

/// Errors reported through a session's error callback.
#[derive(Clone, Default)]
pub struct ErrorLog(Arc<Mutex<Vec<String>>>);

impl ErrorLog {
    pub fn callback(&self) -> impl Fn(&SessionError) + Send + Sync + 'static {
        let log = Arc::clone(&self.0);
        move |error| log.lock().unwrap().push(error.to_string())
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct Harness {
    pub session: ConnectionSession,
    pub connector: Arc<MockConnector>,
    pub errors: ErrorLog,
}

/// Serial-mode session on a mock connector with no transports prepared.
pub fn harness() -> Harness {
    let connector = Arc::new(MockConnector::new());
    let errors = ErrorLog::default();
    let session = ConnectionSession::builder(DeviceDescriptor::serial("/dev/mock0", 9600))
        .with_mode(TransportMode::Serial)
        .with_connector(connector.clone())
        .with_error_callback(errors.callback())
        .build();

    Harness {
        session,
        connector,
        errors,
    }
}

/// Prepare one mock transport and return the device side of it.
pub fn prepare_device(connector: &MockConnector) -> MockTransportHandle {
    let (transport, handle) = MockTransport::new();
    connector.push_transport(transport);
    handle
}

/// Poll `condition` until it holds or `WAIT` elapses.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

pub fn wait_for_state(session: &ConnectionSession, state: SessionState) -> bool {
    wait_until(|| session.state() == state)
}
