//! Connection session.
//!
//! A [`ConnectionSession`] owns at most one worker thread at a time. The
//! worker opens a transport for the session's device, then loops:
//!
//! 1. flush the staged outbound message (if any),
//! 2. read one chunk (bounded by the transport's read timeout),
//! 3. reassemble lines from the chunk (a line may span reads), decode each,
//!    dispatch to subscribers and publish on the descriptor's live data
//!    channel,
//!
//! until [`ConnectionSession::stop`] clears the connected flag or an error
//! ends the session. `stop()` never interrupts an iteration; the worker
//! notices it at the next loop boundary, so a stop takes at most one read
//! timeout to land.
//!
//! Errors on the worker thread cannot be returned to the caller that
//! started it. They are logged and `false` is published on the connection
//! channel. Then the session moves to [`SessionState::Failed`] and the error
//! callback runs last.
//!
//! # Examples
//!
//! ```no_run
//! use sensorlink_core::TransportMode;
//! use sensorlink_session::{ConnectionSession, DeviceDescriptor};
//!
//! let session = ConnectionSession::builder(DeviceDescriptor::serial("/dev/ttyUSB0", 9600))
//!     .with_mode(TransportMode::Serial)
//!     .with_error_callback(|error| eprintln!("device error: {error}"))
//!     .build();
//!
//! session
//!     .set_data_point("IUD", |values| println!("card {}", values[0]))
//!     .unwrap();
//! session.start().unwrap();
//! session.send_message("SECURITY");
//! ```

use crate::descriptor::DeviceDescriptor;
use crate::error::{Result, SessionError};
use crate::outbound::OutboundSlot;
use crate::registry::{SubscriptionKey, SubscriptionRegistry};
use crate::state::SessionState;
use sensorlink_core::{DeviceConfig, MalformedPolicy, TransportMode};
use sensorlink_hardware::{Connector, Endpoint, SystemConnector, Transport};
use sensorlink_protocol::{DecodedMessage, DeviceCommand, FieldValue, LineAssembler, decode_message};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use std::thread::JoinHandle;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

/// Callback receiving errors raised on the worker thread.
pub type ErrorCallback = Arc<dyn Fn(&SessionError) + Send + Sync>;

/// State shared between the session handle and its worker thread.
struct Shared {
    descriptor: RwLock<DeviceDescriptor>,
    mode: RwLock<Option<TransportMode>>,
    connector: RwLock<Arc<dyn Connector>>,
    malformed_policy: RwLock<MalformedPolicy>,
    registry: SubscriptionRegistry,
    outbound: OutboundSlot,
    connected: AtomicBool,
    state: Mutex<SessionState>,
    on_error: ErrorCallback,
}

fn read<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    /// Move to `target` if the lifecycle allows it from the current state.
    fn transition(&self, target: SessionState) -> bool {
        let mut state = self.state();
        if state.can_transition_to(&target) {
            debug!(from = %*state, to = %target, "Session state transition");
            *state = target;
            true
        } else {
            warn!(from = %*state, to = %target, "Ignoring invalid session state transition");
            false
        }
    }

    /// Promote `Connecting` to `Active`. Fails if `stop()` won the race.
    fn activate(&self) -> bool {
        let mut state = self.state();
        if *state == SessionState::Connecting {
            *state = SessionState::Active;
            true
        } else {
            false
        }
    }

    fn fail(&self, descriptor: &DeviceDescriptor, error: SessionError, announce: bool) {
        error!(error = %error, "Session failed");
        self.connected.store(false, Ordering::Release);
        // Publish before leaving the running states, so a restart cannot
        // announce `true` ahead of this `false`.
        if announce {
            descriptor.emit_connection_changed(false);
        }
        self.transition(SessionState::Failed);
        // Must stay last: the callback may restart the session.
        (self.on_error)(&error);
    }

    fn run(&self, connector: Arc<dyn Connector>, endpoint: Endpoint, descriptor: DeviceDescriptor) {
        info!(%endpoint, "Connecting to device");

        let transport = match connector.connect(&endpoint) {
            Ok(transport) => transport,
            Err(e) => {
                self.fail(&descriptor, e.into(), false);
                return;
            }
        };

        if !self.activate() {
            drop(transport);
            self.transition(SessionState::Idle);
            info!(%endpoint, "Session stopped before the device came up");
            return;
        }

        info!(%endpoint, "Device connected");
        descriptor.emit_connection_changed(true);

        match self.pump(transport, &descriptor) {
            Ok(()) => {
                descriptor.emit_connection_changed(false);
                self.transition(SessionState::Idle);
                info!(%endpoint, "Session stopped");
            }
            Err(e) => self.fail(&descriptor, e, true),
        }
    }

    /// Exchange messages until stopped. The transport is closed on return.
    fn pump(&self, mut transport: Box<dyn Transport>, descriptor: &DeviceDescriptor) -> Result<()> {
        let mut lines = LineAssembler::new();

        while self.connected.load(Ordering::Acquire) {
            let outbound = self.outbound.take();
            if let Some(message) = &outbound {
                debug!(command = %message, "Sending staged message");
            }
            transport.send(outbound.as_deref())?;

            let Some(chunk) = transport.receive()? else {
                // Quiet link: an unterminated tail is as complete as it gets.
                if let Some(line) = lines.flush() {
                    self.handle_line(&line, descriptor)?;
                }
                continue;
            };

            for line in lines.push(&chunk)? {
                self.handle_line(&line, descriptor)?;
            }
        }
        Ok(())
    }

    fn handle_line(&self, line: &str, descriptor: &DeviceDescriptor) -> Result<()> {
        let message = match decode_message(line) {
            Ok(message) => message,
            Err(e) if e.is_codec_error() => match *read(&self.malformed_policy) {
                MalformedPolicy::Fatal => return Err(e.into()),
                MalformedPolicy::SkipAndLog => {
                    warn!(line, error = %e, "Skipping malformed line");
                    return Ok(());
                }
            },
            Err(e) => return Err(e.into()),
        };

        let invoked = self.registry.dispatch(&message);
        trace!(fields = message.len(), invoked, "Dispatched line");
        descriptor.emit_live_data(message);
        Ok(())
    }
}

/// Background link to one embedded controller.
///
/// All methods take `&self`; a session can be shared behind an `Arc`
/// between UI code and callbacks. Dropping the session stops its worker
/// without waiting for it.
pub struct ConnectionSession {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionSession {
    /// Create a session for `descriptor` with the given error callback.
    ///
    /// The session uses the system connector and has no mode selected.
    pub fn new(
        descriptor: DeviceDescriptor,
        on_error: impl Fn(&SessionError) + Send + Sync + 'static,
    ) -> Self {
        Self::builder(descriptor)
            .with_error_callback(on_error)
            .build()
    }

    /// Create a session from a configuration record, mode included.
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::builder(DeviceDescriptor::from_config(config))
            .with_mode(config.mode)
            .with_malformed_policy(config.malformed_policy)
            .build()
    }

    pub fn builder(descriptor: DeviceDescriptor) -> ConnectionSessionBuilder {
        ConnectionSessionBuilder::new(descriptor)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.shared.state()
    }

    /// Whether the worker loop is (or is about to be) running.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    pub fn mode(&self) -> Option<TransportMode> {
        *read(&self.shared.mode)
    }

    /// Select the transport for the next `start()`.
    ///
    /// # Errors
    /// Returns `SessionError::AlreadyConnected` while a worker is running.
    pub fn set_mode(&self, mode: TransportMode) -> Result<()> {
        let state = self.shared.state();
        if state.is_running() {
            return Err(SessionError::AlreadyConnected);
        }
        *self
            .shared
            .mode
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(mode);
        drop(state);
        info!(%mode, "Transport mode selected");
        Ok(())
    }

    /// Replace the connector used by the next `start()`.
    ///
    /// # Errors
    /// Returns `SessionError::AlreadyConnected` while a worker is running.
    pub fn set_connector(&self, connector: Arc<dyn Connector>) -> Result<()> {
        let state = self.shared.state();
        if state.is_running() {
            return Err(SessionError::AlreadyConnected);
        }
        *self
            .shared
            .connector
            .write()
            .unwrap_or_else(PoisonError::into_inner) = connector;
        Ok(())
    }

    /// Change how the running or next worker treats undecodable lines.
    pub fn set_malformed_policy(&self, policy: MalformedPolicy) {
        *self
            .shared
            .malformed_policy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = policy;
    }

    /// Snapshot of the device descriptor.
    pub fn descriptor(&self) -> DeviceDescriptor {
        read(&self.shared.descriptor).clone()
    }

    /// Edit the device descriptor.
    ///
    /// A running worker keeps the parameters it started with; the change is
    /// picked up by the next `start()`. Assigning a whole new descriptor also
    /// replaces its event channels, detaching existing subscribers.
    pub fn update_descriptor<R>(&self, edit: impl FnOnce(&mut DeviceDescriptor) -> R) -> R {
        let mut descriptor = self
            .shared
            .descriptor
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        edit(&mut descriptor)
    }

    pub fn subscribe_live_data(&self) -> broadcast::Receiver<DecodedMessage> {
        read(&self.shared.descriptor).subscribe_live_data()
    }

    pub fn subscribe_connection_changed(&self) -> broadcast::Receiver<bool> {
        read(&self.shared.descriptor).subscribe_connection_changed()
    }

    /// Register `sink` for every decoded message matching `key`.
    ///
    /// Subscriptions persist across stop and restart. A group key fires only
    /// when one message carries all of its names; the sink then receives the
    /// values in key order.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidKeyType` for a key that can never match.
    pub fn set_data_point(
        &self,
        key: impl Into<SubscriptionKey>,
        sink: impl Fn(&[FieldValue]) + Send + Sync + 'static,
    ) -> Result<()> {
        self.shared.registry.register(key, sink)
    }

    /// Stage `message` to be written at the start of the next iteration.
    ///
    /// Surrounding whitespace is trimmed. A message staged before the
    /// previous one was flushed replaces it.
    pub fn send_message(&self, message: &str) {
        let message = message.trim();
        if let Some(replaced) = self.shared.outbound.stage(message) {
            debug!(replaced = %replaced, command = message, "Outbound message superseded");
        }
    }

    /// Stage a controller command.
    pub fn send_command(&self, command: &DeviceCommand) {
        self.send_message(command.as_str());
    }

    /// Start the worker thread.
    ///
    /// The device parameters are validated here; opening the transport
    /// happens on the worker, and its failure is reported through the error
    /// callback.
    ///
    /// # Errors
    /// - `SessionError::AlreadyConnected` unless the session is idle or failed
    /// - `SessionError::ModeNotSet` if no transport mode was selected
    /// - `SessionError::InvalidDescriptor` if the descriptor does not fit the mode
    /// - `SessionError::Transport` if the worker thread cannot be spawned
    pub fn start(&self) -> Result<()> {
        let mut state = self.shared.state();
        if !state.can_transition_to(&SessionState::Connecting) {
            return Err(SessionError::AlreadyConnected);
        }

        let mode = self.mode().ok_or(SessionError::ModeNotSet)?;
        let descriptor = self.descriptor();
        let endpoint = descriptor.endpoint(mode)?;
        let connector = Arc::clone(&*read(&self.shared.connector));

        *state = SessionState::Connecting;
        self.shared.connected.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let spawned = std::thread::Builder::new()
            .name(format!("sensorlink-{mode}"))
            .spawn(move || shared.run(connector, endpoint, descriptor));

        match spawned {
            Ok(handle) => {
                // A previous worker, if any, has already given up the session;
                // it finishes on its own.
                *lock(&self.worker) = Some(handle);
                info!(%mode, "Session started");
                Ok(())
            }
            Err(e) => {
                *state = SessionState::Failed;
                self.shared.connected.store(false, Ordering::Release);
                Err(SessionError::Transport(e.into()))
            }
        }
    }

    /// Ask the worker to stop. Idempotent.
    ///
    /// Returns immediately; the worker closes the transport and publishes
    /// `false` on the connection channel once it observes the request.
    pub fn stop(&self) {
        let mut state = self.shared.state();
        self.shared.connected.store(false, Ordering::Release);
        if matches!(*state, SessionState::Connecting | SessionState::Active) {
            *state = SessionState::Stopping;
            info!("Stopping session");
        }
    }

    /// Block until the current worker thread has exited.
    pub fn wait(&self) {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Session worker panicked");
            }
        }
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("state", &self.state())
            .field("mode", &self.mode())
            .field("registry", &self.shared.registry)
            .finish()
    }
}

/// Builder for [`ConnectionSession`].
pub struct ConnectionSessionBuilder {
    descriptor: DeviceDescriptor,
    mode: Option<TransportMode>,
    connector: Arc<dyn Connector>,
    malformed_policy: MalformedPolicy,
    on_error: ErrorCallback,
}

impl ConnectionSessionBuilder {
    fn new(descriptor: DeviceDescriptor) -> Self {
        Self {
            descriptor,
            mode: None,
            connector: Arc::new(SystemConnector),
            malformed_policy: MalformedPolicy::default(),
            on_error: Arc::new(|_| {}),
        }
    }

    pub fn with_mode(mut self, mode: TransportMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Use `connector` instead of the real serial and Bluetooth drivers.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }

    /// Run `callback` on the worker thread for every error that ends a session.
    pub fn with_error_callback(
        mut self,
        callback: impl Fn(&SessionError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Arc::new(callback);
        self
    }

    pub fn build(self) -> ConnectionSession {
        ConnectionSession {
            shared: Arc::new(Shared {
                descriptor: RwLock::new(self.descriptor),
                mode: RwLock::new(self.mode),
                connector: RwLock::new(self.connector),
                malformed_policy: RwLock::new(self.malformed_policy),
                registry: SubscriptionRegistry::new(),
                outbound: OutboundSlot::new(),
                connected: AtomicBool::new(false),
                state: Mutex::new(SessionState::Idle),
                on_error: self.on_error,
            }),
            worker: Mutex::new(None),
        }
    }
}
