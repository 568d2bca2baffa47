//! Device sessions for sensorlink.
//!
//! This crate ties the wire codec to the transports: a
//! [`ConnectionSession`] runs one background worker per device, decodes
//! everything the device sends and fans it out to the sinks registered
//! through [`ConnectionSession::set_data_point`] and to the channels of its
//! [`DeviceDescriptor`].
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐ start/stop/send ┌──────────────────────┐
//! │  caller (UI, CLI)  │ ──────────────> │  ConnectionSession   │
//! └────────────────────┘                 └──────────┬───────────┘
//!          ^                                        │ worker thread
//!          │ sinks, live_data,                      v
//!          │ connection_changed         ┌──────────────────────┐
//!          └─────────────────────────── │ Transport (hardware) │
//!                                       └──────────────────────┘
//! ```

pub mod descriptor;
pub mod error;
pub mod outbound;
pub mod registry;
pub mod session;
pub mod state;

pub use descriptor::DeviceDescriptor;
pub use error::{Result, SessionError};
pub use outbound::OutboundSlot;
pub use registry::{Sink, SubscriptionKey, SubscriptionRegistry};
pub use session::{ConnectionSession, ConnectionSessionBuilder, ErrorCallback};
pub use state::SessionState;
