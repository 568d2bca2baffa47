//! Device transports for the sensorlink communication layer.
//!
//! This crate opens and drives the physical link to the embedded
//! controller: a serial port or a Bluetooth RFCOMM socket. Everything here
//! is blocking and meant to run on a session's dedicated worker thread.
//!
//! # Transports
//!
//! | Transport | Driver | Read behavior |
//! |-----------|--------|---------------|
//! | [`SerialTransport`] | `serialport` | one line per read, 1 s timeout |
//! | [`BluetoothTransport`] | `bluer` RFCOMM | one fixed-size chunk per read |
//! | [`mock::MockTransport`] | in-memory | whatever the handle pushed |
//!
//! ```no_run
//! use sensorlink_hardware::{Connector, Endpoint, SystemConnector, Transport};
//!
//! # fn main() -> sensorlink_hardware::Result<()> {
//! let endpoint = Endpoint::Serial {
//!     path: "/dev/ttyUSB0".to_string(),
//!     baud_rate: 9600,
//! };
//!
//! // Blocks through the controller's boot grace period
//! let mut transport = SystemConnector.connect(&endpoint)?;
//! transport.send(Some("SAFETY"))?;
//! if let Some(chunk) = transport.receive()? {
//!     println!("{chunk}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with a
//! [`TransportError`]. Transports are closed by dropping them.

pub mod bluetooth;
pub mod error;
pub mod mock;
pub mod serial;
pub mod transport;

pub use bluetooth::BluetoothTransport;
pub use error::{Result, TransportError};
pub use serial::{PortSummary, SerialTransport, available_ports};
pub use transport::{Connector, Endpoint, SystemConnector, Transport};
