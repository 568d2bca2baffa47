//! Transport and connector traits.
//!
//! A [`Transport`] is one open link to a device. It is owned by exactly one
//! session worker thread for its whole life and closed by dropping it, so
//! every exit path of the worker (stop, error, panic unwinding) releases it.
//!
//! A [`Connector`] opens transports for an [`Endpoint`]. Sessions hold a
//! connector rather than a transport so they can reconnect to a
//! reconfigured device without being rebuilt.
//!
//! ```text
//! ConnectionSession ──start()──> Connector::connect(&Endpoint)
//!                                      │
//!                                      ├─> SerialTransport    (serialport)
//!                                      ├─> BluetoothTransport (bluer RFCOMM)
//!                                      └─> MockTransport      (tests)
//! ```

use crate::bluetooth::BluetoothTransport;
use crate::error::Result;
use crate::serial::SerialTransport;
use sensorlink_core::BluetoothAddress;
use std::fmt;
use std::time::Duration;

/// Fully validated address of one device on one transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// OS serial device.
    Serial { path: String, baud_rate: u32 },

    /// RFCOMM channel on a Bluetooth device.
    Bluetooth {
        address: BluetoothAddress,
        channel: u8,
        /// `None` blocks each read until data arrives.
        read_timeout: Option<Duration>,
    },
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Serial { path, baud_rate } => write!(f, "serial {path} @ {baud_rate}"),
            Endpoint::Bluetooth {
                address, channel, ..
            } => write!(f, "rfcomm {address} channel {channel}"),
        }
    }
}

/// One open, blocking link to a device.
///
/// Implementations must bound every call by their read timeout where they
/// have one, since the session worker only checks for `stop()` between calls.
pub trait Transport: Send {
    /// Flush the outbound message staged for this iteration.
    ///
    /// `None` means nothing is staged. Request/response transports may still
    /// need to write (an empty poll) in that case.
    fn send(&mut self, message: Option<&str>) -> Result<()>;

    /// Wait for input, up to the transport's read timeout.
    ///
    /// Returns `Ok(None)` when nothing complete arrived in time. A returned
    /// chunk may hold several lines.
    fn receive(&mut self) -> Result<Option<String>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: Option<&str>) -> Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self) -> Result<Option<String>> {
        (**self).receive()
    }
}

/// Opens transports.
pub trait Connector: Send + Sync {
    /// Open a transport to `endpoint`.
    ///
    /// May block for as long as the physical link needs to come up,
    /// including device boot grace periods.
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Transport>>;
}

/// Connector backed by the real serial and Bluetooth drivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemConnector;

impl Connector for SystemConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Transport>> {
        match endpoint {
            Endpoint::Serial { path, baud_rate } => {
                Ok(Box::new(SerialTransport::open(path, *baud_rate)?))
            }
            Endpoint::Bluetooth {
                address,
                channel,
                read_timeout,
            } => Ok(Box::new(BluetoothTransport::connect(
                *address,
                *channel,
                *read_timeout,
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        let serial = Endpoint::Serial {
            path: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
        };
        assert_eq!(serial.to_string(), "serial /dev/ttyUSB0 @ 9600");

        let bluetooth = Endpoint::Bluetooth {
            address: "98:D3:31:F5:2A:10".parse().unwrap(),
            channel: 1,
            read_timeout: None,
        };
        assert_eq!(bluetooth.to_string(), "rfcomm 98:D3:31:F5:2A:10 channel 1");
    }

    #[test]
    fn test_system_connector_reports_open_failure() {
        let endpoint = Endpoint::Serial {
            path: "/dev/sensorlink-does-not-exist".to_string(),
            baud_rate: 9600,
        };
        assert!(SystemConnector.connect(&endpoint).is_err());
    }
}
