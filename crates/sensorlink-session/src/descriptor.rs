//! Device descriptor: where a device lives, plus the event channels a
//! session publishes on.

use crate::error::{Result, SessionError};
use sensorlink_core::constants::DEFAULT_BLUETOOTH_READ_TIMEOUT;
use sensorlink_core::{BluetoothAddress, DeviceConfig, Port, TransportMode};
use sensorlink_hardware::Endpoint;
use sensorlink_protocol::DecodedMessage;
use std::time::Duration;
use tokio::sync::broadcast;

/// Buffered decoded messages per live data subscriber before it lags.
const LIVE_DATA_CAPACITY: usize = 256;

/// Buffered connection events per subscriber before it lags.
const CONNECTION_EVENTS_CAPACITY: usize = 16;

/// Connection parameters and outbound event channels for one device.
///
/// Cloning a descriptor shares its event channels, so a session worker
/// holding a snapshot publishes to the same subscribers as the original.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// RFCOMM channel (Bluetooth) or device path (serial).
    pub port: Port,

    /// Bluetooth MAC address, required in Bluetooth mode.
    pub address: Option<BluetoothAddress>,

    /// Serial baud rate, required in serial mode.
    pub baud_rate: Option<u32>,

    /// Bluetooth read timeout. `None` blocks each read until data arrives.
    pub read_timeout: Option<Duration>,

    live_data: broadcast::Sender<DecodedMessage>,
    connection_changed: broadcast::Sender<bool>,
}

impl DeviceDescriptor {
    /// Describe a serial device.
    pub fn serial(path: impl Into<String>, baud_rate: u32) -> Self {
        Self::with_port(Port::Path(path.into()), None, Some(baud_rate))
    }

    /// Describe a Bluetooth device on an RFCOMM channel.
    pub fn bluetooth(address: BluetoothAddress, channel: u8) -> Self {
        Self::with_port(Port::Channel(channel), Some(address), None)
    }

    /// Build a descriptor from a configuration record.
    pub fn from_config(config: &DeviceConfig) -> Self {
        let mut descriptor =
            Self::with_port(config.port.clone(), config.address, config.baud_rate);
        descriptor.read_timeout = config.read_timeout(DEFAULT_BLUETOOTH_READ_TIMEOUT);
        descriptor
    }

    fn with_port(port: Port, address: Option<BluetoothAddress>, baud_rate: Option<u32>) -> Self {
        let (live_data, _) = broadcast::channel(LIVE_DATA_CAPACITY);
        let (connection_changed, _) = broadcast::channel(CONNECTION_EVENTS_CAPACITY);
        Self {
            port,
            address,
            baud_rate,
            read_timeout: Some(DEFAULT_BLUETOOTH_READ_TIMEOUT),
            live_data,
            connection_changed,
        }
    }

    /// Receive every successfully decoded message, after dispatch.
    pub fn subscribe_live_data(&self) -> broadcast::Receiver<DecodedMessage> {
        self.live_data.subscribe()
    }

    /// Receive `true` when a session comes up and `false` when it ends.
    pub fn subscribe_connection_changed(&self) -> broadcast::Receiver<bool> {
        self.connection_changed.subscribe()
    }

    pub(crate) fn emit_live_data(&self, message: DecodedMessage) {
        // No receivers is fine: live data is optional to observe.
        let _ = self.live_data.send(message);
    }

    pub(crate) fn emit_connection_changed(&self, connected: bool) {
        let _ = self.connection_changed.send(connected);
    }

    /// Resolve the endpoint to open for `mode`.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidDescriptor` if a field the mode needs is
    /// missing or has the wrong shape.
    pub fn endpoint(&self, mode: TransportMode) -> Result<Endpoint> {
        match mode {
            TransportMode::Serial => {
                let path = self.port.as_path().map_err(invalid)?;
                let baud_rate = self.baud_rate.ok_or_else(|| {
                    SessionError::InvalidDescriptor("serial mode requires a baud rate".to_string())
                })?;
                if baud_rate == 0 {
                    return Err(SessionError::InvalidDescriptor(
                        "baud rate must be positive".to_string(),
                    ));
                }
                Ok(Endpoint::Serial {
                    path: path.to_string(),
                    baud_rate,
                })
            }
            TransportMode::Bluetooth => {
                let address = self.address.ok_or_else(|| {
                    SessionError::InvalidDescriptor(
                        "Bluetooth mode requires a device address".to_string(),
                    )
                })?;
                let channel = self.port.as_channel().map_err(invalid)?;
                Ok(Endpoint::Bluetooth {
                    address,
                    channel,
                    read_timeout: self.read_timeout,
                })
            }
        }
    }
}

fn invalid(error: sensorlink_core::Error) -> SessionError {
    SessionError::InvalidDescriptor(error.to_string())
}
