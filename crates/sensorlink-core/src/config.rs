//! Device configuration records.
//!
//! A [`DeviceConfig`] names everything needed to reach one embedded
//! controller. It is what a setup screen or a JSON file produces, and what a
//! session's device descriptor is built from.
//!
//! ```
//! use sensorlink_core::{DeviceConfig, Port, TransportMode};
//!
//! let config = DeviceConfig::from_json_str(
//!     r#"{ "mode": "bluetooth", "port": 1, "address": "98:D3:31:F5:2A:10" }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.mode, TransportMode::Bluetooth);
//! assert_eq!(config.port, Port::Channel(1));
//! ```

use crate::constants::DEFAULT_BAUD_RATE;
use crate::{BluetoothAddress, Error, Port, Result, TransportMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// What a session does with a line that fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Report the codec error and end the session.
    #[default]
    Fatal,

    /// Log the codec error and keep reading.
    SkipAndLog,
}

/// Connection parameters for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Active transport.
    pub mode: TransportMode,

    /// RFCOMM channel (Bluetooth) or device path (serial).
    pub port: Port,

    /// Bluetooth MAC address, only read in Bluetooth mode.
    pub address: Option<BluetoothAddress>,

    /// Serial baud rate, only read in serial mode.
    pub baud_rate: Option<u32>,

    /// Read timeout for Bluetooth reads in milliseconds. `0` blocks forever.
    pub read_timeout_ms: Option<u64>,

    /// Handling of lines that fail to decode.
    pub malformed_policy: MalformedPolicy,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Serial,
            port: Port::Path("/dev/ttyUSB0".to_string()),
            address: None,
            baud_rate: Some(DEFAULT_BAUD_RATE),
            read_timeout_ms: None,
            malformed_policy: MalformedPolicy::Fatal,
        }
    }
}

impl DeviceConfig {
    /// Parse a configuration from JSON text.
    ///
    /// Missing keys take their [`Default`] values.
    ///
    /// # Errors
    /// Returns `Error::Config` if the JSON is invalid or a value has the wrong shape.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// its content is not a valid configuration.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Bluetooth read timeout, `None` meaning "block until data arrives".
    ///
    /// An absent value falls back to `default`.
    #[must_use]
    pub fn read_timeout(&self, default: Duration) -> Option<Duration> {
        match self.read_timeout_ms {
            None => Some(default),
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        }
    }
}
