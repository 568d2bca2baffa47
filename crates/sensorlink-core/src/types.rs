use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bluetooth MAC address (`AA:BB:CC:DD:EE:FF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BluetoothAddress([u8; 6]);

impl BluetoothAddress {
    /// Create an address from its six raw bytes, most significant first.
    #[must_use]
    pub const fn new(bytes: [u8; 6]) -> Self {
        BluetoothAddress(bytes)
    }

    /// Get the raw address bytes, most significant first.
    #[must_use]
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for BluetoothAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl std::str::FromStr for BluetoothAddress {
    type Err = Error;

    /// Parse a colon separated address.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` unless the input is six colon separated
    /// two-digit hex octets.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');

        for byte in &mut bytes {
            let part = parts
                .next()
                .ok_or_else(|| Error::InvalidAddress(s.to_string()))?;
            if part.len() != 2 {
                return Err(Error::InvalidAddress(s.to_string()));
            }
            *byte =
                u8::from_str_radix(part, 16).map_err(|_| Error::InvalidAddress(s.to_string()))?;
        }

        if parts.next().is_some() {
            return Err(Error::InvalidAddress(s.to_string()));
        }

        Ok(BluetoothAddress(bytes))
    }
}

impl Serialize for BluetoothAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BluetoothAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Physical transport used by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// OS serial device (USB CDC, UART adapter).
    Serial,

    /// Bluetooth RFCOMM stream socket.
    Bluetooth,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Serial => write!(f, "serial"),
            TransportMode::Bluetooth => write!(f, "bluetooth"),
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(TransportMode::Serial),
            "bluetooth" | "bt" | "rfcomm" => Ok(TransportMode::Bluetooth),
            other => Err(Error::Config(format!("Unknown transport mode: {other}"))),
        }
    }
}

/// Where a device lives: an RFCOMM channel or a serial device path.
///
/// Which variant is meaningful depends on the active [`TransportMode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Port {
    /// RFCOMM channel number (Bluetooth mode).
    Channel(u8),

    /// OS serial device path such as `/dev/ttyUSB0` or `COM3` (serial mode).
    Path(String),
}

impl Port {
    /// Interpret this port as an RFCOMM channel.
    ///
    /// A path made only of digits is accepted, since setup screens and
    /// command lines usually hand the channel over as text.
    ///
    /// # Errors
    /// Returns `Error::InvalidPort` if the port is not a channel number.
    pub fn as_channel(&self) -> Result<u8> {
        match self {
            Port::Channel(channel) => Ok(*channel),
            Port::Path(path) => path
                .trim()
                .parse()
                .map_err(|_| Error::InvalidPort(format!("'{path}' is not an RFCOMM channel"))),
        }
    }

    /// Interpret this port as a serial device path.
    ///
    /// # Errors
    /// Returns `Error::InvalidPort` for channel numbers and blank paths.
    pub fn as_path(&self) -> Result<&str> {
        match self {
            Port::Path(path) if !path.trim().is_empty() => Ok(path.trim()),
            Port::Path(_) => Err(Error::InvalidPort("serial path is empty".to_string())),
            Port::Channel(channel) => Err(Error::InvalidPort(format!(
                "channel {channel} is not a serial device path"
            ))),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Channel(channel) => write!(f, "{channel}"),
            Port::Path(path) => write!(f, "{path}"),
        }
    }
}

impl From<u8> for Port {
    fn from(channel: u8) -> Self {
        Port::Channel(channel)
    }
}

impl From<&str> for Port {
    fn from(path: &str) -> Self {
        Port::Path(path.to_string())
    }
}

impl From<String> for Port {
    fn from(path: String) -> Self {
        Port::Path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("00:11:22:33:44:55", [0x00, 0x11, 0x22, 0x33, 0x44, 0x55])]
    #[case("aa:bb:cc:dd:ee:ff", [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF])]
    #[case("  98:D3:31:F5:2A:10 ", [0x98, 0xD3, 0x31, 0xF5, 0x2A, 0x10])]
    fn test_address_valid(#[case] input: &str, #[case] expected: [u8; 6]) {
        let address: BluetoothAddress = input.parse().unwrap();
        assert_eq!(address.octets(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("00:11:22:33:44")] // too few octets
    #[case("00:11:22:33:44:55:66")] // too many octets
    #[case("00:11:22:33:44:GG")] // not hex
    #[case("0:11:22:33:44:55")] // short octet
    fn test_address_invalid(#[case] input: &str) {
        let result: Result<BluetoothAddress> = input.parse();
        assert!(matches!(result, Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_address_display() {
        let address = BluetoothAddress::new([0x98, 0xd3, 0x31, 0xf5, 0x2a, 0x10]);
        assert_eq!(address.to_string(), "98:D3:31:F5:2A:10");
    }

    #[test]
    fn test_address_serde() {
        let address: BluetoothAddress = "98:D3:31:F5:2A:10".parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"98:D3:31:F5:2A:10\"");
        let back: BluetoothAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }

    #[rstest]
    #[case("serial", TransportMode::Serial)]
    #[case("Bluetooth", TransportMode::Bluetooth)]
    #[case("bt", TransportMode::Bluetooth)]
    fn test_transport_mode_parse(#[case] input: &str, #[case] expected: TransportMode) {
        assert_eq!(input.parse::<TransportMode>().unwrap(), expected);
    }

    #[test]
    fn test_transport_mode_invalid() {
        assert!("usb".parse::<TransportMode>().is_err());
    }

    #[rstest]
    #[case(Port::Channel(3), 3)]
    #[case(Port::Path("5".to_string()), 5)]
    fn test_port_as_channel(#[case] port: Port, #[case] expected: u8) {
        assert_eq!(port.as_channel().unwrap(), expected);
    }

    #[test]
    fn test_port_mismatch() {
        assert!(Port::from("/dev/ttyUSB0").as_channel().is_err());
        assert!(Port::Channel(1).as_path().is_err());
        assert!(Port::from("   ").as_path().is_err());
        assert_eq!(Port::from("/dev/ttyACM0").as_path().unwrap(), "/dev/ttyACM0");
    }

    #[test]
    fn test_port_untagged_serde() {
        let port: Port = serde_json::from_str("4").unwrap();
        assert_eq!(port, Port::Channel(4));
        let port: Port = serde_json::from_str("\"COM3\"").unwrap();
        assert_eq!(port, Port::Path("COM3".to_string()));
    }
}
