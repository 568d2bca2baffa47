//! Outbound commands understood by the controller firmware.
//!
//! Commands are plain text. The controller switches what it reports based
//! on the last command it received.
//!
//! ```
//! use sensorlink_protocol::DeviceCommand;
//!
//! assert_eq!(DeviceCommand::Security.as_str(), "SECURITY");
//! assert_eq!("safety".parse::<DeviceCommand>().unwrap(), DeviceCommand::Safety);
//! assert_eq!("BEEP".parse::<DeviceCommand>().unwrap(), DeviceCommand::Custom("BEEP".into()));
//! ```

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    /// Report ultrasonic sonar sweeps.
    Security,

    /// Report gas and flame readings.
    Safety,

    /// Any other firmware command, sent verbatim.
    Custom(String),
}

impl DeviceCommand {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceCommand::Security => "SECURITY",
            DeviceCommand::Safety => "SAFETY",
            DeviceCommand::Custom(text) => text,
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceCommand {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.to_ascii_uppercase().as_str() {
            "SECURITY" => DeviceCommand::Security,
            "SAFETY" => DeviceCommand::Safety,
            _ => DeviceCommand::Custom(s.to_string()),
        })
    }
}

impl From<DeviceCommand> for String {
    fn from(command: DeviceCommand) -> Self {
        command.as_str().to_string()
    }
}
