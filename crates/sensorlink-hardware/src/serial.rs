//! Serial port transport.
//!
//! Opens the port with a 1 second read timeout, then waits
//! [`SERIAL_BOOT_DELAY`] before any traffic: opening the port resets most
//! USB controller boards and their firmware must boot first.
//!
//! Input is line-delimited. A line that is still incomplete when the read
//! timeout fires is kept and completed by the next read, up to
//! [`MAX_LINE_LENGTH`] bytes.

use crate::error::{Result, TransportError};
use crate::transport::Transport;
use sensorlink_core::constants::{
    LINE_TERMINATOR, MAX_LINE_LENGTH, SERIAL_BOOT_DELAY, SERIAL_READ_TIMEOUT,
};
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use tracing::{debug, info, trace};

/// Line-oriented transport over a serial port.
pub struct SerialTransport<P = Box<dyn SerialPort>> {
    port: BufReader<P>,
    partial: Vec<u8>,
    name: String,
}

impl SerialTransport {
    /// Open `path` at `baud_rate` and wait for the controller to boot.
    ///
    /// # Errors
    /// Returns `TransportError::OpenFailed` if the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        info!(path, baud_rate, "Opening serial port");

        let port = serialport::new(path, baud_rate)
            .timeout(SERIAL_READ_TIMEOUT)
            .open()
            .map_err(|e| TransportError::open(format!("{path} @ {baud_rate}"), e.to_string()))?;

        debug!(
            delay_ms = SERIAL_BOOT_DELAY.as_millis() as u64,
            "Waiting for controller to boot"
        );
        std::thread::sleep(SERIAL_BOOT_DELAY);

        Ok(Self::from_port(port, path))
    }
}

impl<P: Read + Write + Send> SerialTransport<P> {
    /// Wrap an already open port. No boot delay is applied.
    pub fn from_port(port: P, name: impl Into<String>) -> Self {
        Self {
            port: BufReader::new(port),
            partial: Vec::new(),
            name: name.into(),
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let bytes = std::mem::take(&mut self.partial);
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<P: Read + Write + Send> Transport for SerialTransport<P> {
    fn send(&mut self, message: Option<&str>) -> Result<()> {
        let Some(message) = message.filter(|m| !m.is_empty()) else {
            return Ok(());
        };

        trace!(port = %self.name, command = message, "Writing to serial port");
        let port = self.port.get_mut();
        port.write_all(message.as_bytes())?;
        port.write_all(&[LINE_TERMINATOR])?;
        port.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<String>> {
        // read_until keeps whatever it consumed in `partial` even when it
        // returns an error, so a timeout never loses half a line.
        let budget = (MAX_LINE_LENGTH + 1).saturating_sub(self.partial.len()) as u64;
        match (&mut self.port)
            .take(budget)
            .read_until(LINE_TERMINATOR, &mut self.partial)
        {
            Ok(0) if self.partial.is_empty() => Err(TransportError::disconnected(&*self.name)),
            Ok(_) if self.partial.len() > MAX_LINE_LENGTH => {
                self.partial.clear();
                Err(TransportError::communication(format!(
                    "{}: line exceeds {MAX_LINE_LENGTH} bytes without a terminator",
                    self.name
                )))
            }
            Ok(_) => Ok(self.take_line()),
            Err(e) if is_poll_timeout(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_poll_timeout(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

/// A serial port found on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSummary {
    pub name: String,
    pub kind: String,
}

/// List serial ports present on this machine.
///
/// # Errors
/// Returns `TransportError::Serial` if the OS enumeration fails.
pub fn available_ports() -> Result<Vec<PortSummary>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(summarize).collect())
}

fn summarize(info: SerialPortInfo) -> PortSummary {
    let kind = match info.port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.unwrap_or_default();
            format!("USB {:04x}:{:04x} {product}", usb.vid, usb.pid)
                .trim_end()
                .to_string()
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "Unknown".to_string(),
    };

    PortSummary {
        name: info.port_name,
        kind,
    }
}
