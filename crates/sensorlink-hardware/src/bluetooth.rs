//! Bluetooth RFCOMM transport.
//!
//! The controller answers in request/response fashion: every iteration the
//! session writes whatever is staged (possibly nothing) and then reads one
//! chunk of at most [`BLUETOOTH_READ_BUFFER`] bytes. A chunk can end in the
//! middle of a line; the session reassembles lines across reads.
//!
//! The socket comes from BlueZ through `bluer`, which is async. Each
//! transport owns a current-thread Tokio runtime and blocks on it, so it can
//! run on the session's plain worker thread like the serial transport.
//!
//! Only available on Linux with the `bluetooth` feature; elsewhere
//! [`BluetoothTransport::connect`] fails with `TransportError::Unsupported`.

use crate::error::Result;
#[cfg(not(all(feature = "bluetooth", target_os = "linux")))]
use crate::error::TransportError;
use crate::transport::Transport;
use sensorlink_core::BluetoothAddress;
#[cfg(all(feature = "bluetooth", target_os = "linux"))]
pub use rfcomm::BluetoothTransport;
use std::time::Duration;

#[cfg(all(feature = "bluetooth", target_os = "linux"))]
mod rfcomm {
    use super::*;
    use crate::error::TransportError;
    use bluer::rfcomm::{SocketAddr, Stream};
    use sensorlink_core::constants::BLUETOOTH_READ_BUFFER;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::runtime::Runtime;
    use tracing::{info, trace};

    /// Request/response transport over an RFCOMM stream socket.
    pub struct BluetoothTransport {
        runtime: Runtime,
        stream: Stream,
        buffer: Vec<u8>,
        read_timeout: Option<Duration>,
        peer: String,
    }

    impl BluetoothTransport {
        /// Connect to `channel` on the device at `address`.
        ///
        /// # Errors
        /// Returns `TransportError::OpenFailed` if the socket cannot connect,
        /// and `TransportError::Io` if the runtime cannot be created.
        pub fn connect(
            address: BluetoothAddress,
            channel: u8,
            read_timeout: Option<Duration>,
        ) -> Result<Self> {
            info!(%address, channel, "Connecting RFCOMM socket");

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;

            let target = SocketAddr::new(bluer::Address::new(address.octets()), channel);
            let stream = runtime
                .block_on(Stream::connect(target))
                .map_err(|e| {
                    TransportError::open(format!("{address} channel {channel}"), e.to_string())
                })?;

            Ok(Self {
                runtime,
                stream,
                buffer: vec![0; BLUETOOTH_READ_BUFFER],
                read_timeout,
                peer: address.to_string(),
            })
        }
    }

    impl Transport for BluetoothTransport {
        fn send(&mut self, message: Option<&str>) -> Result<()> {
            let message = message.unwrap_or_default();
            if !message.is_empty() {
                trace!(peer = %self.peer, command = message, "Writing to RFCOMM socket");
            }
            self.runtime
                .block_on(self.stream.write_all(message.as_bytes()))?;
            Ok(())
        }

        fn receive(&mut self) -> Result<Option<String>> {
            let read = self.stream.read(&mut self.buffer);
            let n = match self.read_timeout {
                Some(limit) => match self.runtime.block_on(tokio::time::timeout(limit, read)) {
                    Ok(result) => result?,
                    Err(_elapsed) => return Ok(None),
                },
                None => self.runtime.block_on(read)?,
            };

            if n == 0 {
                return Err(TransportError::disconnected(&*self.peer));
            }
            Ok(Some(String::from_utf8_lossy(&self.buffer[..n]).into_owned()))
        }
    }
}

/// Placeholder used when RFCOMM support is not compiled in.
#[cfg(not(all(feature = "bluetooth", target_os = "linux")))]
pub struct BluetoothTransport {
    _private: (),
}

#[cfg(not(all(feature = "bluetooth", target_os = "linux")))]
impl BluetoothTransport {
    /// Always fails: this build has no RFCOMM support.
    pub fn connect(
        _address: BluetoothAddress,
        _channel: u8,
        _read_timeout: Option<Duration>,
    ) -> Result<Self> {
        Err(TransportError::unsupported(
            "Bluetooth RFCOMM (requires Linux and the `bluetooth` feature)",
        ))
    }
}

#[cfg(not(all(feature = "bluetooth", target_os = "linux")))]
impl Transport for BluetoothTransport {
    fn send(&mut self, _message: Option<&str>) -> Result<()> {
        Err(TransportError::unsupported("Bluetooth RFCOMM"))
    }

    fn receive(&mut self) -> Result<Option<String>> {
        Err(TransportError::unsupported("Bluetooth RFCOMM"))
    }
}
