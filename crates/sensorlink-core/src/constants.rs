//! Core constants for the sensorlink wire protocol and transports.
//!
//! The embedded controller speaks a line-oriented text protocol where every
//! field carries a type tag:
//!
//! ```text
//! name:type(payload)|name:type(payload)|...
//! ```
//!
//! Where:
//! - `|` - Field delimiter (a trailing `|` is optional)
//! - `:` - Separates the field name from its typed payload (first occurrence only)
//! - `type` - One of `str`, `number` or `collection`
//! - `(` `)` - Enclose the payload content
//! - `,` - Separates the items of a `collection`
//!
//! # Delimiter Semantics
//!
//! | Delimiter | Name | Purpose | Example |
//! |-----------|------|---------|---------|
//! | `\|` | DELIMITER_FIELD | Separates fields in a line | `a:str(x)\|b:number(2)` |
//! | `:` | DELIMITER_NAME | Separates name and payload | `temp:number(21.5)` |
//! | `(` | PAYLOAD_OPEN | Opens payload content | `str(` |
//! | `)` | PAYLOAD_CLOSE | Closes payload content | `number(3))` |
//! | `,` | DELIMITER_ITEM | Separates collection items | `collection(number(1),number(2))` |
//!
//! # Usage
//!
//! ```
//! use sensorlink_core::constants::*;
//!
//! let line = "angles:collection(number(0),number(30))|";
//! assert!(line.ends_with(DELIMITER_FIELD));
//! assert_eq!(line.split_once(DELIMITER_NAME).map(|(name, _)| name), Some("angles"));
//! ```

use std::time::Duration;

// ============================================================================
// Protocol Delimiters
// ============================================================================

/// Field separator in a wire line.
pub const DELIMITER_FIELD: char = '|';

/// Separator between a field name and its typed payload.
///
/// Only the first occurrence in a field is significant.
pub const DELIMITER_NAME: char = ':';

/// Separator between the items of a `collection` payload.
pub const DELIMITER_ITEM: char = ',';

/// Opens the content of a typed payload.
pub const PAYLOAD_OPEN: char = '(';

/// Closes the content of a typed payload.
pub const PAYLOAD_CLOSE: char = ')';

/// Line terminator used by the serial transport.
pub const LINE_TERMINATOR: u8 = b'\n';

// ============================================================================
// Payload Type Tags
// ============================================================================

/// Type tag for text payloads; content is taken verbatim.
pub const TYPE_STR: &str = "str";

/// Type tag for floating point payloads; content is trimmed before parsing.
pub const TYPE_NUMBER: &str = "number";

/// Type tag for nested payload lists.
pub const TYPE_COLLECTION: &str = "collection";

/// Deepest `collection` nesting a decoder accepts.
///
/// Parsing recurses once per level, so this bounds stack use on hostile input.
///
/// # Value: 64
pub const MAX_NESTING_DEPTH: usize = 64;

// ============================================================================
// Serial Transport
// ============================================================================

/// Read timeout applied to an opened serial port.
///
/// Bounds how long one worker iteration can block, and therefore how long
/// `stop()` takes to be observed.
///
/// # Value: 1 second
pub const SERIAL_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Grace period after opening a serial port before any traffic.
///
/// Opening the port resets most USB microcontroller boards; the firmware
/// needs this long to boot before it can answer.
///
/// # Value: 2 seconds
pub const SERIAL_BOOT_DELAY: Duration = Duration::from_secs(2);

/// Longest line a transport buffers while waiting for its terminator.
///
/// # Value: 64 KiB
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Baud rate used when a configuration leaves it out.
///
/// # Value: 9600
pub const DEFAULT_BAUD_RATE: u32 = 9600;

// ============================================================================
// Bluetooth Transport
// ============================================================================

/// Size of the fixed read buffer used for RFCOMM reads.
///
/// # Value: 1024 bytes
pub const BLUETOOTH_READ_BUFFER: usize = 1024;

/// RFCOMM channel used when a configuration leaves the port out.
pub const DEFAULT_RFCOMM_CHANNEL: u8 = 1;

/// Default read timeout for RFCOMM reads.
///
/// # Value: 1 second
pub const DEFAULT_BLUETOOTH_READ_TIMEOUT: Duration = Duration::from_secs(1);
