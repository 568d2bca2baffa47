//! Wire line decoding.
//!
//! # Protocol Format
//!
//! ```text
//! field1:type(payload1)|field2:type(payload2)|...
//! ```
//!
//! A trailing `|` is optional. See [`sensorlink_core::constants`] for the
//! delimiters and type tags.
//!
//! # Examples
//!
//! ```
//! use sensorlink_protocol::{decode_message, FieldValue};
//!
//! let line = "angles:collection(number(0),number(30),number(60))|distances:collection(number(120),number(95),number(80))|";
//! let message = decode_message(line).unwrap();
//!
//! assert_eq!(message.get("angles").and_then(FieldValue::to_numbers), Some(vec![0.0, 30.0, 60.0]));
//! assert_eq!(message.get("distances").and_then(FieldValue::to_numbers), Some(vec![120.0, 95.0, 80.0]));
//! ```
//!
//! ## Error Handling
//!
//! Decoding never coerces: a bad payload fails the whole line.
//!
//! ```
//! use sensorlink_core::Error;
//! use sensorlink_protocol::decode_message;
//!
//! assert!(matches!(decode_message("a:bool(true)|"), Err(Error::UnknownType { .. })));
//! assert!(matches!(decode_message("noColonHere|"), Err(Error::MalformedField { .. })));
//! assert!(matches!(decode_message("a:number(x)|"), Err(Error::MalformedNumber { .. })));
//! ```

use crate::message::DecodedMessage;
use crate::parser;
use sensorlink_core::Result;
use sensorlink_core::constants::DELIMITER_FIELD;

/// Strip protocol framing from a raw line.
///
/// Trims surrounding whitespace (including the line terminator), removes one
/// trailing `|` if present, and trims again.
///
/// ```
/// use sensorlink_protocol::strip_framing;
///
/// assert_eq!(strip_framing("  a:str(x)| \r\n"), "a:str(x)");
/// assert_eq!(strip_framing("a:str(x)"), "a:str(x)");
/// assert_eq!(strip_framing(" | "), "");
/// ```
#[must_use]
pub fn strip_framing(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix(DELIMITER_FIELD)
        .unwrap_or(trimmed)
        .trim()
}

/// Split a received chunk into framed, non-empty lines, in arrival order.
///
/// Transports that read fixed-size chunks may deliver several lines at once.
///
/// ```
/// use sensorlink_protocol::split_lines;
///
/// let lines: Vec<&str> = split_lines("a:str(x)|\r\n\nb:number(1)|\n").collect();
/// assert_eq!(lines, vec!["a:str(x)", "b:number(1)"]);
/// ```
pub fn split_lines(chunk: &str) -> impl Iterator<Item = &str> {
    chunk
        .lines()
        .map(strip_framing)
        .filter(|line| !line.is_empty())
}

/// Decode one raw wire line into a [`DecodedMessage`].
///
/// A line that is empty after framing is stripped decodes to an empty
/// message. A field name repeated within one line keeps its last value.
///
/// # Errors
///
/// - `Error::MalformedField` - a field has no `:`, an empty name, no type
///   tag, unbalanced parentheses or trailing input after its payload
/// - `Error::MalformedNumber` - a `number` payload does not parse as `f64`
/// - `Error::UnknownType` - a payload tag other than `str`, `number`, `collection`
pub fn decode_message(raw: &str) -> Result<DecodedMessage> {
    let line = strip_framing(raw);
    if line.is_empty() {
        return Ok(DecodedMessage::new());
    }
    parser::parse_line(line)
}
