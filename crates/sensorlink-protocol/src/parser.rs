//! Recursive-descent parser over one framed wire line.
//!
//! The grammar, with whitespace allowed around tags and items:
//!
//! ```text
//! line       := field ('|' field)*
//! field      := name ':' payload
//! payload    := tag '(' content ')'
//! content    := <balanced text>               (tag = str | number)
//!             | [payload (',' payload)*]      (tag = collection)
//! ```
//!
//! Walking a cursor instead of splitting strings keeps commas, pipes and
//! parentheses nested inside a payload attached to that payload.

use crate::message::DecodedMessage;
use crate::value::FieldValue;
use sensorlink_core::constants::*;
use sensorlink_core::{Error, Result};

const FIELD: u8 = DELIMITER_FIELD as u8;
const NAME: u8 = DELIMITER_NAME as u8;
const ITEM: u8 = DELIMITER_ITEM as u8;
const OPEN: u8 = PAYLOAD_OPEN as u8;
const CLOSE: u8 = PAYLOAD_CLOSE as u8;

/// Byte cursor over a line.
///
/// Every delimiter is ASCII, so every position the cursor stops at is a
/// valid `str` boundary.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Remaining text up to the next top-level field delimiter, for error context.
    fn rest_of_field(&self) -> &'a str {
        let rest = &self.input[self.pos..];
        rest.split(DELIMITER_FIELD).next().unwrap_or(rest)
    }

    /// Consume content up to, not including, the `)` closing the payload
    /// that was just opened.
    fn take_balanced(&mut self, field: &str) -> Result<&'a str> {
        let start = self.pos;
        let mut depth = 0usize;

        while let Some(byte) = self.peek() {
            match byte {
                OPEN => depth += 1,
                CLOSE if depth == 0 => return Ok(&self.input[start..self.pos]),
                CLOSE => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }

        Err(Error::malformed_field(field, "unclosed '('"))
    }

    fn expect_close(&mut self, field: &str) -> Result<()> {
        self.skip_whitespace();
        match self.bump() {
            Some(CLOSE) => Ok(()),
            Some(other) => Err(Error::malformed_field(
                field,
                format!("expected ')' but found '{}'", other as char),
            )),
            None => Err(Error::malformed_field(field, "unclosed '('")),
        }
    }
}

/// Parse a framed, non-empty line into a message.
pub(crate) fn parse_line(line: &str) -> Result<DecodedMessage> {
    let mut cursor = Cursor::new(line);
    let mut message = DecodedMessage::new();

    loop {
        let (name, value) = parse_field(&mut cursor)?;
        message.insert(name, value);

        match cursor.bump() {
            None => return Ok(message),
            Some(FIELD) => continue,
            // parse_field only returns at end of input or before '|'
            Some(other) => {
                return Err(Error::malformed_field(
                    line,
                    format!("unexpected '{}'", other as char),
                ));
            }
        }
    }
}

fn parse_field(cursor: &mut Cursor<'_>) -> Result<(String, FieldValue)> {
    let name = cursor.take_while(|b| b != NAME && b != FIELD);

    if cursor.peek() != Some(NAME) {
        return Err(Error::malformed_field(
            name.trim(),
            "missing ':' separator",
        ));
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::malformed_field(
            cursor.rest_of_field(),
            "empty field name",
        ));
    }

    cursor.bump();
    let value = parse_payload(cursor, name, 0)?;

    cursor.skip_whitespace();
    match cursor.peek() {
        None | Some(FIELD) => Ok((name.to_string(), value)),
        Some(_) => Err(Error::malformed_field(
            name,
            format!("unexpected trailing input '{}'", cursor.rest_of_field()),
        )),
    }
}

fn parse_payload(cursor: &mut Cursor<'_>, field: &str, depth: usize) -> Result<FieldValue> {
    cursor.skip_whitespace();
    let tag = cursor.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
    cursor.skip_whitespace();

    if tag.is_empty() {
        return Err(Error::malformed_field(field, "missing type tag"));
    }
    if cursor.peek() != Some(OPEN) {
        return Err(Error::malformed_field(
            field,
            format!("expected '(' after '{tag}'"),
        ));
    }
    cursor.bump();

    let value = match tag {
        TYPE_STR => FieldValue::Str(cursor.take_balanced(field)?.to_string()),
        TYPE_NUMBER => {
            let content = cursor.take_balanced(field)?.trim();
            let number = content.parse::<f64>().map_err(|_| Error::MalformedNumber {
                value: content.to_string(),
            })?;
            FieldValue::Number(number)
        }
        TYPE_COLLECTION => {
            if depth >= MAX_NESTING_DEPTH {
                return Err(Error::malformed_field(field, "collection nested too deeply"));
            }
            FieldValue::Collection(parse_items(cursor, field, depth + 1)?)
        }
        other => {
            return Err(Error::UnknownType {
                tag: other.to_string(),
            });
        }
    };

    cursor.expect_close(field)?;
    Ok(value)
}

/// Parse collection items, leaving the cursor on the closing `)`.
fn parse_items(cursor: &mut Cursor<'_>, field: &str, depth: usize) -> Result<Vec<FieldValue>> {
    let mut items = Vec::new();

    cursor.skip_whitespace();
    if cursor.peek() == Some(CLOSE) {
        return Ok(items);
    }

    loop {
        items.push(parse_payload(cursor, field, depth)?);
        cursor.skip_whitespace();

        match cursor.peek() {
            Some(ITEM) => {
                cursor.bump();
            }
            Some(CLOSE) => return Ok(items),
            Some(other) => {
                return Err(Error::malformed_field(
                    field,
                    format!("expected ',' or ')' but found '{}'", other as char),
                ));
            }
            None => return Err(Error::malformed_field(field, "unclosed '('")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_balanced_nested() {
        let mut cursor = Cursor::new("a(b)c)rest");
        assert_eq!(cursor.take_balanced("f").unwrap(), "a(b)c");
        assert_eq!(cursor.peek(), Some(b')'));
    }

    #[test]
    fn test_take_balanced_unclosed() {
        let mut cursor = Cursor::new("a(b");
        assert!(matches!(
            cursor.take_balanced("f"),
            Err(Error::MalformedField { .. })
        ));
    }

    #[test]
    fn test_str_keeps_delimiters_inside_parens() {
        let message = parse_line("note:str(a|b,c (d))").unwrap();
        assert_eq!(message.get("note"), Some(&FieldValue::from("a|b,c (d)")));
    }

    #[test]
    fn test_str_in_collection_keeps_commas() {
        let message = parse_line("a:collection(str(x,y),number(1))").unwrap();
        assert_eq!(
            message.get("a"),
            Some(&FieldValue::Collection(vec![
                FieldValue::from("x,y"),
                FieldValue::Number(1.0)
            ]))
        );
    }

    #[test]
    fn test_tag_whitespace_tolerated() {
        let message = parse_line(" a : number (4) ").unwrap();
        assert_eq!(message.get("a"), Some(&FieldValue::Number(4.0)));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let result = parse_line("a:number(4)x");
        assert!(matches!(result, Err(Error::MalformedField { .. })));
    }

    #[test]
    fn test_trailing_comma_in_collection_rejected() {
        let result = parse_line("a:collection(number(1),)");
        assert!(matches!(result, Err(Error::MalformedField { .. })));
    }

    #[test]
    fn test_missing_item_separator_rejected() {
        let result = parse_line("a:collection(number(1) number(2))");
        assert!(matches!(result, Err(Error::MalformedField { .. })));
    }
}
