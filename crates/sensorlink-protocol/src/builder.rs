use crate::value::FieldValue;
use sensorlink_core::constants::{
    DELIMITER_FIELD, DELIMITER_NAME, LINE_TERMINATOR, PAYLOAD_CLOSE, PAYLOAD_OPEN,
};
use sensorlink_core::{Error, Result};

/// Builder for wire lines with a fluent API
///
/// Produces the same format the embedded controller sends, which makes it
/// the natural way to script a fake device in tests.
///
/// # Example
/// ```
/// use sensorlink_protocol::{decode_message, FieldValue, MessageBuilder};
///
/// let line = MessageBuilder::new()
///     .field("Gas", 312.0).unwrap()
///     .field("IUD", "04A2B3C4").unwrap()
///     .build();
///
/// assert_eq!(line, "Gas:number(312)|IUD:str(04A2B3C4)|");
/// let message = decode_message(&line).unwrap();
/// assert_eq!(message.get("Gas"), Some(&FieldValue::Number(312.0)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    fields: Vec<(String, FieldValue)>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field
    ///
    /// Fields are written in the order they are added.
    ///
    /// # Errors
    /// Returns `Error::MalformedField` if the name is empty, padded with
    /// whitespace or contains `:`/`|`, or if a `str` value (at any depth) has
    /// unbalanced parentheses or a line break.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        validate_name(&name)?;
        validate_value(&name, &value)?;
        self.fields.push((name, value));
        Ok(self)
    }

    /// Build the line, with a trailing `|` and no terminator.
    #[must_use]
    pub fn build(&self) -> String {
        let mut line = String::new();
        for (name, value) in &self.fields {
            line.push_str(name);
            line.push(DELIMITER_NAME);
            line.push_str(&value.to_string());
            line.push(DELIMITER_FIELD);
        }
        line
    }

    /// Build the line followed by the line terminator.
    #[must_use]
    pub fn build_line(&self) -> String {
        let mut line = self.build();
        line.push(LINE_TERMINATOR as char);
        line
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::malformed_field(name, "empty field name"));
    }
    if name.trim() != name {
        return Err(Error::malformed_field(
            name,
            "field name has surrounding whitespace",
        ));
    }
    if name.contains([DELIMITER_NAME, DELIMITER_FIELD, '\n', '\r']) {
        return Err(Error::malformed_field(
            name,
            "field name contains a reserved delimiter",
        ));
    }
    Ok(())
}

fn validate_value(name: &str, value: &FieldValue) -> Result<()> {
    match value {
        FieldValue::Str(s) => {
            if s.contains(['\n', '\r']) {
                return Err(Error::malformed_field(name, "text contains a line break"));
            }
            let mut depth = 0usize;
            for c in s.chars() {
                if c == PAYLOAD_OPEN {
                    depth += 1;
                } else if c == PAYLOAD_CLOSE {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        Error::malformed_field(name, "text has unbalanced parentheses")
                    })?;
                }
            }
            if depth != 0 {
                return Err(Error::malformed_field(
                    name,
                    "text has unbalanced parentheses",
                ));
            }
            Ok(())
        }
        FieldValue::Number(_) => Ok(()),
        FieldValue::Collection(items) => items.iter().try_for_each(|item| validate_value(name, item)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_message;
    use rstest::rstest;

    #[test]
    fn test_empty_builder() {
        assert_eq!(MessageBuilder::new().build(), "");
    }

    #[test]
    fn test_build_line_terminated() {
        let line = MessageBuilder::new()
            .field("Fire", 0.0)
            .unwrap()
            .build_line();
        assert_eq!(line, "Fire:number(0)|\n");
    }

    #[test]
    fn test_nested_roundtrip() {
        let value = FieldValue::from(vec![
            FieldValue::from("x"),
            FieldValue::Number(2.0),
            FieldValue::from(vec![FieldValue::from("y (inner)"), FieldValue::Number(3.25)]),
        ]);
        let line = MessageBuilder::new()
            .field("a", value.clone())
            .unwrap()
            .build();

        let message = decode_message(&line).unwrap();
        assert_eq!(message.get("a"), Some(&value));
    }

    #[rstest]
    #[case("")]
    #[case(" a")]
    #[case("a:b")]
    #[case("a|b")]
    fn test_invalid_name(#[case] name: &str) {
        assert!(MessageBuilder::new().field(name, 1.0).is_err());
    }

    #[rstest]
    #[case("a)")]
    #[case("(a")]
    #[case(")(")]
    #[case("two\nlines")]
    fn test_invalid_text(#[case] text: &str) {
        assert!(MessageBuilder::new().field("a", text).is_err());
    }

    #[test]
    fn test_invalid_text_nested() {
        let value = FieldValue::from(vec![FieldValue::from("ok"), FieldValue::from("bad)")]);
        assert!(MessageBuilder::new().field("a", value).is_err());
    }
}
