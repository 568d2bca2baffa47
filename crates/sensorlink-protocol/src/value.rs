//! Typed field values.
//!
//! Every payload on the wire carries one of three type tags, and decodes to
//! the matching [`FieldValue`] variant:
//!
//! | Wire payload | Value |
//! |--------------|-------|
//! | `str(hello)` | `FieldValue::Str("hello")` |
//! | `number( 3.5 )` | `FieldValue::Number(3.5)` |
//! | `collection(number(1),str(x))` | `FieldValue::Collection([Number(1.0), Str("x")])` |
//!
//! Collections nest to any depth. `Display` renders the wire payload back:
//!
//! ```
//! use sensorlink_protocol::FieldValue;
//!
//! let value = FieldValue::Collection(vec![FieldValue::Number(0.0), FieldValue::from("x")]);
//! assert_eq!(value.to_string(), "collection(number(0),str(x))");
//! ```

use sensorlink_core::constants::{DELIMITER_ITEM, TYPE_COLLECTION, TYPE_NUMBER, TYPE_STR};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One decoded payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// `str(...)` content, verbatim.
    Str(String),

    /// `number(...)` content.
    Number(f64),

    /// `collection(...)` items, in wire order.
    Collection(Vec<FieldValue>),
}

impl FieldValue {
    /// Type tag this value is written with.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => TYPE_STR,
            FieldValue::Number(_) => TYPE_NUMBER,
            FieldValue::Collection(_) => TYPE_COLLECTION,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_collection(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Collection(items) => Some(items),
            _ => None,
        }
    }

    /// Flatten a collection of numbers, as sent for sonar sweeps.
    ///
    /// Returns `None` if this is not a collection or any item is not a number.
    #[must_use]
    pub fn to_numbers(&self) -> Option<Vec<f64>> {
        self.as_collection()?
            .iter()
            .map(FieldValue::as_number)
            .collect()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{TYPE_STR}({s})"),
            FieldValue::Number(n) => write!(f, "{TYPE_NUMBER}({n})"),
            FieldValue::Collection(items) => {
                write!(f, "{TYPE_COLLECTION}(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{DELIMITER_ITEM}")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Collection(items.into_iter().map(Into::into).collect())
    }
}
