use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fields decoded from one wire line, keyed by field name.
///
/// Names are unique within a message. When a line repeats a name, the last
/// occurrence wins. Iteration order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedMessage {
    fields: HashMap<String, FieldValue>,
}

impl DecodedMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> HashMap<String, FieldValue> {
        self.fields
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for DecodedMessage {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut message = DecodedMessage::new();
        for (name, value) in iter {
            message.insert(name, value);
        }
        message
    }
}

impl IntoIterator for DecodedMessage {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::hash_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
