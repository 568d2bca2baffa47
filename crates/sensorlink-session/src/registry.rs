//! Subscription registry.
//!
//! Maps field keys to sinks. A key is either one field name or an ordered
//! group of names; a group sink only fires when one decoded message holds
//! every name in the group, and receives the values in declaration order.
//!
//! ```
//! use sensorlink_protocol::decode_message;
//! use sensorlink_session::{SubscriptionKey, SubscriptionRegistry};
//! use std::sync::{Arc, Mutex};
//!
//! let registry = SubscriptionRegistry::new();
//! let sweeps = Arc::new(Mutex::new(Vec::new()));
//!
//! let seen = Arc::clone(&sweeps);
//! registry
//!     .register(["angles", "distances"], move |values| {
//!         seen.lock().unwrap().push(values.to_vec());
//!     })
//!     .unwrap();
//!
//! let message = decode_message("distances:collection(number(80))|angles:collection(number(0))|").unwrap();
//! assert_eq!(registry.dispatch(&message), 1);
//! assert_eq!(sweeps.lock().unwrap().len(), 1);
//! ```

use crate::error::{Result, SessionError};
use sensorlink_protocol::{DecodedMessage, FieldValue};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Callback receiving the values of one subscription, positionally.
pub type Sink = Arc<dyn Fn(&[FieldValue]) + Send + Sync>;

/// Field name or ordered group of field names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionKey {
    Single(String),
    Group(Vec<String>),
}

impl SubscriptionKey {
    /// Parse a key written as `name` or `name1,name2,...`.
    ///
    /// ```
    /// use sensorlink_session::SubscriptionKey;
    ///
    /// assert_eq!(SubscriptionKey::parse("Gas"), SubscriptionKey::from("Gas"));
    /// assert_eq!(SubscriptionKey::parse("angles, distances"), SubscriptionKey::from(["angles", "distances"]));
    /// ```
    pub fn parse(text: &str) -> Self {
        if text.contains(',') {
            SubscriptionKey::Group(text.split(',').map(|name| name.trim().to_string()).collect())
        } else {
            SubscriptionKey::Single(text.trim().to_string())
        }
    }

    /// Field names covered by this key, in order.
    pub fn names(&self) -> &[String] {
        match self {
            SubscriptionKey::Single(name) => std::slice::from_ref(name),
            SubscriptionKey::Group(names) => names,
        }
    }

    /// Check that this key can ever match a decoded message.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidKeyType` for an empty name, an empty
    /// group, or a group naming the same field twice.
    pub fn validate(&self) -> Result<()> {
        if let SubscriptionKey::Group(names) = self {
            if names.is_empty() {
                return Err(SessionError::InvalidKeyType(
                    "group key has no field names".to_string(),
                ));
            }
            let mut seen = HashSet::new();
            if let Some(dup) = names.iter().find(|name| !seen.insert(name.as_str())) {
                return Err(SessionError::InvalidKeyType(format!(
                    "group key names '{dup}' twice"
                )));
            }
        }

        if self.names().iter().any(|name| name.trim().is_empty()) {
            return Err(SessionError::InvalidKeyType(
                "field name is empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Values of this key in `message`, in key order, if all are present.
    fn values_in(&self, message: &DecodedMessage) -> Option<Vec<FieldValue>> {
        let names = self.names();
        let mut slots: Vec<Option<&FieldValue>> = vec![None; names.len()];

        for (slot, name) in slots.iter_mut().zip(names) {
            *slot = message.get(name);
        }

        slots.into_iter().map(|slot| slot.cloned()).collect()
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionKey::Single(name) => write!(f, "{name}"),
            SubscriptionKey::Group(names) => write!(f, "[{}]", names.join(", ")),
        }
    }
}

impl From<&str> for SubscriptionKey {
    fn from(name: &str) -> Self {
        SubscriptionKey::Single(name.to_string())
    }
}

impl From<String> for SubscriptionKey {
    fn from(name: String) -> Self {
        SubscriptionKey::Single(name)
    }
}

impl From<Vec<String>> for SubscriptionKey {
    fn from(names: Vec<String>) -> Self {
        SubscriptionKey::Group(names)
    }
}

impl From<Vec<&str>> for SubscriptionKey {
    fn from(names: Vec<&str>) -> Self {
        SubscriptionKey::Group(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for SubscriptionKey {
    fn from(names: &[&str]) -> Self {
        SubscriptionKey::Group(names.iter().map(|name| name.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SubscriptionKey {
    fn from(names: [&str; N]) -> Self {
        SubscriptionKey::Group(names.iter().map(|name| name.to_string()).collect())
    }
}

struct Subscription {
    key: SubscriptionKey,
    sink: Sink,
}

/// Ordered list of subscriptions, shared between a session's callers and its
/// worker thread.
///
/// Keys need not be unique; every matching sink fires, in registration
/// order. There is no unregistration.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: RwLock<Vec<Arc<Subscription>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sink` for `key`.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidKeyType` if the key can never match.
    pub fn register(
        &self,
        key: impl Into<SubscriptionKey>,
        sink: impl Fn(&[FieldValue]) + Send + Sync + 'static,
    ) -> Result<()> {
        let key = key.into();
        key.validate()?;

        tracing::debug!(%key, "Registering data point");
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(Subscription {
                key,
                sink: Arc::new(sink),
            }));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every sink whose key is satisfied by `message`.
    ///
    /// Sinks run without the registry lock held, so a sink may register
    /// further subscriptions; those take effect from the next message.
    /// Returns the number of sinks invoked.
    pub fn dispatch(&self, message: &DecodedMessage) -> usize {
        let snapshot: Vec<Arc<Subscription>> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut invoked = 0;
        for subscription in snapshot {
            match &subscription.key {
                SubscriptionKey::Single(name) => {
                    if let Some(value) = message.get(name) {
                        (subscription.sink)(std::slice::from_ref(value));
                        invoked += 1;
                    }
                }
                SubscriptionKey::Group(_) => {
                    if let Some(values) = subscription.key.values_in(message) {
                        (subscription.sink)(&values);
                        invoked += 1;
                    }
                }
            }
        }
        invoked
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<SubscriptionKey> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|subscription| subscription.key.clone())
            .collect();
        f.debug_struct("SubscriptionRegistry")
            .field("keys", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use sensorlink_protocol::decode_message;
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<Vec<FieldValue>>>>;

    fn recorder(calls: &Calls) -> impl Fn(&[FieldValue]) + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move |values| calls.lock().unwrap().push(values.to_vec())
    }

    #[test]
    fn test_single_key_fires() {
        let registry = SubscriptionRegistry::new();
        let calls = Calls::default();
        registry.register("temp", recorder(&calls)).unwrap();

        let message = decode_message("temp:number(21.5)|").unwrap();
        assert_eq!(registry.dispatch(&message), 1);
        assert_eq!(*calls.lock().unwrap(), vec![vec![FieldValue::Number(21.5)]]);
    }

    #[test]
    fn test_incomplete_group_does_not_fire() {
        let registry = SubscriptionRegistry::new();
        let single = Calls::default();
        let group = Calls::default();
        registry.register("temp", recorder(&single)).unwrap();
        registry
            .register(["temp", "humidity"], recorder(&group))
            .unwrap();

        let message = decode_message("temp:number(21.5)|").unwrap();
        assert_eq!(registry.dispatch(&message), 1);
        assert_eq!(single.lock().unwrap().len(), 1);
        assert!(group.lock().unwrap().is_empty());
    }

    #[test]
    fn test_group_values_in_declared_order() {
        let registry = SubscriptionRegistry::new();
        let group = Calls::default();
        registry
            .register(["temp", "humidity"], recorder(&group))
            .unwrap();

        let message = decode_message("humidity:number(40)|temp:number(21.5)|").unwrap();
        assert_eq!(registry.dispatch(&message), 1);
        assert_eq!(
            *group.lock().unwrap(),
            vec![vec![FieldValue::Number(21.5), FieldValue::Number(40.0)]]
        );
    }

    #[test]
    fn test_group_state_does_not_carry_over() {
        let registry = SubscriptionRegistry::new();
        let group = Calls::default();
        registry
            .register(["temp", "humidity"], recorder(&group))
            .unwrap();

        registry.dispatch(&decode_message("temp:number(21)|").unwrap());
        registry.dispatch(&decode_message("humidity:number(40)|").unwrap());
        assert!(group.lock().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_keys_all_fire_in_order() {
        let registry = SubscriptionRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = Arc::clone(&order);
            registry
                .register("Gas", move |_| order.lock().unwrap().push(id))
                .unwrap();
        }

        let message = decode_message("Gas:number(300)|").unwrap();
        assert_eq!(registry.dispatch(&message), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unmatched_message_invokes_nothing() {
        let registry = SubscriptionRegistry::new();
        let calls = Calls::default();
        registry.register("Gas", recorder(&calls)).unwrap();

        assert_eq!(
            registry.dispatch(&decode_message("Fire:number(1)|").unwrap()),
            0
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sink_may_register_during_dispatch() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let inner = Arc::clone(&registry);
        registry
            .register("IUD", move |_| {
                inner.register("IUD", |_| {}).unwrap();
            })
            .unwrap();

        registry.dispatch(&decode_message("IUD:str(04A2)|").unwrap());
        assert_eq!(registry.len(), 2);
    }

    #[rstest]
    #[case(SubscriptionKey::from(""))]
    #[case(SubscriptionKey::from("  "))]
    #[case(SubscriptionKey::Group(vec![]))]
    #[case(SubscriptionKey::from(["a", ""]))]
    #[case(SubscriptionKey::from(["a", "b", "a"]))]
    fn test_invalid_keys_rejected(#[case] key: SubscriptionKey) {
        let registry = SubscriptionRegistry::new();
        assert!(matches!(
            registry.register(key, |_| {}),
            Err(SessionError::InvalidKeyType(_))
        ));
        assert!(registry.is_empty());
    }

    #[rstest]
    #[case("Gas", SubscriptionKey::Single("Gas".to_string()))]
    #[case(" Gas ", SubscriptionKey::Single("Gas".to_string()))]
    #[case("angles,distances", SubscriptionKey::from(vec!["angles", "distances"]))]
    #[case("temp, humidity ", SubscriptionKey::from(vec!["temp", "humidity"]))]
    fn test_parse(#[case] text: &str, #[case] expected: SubscriptionKey) {
        assert_eq!(SubscriptionKey::parse(text), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(SubscriptionKey::from("Gas").to_string(), "Gas");
        assert_eq!(
            SubscriptionKey::from(["angles", "distances"]).to_string(),
            "[angles, distances]"
        );
    }
}
