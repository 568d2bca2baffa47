use std::sync::{Mutex, PoisonError};

/// Single pending outbound message.
///
/// There is no queue: staging a message replaces whatever is pending, and
/// the worker takes at most one message per iteration.
#[derive(Debug, Default)]
pub struct OutboundSlot {
    pending: Mutex<Option<String>>,
}

impl OutboundSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `message` for the next iteration, returning the one it replaced.
    ///
    /// An empty message clears the slot.
    pub fn stage(&self, message: impl Into<String>) -> Option<String> {
        let message = message.into();
        let next = (!message.is_empty()).then_some(message);
        std::mem::replace(&mut *self.lock(), next)
    }

    /// Remove and return the pending message.
    pub fn take(&self) -> Option<String> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let slot = OutboundSlot::new();
        assert_eq!(slot.stage("SECURITY"), None);
        assert_eq!(slot.stage("SAFETY"), Some("SECURITY".to_string()));
        assert_eq!(slot.take().as_deref(), Some("SAFETY"));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_empty_message_clears() {
        let slot = OutboundSlot::new();
        slot.stage("SAFETY");
        slot.stage("");
        assert!(slot.is_empty());
    }
}
